use serde::{Deserialize, Serialize};

use text_normalizer::{CleanReport, RuleHit};

/// How the host was invoked when the event happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    OneShot,
    Watch,
}

/// What happened.  Serialised with an `event` tag next to the record fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    /// Input was cleaned and the result written.
    Cleaned {
        input_chars: usize,
        output_chars: usize,
        replacements: usize,
        hits: Vec<RuleHit>,
    },
    /// Input was blank and never reached the normalizer.
    EmptyInput,
    /// Input exceeded the configured byte limit.
    InputTooLarge { limit_bytes: u64 },
    WatchStarted {
        poll_interval_ms: u64,
        debounce_ms: u64,
    },
    WatchStopped { runs: u64 },
}

impl RunEvent {
    /// Summarise a finished clean; the cleaned text itself is not kept.
    pub fn cleaned(report: &CleanReport) -> Self {
        Self::Cleaned {
            input_chars: report.input_chars,
            output_chars: report.output_chars,
            replacements: report.total_replacements(),
            hits: report.hits.clone(),
        }
    }
}

/// One line of the journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: uuid::Uuid,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub mode: RunMode,
    /// Input file path; absent for stdin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(flatten)]
    pub event: RunEvent,
}

impl RunRecord {
    /// Stamp `event` with a fresh UUID v4 and the current UTC time.
    pub fn new(mode: RunMode, input: Option<String>, event: RunEvent) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
            mode,
            input,
            event,
        }
    }
}
