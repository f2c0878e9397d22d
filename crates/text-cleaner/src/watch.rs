use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use tokio::sync::broadcast;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use run_journal::{RunEvent, RunMode};

use crate::host::Host;
use crate::io::{InputError, InputSource};

/// Timing for the live-preview loop.
#[derive(Debug, Clone, Copy)]
pub struct WatchSettings {
    /// How often the input file is re-read.
    pub poll_interval: Duration,
    /// How long content must stay unchanged before it is cleaned.
    pub debounce: Duration,
}

/// Decides when freshly read content should be cleaned.
///
/// Content is released once it has been observed unchanged for the debounce
/// period, and only if it differs from the last released content.
#[derive(Debug)]
pub struct Debouncer {
    debounce: Duration,
    pending: Option<(String, Instant)>,
    last_released: Option<String>,
}

impl Debouncer {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            pending: None,
            last_released: None,
        }
    }

    /// Feed the content read at `now`; returns it when it is due for a clean.
    pub fn observe(&mut self, content: &str, now: Instant) -> Option<String> {
        let unchanged = matches!(&self.pending, Some((pending, _)) if pending == content);
        if !unchanged {
            self.pending = Some((content.to_owned(), now));
        }
        let changed_at = self.pending.as_ref().map_or(now, |(_, since)| *since);

        if now.duration_since(changed_at) < self.debounce {
            return None;
        }
        if self.last_released.as_deref() == Some(content) {
            return None;
        }

        self.last_released = Some(content.to_owned());
        self.last_released.clone()
    }
}

/// Poll `input` and rewrite `output` each time its content settles on
/// something new.  Runs until `shutdown` fires and returns the number of
/// cleans performed.
pub async fn run(
    host: &Host,
    settings: WatchSettings,
    input: PathBuf,
    output: Option<PathBuf>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<u64> {
    let source = InputSource::File(input);

    info!(
        input = %source.describe(),
        poll_ms = settings.poll_interval.as_millis() as u64,
        debounce_ms = settings.debounce.as_millis() as u64,
        "watching input for changes"
    );
    host.record(
        RunMode::Watch,
        &source,
        RunEvent::WatchStarted {
            poll_interval_ms: settings.poll_interval.as_millis() as u64,
            debounce_ms: settings.debounce.as_millis() as u64,
        },
    );

    let mut ticker = tokio::time::interval(settings.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut debouncer = Debouncer::new(settings.debounce);
    let mut runs: u64 = 0;
    let mut oversized_reported = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let raw = match source.read(host.max_input_bytes()).await {
                    Ok(raw) => {
                        oversized_reported = false;
                        raw
                    }
                    // Blank input is simply not cleaned yet.
                    Err(InputError::Empty) => continue,
                    Err(err @ InputError::TooLarge { .. }) => {
                        if !oversized_reported {
                            host.record_rejection(RunMode::Watch, &source, &err);
                            oversized_reported = true;
                        }
                        continue;
                    }
                    Err(err) => {
                        warn!(%err, "failed to read watched input; retrying");
                        continue;
                    }
                };

                let Some(content) = debouncer.observe(&raw, Instant::now()) else {
                    continue;
                };

                debug!(bytes = content.len(), "input settled; cleaning");
                host.clean_and_write(&content, &source, RunMode::Watch, output.as_deref())
                    .await?;
                runs += 1;
            }

            _ = shutdown.recv() => {
                info!(runs, "watch stopped");
                break;
            }
        }
    }

    host.record(RunMode::Watch, &source, RunEvent::WatchStopped { runs });

    Ok(runs)
}

/// Reject watch targets that cannot work before the loop starts.
pub fn check_input(input: &Path) -> Result<()> {
    if input == Path::new("-") {
        anyhow::bail!("--watch needs an input file, not stdin");
    }
    if !input.is_file() {
        anyhow::bail!("watched input {} is not a file", input.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use text_normalizer::Normalizer;

    const DEBOUNCE: Duration = Duration::from_millis(500);

    #[test]
    fn content_is_held_until_it_settles() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(DEBOUNCE);

        assert_eq!(d.observe("draft", t0), None);
        assert_eq!(d.observe("draft", t0 + Duration::from_millis(200)), None);
        assert_eq!(
            d.observe("draft", t0 + DEBOUNCE),
            Some("draft".to_string())
        );
    }

    #[test]
    fn edits_restart_the_debounce_window() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(DEBOUNCE);

        d.observe("a", t0);
        assert_eq!(d.observe("ab", t0 + Duration::from_millis(400)), None);
        assert_eq!(d.observe("ab", t0 + Duration::from_millis(600)), None);
        assert_eq!(
            d.observe("ab", t0 + Duration::from_millis(900)),
            Some("ab".to_string())
        );
    }

    #[test]
    fn unchanged_content_is_released_once() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(Duration::ZERO);

        assert_eq!(d.observe("same", t0), Some("same".to_string()));
        assert_eq!(d.observe("same", t0 + DEBOUNCE), None);
        assert_eq!(d.observe("new", t0 + DEBOUNCE), Some("new".to_string()));
        // Reverting to earlier content counts as a change.
        assert_eq!(d.observe("same", t0 + DEBOUNCE), Some("same".to_string()));
    }

    #[test]
    fn stdin_and_missing_files_cannot_be_watched() {
        assert!(check_input(Path::new("-")).is_err());
        let dir = tempfile::tempdir().unwrap();
        assert!(check_input(&dir.path().join("absent.txt")).is_err());
        assert!(check_input(dir.path()).is_err());
    }

    fn fast_settings() -> WatchSettings {
        WatchSettings {
            poll_interval: Duration::from_millis(10),
            debounce: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn rewrites_output_when_input_changes() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.html");
        let output = dir.path().join("notes.txt");
        replace(&input, "<b>first</b>");

        let host = Host::new(Normalizer::default(), None, 1024, false);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let watcher = run(&host, fast_settings(), input.clone(), Some(output.clone()), shutdown_rx);
        let driver = async {
            wait_for(&output, "first\n").await;
            replace(&input, "<i>second!!</i>");
            wait_for(&output, "second\n").await;
            shutdown_tx.send(()).unwrap();
        };

        let (runs, ()) = tokio::join!(watcher, driver);
        assert_eq!(runs.unwrap(), 2);
    }

    #[tokio::test]
    async fn survives_missing_and_oversized_input_and_journals_the_limit_once() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("draft.html");
        let output = dir.path().join("draft.txt");
        let journal_path = dir.path().join("journal.jsonl");

        let journal = run_journal::Journal::open(&journal_path).unwrap();
        let host = Host::new(Normalizer::default(), Some(journal), 16, false);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let watcher = run(&host, fast_settings(), input.clone(), Some(output.clone()), shutdown_rx);
        let driver = async {
            // Input does not exist yet: every tick is a read error.
            tokio::time::sleep(Duration::from_millis(50)).await;
            assert!(!output.exists());

            replace(&input, &"x".repeat(64));
            wait_for_event(&journal_path, "input_too_large").await;
            // Let the loop see the oversized file on several more ticks.
            tokio::time::sleep(Duration::from_millis(100)).await;

            replace(&input, "<b>ok</b>");
            wait_for(&output, "ok\n").await;
            shutdown_tx.send(()).unwrap();
        };

        let (runs, ()) = tokio::join!(watcher, driver);
        assert_eq!(runs.unwrap(), 1);

        let records = run_journal::read_records(&journal_path).unwrap();
        assert!(records.iter().all(|r| r.mode == RunMode::Watch));
        assert_eq!(
            event_names(&records),
            ["watch_started", "input_too_large", "cleaned", "watch_stopped"]
        );
        assert_eq!(records[1].event, RunEvent::InputTooLarge { limit_bytes: 16 });
    }

    /// Swap in new content with a rename so the watcher never reads a
    /// half-written file.
    fn replace(path: &Path, contents: &str) {
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, contents).unwrap();
        std::fs::rename(&tmp, path).unwrap();
    }

    fn event_names(records: &[run_journal::RunRecord]) -> Vec<String> {
        records
            .iter()
            .map(|r| {
                let value = serde_json::to_value(&r.event).unwrap();
                value["event"].as_str().unwrap().to_string()
            })
            .collect()
    }

    async fn wait_for_event(journal: &Path, event: &str) {
        for _ in 0..500 {
            let records = run_journal::read_records(journal).unwrap_or_default();
            if event_names(&records).iter().any(|name| name == event) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("{} never recorded {event}", journal.display());
    }

    async fn wait_for(path: &Path, expected: &str) {
        for _ in 0..500 {
            if std::fs::read_to_string(path).is_ok_and(|s| s == expected) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("{} never contained {expected:?}", path.display());
    }
}
