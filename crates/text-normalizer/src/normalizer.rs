//! High-level normalizer that wraps the [`Pipeline`](crate::pipeline::Pipeline)
//! and produces either the cleaned string or a [`CleanReport`] describing
//! what was removed.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::pipeline::{Pipeline, PipelineError, RuleHit};
use crate::rules::RewriteRule;

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// The outcome of a [`Normalizer::clean_with_report`] call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanReport {
    /// The cleaned text, identical to what [`Normalizer::clean`] returns.
    pub output: String,
    /// Length of the input in characters.
    pub input_chars: usize,
    /// Length of the output in characters.
    pub output_chars: usize,
    /// One entry per rule that changed the text, in pipeline order.
    pub hits: Vec<RuleHit>,
}

impl CleanReport {
    /// Total number of replacements across all rules.
    pub fn total_replacements(&self) -> usize {
        self.hits.iter().map(|h| h.replacements).sum()
    }

    /// Replacement count for the rule called `name`, or 0 if it never fired.
    pub fn replacements_for(&self, name: &str) -> usize {
        self.hits
            .iter()
            .find(|h| h.rule == name)
            .map_or(0, |h| h.replacements)
    }
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Main entry point for text cleaning.
///
/// # Example
///
/// ```rust
/// use text_normalizer::Normalizer;
///
/// let normalizer = Normalizer::new().unwrap();
/// assert_eq!(normalizer.clean("<b>hi</b>"), "hi");
/// ```
pub struct Normalizer {
    pipeline: Pipeline,
}

impl Normalizer {
    /// Create a normalizer over the built-in rule table.
    pub fn new() -> Result<Self, PipelineError> {
        Ok(Self {
            pipeline: Pipeline::new()?,
        })
    }

    /// Create a normalizer over a custom, ordered rule table.
    pub fn with_rules(rules: &'static [RewriteRule]) -> Result<Self, PipelineError> {
        Ok(Self {
            pipeline: Pipeline::with_rules(rules)?,
        })
    }

    /// Clean `text`.  Total over all inputs; the empty string maps to the
    /// empty string.
    pub fn clean(&self, text: &str) -> String {
        self.pipeline.apply(text)
    }

    /// Clean `text` and describe what each rule removed.
    pub fn clean_with_report(&self, text: &str) -> CleanReport {
        let (output, hits) = self.pipeline.apply_with_hits(text);

        let report = CleanReport {
            input_chars: text.chars().count(),
            output_chars: output.chars().count(),
            output,
            hits,
        };

        debug!(
            input_chars = report.input_chars,
            output_chars = report.output_chars,
            rules_fired = report.hits.len(),
            replacements = report.total_replacements(),
            "text cleaned"
        );

        report
    }

    /// Rule names in application order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.pipeline.rule_names().collect()
    }
}

impl Default for Normalizer {
    /// Constructs a normalizer over the built-in rules.
    ///
    /// # Panics
    ///
    /// Panics if the built-in rule table fails to compile, which the
    /// catalogue tests rule out.
    fn default() -> Self {
        Self::new().expect("built-in rules must compile")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
