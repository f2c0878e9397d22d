//! Append-only JSON-lines record of text-cleaner runs.
//!
//! Every clean the host performs, every input it refuses, and the start and
//! end of each watch session becomes one [`RunRecord`] line.  A cleaned run
//! keeps the per-rule [`RuleHit`](text_normalizer::RuleHit) counts from the
//! [`CleanReport`](text_normalizer::CleanReport) but never the text itself.
//!
//! ```rust,no_run
//! use run_journal::{Journal, RunEvent, RunMode, RunRecord};
//!
//! # fn example() -> Result<(), run_journal::JournalError> {
//! let journal = Journal::open("clean-journal.jsonl")?;
//! let report = text_normalizer::Normalizer::default().clean_with_report("<b>hi</b>");
//! journal.append(&RunRecord::new(RunMode::OneShot, None, RunEvent::cleaned(&report)))?;
//! # Ok(())
//! # }
//! ```

pub mod journal;
pub mod record;

pub use journal::{read_records, Journal, JournalError};
pub use record::{RunEvent, RunMode, RunRecord};
