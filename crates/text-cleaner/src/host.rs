use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use run_journal::{Journal, RunEvent, RunMode, RunRecord};
use text_normalizer::{CleanReport, Normalizer};

use crate::io::{self, InputError, InputSource};

/// Ties the normalizer to the host's I/O, size limit and journal.
pub struct Host {
    normalizer: Normalizer,
    journal: Option<Journal>,
    max_input_bytes: u64,
    print_report: bool,
}

impl Host {
    pub fn new(
        normalizer: Normalizer,
        journal: Option<Journal>,
        max_input_bytes: u64,
        print_report: bool,
    ) -> Self {
        Self {
            normalizer,
            journal,
            max_input_bytes,
            print_report,
        }
    }

    pub fn max_input_bytes(&self) -> u64 {
        self.max_input_bytes
    }

    /// Append a record to the journal, if one is configured.  A failed
    /// append is logged and never fails the run.
    pub fn record(&self, mode: RunMode, input: &InputSource, event: RunEvent) {
        let Some(journal) = &self.journal else {
            return;
        };
        let record = RunRecord::new(mode, input.path_label(), event);
        if let Err(err) = journal.append(&record) {
            warn!(
                path = %journal.path().display(),
                %err,
                "failed to append run record"
            );
        }
    }

    /// Read, clean and write a single input.
    pub async fn clean_once(&self, input: &InputSource, output: Option<&Path>) -> Result<()> {
        let raw = match input.read(self.max_input_bytes).await {
            Ok(raw) => raw,
            Err(err) => {
                self.record_rejection(RunMode::OneShot, input, &err);
                return Err(err).with_context(|| format!("cannot clean {}", input.describe()));
            }
        };

        self.clean_and_write(&raw, input, RunMode::OneShot, output)
            .await?;
        Ok(())
    }

    /// Clean already-read text, write it out and journal the run.
    pub async fn clean_and_write(
        &self,
        raw: &str,
        input: &InputSource,
        mode: RunMode,
        output: Option<&Path>,
    ) -> Result<CleanReport> {
        let report = self.normalizer.clean_with_report(raw);

        io::write_output(output, &report.output).await?;

        info!(
            input = %input.describe(),
            input_chars = report.input_chars,
            output_chars = report.output_chars,
            replacements = report.total_replacements(),
            "cleaning complete"
        );

        if self.print_report {
            let json = serde_json::to_string_pretty(&report).context("failed to encode report")?;
            eprintln!("{json}");
        }

        self.record(mode, input, RunEvent::cleaned(&report));

        Ok(report)
    }

    /// Log and journal input the host refused to clean.
    pub fn record_rejection(&self, mode: RunMode, input: &InputSource, err: &InputError) {
        let event = match err {
            InputError::Empty => RunEvent::EmptyInput,
            InputError::TooLarge { limit } => RunEvent::InputTooLarge {
                limit_bytes: *limit,
            },
            // Read failures are reported through the returned error only.
            InputError::Read { .. } => return,
        };

        warn!(input = %input.describe(), %err, "input rejected");
        self.record(mode, input, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(journal: Option<Journal>, max_input_bytes: u64) -> Host {
        Host::new(Normalizer::default(), journal, max_input_bytes, false)
    }

    #[tokio::test]
    async fn cleans_file_into_output_and_journals_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("page.html");
        let output_path = dir.path().join("page.txt");
        let journal_path = dir.path().join("journal.jsonl");
        std::fs::write(&input_path, "<p>call 123-456-7890 now!!!</p>").unwrap();

        let host = host(Some(Journal::open(&journal_path).unwrap()), 1024);
        host.clean_once(&InputSource::File(input_path.clone()), Some(&output_path))
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&output_path).unwrap(), "call now\n");

        let records = run_journal::read_records(&journal_path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].mode, RunMode::OneShot);
        assert_eq!(
            records[0].input.as_deref(),
            Some(input_path.display().to_string().as_str())
        );
        let RunEvent::Cleaned {
            output_chars, hits, ..
        } = &records[0].event
        else {
            panic!("expected a cleaned record, got {:?}", records[0].event);
        };
        assert_eq!(*output_chars, 8);
        let rules: Vec<_> = hits.iter().map(|h| h.rule.as_str()).collect();
        assert!(rules.contains(&"phone_number"), "rules fired: {rules:?}");
        assert!(rules.contains(&"repeated_punctuation"), "rules fired: {rules:?}");
    }

    #[tokio::test]
    async fn empty_file_is_rejected_and_journaled() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("blank.txt");
        let output_path = dir.path().join("out.txt");
        let journal_path = dir.path().join("journal.jsonl");
        std::fs::write(&input_path, "   \n").unwrap();

        let host = host(Some(Journal::open(&journal_path).unwrap()), 1024);
        let err = host
            .clean_once(&InputSource::File(input_path), Some(&output_path))
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("No input provided."));
        assert!(!output_path.exists());
        let records = run_journal::read_records(&journal_path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event, RunEvent::EmptyInput);
    }

    #[tokio::test]
    async fn oversized_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("big.txt");
        std::fs::write(&input_path, "x".repeat(64)).unwrap();

        let err = host(None, 16)
            .clean_once(&InputSource::File(input_path), Some(&dir.path().join("o.txt")))
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("16 byte limit"));
    }
}
