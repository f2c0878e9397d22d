use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::record::RunRecord;

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("failed to open journal {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode run record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to append to journal: {0}")]
    Append(std::io::Error),

    #[error("failed to read journal {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record on line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Append-only journal file shared by every run of one process.
///
/// Each record goes out as a single `write_all` of one JSON line on a file
/// opened in append mode, so records never interleave.
#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
    file: Mutex<File>,
}

impl Journal {
    /// Open (or create) the journal at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        let path = path.as_ref().to_path_buf();
        let open_err = |source| JournalError::Open {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(open_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(open_err)?;

        tracing::debug!(path = %path.display(), "journal opened");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &RunRecord) -> Result<(), JournalError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.write_all(&line).map_err(JournalError::Append)
    }
}

/// Read every record back, oldest first.  Blank lines are skipped.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<RunRecord>, JournalError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| JournalError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|source| JournalError::Malformed {
                line: idx + 1,
                source,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RunEvent, RunMode};

    #[test]
    fn appends_across_reopen_and_reads_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("runs.jsonl");

        let journal = Journal::open(&path).unwrap();
        journal
            .append(&RunRecord::new(RunMode::OneShot, None, RunEvent::EmptyInput))
            .unwrap();
        drop(journal);

        let journal = Journal::open(&path).unwrap();
        journal
            .append(&RunRecord::new(
                RunMode::OneShot,
                Some("page.html".into()),
                RunEvent::InputTooLarge { limit_bytes: 8 },
            ))
            .unwrap();

        let records = read_records(journal.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].event, RunEvent::EmptyInput);
        assert_eq!(records[1].event, RunEvent::InputTooLarge { limit_bytes: 8 });
    }

    #[test]
    fn shared_journal_keeps_lines_whole_across_threads() {
        let dir = tempfile::tempdir().unwrap();
        let journal = std::sync::Arc::new(Journal::open(dir.path().join("runs.jsonl")).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|runs| {
                let journal = std::sync::Arc::clone(&journal);
                std::thread::spawn(move || {
                    journal
                        .append(&RunRecord::new(
                            RunMode::Watch,
                            None,
                            RunEvent::WatchStopped { runs },
                        ))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(read_records(journal.path()).unwrap().len(), 8);
    }

    #[test]
    fn malformed_line_is_reported_with_its_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.jsonl");
        let good = serde_json::to_string(&RunRecord::new(
            RunMode::OneShot,
            None,
            RunEvent::EmptyInput,
        ))
        .unwrap();
        std::fs::write(&path, format!("{good}\n\nnot json\n")).unwrap();

        let err = read_records(&path).unwrap_err();
        assert!(matches!(err, JournalError::Malformed { line: 3, .. }), "{err}");
    }

    #[test]
    fn missing_journal_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_records(dir.path().join("absent.jsonl")).unwrap_err();
        assert!(err.to_string().contains("absent.jsonl"));
    }
}
