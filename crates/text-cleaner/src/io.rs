//! Reading raw text and writing cleaned text for the host.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

/// Reasons the host refuses to hand input to the normalizer.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("No input provided.")]
    Empty,

    #[error("input exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("failed to read {source_name}: {source}")]
    Read {
        source_name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Where raw text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

impl InputSource {
    /// `None` and `-` select stdin.
    pub fn from_arg(arg: Option<&Path>) -> Self {
        match arg {
            Some(path) if path != Path::new("-") => Self::File(path.to_path_buf()),
            _ => Self::Stdin,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Stdin => "stdin".to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }

    /// File path for journal entries; stdin has none.
    pub fn path_label(&self) -> Option<String> {
        match self {
            Self::Stdin => None,
            Self::File(path) => Some(path.display().to_string()),
        }
    }

    /// Read the whole source, refusing anything over `max_bytes` and
    /// anything that is empty once trimmed.
    pub async fn read(&self, max_bytes: u64) -> Result<String, InputError> {
        let name = self.describe();
        match self {
            Self::Stdin => read_bounded(tokio::io::stdin(), max_bytes, &name).await,
            Self::File(path) => {
                let file = tokio::fs::File::open(path)
                    .await
                    .map_err(|source| InputError::Read {
                        source_name: name.clone(),
                        source,
                    })?;
                read_bounded(file, max_bytes, &name).await
            }
        }
    }
}

/// Read at most `max_bytes` from `reader`.
///
/// Invalid UTF-8 is replaced with U+FFFD, which the character filter removes
/// later anyway.
pub async fn read_bounded<R>(
    reader: R,
    max_bytes: u64,
    source_name: &str,
) -> Result<String, InputError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    reader
        .take(max_bytes.saturating_add(1))
        .read_to_end(&mut buf)
        .await
        .map_err(|source| InputError::Read {
            source_name: source_name.to_string(),
            source,
        })?;

    if buf.len() as u64 > max_bytes {
        return Err(InputError::TooLarge { limit: max_bytes });
    }

    let text = String::from_utf8_lossy(&buf).into_owned();
    if text.trim_matches(is_blank).is_empty() {
        return Err(InputError::Empty);
    }
    Ok(text)
}

/// Whitespace as the cleaning rules see it, ASCII information separators
/// included.
fn is_blank(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Write `text` plus a trailing newline to `output`, or stdout when `output`
/// is `None` or `-`.
pub async fn write_output(output: Option<&Path>, text: &str) -> Result<()> {
    let mut line = String::with_capacity(text.len() + 1);
    line.push_str(text);
    line.push('\n');

    match output {
        Some(path) if path != Path::new("-") => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            tokio::fs::write(path, line)
                .await
                .with_context(|| format!("failed to write output file {}", path.display()))
        }
        _ => {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(line.as_bytes())
                .await
                .context("failed to write to stdout")?;
            stdout.flush().await.context("failed to flush stdout")
        }
    }
}
