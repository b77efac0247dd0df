use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::StoreError;

/// Line opening every diagnostic block.
pub const BLOCK_MARKER: &str = "---";

const ERROR_MESSAGE_PREFIX: &str = "error_message: ";

/// One structured diagnostic record for a failed remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEntry {
    pub model: String,
    pub error_message: String,
    pub user_prompt: String,
    pub parameters: Vec<(String, String)>,
}

/// Append-only diagnostic log, written only when debugging is enabled.
///
/// Retrieval works regardless of the debug flag so that an error recorded by
/// an earlier debug-enabled invocation stays reachable.
#[derive(Debug, Clone)]
pub struct DiagnosticLog {
    path: PathBuf,
    enabled: bool,
}

impl DiagnosticLog {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            path: path.into(),
            enabled,
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Appends one marker-delimited block. No-op when debugging is disabled.
    pub fn record(&self, entry: &DiagnosticEntry) -> Result<(), StoreError> {
        if !self.enabled {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| StoreError::io("creating data directory", parent, source))?;
        }

        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(StoreError::ClockFormat)?;

        let mut block = String::new();
        block.push_str(BLOCK_MARKER);
        block.push('\n');
        block.push_str(&format!("timestamp: {timestamp}\n"));
        block.push_str(&format!("model: {}\n", single_line(&entry.model)));
        block.push_str(&format!(
            "{ERROR_MESSAGE_PREFIX}{}\n",
            single_line(&entry.error_message)
        ));
        block.push_str(&format!("user_prompt: {}\n", single_line(&entry.user_prompt)));
        for (key, value) in &entry.parameters {
            block.push_str(&format!("{}: {}\n", single_line(key), single_line(value)));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| {
                StoreError::io("opening diagnostic log for append", &self.path, source)
            })?;
        file.write_all(block.as_bytes())
            .map_err(|source| StoreError::io("appending diagnostic block", &self.path, source))
    }

    /// Returns the most recently recorded error message, scanning from the
    /// end of the log. A missing log yields `None`.
    pub fn last_error_message(&self) -> Result<Option<String>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .map_err(|source| StoreError::io("reading diagnostic log", &self.path, source))?;

        Ok(contents
            .lines()
            .rev()
            .find_map(|line| line.strip_prefix(ERROR_MESSAGE_PREFIX))
            .map(|message| message.trim().to_string()))
    }
}

// Field values share the line-oriented block format, so embedded newlines
// must not fork a record into stray lines.
fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::single_line;

    #[test]
    fn single_line_flattens_newlines() {
        assert_eq!(single_line("a\nb\r\nc"), "a b  c");
        assert_eq!(single_line("plain"), "plain");
    }
}
