//! Persistent diagnostic log
//!
//! Collaborator failures (player queries, lyric lookups) are appended to a
//! plain text file, one `[YYYY-MM-DD HH:MM:SS] message` line per record, so
//! they can be inspected after the session. Recording never fails.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

/// Default diagnostic log file, relative to the working directory
pub const DEFAULT_LOG_FILE: &str = "lyrics_errors.log";

/// Sink for non-fatal failures
pub trait Diagnostics: Send + Sync {
    fn record(&self, message: &str);
}

fn format_record(message: &str) -> String {
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    format!("[{}] {}\n", timestamp, message)
}

/// Append-only log file, flushed after every record
#[derive(Debug)]
pub struct FileDiagnostics {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileDiagnostics {
    /// Open (or create) the log file for appending
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Diagnostics for FileDiagnostics {
    fn record(&self, message: &str) {
        let line = format_record(message);
        let mut file = self.file.lock();
        if let Err(e) = file.write_all(line.as_bytes()).and_then(|_| file.flush()) {
            tracing::warn!("Failed to write diagnostic log {:?}: {}", self.path, e);
        }
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {
    fn record(&self, _message: &str) {}
}

/// Keeps records in memory, for tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    records: Mutex<Vec<String>>,
}

#[cfg(test)]
impl MemoryDiagnostics {
    pub fn records(&self) -> Vec<String> {
        self.records.lock().clone()
    }
}

#[cfg(test)]
impl Diagnostics for MemoryDiagnostics {
    fn record(&self, message: &str) {
        self.records.lock().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_record() {
        let line = format_record("boom");
        assert!(line.starts_with('['));
        assert!(line.ends_with("] boom\n"));
        // "[YYYY-MM-DD HH:MM:SS] "
        assert_eq!(line.find(']'), Some(20));
    }

    #[test]
    fn test_file_diagnostics_appends() {
        let path = std::env::temp_dir().join(format!(
            "lyricsync-diagnostics-{}.log",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        {
            let log = FileDiagnostics::open(&path).unwrap();
            log.record("first");
        }
        {
            let log = FileDiagnostics::open(&path).unwrap();
            log.record("second");
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("] first"));
        assert!(lines[1].ends_with("] second"));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_memory_diagnostics() {
        let log = MemoryDiagnostics::default();
        log.record("a");
        log.record("b");
        assert_eq!(log.records(), ["a", "b"]);
    }
}
