//! Append-only log of errors the main loop swallowed.
//!
//! Kept separate from the tracing log so the operator can see at a glance why
//! a key press "did nothing".  Writing is best effort.

use std::fmt::Display;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::warn;

#[derive(Debug, Clone)]
pub struct FailureLog {
    path: PathBuf,
}

impl FailureLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line: `<rfc3339 timestamp> <error>`.
    pub fn record(&self, err: &dyn Display) {
        let line = format!("{} {}", chrono::Local::now().to_rfc3339(), err);
        let written = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut f| writeln!(f, "{}", line.replace('\n', " ")));
        if let Err(e) = written {
            warn!("could not write {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_one_line_per_error() {
        let dir = tempfile::tempdir().unwrap();
        let log = FailureLog::new(dir.path().join("failures.log"));
        log.record(&"speaker unreachable");
        log.record(&"bridge answered 503\nService Unavailable");

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" speaker unreachable"));
        assert!(lines[1].ends_with("503 Service Unavailable"));
    }

    #[test]
    fn test_unwritable_path_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let log = FailureLog::new(dir.path().join("missing").join("failures.log"));
        log.record(&"ignored");
        assert!(!log.path().exists());
    }
}
