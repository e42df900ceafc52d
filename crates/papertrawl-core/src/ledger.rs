use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;

const RULE_WIDTH: usize = 50;

/// One rejected or failed candidate, as recorded for later audit.
#[derive(Debug, Clone)]
pub struct RejectionRecord {
    pub filename: String,
    pub query: String,
    pub source_url: String,
    pub reason: String,
}

/// Append-only per-query log of rejected and failed candidates. Entries are
/// only ever added; nothing rewrites or truncates the file.
pub struct RejectionLedger {
    path: PathBuf,
}

impl RejectionLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record, creating the file on first use.
    pub fn append(&self, record: &RejectionRecord) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        writeln!(file, "Filename: {}", record.filename)?;
        writeln!(file, "Query: {}", record.query)?;
        writeln!(file, "URL: {}", record.source_url)?;
        writeln!(file, "Reason: {}", record.reason)?;
        writeln!(file, "{}", "-".repeat(RULE_WIDTH))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(filename: &str, reason: &str) -> RejectionRecord {
        RejectionRecord {
            filename: filename.to_string(),
            query: "rocket engine injector".to_string(),
            source_url: "https://example.org/paper.pdf".to_string(),
            reason: reason.to_string(),
        }
    }

    #[test]
    fn test_append_creates_and_formats() {
        let dir = TempDir::new().unwrap();
        let ledger = RejectionLedger::new(dir.path().join("rejections_test.txt"));

        ledger
            .append(&record("arXiv_1_Some Paper.pdf", "Not relevant to query"))
            .unwrap();

        let contents = std::fs::read_to_string(ledger.path()).unwrap();
        assert!(contents.starts_with("Filename: arXiv_1_Some Paper.pdf\n"));
        assert!(contents.contains("Query: rocket engine injector\n"));
        assert!(contents.contains("URL: https://example.org/paper.pdf\n"));
        assert!(contents.contains("Reason: Not relevant to query\n"));
        assert!(contents.contains(&"-".repeat(50)));
    }

    #[test]
    fn test_append_preserves_earlier_entries() {
        let dir = TempDir::new().unwrap();
        let ledger = RejectionLedger::new(dir.path().join("rejections_test.txt"));

        ledger
            .append(&record("first.pdf", "Download failed"))
            .unwrap();
        ledger
            .append(&record("second.pdf", "Not relevant to query"))
            .unwrap();

        let contents = std::fs::read_to_string(ledger.path()).unwrap();
        let first = contents.find("Filename: first.pdf").unwrap();
        let second = contents.find("Filename: second.pdf").unwrap();
        assert!(first < second);
        assert_eq!(contents.matches(&"-".repeat(50)).count(), 2);
    }
}
