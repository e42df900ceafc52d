use std::path::PathBuf;

use serde::Serialize;

/// Minimal normalized paper record emitted by a source adapter, before any
/// download happens. A stub without a `pdf_url` still occupies a rank in its
/// source's result order but is dropped before download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaperStub {
    pub title: String,
    pub pdf_url: Option<String>,
}

impl PaperStub {
    pub fn new(title: impl Into<String>, pdf_url: Option<String>) -> Self {
        Self {
            title: title.into(),
            pdf_url,
        }
    }
}

/// Result of one fetch attempt. The downloaded file is the only durable
/// artifact of the attempt; on failure nothing was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded(PathBuf),
    Failed,
}

impl DownloadOutcome {
    pub fn is_downloaded(&self) -> bool {
        matches!(self, DownloadOutcome::Downloaded(_))
    }
}

/// Terminal state the pipeline assigns to one candidate paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// File retained on disk (judged relevant, already present, or kept
    /// because no text could be extracted).
    Kept,
    /// Judged not relevant; file deleted, rejection logged.
    RejectedIrrelevant,
    /// Could not be downloaded; rejection logged, no file written.
    RejectedDownloadFailed,
}

/// Kept/rejected/failed counts for one source pass. Observational only;
/// nothing downstream branches on these numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceTally {
    pub kept: usize,
    pub rejected: usize,
    pub failed: usize,
}

impl SourceTally {
    pub fn record(&mut self, disposition: Disposition) {
        match disposition {
            Disposition::Kept => self.kept += 1,
            Disposition::RejectedIrrelevant => self.rejected += 1,
            Disposition::RejectedDownloadFailed => self.failed += 1,
        }
    }
}

/// One adapter's contribution to a query run.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source: String,
    /// Number of stubs the adapter returned, before any filtering.
    pub found: usize,
    #[serde(flatten)]
    pub tally: SourceTally,
}

/// Aggregate outcome of one full pipeline pass for one query.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryReport {
    pub query: String,
    pub sources: Vec<SourceReport>,
}

impl QueryReport {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            sources: Vec::new(),
        }
    }

    pub fn total(&self) -> SourceTally {
        let mut total = SourceTally::default();
        for report in &self.sources {
            total.kept += report.tally.kept;
            total.rejected += report.tally.rejected;
            total.failed += report.tally.failed;
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_records_each_disposition() {
        let mut tally = SourceTally::default();
        tally.record(Disposition::Kept);
        tally.record(Disposition::Kept);
        tally.record(Disposition::RejectedIrrelevant);
        tally.record(Disposition::RejectedDownloadFailed);
        assert_eq!(
            tally,
            SourceTally {
                kept: 2,
                rejected: 1,
                failed: 1
            }
        );
    }

    #[test]
    fn report_serializes_with_flattened_tallies() {
        let mut report = QueryReport::new("photosynthesis");
        report.sources.push(SourceReport {
            source: "arXiv".to_string(),
            found: 2,
            tally: SourceTally {
                kept: 1,
                rejected: 1,
                failed: 0,
            },
        });

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["query"], "photosynthesis");
        assert_eq!(json["sources"][0]["source"], "arXiv");
        assert_eq!(json["sources"][0]["found"], 2);
        // Tally counts sit directly on the source object
        assert_eq!(json["sources"][0]["kept"], 1);
        assert_eq!(json["sources"][0]["rejected"], 1);
        assert_eq!(json["sources"][0]["failed"], 0);
    }

    #[test]
    fn stub_serializes_optional_url() {
        let with_url = PaperStub::new("Linked", Some("https://x.org/a.pdf".to_string()));
        let without_url = PaperStub::new("Linkless", None);

        assert_eq!(
            serde_json::to_value(&with_url).unwrap()["pdf_url"],
            "https://x.org/a.pdf"
        );
        assert!(serde_json::to_value(&without_url).unwrap()["pdf_url"].is_null());
    }

    #[test]
    fn report_totals_sum_across_sources() {
        let mut report = QueryReport::new("photosynthesis");
        report.sources.push(SourceReport {
            source: "arXiv".to_string(),
            found: 3,
            tally: SourceTally {
                kept: 2,
                rejected: 1,
                failed: 0,
            },
        });
        report.sources.push(SourceReport {
            source: "DOAJ".to_string(),
            found: 1,
            tally: SourceTally {
                kept: 0,
                rejected: 0,
                failed: 1,
            },
        });
        assert_eq!(
            report.total(),
            SourceTally {
                kept: 2,
                rejected: 1,
                failed: 1
            }
        );
    }
}
