use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};

use crate::config::Config;
use crate::error::Result;
use crate::excerpt::excerpt_from_path;
use crate::fetch::Fetcher;
use crate::judge::RelevanceJudge;
use crate::ledger::{RejectionLedger, RejectionRecord};
use crate::sanitize::sanitize_filename;
use crate::sources::{SourceAdapter, default_sources};
use crate::types::{
    Disposition, DownloadOutcome, PaperStub, QueryReport, SourceReport, SourceTally,
};

// Some publishers refuse non-browser user agents
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Timing and filesystem layout for one pipeline instance.
pub struct PipelineOptions {
    pub download_dir: PathBuf,
    pub rejection_dir: PathBuf,
    pub candidate_pause: Duration,
    pub source_pause: Duration,
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            download_dir: config.download_dir(),
            rejection_dir: config.rejection_dir(),
            candidate_pause: Duration::from_secs(config.pipeline.candidate_pause_secs),
            source_pause: Duration::from_secs(config.pipeline.source_pause_secs),
        }
    }
}

/// Drives one query through every source backend: search, download, excerpt,
/// relevance check, and the final keep/reject bookkeeping.
///
/// Candidates are processed strictly one at a time. The deliberate pauses
/// between candidates and between sources keep the request rate polite
/// toward both the backends and the judge endpoint.
pub struct Pipeline {
    sources: Vec<Box<dyn SourceAdapter>>,
    fetcher: Fetcher,
    judge: RelevanceJudge,
    options: PipelineOptions,
}

/// How one candidate left the per-candidate state machine.
enum CandidateOutcome {
    /// No PDF URL; never counted, no pause owed.
    Skipped,
    /// Target file already on disk; counted as kept, no network touched,
    /// no pause owed.
    AlreadyPresent,
    /// Network work happened; counted, and a politeness pause is owed.
    Settled(Disposition),
}

impl Pipeline {
    pub fn new(config: &Config) -> Self {
        Self::with_components(
            default_sources(&config.sources),
            Fetcher::new(),
            RelevanceJudge::new(&config.judge),
            PipelineOptions::from_config(config),
        )
    }

    pub fn with_components(
        sources: Vec<Box<dyn SourceAdapter>>,
        fetcher: Fetcher,
        judge: RelevanceJudge,
        options: PipelineOptions,
    ) -> Self {
        Self {
            sources,
            fetcher,
            judge,
            options,
        }
    }

    /// Runs the full pass for one query. The only fatal condition is a
    /// storage directory that cannot be created; every per-candidate and
    /// per-source failure is absorbed into the report and the ledger.
    pub async fn run_query(&self, query: &str) -> Result<QueryReport> {
        let safe_query = sanitize_filename(query);
        let query_folder = self.options.download_dir.join(&safe_query);
        std::fs::create_dir_all(&query_folder)?;
        std::fs::create_dir_all(&self.options.rejection_dir)?;

        let ledger = RejectionLedger::new(
            self.options
                .rejection_dir
                .join(format!("rejections_{safe_query}.txt")),
        );

        tracing::info!(query, "starting pipeline pass");

        let mut report = QueryReport::new(query);
        for (idx, source) in self.sources.iter().enumerate() {
            let stubs = source.search(query, None).await;
            tracing::info!(source = source.name(), found = stubs.len(), "search complete");

            let mut tally = SourceTally::default();
            for (i, stub) in stubs.iter().enumerate() {
                let outcome = self
                    .process_candidate(query, &query_folder, &ledger, source.name(), i + 1, stub)
                    .await;
                match outcome {
                    CandidateOutcome::Skipped => {}
                    CandidateOutcome::AlreadyPresent => tally.record(Disposition::Kept),
                    CandidateOutcome::Settled(disposition) => {
                        tally.record(disposition);
                        tokio::time::sleep(self.options.candidate_pause).await;
                    }
                }
            }

            tracing::info!(
                source = source.name(),
                kept = tally.kept,
                rejected = tally.rejected,
                failed = tally.failed,
                "source pass complete"
            );
            report.sources.push(SourceReport {
                source: source.name().to_string(),
                found: stubs.len(),
                tally,
            });

            if idx + 1 < self.sources.len() {
                tokio::time::sleep(self.options.source_pause).await;
            }
        }

        let total = report.total();
        tracing::info!(
            query,
            kept = total.kept,
            rejected = total.rejected,
            failed = total.failed,
            "pipeline pass complete"
        );
        Ok(report)
    }

    async fn process_candidate(
        &self,
        query: &str,
        query_folder: &Path,
        ledger: &RejectionLedger,
        source_name: &str,
        rank: usize,
        stub: &PaperStub,
    ) -> CandidateOutcome {
        let Some(pdf_url) = stub.pdf_url.as_deref() else {
            return CandidateOutcome::Skipped;
        };

        let filename = format!("{}_{}_{}.pdf", source_name, rank, sanitize_filename(&stub.title));
        let filepath = query_folder.join(&filename);

        if filepath.exists() {
            tracing::info!(file = %filename, "already downloaded");
            return CandidateOutcome::AlreadyPresent;
        }

        tracing::info!(title = %stub.title, url = pdf_url, "downloading candidate");
        let headers = browser_headers();
        let mut outcome = self.fetcher.fetch(pdf_url, &filepath, headers.clone()).await;

        // The one sanctioned retry: arXiv hands out abstract-page and
        // extensionless links whose PDF lives at the /pdf/ path.
        if !outcome.is_downloaded()
            && let Some(fallback) = arxiv_pdf_fallback(pdf_url)
        {
            tracing::info!(url = %fallback, "retrying with arXiv PDF path");
            outcome = self.fetcher.fetch(&fallback, &filepath, headers).await;
        }

        let path = match outcome {
            DownloadOutcome::Downloaded(path) => path,
            DownloadOutcome::Failed => {
                tracing::info!(title = %stub.title, "download failed");
                log_rejection(ledger, &filename, query, pdf_url, "Download failed");
                return CandidateOutcome::Settled(Disposition::RejectedDownloadFailed);
            }
        };

        let excerpt = excerpt_from_path(&path);
        if excerpt.is_empty() {
            tracing::info!(file = %filename, "kept, no extractable text to judge");
            return CandidateOutcome::Settled(Disposition::Kept);
        }

        if self.judge.judge(query, &stub.title, &excerpt).await {
            tracing::info!(file = %filename, "kept, judged relevant");
            CandidateOutcome::Settled(Disposition::Kept)
        } else {
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::warn!(file = %filename, error = %e, "could not delete rejected file");
            }
            log_rejection(ledger, &filename, query, pdf_url, "Not relevant to query");
            tracing::info!(file = %filename, "rejected, judged not relevant");
            CandidateOutcome::Settled(Disposition::RejectedIrrelevant)
        }
    }
}

fn log_rejection(ledger: &RejectionLedger, filename: &str, query: &str, url: &str, reason: &str) {
    let record = RejectionRecord {
        filename: filename.to_string(),
        query: query.to_string(),
        source_url: url.to_string(),
        reason: reason.to_string(),
    };
    if let Err(e) = ledger.append(&record) {
        tracing::warn!(
            path = %ledger.path().display(),
            error = %e,
            "could not write rejection record"
        );
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers
}

/// arXiv Atom feeds hand out `/abs/` page links and extensionless PDF links;
/// the downloadable file lives under `/pdf/` with a `.pdf` suffix.
fn arxiv_pdf_fallback(url: &str) -> Option<String> {
    if url.contains("arxiv.org") && !url.ends_with(".pdf") {
        Some(format!("{}.pdf", url.replace("/abs/", "/pdf/")))
    } else {
        None
    }
}
