//! Papertrawl — multi-source academic paper retrieval with relevance filtering.
//!
//! One query fans out to several open-access search backends; every candidate
//! PDF is downloaded, sampled, and checked against the query by an external
//! classifier before it is allowed to stay on disk.

pub mod error;
pub mod http;
pub mod config;
pub mod types;
pub mod sanitize;
pub mod sources;
pub mod fetch;
pub mod excerpt;
pub mod judge;
pub mod ledger;
pub mod pipeline;

pub use config::Config;
pub use error::{Result, TrawlError};
pub use fetch::Fetcher;
pub use judge::RelevanceJudge;
pub use ledger::{RejectionLedger, RejectionRecord};
pub use pipeline::{Pipeline, PipelineOptions};
pub use sources::{SourceAdapter, default_sources};
pub use types::{Disposition, DownloadOutcome, PaperStub, QueryReport, SourceReport, SourceTally};
