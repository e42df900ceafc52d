use async_trait::async_trait;

use crate::config::SourcesConfig;
use crate::types::PaperStub;

/// One search backend. An adapter translates a free-text query into the
/// backend's native paging protocol and yields normalized stubs in the
/// backend's result order.
///
/// `search` never fails: transport and parse errors are caught inside the
/// adapter, logged, and degrade to whatever stubs were already collected
/// (empty when the first page fails).
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Display name, also used as the filename prefix for this backend.
    fn name(&self) -> &'static str;

    /// `max_results: None` selects the backend's own default cap.
    async fn search(&self, query: &str, max_results: Option<usize>) -> Vec<PaperStub>;
}

/// The five backends in pipeline order.
pub fn default_sources(cfg: &SourcesConfig) -> Vec<Box<dyn SourceAdapter>> {
    vec![
        Box::new(arxiv::ArxivSource::new(cfg.arxiv_max_results)),
        Box::new(doaj::DoajSource::new()),
        Box::new(pmc::PmcSource::new(cfg.pmc_max_results)),
        Box::new(plos::PlosSource::new(cfg.plos_max_results)),
        Box::new(core_ac::CoreSource::new(cfg.core_api_key.clone())),
    ]
}

pub mod arxiv;
pub mod doaj;
pub mod pmc;
pub mod plos;
pub mod core_ac;

pub use arxiv::ArxivSource;
pub use core_ac::CoreSource;
pub use doaj::DoajSource;
pub use plos::PlosSource;
pub use pmc::PmcSource;
