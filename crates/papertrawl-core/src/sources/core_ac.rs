use async_trait::async_trait;

use crate::sources::SourceAdapter;
use crate::types::PaperStub;

/// CORE aggregator adapter. The public API requires a registered key and
/// keyless requests return nothing useful, so this backend stays inert until
/// a key is configured. It still participates in the source registry so
/// per-source reporting covers it.
pub struct CoreSource {
    api_key: Option<String>,
}

impl CoreSource {
    pub fn new(api_key: Option<String>) -> Self {
        Self { api_key }
    }
}

#[async_trait]
impl SourceAdapter for CoreSource {
    fn name(&self) -> &'static str {
        "CORE"
    }

    async fn search(&self, _query: &str, _max_results: Option<usize>) -> Vec<PaperStub> {
        match self.api_key.as_deref() {
            None | Some("") => {
                tracing::debug!(source = "CORE", "no api key configured, skipping search");
            }
            Some(_) => {
                tracing::warn!(
                    source = "CORE",
                    "keyed search is not wired up yet, returning no results"
                );
            }
        }
        Vec::new()
    }
}
