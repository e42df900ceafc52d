use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Result, TrawlError};
use crate::http::PoliteClient;
use crate::sources::SourceAdapter;
use crate::types::PaperStub;

const DEFAULT_BASE_URL: &str = "https://api.plos.org";

/// PLOS Solr search adapter. Single request against the title/abstract
/// fields; each returned article id maps to the journal's "printable"
/// download URL.
pub struct PlosSource {
    client: PoliteClient,
    base_url: String,
    default_cap: usize,
}

impl PlosSource {
    pub fn new(default_cap: usize) -> Self {
        Self::with_params(DEFAULT_BASE_URL, Duration::from_secs(1), default_cap)
    }

    pub fn with_params(base_url: &str, min_interval: Duration, default_cap: usize) -> Self {
        Self {
            client: PoliteClient::new(min_interval, Duration::from_secs(30), "papertrawl/0.1"),
            base_url: base_url.to_string(),
            default_cap,
        }
    }

    async fn try_search(&self, query: &str, cap: usize) -> Result<Vec<PaperStub>> {
        let q = format!(r#"title:"{query}" OR abstract:"{query}""#);
        let url = format!(
            "{}/search?q={}&fl=id,title&rows={}&wt=json",
            self.base_url,
            urlencoding::encode(&q),
            cap
        );
        let body = self.client.get(&url).await?;
        let parsed: PlosResponse =
            serde_json::from_str(&body).map_err(|e| TrawlError::Parse(e.to_string()))?;

        let mut papers: Vec<PaperStub> = parsed
            .response
            .docs
            .into_iter()
            .filter_map(|doc| {
                let id = doc.id?;
                Some(PaperStub {
                    title: doc.title.unwrap_or_else(|| "Unknown Title".to_string()),
                    pdf_url: Some(format!(
                        "https://journals.plos.org/plosone/article/file?id={id}&type=printable"
                    )),
                })
            })
            .collect();
        // rows is a request, not a promise
        papers.truncate(cap);
        Ok(papers)
    }
}

#[async_trait]
impl SourceAdapter for PlosSource {
    fn name(&self) -> &'static str {
        "PLOS"
    }

    async fn search(&self, query: &str, max_results: Option<usize>) -> Vec<PaperStub> {
        let cap = max_results.unwrap_or(self.default_cap);
        match self.try_search(query, cap).await {
            Ok(papers) => papers,
            Err(e) => {
                tracing::warn!(source = "PLOS", error = %e, "search failed");
                Vec::new()
            }
        }
    }
}

// ─── Response shapes ───────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PlosResponse {
    #[serde(default)]
    response: PlosDocList,
}

#[derive(Debug, Default, Deserialize)]
struct PlosDocList {
    #[serde(default)]
    docs: Vec<PlosDoc>,
}

#[derive(Debug, Deserialize)]
struct PlosDoc {
    id: Option<String>,
    title: Option<String>,
}
