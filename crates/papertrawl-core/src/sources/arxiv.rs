use std::time::Duration;

use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::error::{Result, TrawlError};
use crate::http::PoliteClient;
use crate::sources::SourceAdapter;
use crate::types::PaperStub;

const DEFAULT_BASE_URL: &str = "http://export.arxiv.org/api/query";
const BATCH_SIZE: usize = 100;

/// arXiv Atom API adapter. Pages through `search_query=all:<query>` in
/// batches of 100 until the cap is reached or the feed runs dry.
pub struct ArxivSource {
    client: PoliteClient,
    base_url: String,
    default_cap: usize,
}

impl ArxivSource {
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

    async fn fetch_page(&self, encoded_query: &str, start: usize, batch: usize) -> Result<Vec<PaperStub>> {
        let url = format!(
            "{}?search_query=all:{}&start={}&max_results={}",
            self.base_url, encoded_query, start, batch
        );
        let xml = self.client.get(&url).await?;
        parse_atom_page(&xml)
    }
}

#[async_trait]
impl SourceAdapter for ArxivSource {
    fn name(&self) -> &'static str {
        "arXiv"
    }

    async fn search(&self, query: &str, max_results: Option<usize>) -> Vec<PaperStub> {
        let cap = max_results.unwrap_or(self.default_cap);
        // arXiv expects `+` between query terms
        let encoded = urlencoding::encode(query).replace("%20", "+");

        let mut papers: Vec<PaperStub> = Vec::new();
        let mut start = 0;

        while papers.len() < cap {
            let batch = BATCH_SIZE.min(cap - papers.len());
            let page = match self.fetch_page(&encoded, start, batch).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(source = "arXiv", error = %e, "search page failed");
                    break;
                }
            };
            if page.is_empty() {
                break;
            }

            let got = page.len();
            papers.extend(page);
            start += batch;

            // A short page means the feed is exhausted
            if got < batch {
                break;
            }
        }

        papers.truncate(cap);
        papers
    }
}

// ─── Atom parsing ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: String,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@type")]
    link_type: Option<String>,
}

fn parse_atom_page(xml: &str) -> Result<Vec<PaperStub>> {
    let feed: AtomFeed =
        from_str(xml).map_err(|e| TrawlError::Parse(format!("invalid atom xml: {e}")))?;

    Ok(feed
        .entries
        .into_iter()
        .map(|entry| {
            let pdf_url = entry
                .links
                .iter()
                .find(|link| link.link_type.as_deref() == Some("application/pdf"))
                .and_then(|link| link.href.clone());

            PaperStub {
                title: clean_text(&entry.title),
                pdf_url,
            }
        })
        .collect())
}

fn clean_text(input: &str) -> String {
    input
        .split_whitespace()
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
