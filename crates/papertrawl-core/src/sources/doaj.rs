use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Result, TrawlError};
use crate::http::PoliteClient;
use crate::sources::SourceAdapter;
use crate::types::PaperStub;

const DEFAULT_BASE_URL: &str = "https://doaj.org";
const PAGE_SIZE: usize = 100;
// Guards against a backend that keeps returning full pages
const MAX_PAGES: usize = 50;

/// Directory of Open Access Journals adapter. Walks the article search
/// endpoint page by page until the result set is exhausted, emitting only
/// articles that carry a full-text PDF link.
pub struct DoajSource {
    client: PoliteClient,
    base_url: String,
}

impl DoajSource {
    pub fn new() -> Self {
        Self::with_params(DEFAULT_BASE_URL, Duration::from_secs(1))
    }

    pub fn with_params(base_url: &str, min_interval: Duration) -> Self {
        Self {
            client: PoliteClient::new(min_interval, Duration::from_secs(30), "papertrawl/0.1"),
            base_url: base_url.to_string(),
        }
    }

    async fn fetch_page(&self, encoded_query: &str, page: usize) -> Result<Vec<DoajArticle>> {
        let url = format!(
            "{}/api/search/articles/{}?pageSize={}&page={}",
            self.base_url, encoded_query, PAGE_SIZE, page
        );
        let body = self.client.get(&url).await?;
        let parsed: DoajPage =
            serde_json::from_str(&body).map_err(|e| TrawlError::Parse(e.to_string()))?;
        Ok(parsed.results)
    }
}

impl Default for DoajSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for DoajSource {
    fn name(&self) -> &'static str {
        "DOAJ"
    }

    async fn search(&self, query: &str, max_results: Option<usize>) -> Vec<PaperStub> {
        let encoded = urlencoding::encode(query).into_owned();

        let mut papers: Vec<PaperStub> = Vec::new();
        let mut page = 1;

        loop {
            let results = match self.fetch_page(&encoded, page).await {
                Ok(results) => results,
                Err(e) => {
                    tracing::warn!(source = "DOAJ", error = %e, "search page failed");
                    break;
                }
            };
            if results.is_empty() {
                break;
            }

            // End-of-results check is on the raw page, not on how many
            // articles actually had a PDF link
            let got = results.len();
            for article in results {
                if let Some(stub) = article.into_stub() {
                    papers.push(stub);
                }
            }

            if max_results.is_some_and(|cap| papers.len() >= cap) {
                break;
            }
            if got < PAGE_SIZE {
                break;
            }
            page += 1;
            if page > MAX_PAGES {
                break;
            }
        }

        if let Some(cap) = max_results {
            papers.truncate(cap);
        }
        papers
    }
}

// ─── Response shapes ───────────────────────────────────────

#[derive(Debug, Deserialize)]
struct DoajPage {
    #[serde(default)]
    results: Vec<DoajArticle>,
}

#[derive(Debug, Deserialize)]
struct DoajArticle {
    #[serde(default)]
    bibjson: DoajBibjson,
}

#[derive(Debug, Default, Deserialize)]
struct DoajBibjson {
    title: Option<String>,
    #[serde(rename = "link", default)]
    links: Vec<DoajLink>,
}

#[derive(Debug, Deserialize)]
struct DoajLink {
    #[serde(rename = "type")]
    link_type: Option<String>,
    url: Option<String>,
}

impl DoajArticle {
    /// First full-text link ending in `.pdf`, or no stub at all.
    fn into_stub(self) -> Option<PaperStub> {
        let pdf_url = self.bibjson.links.into_iter().find_map(|link| {
            let is_fulltext = link.link_type.as_deref() == Some("fulltext");
            match link.url {
                Some(url) if is_fulltext && url.ends_with(".pdf") => Some(url),
                _ => None,
            }
        })?;

        Some(PaperStub {
            title: self
                .bibjson
                .title
                .unwrap_or_else(|| "Unknown Title".to_string()),
            pdf_url: Some(pdf_url),
        })
    }
}
