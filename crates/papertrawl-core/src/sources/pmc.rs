use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Result, TrawlError};
use crate::http::PoliteClient;
use crate::sources::SourceAdapter;
use crate::types::PaperStub;

const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// PubMed Central adapter. Two-step E-utilities flow: `esearch` for the uid
/// list, then `esummary` for titles and PMC identifiers. Articles without a
/// `pmcid` have no canonical PDF path and are skipped.
pub struct PmcSource {
    client: PoliteClient,
    base_url: String,
    default_cap: usize,
}

impl PmcSource {
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
        let search_url = format!(
            "{}/esearch.fcgi?db=pmc&term={}&retmax={}&format=json",
            self.base_url,
            urlencoding::encode(query),
            cap
        );
        let body = self.client.get(&search_url).await?;
        let search: EsearchResponse =
            serde_json::from_str(&body).map_err(|e| TrawlError::Parse(e.to_string()))?;

        let id_list = search.esearchresult.idlist;
        if id_list.is_empty() {
            return Ok(Vec::new());
        }

        let ids = id_list
            .iter()
            .take(cap)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let summary_url = format!(
            "{}/esummary.fcgi?db=pmc&id={}&retmode=json",
            self.base_url,
            urlencoding::encode(&ids)
        );
        let body = self.client.get(&summary_url).await?;
        let summary: EsummaryResponse =
            serde_json::from_str(&body).map_err(|e| TrawlError::Parse(e.to_string()))?;

        let result = summary.result.unwrap_or_default();
        let mut papers = Vec::new();
        for uid in &result.uids {
            let Some(doc) = result.docs.get(uid) else {
                continue;
            };
            let Some(pmcid) = doc.pmcid.as_deref() else {
                continue;
            };
            papers.push(PaperStub {
                title: doc
                    .title
                    .clone()
                    .unwrap_or_else(|| "Unknown Title".to_string()),
                pdf_url: Some(format!(
                    "https://www.ncbi.nlm.nih.gov/pmc/articles/{pmcid}/pdf/"
                )),
            });
        }
        // The summary endpoint may echo more uids than were asked for
        papers.truncate(cap);
        Ok(papers)
    }
}

#[async_trait]
impl SourceAdapter for PmcSource {
    fn name(&self) -> &'static str {
        "PMC"
    }

    async fn search(&self, query: &str, max_results: Option<usize>) -> Vec<PaperStub> {
        let cap = max_results.unwrap_or(self.default_cap);
        match self.try_search(query, cap).await {
            Ok(papers) => papers,
            Err(e) => {
                tracing::warn!(source = "PMC", error = %e, "search failed");
                Vec::new()
            }
        }
    }
}

// ─── Response shapes ───────────────────────────────────────

#[derive(Debug, Deserialize)]
struct EsearchResponse {
    #[serde(default)]
    esearchresult: EsearchResult,
}

#[derive(Debug, Default, Deserialize)]
struct EsearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EsummaryResponse {
    result: Option<EsummaryResult>,
}

#[derive(Debug, Default, Deserialize)]
struct EsummaryResult {
    #[serde(default)]
    uids: Vec<String>,
    #[serde(flatten)]
    docs: HashMap<String, PmcDocSummary>,
}

#[derive(Debug, Deserialize)]
struct PmcDocSummary {
    title: Option<String>,
    pmcid: Option<String>,
}
