use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::HeaderMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::time::sleep;

use crate::error::{Result, TrawlError};

/// Thin wrapper over [`reqwest::Client`] that spaces successive requests by a
/// minimum interval; upstream search APIs rate-ban clients that hammer their
/// paging endpoints.
///
/// No retry loop: a failed request surfaces as an error immediately and the
/// caller decides what degrading looks like.
pub struct PoliteClient {
    client: reqwest::Client,
    min_interval: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl PoliteClient {
    pub fn new(min_interval: Duration, timeout: Duration, user_agent: &str) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .gzip(true)
            .build()
            .expect("failed to build reqwest client");
        Self {
            client,
            min_interval,
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    async fn pace(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(t) = *last {
            let elapsed = t.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    pub async fn get(&self, url: &str) -> Result<String> {
        self.pace().await;
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(TrawlError::Api(
                url.to_string(),
                format!("HTTP {status}: {body}"),
            ));
        }
        resp.text().await.map_err(TrawlError::Http)
    }

    /// Fetch a URL as raw bytes. The full body is buffered before returning,
    /// so an error never hands the caller a partial payload.
    pub async fn get_bytes_with_headers(&self, url: &str, headers: HeaderMap) -> Result<Vec<u8>> {
        self.pace().await;
        let resp = self.client.get(url).headers(headers).send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            return Err(TrawlError::Api(
                url.to_string(),
                format!("HTTP {status}"),
            ));
        }
        Ok(resp.bytes().await.map_err(TrawlError::Http)?.to_vec())
    }

    pub async fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<R> {
        self.pace().await;
        let resp = self.client.post(url).json(body).send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let msg = resp.text().await.unwrap_or_default();
            return Err(TrawlError::Api(
                url.to_string(),
                format!("HTTP {status}: {msg}"),
            ));
        }
        let text = resp.text().await.map_err(TrawlError::Http)?;
        serde_json::from_str(&text).map_err(|e| TrawlError::Parse(e.to_string()))
    }
}
