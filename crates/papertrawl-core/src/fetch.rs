use std::path::Path;
use std::time::Duration;

use reqwest::header::HeaderMap;

use crate::http::PoliteClient;
use crate::types::DownloadOutcome;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Downloads one PDF to a destination path. Failures are an outcome, not an
/// error: callers route `Failed` into their own bookkeeping.
pub struct Fetcher {
    client: PoliteClient,
}

impl Fetcher {
    pub fn new() -> Self {
        Self::with_timeout(DOWNLOAD_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: PoliteClient::new(Duration::ZERO, timeout, "papertrawl/0.1"),
        }
    }

    /// Buffers the whole body before touching `dest`, so a failed or
    /// interrupted download never leaves a partial or zero-byte file behind.
    pub async fn fetch(&self, url: &str, dest: &Path, headers: HeaderMap) -> DownloadOutcome {
        let bytes = match self.client.get_bytes_with_headers(url, headers).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(url, error = %e, "download failed");
                return DownloadOutcome::Failed;
            }
        };

        match tokio::fs::write(dest, &bytes).await {
            Ok(()) => DownloadOutcome::Downloaded(dest.to_path_buf()),
            Err(e) => {
                tracing::warn!(url, path = %dest.display(), error = %e, "failed to write download");
                DownloadOutcome::Failed
            }
        }
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fetch_writes_body_to_dest() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/paper.pdf")
            .with_status(200)
            .with_body(b"%PDF-1.4 pretend body".as_slice())
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("paper.pdf");

        let fetcher = Fetcher::new();
        let outcome = fetcher
            .fetch(&format!("{}/paper.pdf", server.url()), &dest, HeaderMap::new())
            .await;

        assert!(outcome.is_downloaded());
        assert_eq!(std::fs::read(&dest).unwrap(), b"%PDF-1.4 pretend body");
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_no_file() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/paper.pdf")
            .with_status(403)
            .with_body("forbidden")
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("paper.pdf");

        let fetcher = Fetcher::new();
        let outcome = fetcher
            .fetch(&format!("{}/paper.pdf", server.url()), &dest, HeaderMap::new())
            .await;

        assert!(!outcome.is_downloaded());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_fetch_sends_caller_headers() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/paper.pdf")
            .match_header("user-agent", "Mozilla/5.0 (test)")
            .with_status(200)
            .with_body(b"ok".as_slice())
            .expect(1)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("paper.pdf");

        let mut headers = HeaderMap::new();
        headers.insert("user-agent", "Mozilla/5.0 (test)".parse().unwrap());

        let fetcher = Fetcher::new();
        fetcher
            .fetch(&format!("{}/paper.pdf", server.url()), &dest, headers)
            .await;

        m.assert_async().await;
    }
}
