use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::JudgeConfig;
use crate::error::{Result, TrawlError};
use crate::http::PoliteClient;

// Inference latency dwarfs ordinary HTTP latency
const JUDGE_TIMEOUT: Duration = Duration::from_secs(120);
const EXCERPT_PROMPT_CHARS: usize = 2000;

/// Client for the external relevance classifier (an Ollama-compatible
/// `/api/generate` endpoint). Asks for a bare YES/NO and exact-matches the
/// answer token.
pub struct RelevanceJudge {
    client: PoliteClient,
    base_url: String,
    model: String,
}

impl RelevanceJudge {
    pub fn new(cfg: &JudgeConfig) -> Self {
        Self::with_params(&cfg.base_url, &cfg.model, JUDGE_TIMEOUT)
    }

    pub fn with_params(base_url: &str, model: &str, timeout: Duration) -> Self {
        Self {
            client: PoliteClient::new(Duration::ZERO, timeout, "papertrawl/0.1"),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// `true` iff the classifier answered YES. Everything else, including an
    /// unreachable or misbehaving endpoint, is `false`; papers are never
    /// kept on the strength of a failed check.
    pub async fn judge(&self, query: &str, title: &str, excerpt: &str) -> bool {
        match self.try_judge(query, title, excerpt).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!(error = %e, "relevance check failed, treating as not relevant");
                false
            }
        }
    }

    async fn try_judge(&self, query: &str, title: &str, excerpt: &str) -> Result<bool> {
        let prompt = build_prompt(query, title, excerpt);
        let request = GenerateRequest {
            model: &self.model,
            prompt: &prompt,
            stream: false,
        };

        let url = format!("{}/api/generate", self.base_url);
        let response: GenerateResponse = match self.client.post_json(&url, &request).await {
            Ok(response) => response,
            // Unreachable and erroring endpoints both mean the classifier is
            // unavailable; only a malformed answer body stays a parse error
            Err(TrawlError::Http(e)) => return Err(TrawlError::JudgeUnavailable(e.to_string())),
            Err(TrawlError::Api(_, detail)) => return Err(TrawlError::JudgeUnavailable(detail)),
            Err(e) => return Err(e),
        };

        Ok(response.response.trim().eq_ignore_ascii_case("YES"))
    }
}

fn build_prompt(query: &str, title: &str, excerpt: &str) -> String {
    let excerpt_head: String = excerpt.chars().take(EXCERPT_PROMPT_CHARS).collect();
    format!(
        "Query: {query}\n\
         Paper Title: {title}\n\
         Paper Content (excerpt): {excerpt_head}...\n\
         \n\
         Based on the query and the paper title and content, is this paper relevant to the query?\n\
         Answer ONLY with \"YES\" if relevant or \"NO\" if not relevant."
    )
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn test_judge(server: &Server) -> RelevanceJudge {
        RelevanceJudge::with_params(&server.url(), "qwen3:8b", Duration::from_secs(5))
    }

    #[test]
    fn test_prompt_contains_inputs_and_truncates_excerpt() {
        let excerpt = "z".repeat(3000);
        let prompt = build_prompt("rocket injectors", "Coaxial Swirl Study", &excerpt);

        assert!(prompt.contains("Query: rocket injectors"));
        assert!(prompt.contains("Paper Title: Coaxial Swirl Study"));
        assert!(prompt.contains(&format!("{}...", "z".repeat(2000))));
        assert!(!prompt.contains(&"z".repeat(2001)));
        assert!(prompt.contains("Answer ONLY with \"YES\""));
    }

    #[tokio::test]
    async fn test_judge_yes_answer() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/api/generate")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "qwen3:8b",
                "stream": false
            })))
            .with_status(200)
            .with_body(r#"{"model": "qwen3:8b", "response": "YES", "done": true}"#)
            .expect(1)
            .create_async()
            .await;

        let judge = test_judge(&server);
        assert!(judge.judge("q", "t", "some excerpt").await);
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_judge_no_answer() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_body(r#"{"response": "NO"}"#)
            .create_async()
            .await;

        let judge = test_judge(&server);
        assert!(!judge.judge("q", "t", "e").await);
    }

    #[tokio::test]
    async fn test_judge_trims_and_ignores_case() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_body(r#"{"response": "  yes\n"}"#)
            .create_async()
            .await;

        let judge = test_judge(&server);
        assert!(judge.judge("q", "t", "e").await);
    }

    #[tokio::test]
    async fn test_judge_rejects_non_token_answers() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_body(r#"{"response": "Yes, this paper is clearly relevant."}"#)
            .create_async()
            .await;

        let judge = test_judge(&server);
        assert!(!judge.judge("q", "t", "e").await);
    }

    #[tokio::test]
    async fn test_judge_fails_closed_on_server_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/api/generate")
            .with_status(500)
            .with_body("model exploded")
            .create_async()
            .await;

        let judge = test_judge(&server);
        assert!(!judge.judge("q", "t", "e").await);
    }

    #[tokio::test]
    async fn test_judge_fails_closed_on_malformed_body() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_body("not json at all")
            .create_async()
            .await;

        let judge = test_judge(&server);
        assert!(!judge.judge("q", "t", "e").await);
    }

    #[tokio::test]
    async fn test_judge_fails_closed_when_unreachable() {
        // Nothing is listening on this port
        let judge =
            RelevanceJudge::with_params("http://127.0.0.1:1", "qwen3:8b", Duration::from_secs(1));
        assert!(!judge.judge("q", "t", "e").await);
    }

    #[tokio::test]
    async fn test_error_status_maps_to_judge_unavailable() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/api/generate")
            .with_status(503)
            .with_body("loading model")
            .create_async()
            .await;

        let judge = test_judge(&server);
        let err = judge.try_judge("q", "t", "e").await.unwrap_err();
        assert!(matches!(err, TrawlError::JudgeUnavailable(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_maps_to_judge_unavailable() {
        let judge =
            RelevanceJudge::with_params("http://127.0.0.1:1", "qwen3:8b", Duration::from_secs(1));
        let err = judge.try_judge("q", "t", "e").await.unwrap_err();
        assert!(matches!(err, TrawlError::JudgeUnavailable(_)));
    }
}
