//! Optional web context lookup through the Tavily search API.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::config::ProviderConfig;
use crate::foundation::error::{RecapError, RecapResult};
use crate::providers::ContextSearch;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchResponse {
    pub(crate) answer: Option<String>,
    #[serde(default)]
    pub(crate) results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchHit {
    #[serde(default)]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) content: String,
}

/// Tavily-backed [`ContextSearch`]. Without a key every search returns empty text.
#[derive(Clone, Debug)]
pub struct TavilyClient {
    api_key: Option<String>,
    http: Client,
    base_url: String,
}

impl TavilyClient {
    /// Create a client; `api_key` may be absent.
    pub fn new(api_key: Option<String>, cfg: &ProviderConfig) -> RecapResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .map_err(|e| RecapError::provider(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            http,
            base_url: cfg.tavily_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn query(&self, api_key: &str, query: &str) -> RecapResult<SearchResponse> {
        let resp = self
            .http
            .post(format!("{}/search", self.base_url))
            .bearer_auth(api_key)
            .json(&json!({
                "api_key": api_key,
                "query": query,
                "search_depth": "basic",
                "include_answer": true,
                "max_results": 3,
                "topic": "general",
            }))
            .send()
            .map_err(|e| RecapError::provider(format!("tavily request failed: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(RecapError::provider(format!("tavily HTTP {status}: {}", body.trim())));
        }
        resp.json()
            .map_err(|e| RecapError::provider(format!("tavily response: {e}")))
    }
}

impl ContextSearch for TavilyClient {
    fn search(&self, query: &str) -> String {
        let Some(key) = self.api_key.as_deref() else {
            warn!("TAVILY_API_KEY not set; skipping web context");
            return String::new();
        };
        info!(%query, "searching web context");
        match self.query(key, query) {
            Ok(resp) => format_context(&resp),
            Err(e) => {
                warn!(error = %e, "web context search failed");
                String::new()
            }
        }
    }
}

/// Render the answer and hits as the plain-text block handed to the planner.
pub(crate) fn format_context(resp: &SearchResponse) -> String {
    let mut blocks = Vec::new();
    if let Some(answer) = resp.answer.as_deref().filter(|a| !a.trim().is_empty()) {
        blocks.push(format!("AI SUMMARY:\n{answer}"));
    }
    if !resp.results.is_empty() {
        blocks.push("\nWEB RESULTS:".to_string());
        blocks.extend(
            resp.results
                .iter()
                .map(|hit| format!("- {}: {}", hit.title, hit.content)),
        );
    }
    blocks.join("\n\n")
}

#[cfg(test)]
#[path = "../../tests/unit/providers/tavily.rs"]
mod tests;
