use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use rostra_core::debate::ResearchDepth;
use rostra_core::errors::GatewayError;
use rostra_core::provider::ResearchProvider;
use rostra_core::research::{ResearchResponse, ResearchSource};

const DEFAULT_API_URL: &str = "https://api.tavily.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_RESULTS: u32 = 8;

#[derive(Clone)]
pub struct TavilyConfig {
    pub api_key: SecretString,
    pub base_url: String,
}

impl TavilyConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Tavily search client. The two depth tiers map straight onto the
/// service's `search_depth` parameter.
pub struct TavilyClient {
    client: Client,
    config: TavilyConfig,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    answer: String,
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct SearchResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    content: String,
}

impl TavilyClient {
    pub fn new(config: TavilyConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            config,
        }
    }
}

#[async_trait]
impl ResearchProvider for TavilyClient {
    #[instrument(skip(self, query), fields(depth = %depth))]
    async fn search(&self, query: &str, depth: ResearchDepth) -> Result<ResearchResponse, GatewayError> {
        let body = json!({
            "api_key": self.config.api_key.expose_secret(),
            "query": query,
            "search_depth": depth.to_string(),
            "include_answer": true,
            "max_results": MAX_RESULTS,
        });

        let response = self
            .client
            .post(format!("{}/search", self.config.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout(REQUEST_TIMEOUT)
                } else {
                    GatewayError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::from_status(status.as_u16(), body));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

        Ok(ResearchResponse {
            answer: parsed.answer,
            sources: parsed
                .results
                .into_iter()
                .map(|r| ResearchSource {
                    title: r.title,
                    url: r.url,
                    snippet: r.content,
                })
                .collect(),
        })
    }
}
