//! HTTP engine adapter for answer engines reachable over a probe API.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use aevis_core::{
    defaults, BrandContext, EngineAdapter, EngineAnswer, EngineId, Error, Keyword, Result,
};

/// Wire request for a probe call.
#[derive(Debug, Serialize)]
struct ProbeRequest<'a> {
    engine: &'a str,
    keyword: &'a str,
    brand_name: &'a str,
    domain: &'a str,
}

/// Wire response from a probe call.
#[derive(Debug, Deserialize)]
struct ProbeResponse {
    presence: bool,
    #[serde(default)]
    position: Option<i32>,
    #[serde(default)]
    answer_snippet: String,
    #[serde(default)]
    citations_count: i32,
    #[serde(default)]
    observed_urls: Vec<String>,
}

/// Answer engine adapter that delegates to an HTTP probe service.
pub struct HttpEngineAdapter {
    client: Client,
    base_url: String,
    id: EngineId,
    display_name: String,
    timeout_secs: u64,
}

impl HttpEngineAdapter {
    /// Create an adapter for the named engine against a probe service URL.
    pub fn new(engine: impl Into<String>, base_url: impl Into<String>) -> Self {
        let name = engine.into();
        let timeout_secs = std::env::var("AEVIS_PROBE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::ADAPTER_TIMEOUT_SECS);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        let base_url = base_url.into();
        info!("Initializing probe adapter: engine={}, url={}", name, base_url);

        Self {
            client,
            base_url,
            id: EngineId::new(name.clone()),
            display_name: name,
            timeout_secs,
        }
    }

    /// Create from environment variables (`AEVIS_PROBE_URL`).
    pub fn from_env(engine: impl Into<String>) -> Result<Self> {
        let base_url = std::env::var("AEVIS_PROBE_URL")
            .map_err(|_| Error::Config("AEVIS_PROBE_URL is not set".to_string()))?;
        Ok(Self::new(engine, base_url))
    }
}

#[async_trait]
impl EngineAdapter for HttpEngineAdapter {
    fn engine(&self) -> &EngineId {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    async fn check(&self, keyword: &Keyword, brand: &BrandContext) -> Result<EngineAnswer> {
        let start = Instant::now();
        let request = ProbeRequest {
            engine: self.id.as_str(),
            keyword: &keyword.text,
            brand_name: &brand.brand_name,
            domain: &brand.domain,
        };

        let response = self
            .client
            .post(format!("{}/probe", self.base_url))
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::EngineAdapter(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(
                engine = %self.id,
                status = %status,
                "Probe service returned an error"
            );
            return Err(Error::EngineAdapter(format!(
                "Probe service returned {}: {}",
                status, body
            )));
        }

        let result: ProbeResponse = response
            .json()
            .await
            .map_err(|e| Error::EngineAdapter(format!("Failed to parse response: {}", e)))?;

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            engine = %self.id,
            presence = result.presence,
            duration_ms = elapsed,
            "Probe completed"
        );

        let answer = EngineAnswer {
            presence: result.presence,
            position: if result.presence { result.position } else { None },
            answer_snippet: result.answer_snippet,
            citations_count: if result.presence {
                result.citations_count.max(0)
            } else {
                0
            },
            observed_urls: if result.presence {
                result.observed_urls
            } else {
                Vec::new()
            },
        };
        Ok(answer)
    }
}
