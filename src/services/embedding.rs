//! Client for the embedding server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::EmbeddingError;
use crate::models::EmbeddingConfig;

/// Maps text to a fixed-length vector.
///
/// The production implementation talks to an embedding server over HTTP;
/// tests substitute an in-memory fake.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn health_check(&self) -> Result<(), EmbeddingError>;
    async fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Request body for the /embed endpoint.
#[derive(Debug, Serialize)]
struct EmbedRequest {
    inputs: Vec<String>,
}

/// Response from the /embed endpoint.
#[derive(Debug, Deserialize)]
struct EmbedResponse(Vec<Vec<f32>>);

/// Health response from the /health endpoint.
#[derive(Debug, Deserialize)]
struct HealthResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    model_id: Option<String>,
}

/// HTTP client for the embedding server. Constructed once at startup and
/// held by the worker for the process lifetime.
#[derive(Debug, Clone)]
pub struct HttpEmbeddingClient {
    client: Client,
    base_url: String,
    dimension: usize,
}

impl HttpEmbeddingClient {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            dimension: config.dimension as usize,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Embedder for HttpEmbeddingClient {
    async fn health_check(&self) -> Result<(), EmbeddingError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EmbeddingError::ServerError(format!(
                "health check failed with status {}",
                response.status()
            )));
        }

        // The server may answer with an empty body; any 2xx counts as
        // healthy, the parsed details are log-only.
        let text = response.text().await.unwrap_or_default();
        if !text.is_empty()
            && let Ok(health) = serde_json::from_str::<HealthResponse>(&text)
            && let Some(model_id) = health.model_id
        {
            tracing::info!(
                model_id,
                status = health.status.as_deref().unwrap_or("ok"),
                "embedding server ready"
            );
        }

        Ok(())
    }

    async fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{}/embed", self.base_url);
        let request = EmbedRequest {
            inputs: vec![text.to_string()],
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout
                } else {
                    EmbeddingError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ServerError(format!(
                "status {}: {}",
                status, body
            )));
        }

        let EmbedResponse(embeddings) = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        let embedding = embeddings.into_iter().next().ok_or_else(|| {
            EmbeddingError::InvalidResponse("empty embedding response".to_string())
        })?;

        if embedding.len() != self.dimension {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} dimensions, got {}",
                self.dimension,
                embedding.len()
            )));
        }

        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let config = EmbeddingConfig::default();
        assert!(HttpEmbeddingClient::new(&config).is_ok());
    }

    #[test]
    fn base_url_trimming() {
        let config = EmbeddingConfig {
            url: "http://localhost:11411/".to_string(),
            ..Default::default()
        };
        let client = HttpEmbeddingClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:11411");
    }
}
