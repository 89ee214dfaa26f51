//! Embedding vectors and cosine similarity.
//!
//! The indexer talks to an external embedding provider over HTTP. Two
//! request shapes are supported: a local-model style endpoint and a
//! cloud API with bearer-token auth. Both return a fixed-length f32
//! vector; the provider distinction is configuration, not logic.

use std::{future::Future, pin::Pin};

use serde::{Deserialize, Serialize};

use crate::{
    config::{EmbeddingConfig, EmbeddingProvider},
    error::{Error, Result},
};

/// Whether the text being embedded is an indexed passage or a search
/// query. Some providers use asymmetric encoders, so the distinction is
/// part of the interface even though the output contract is identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedKind {
    Passage,
    Query,
}

impl EmbedKind {
    fn as_str(self) -> &'static str {
        match self {
            EmbedKind::Passage => "passage",
            EmbedKind::Query => "query",
        }
    }
}

pub type EmbedFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<f32>>> + Send + 'a>>;

/// Anything that can turn text into an embedding vector.
///
/// The indexer and query engine depend on this trait rather than the
/// HTTP client so tests can substitute deterministic embedders.
pub trait Embedder: Send + Sync {
    fn embed<'a>(&'a self, text: &'a str, kind: EmbedKind) -> EmbedFuture<'a>;
}

#[derive(Serialize)]
struct LocalRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    purpose: &'a str,
}

#[derive(Deserialize)]
struct LocalResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct CloudRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct CloudResponse {
    data: Vec<CloudEmbedding>,
}

#[derive(Deserialize)]
struct CloudEmbedding {
    embedding: Vec<f32>,
}

/// HTTP client for the configured embedding provider.
pub struct EmbeddingClient {
    http: reqwest::Client,
    config: EmbeddingConfig,
}

impl EmbeddingClient {
    pub fn new(config: EmbeddingConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    async fn request(&self, text: &str, kind: EmbedKind) -> Result<Vec<f32>> {
        let response = match &self.config.provider {
            EmbeddingProvider::Local { endpoint } => {
                self.http
                    .post(endpoint)
                    .json(&LocalRequest {
                        model: &self.config.model,
                        prompt: text,
                        purpose: kind.as_str(),
                    })
                    .send()
                    .await?
            }
            EmbeddingProvider::Cloud { endpoint, api_key } => {
                self.http
                    .post(endpoint)
                    .bearer_auth(api_key)
                    .json(&CloudRequest {
                        model: &self.config.model,
                        input: text,
                    })
                    .send()
                    .await?
            }
        };

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                "embedding provider rejected request"
            );
            return Err(Error::Embedding {
                status: status.as_u16(),
                message,
            });
        }

        match &self.config.provider {
            EmbeddingProvider::Local { .. } => {
                let body: LocalResponse = response.json().await?;
                Ok(body.embedding)
            }
            EmbeddingProvider::Cloud { .. } => {
                let body: CloudResponse = response.json().await?;
                body.data
                    .into_iter()
                    .next()
                    .map(|e| e.embedding)
                    .ok_or_else(|| Error::Embedding {
                        status: status.as_u16(),
                        message: "response contained no embeddings".into(),
                    })
            }
        }
    }
}

impl Embedder for EmbeddingClient {
    fn embed<'a>(&'a self, text: &'a str, kind: EmbedKind) -> EmbedFuture<'a> {
        Box::pin(self.request(text, kind))
    }
}

impl std::fmt::Debug for EmbeddingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingClient")
            .field("model", &self.config.model)
            .finish_non_exhaustive()
    }
}

/// Cosine similarity between two equal-length vectors, in `[-1, 1]`.
///
/// Mismatched lengths are a contract violation and fail fast. A zero
/// magnitude on either side yields `0.0` rather than dividing by zero;
/// that is a degenerate-case policy, not a true cosine value.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (norm_a.sqrt() * norm_b.sqrt()))
}
