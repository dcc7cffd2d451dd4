use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::core::similarity::{Embedder, SimilarityError};

/// Client for an OpenAI-compatible embeddings endpoint
///
/// Sends `{"model", "input", "dimensions"}` and reads `data[].embedding`.
pub struct HttpEmbedder {
    url: String,
    api_key: Option<String>,
    model: String,
    dimensions: Option<u32>,
    client: Client,
}

impl HttpEmbedder {
    pub fn new(
        endpoint: &str,
        path: &str,
        api_key: Option<String>,
        model: String,
        dimensions: Option<u32>,
        timeout: Duration,
    ) -> Result<Self, SimilarityError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            url: format!("{}{}", endpoint.trim_end_matches('/'), path),
            api_key,
            model,
            dimensions,
            client,
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    async fn encode(&self, text: &str) -> Result<Vec<f32>, SimilarityError> {
        let mut body = serde_json::json!({
            "model": self.model,
            "input": [text],
        });
        if let Some(dimensions) = self.dimensions {
            body["dimensions"] = dimensions.into();
        }

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        tracing::debug!("Encoding {} chars with {}", text.len(), self.model);

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(SimilarityError::ApiError(format!(
                "Embedding request failed: {}",
                response.status()
            )));
        }

        let json: Value = response.json().await?;

        parse_embedding_response(json)?
            .into_iter()
            .next()
            .ok_or_else(|| SimilarityError::InvalidResponse("Empty data array".into()))
    }
}

fn parse_embedding_response(json: Value) -> Result<Vec<Vec<f32>>, SimilarityError> {
    let data = json
        .get("data")
        .and_then(|v| v.as_array())
        .ok_or_else(|| SimilarityError::InvalidResponse("Missing data array".into()))?;

    let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());
    for (fallback_index, item) in data.iter().enumerate() {
        let index = item
            .get("index")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(fallback_index);
        let embedding = item
            .get("embedding")
            .and_then(|v| v.as_array())
            .ok_or_else(|| SimilarityError::InvalidResponse("Item missing embedding array".into()))?;

        let vector = embedding
            .iter()
            .map(|value| {
                value
                    .as_f64()
                    .map(|n| n as f32)
                    .ok_or_else(|| SimilarityError::InvalidResponse("Embedding value must be numeric".into()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        indexed.push((index, vector));
    }

    indexed.sort_by_key(|(index, _)| *index);

    Ok(indexed.into_iter().map(|(_, vector)| vector).collect())
}
