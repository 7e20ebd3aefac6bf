//! Hugging Face Inference providers for embeddings and generation
//!
//! Embeddings use the `feature-extraction` pipeline of the serverless
//! inference router; generation uses its OpenAI-compatible chat completions.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::HuggingFaceConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;

const PROVIDER: &str = "huggingface";

/// Shared HTTP client for the inference router
pub struct HuggingFaceClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HuggingFaceClient {
    /// Create a new client
    pub fn new(config: &HuggingFaceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.post(&url).json(body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::dependency(PROVIDER, format!("POST {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::dependency(
                PROVIDER,
                format!("POST {} returned {}: {}", url, status, text),
            ));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::dependency(PROVIDER, format!("Invalid response from {}: {}", url, e)))
    }
}

#[derive(Serialize)]
struct FeatureExtractionRequest<'a, I: Serialize + ?Sized> {
    inputs: &'a I,
}

/// Embedding provider backed by a sentence-transformers style model
pub struct HuggingFaceEmbedder {
    client: Arc<HuggingFaceClient>,
    model: String,
}

impl HuggingFaceEmbedder {
    /// Create a new embedder
    pub fn new(client: Arc<HuggingFaceClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    fn path(&self) -> String {
        format!("/hf-inference/models/{}/pipeline/feature-extraction", self.model)
    }
}

#[async_trait]
impl EmbeddingProvider for HuggingFaceEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let value: Value = self
            .client
            .post_json(&self.path(), &FeatureExtractionRequest { inputs: text })
            .await?;
        parse_embedding(&value)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let value: Value = self
            .client
            .post_json(&self.path(), &FeatureExtractionRequest { inputs: texts })
            .await?;
        let rows = parse_embedding_batch(&value)?;
        if rows.len() != texts.len() {
            return Err(Error::dependency(
                PROVIDER,
                format!("Expected {} embeddings, got {}", texts.len(), rows.len()),
            ));
        }
        Ok(rows)
    }

    fn name(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Read one embedding. Nested responses (per-token output) use their first row.
fn parse_embedding(value: &Value) -> Result<Vec<f32>> {
    let arr = value
        .as_array()
        .ok_or_else(|| Error::dependency(PROVIDER, "Embedding is not an array"))?;
    match arr.first() {
        None => Err(Error::dependency(PROVIDER, "Empty embedding")),
        Some(first) if first.is_array() => parse_embedding(first),
        Some(_) => arr
            .iter()
            .map(|v| {
                v.as_f64()
                    .map(|n| n as f32)
                    .ok_or_else(|| Error::dependency(PROVIDER, "Embedding value is not a number"))
            })
            .collect(),
    }
}

fn parse_embedding_batch(value: &Value) -> Result<Vec<Vec<f32>>> {
    let rows = value
        .as_array()
        .ok_or_else(|| Error::dependency(PROVIDER, "Batch embedding is not an array"))?;
    rows.iter().map(parse_embedding).collect()
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> Result<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::dependency(PROVIDER, "Chat completion returned no content"))
    }
}

/// Chat-completion generation provider
pub struct HuggingFaceLlm {
    client: Arc<HuggingFaceClient>,
    model: String,
    max_tokens: u32,
    temperature: Option<f32>,
}

impl HuggingFaceLlm {
    /// Create a new generation provider for `model`
    pub fn new(client: Arc<HuggingFaceClient>, model: impl Into<String>, config: &HuggingFaceConfig) -> Self {
        Self {
            client,
            model: model.into(),
            max_tokens: config.max_new_tokens,
            temperature: config.temperature,
        }
    }
}

#[async_trait]
impl LlmProvider for HuggingFaceLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: false,
        };

        let response: ChatResponse = self.client.post_json("/v1/chat/completions", &request).await?;
        response.into_text()
    }

    fn name(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }
}
