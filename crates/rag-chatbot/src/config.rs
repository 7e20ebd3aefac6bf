//! Configuration for the RAG chatbot
//!
//! Values come from [`Default`], then an optional TOML file named by
//! `RAG_CONFIG_FILE`, then environment variables. The variable names used by
//! existing deployments (`QDRANT_URL`, `QDRANT_API_KEY`, `COLLECTION_NAME`,
//! `HF_API_TOKEN`, `EMBEDDING_MODEL_NAME`, `GENERATION_MODEL_NAME`) are kept.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Largest `top_k` a deployment may allow
pub const TOP_K_CEILING: usize = 10;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Qdrant vector store configuration
    pub qdrant: QdrantConfig,
    /// Hugging Face inference configuration
    pub huggingface: HuggingFaceConfig,
    /// Retrieval limits and timeouts
    pub retrieval: RetrievalConfig,
    /// Answer synthesis configuration
    pub answer: AnswerConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Origins allowed by CORS; `*` allows any origin
    pub cors_origins: Vec<String>,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["http://localhost:3000".to_string()],
            max_body_size: 64 * 1024,
        }
    }
}

impl ServerConfig {
    /// `host:port` string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether CORS should accept any origin
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

/// Which Qdrant search endpoint to call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchApi {
    /// Ask the server for its version at startup and pick accordingly
    #[default]
    Auto,
    /// `POST /collections/{name}/points/query` (Qdrant 1.10+)
    Query,
    /// `POST /collections/{name}/points/search` (older servers)
    Search,
}

impl FromStr for SearchApi {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "query" => Ok(Self::Query),
            "search" => Ok(Self::Search),
            other => Err(Error::Config(format!(
                "QDRANT_SEARCH_API must be auto, query or search (got '{}')",
                other
            ))),
        }
    }
}

/// Qdrant configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QdrantConfig {
    /// Base URL, e.g. `https://xyz.cloud.qdrant.io:6333`. No URL means no vector store.
    pub url: Option<String>,
    /// API key sent as the `api-key` header
    pub api_key: Option<String>,
    /// Collection holding the chunks
    pub collection: String,
    /// Search endpoint selection
    pub search_api: SearchApi,
    /// Check at startup that the collection exists and is non-empty
    pub verify_collection: bool,
    /// HTTP timeout in seconds
    pub timeout_secs: u64,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            collection: "rag_documents".to_string(),
            search_api: SearchApi::Auto,
            verify_collection: true,
            timeout_secs: 30,
        }
    }
}

/// Hugging Face inference configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HuggingFaceConfig {
    /// Bearer token. Generation is disabled without it.
    pub api_token: Option<String>,
    /// Inference router base URL
    pub base_url: String,
    /// Feature-extraction model used for embeddings
    pub embedding_model: String,
    /// Chat model used for generation
    pub generation_model: Option<String>,
    /// Maximum tokens to generate
    pub max_new_tokens: u32,
    /// Sampling temperature (provider default when unset)
    pub temperature: Option<f32>,
    /// HTTP timeout in seconds
    pub timeout_secs: u64,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            base_url: "https://router.huggingface.co".to_string(),
            embedding_model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            generation_model: None,
            max_new_tokens: 512,
            temperature: None,
            timeout_secs: 60,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// `top_k` used when a request omits it
    pub default_top_k: usize,
    /// Largest accepted `top_k`
    pub max_top_k: usize,
    /// Time budget for each provider call in the pipeline
    pub stage_timeout_secs: u64,
    /// Truncate source texts in responses to this many chars (0 keeps full text)
    pub source_preview_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_top_k: 3,
            max_top_k: TOP_K_CEILING,
            stage_timeout_secs: 30,
            source_preview_chars: 0,
        }
    }
}

/// How answers are produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Generative when a generation model is configured, extractive otherwise
    #[default]
    Auto,
    /// Always call the generation model
    Generative,
    /// Always use keyword-overlap sentence extraction
    Extractive,
}

impl FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "generative" => Ok(Self::Generative),
            "extractive" => Ok(Self::Extractive),
            other => Err(Error::Config(format!(
                "RAG_ANSWER_STRATEGY must be auto, generative or extractive (got '{}')",
                other
            ))),
        }
    }
}

/// Answer synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerConfig {
    /// Strategy selection
    pub strategy: StrategyKind,
    /// Name of the corpus used in prompts and extractive answers
    pub corpus_label: String,
    /// Question words must be longer than this to count as keywords
    pub keyword_min_len: usize,
    /// Number of sentences an extractive answer keeps
    pub max_sentences: usize,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Auto,
            corpus_label: "textbook".to_string(),
            keyword_min_len: 3,
            max_sentences: 3,
        }
    }
}

impl RagConfig {
    /// Load configuration from `.env`, an optional TOML file and the environment
    pub fn load() -> Result<Self> {
        // A missing .env is normal in containers
        let _ = dotenvy::dotenv();

        let mut config = match std::env::var("RAG_CONFIG_FILE") {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };
        config.apply_env_with(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse TOML configuration text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Override fields from environment-style lookups. Empty values count as unset.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get("RAG_HOST") {
            self.server.host = v;
        }
        if let Some(v) = get("PORT") {
            self.server.port = parse_env("PORT", &v)?;
        }
        if let Some(v) = get("CORS_ALLOWED_ORIGINS") {
            self.server.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(v) = get("QDRANT_URL") {
            self.qdrant.url = Some(v.trim_end_matches('/').to_string());
        }
        if let Some(v) = get("QDRANT_API_KEY") {
            self.qdrant.api_key = Some(v);
        }
        if let Some(v) = get("COLLECTION_NAME") {
            self.qdrant.collection = v;
        }
        if let Some(v) = get("QDRANT_SEARCH_API") {
            self.qdrant.search_api = v.parse()?;
        }
        if let Some(v) = get("RAG_VERIFY_COLLECTION") {
            self.qdrant.verify_collection = parse_env("RAG_VERIFY_COLLECTION", &v)?;
        }

        if let Some(v) = get("HF_API_TOKEN") {
            self.huggingface.api_token = Some(v);
        }
        if let Some(v) = get("HF_API_BASE_URL") {
            self.huggingface.base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("EMBEDDING_MODEL_NAME") {
            self.huggingface.embedding_model = v;
        }
        if let Some(v) = get("GENERATION_MODEL_NAME") {
            self.huggingface.generation_model = Some(v);
        }
        if let Some(v) = get("RAG_MAX_NEW_TOKENS") {
            self.huggingface.max_new_tokens = parse_env("RAG_MAX_NEW_TOKENS", &v)?;
        }
        if let Some(v) = get("RAG_TEMPERATURE") {
            self.huggingface.temperature = Some(parse_env("RAG_TEMPERATURE", &v)?);
        }

        if let Some(v) = get("RAG_STAGE_TIMEOUT_SECS") {
            self.retrieval.stage_timeout_secs = parse_env("RAG_STAGE_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("RAG_SOURCE_PREVIEW_CHARS") {
            self.retrieval.source_preview_chars = parse_env("RAG_SOURCE_PREVIEW_CHARS", &v)?;
        }

        if let Some(v) = get("RAG_ANSWER_STRATEGY") {
            self.answer.strategy = v.parse()?;
        }
        if let Some(v) = get("RAG_CORPUS_LABEL") {
            self.answer.corpus_label = v;
        }
        if let Some(v) = get("RAG_KEYWORD_MIN_LEN") {
            self.answer.keyword_min_len = parse_env("RAG_KEYWORD_MIN_LEN", &v)?;
        }
        if let Some(v) = get("RAG_MAX_SENTENCES") {
            self.answer.max_sentences = parse_env("RAG_MAX_SENTENCES", &v)?;
        }

        Ok(())
    }

    /// Reject combinations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let r = &self.retrieval;
        if r.max_top_k == 0 || r.max_top_k > TOP_K_CEILING {
            return Err(Error::Config(format!(
                "max_top_k must be between 1 and {} (got {})",
                TOP_K_CEILING, r.max_top_k
            )));
        }
        if r.default_top_k == 0 || r.default_top_k > r.max_top_k {
            return Err(Error::Config(format!(
                "default_top_k must be between 1 and {} (got {})",
                r.max_top_k, r.default_top_k
            )));
        }
        if r.stage_timeout_secs == 0 {
            return Err(Error::Config("stage_timeout_secs must be positive".to_string()));
        }
        if self.answer.max_sentences == 0 {
            return Err(Error::Config("max_sentences must be at least 1".to_string()));
        }
        if self.server.cors_origins.is_empty() {
            return Err(Error::Config("at least one CORS origin is required".to_string()));
        }
        Ok(())
    }

    /// Whether a generation provider can be built from this configuration
    pub fn generation_configured(&self) -> bool {
        self.huggingface.api_token.is_some() && self.huggingface.generation_model.is_some()
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("{} has an invalid value: '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = RagConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retrieval.default_top_k, 3);
        assert_eq!(config.retrieval.max_top_k, 10);
        assert_eq!(config.answer.keyword_min_len, 3);
        assert_eq!(config.answer.max_sentences, 3);
        assert!(!config.generation_configured());
    }

    #[test]
    fn test_env_names_are_honoured() {
        let mut config = RagConfig::default();
        config
            .apply_env_with(lookup(&[
                ("QDRANT_URL", "https://qdrant.example.com:6333/"),
                ("QDRANT_API_KEY", "secret"),
                ("COLLECTION_NAME", "humanoid_robotics"),
                ("HF_API_TOKEN", "hf_token"),
                ("EMBEDDING_MODEL_NAME", "BAAI/bge-small-en-v1.5"),
                ("GENERATION_MODEL_NAME", "mistralai/Mistral-7B-Instruct-v0.3"),
                ("CORS_ALLOWED_ORIGINS", "http://localhost:3000, https://docs.example.com"),
                ("PORT", "3003"),
            ]))
            .unwrap();

        assert_eq!(config.qdrant.url.as_deref(), Some("https://qdrant.example.com:6333"));
        assert_eq!(config.qdrant.api_key.as_deref(), Some("secret"));
        assert_eq!(config.qdrant.collection, "humanoid_robotics");
        assert_eq!(config.huggingface.embedding_model, "BAAI/bge-small-en-v1.5");
        assert!(config.generation_configured());
        assert_eq!(config.server.port, 3003);
        assert_eq!(config.server.cors_origins.len(), 2);
        assert_eq!(config.server.cors_origins[1], "https://docs.example.com");
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let mut config = RagConfig::default();
        config
            .apply_env_with(lookup(&[("HF_API_TOKEN", "  "), ("COLLECTION_NAME", "")]))
            .unwrap();
        assert!(config.huggingface.api_token.is_none());
        assert_eq!(config.qdrant.collection, "rag_documents");
    }

    #[test]
    fn test_bad_numbers_are_config_errors() {
        let mut config = RagConfig::default();
        let err = config.apply_env_with(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = config
            .apply_env_with(lookup(&[("QDRANT_SEARCH_API", "grpc")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RagConfig::from_toml_str(
            r#"
            [qdrant]
            url = "http://localhost:6333"
            search_api = "search"

            [answer]
            strategy = "extractive"
            max_sentences = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.qdrant.search_api, SearchApi::Search);
        assert_eq!(config.qdrant.collection, "rag_documents");
        assert_eq!(config.answer.strategy, StrategyKind::Extractive);
        assert_eq!(config.answer.max_sentences, 5);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rag.toml");
        std::fs::write(&path, "[server]\nport = 9090\n").unwrap();

        let config = RagConfig::from_file(&path).unwrap();
        assert_eq!(config.server.port, 9090);
        assert!(RagConfig::from_file(dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_limits() {
        let mut config = RagConfig::default();
        config.retrieval.default_top_k = 11;
        assert!(config.validate().is_err());

        let mut config = RagConfig::default();
        config.answer.max_sentences = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_top_k_is_capped() {
        let config = RagConfig::from_toml_str("[retrieval]\nmax_top_k = 20\n").unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = RagConfig::from_toml_str("[retrieval]\nmax_top_k = 5\n").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.retrieval.default_top_k, 3);
    }
}
