//! Qdrant REST providers
//!
//! Qdrant 1.10 introduced `points/query` and later servers deprecate
//! `points/search`. Each endpoint gets its own [`VectorStoreProvider`]; which
//! one is used is decided once by [`connect`].

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use semver::Version;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{QdrantConfig, SearchApi};
use crate::error::{Error, Result};

use super::vector_store::{CollectionStatus, ScoredPoint, VectorPoint, VectorStoreProvider};

const PROVIDER: &str = "qdrant";

/// Every Qdrant REST response wraps its payload in `result`
#[derive(Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Deserialize)]
struct QueryResult {
    #[serde(default)]
    points: Vec<ScoredPoint>,
}

#[derive(Deserialize)]
struct CollectionInfo {
    #[serde(default)]
    points_count: Option<u64>,
}

#[derive(Deserialize)]
struct ServerInfo {
    version: String,
}

/// Thin REST client bound to one collection
pub struct QdrantClient {
    client: Client,
    base_url: String,
    collection: String,
}

impl QdrantClient {
    /// Create a client for `config.collection` at `url`
    pub fn new(url: &str, config: &QdrantConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key)
                .map_err(|_| Error::Config("QDRANT_API_KEY contains invalid characters".to_string()))?;
            headers.insert("api-key", value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
        })
    }

    /// Collection name
    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn collection_url(&self, suffix: &str) -> String {
        format!("{}/collections/{}{}", self.base_url, self.collection, suffix)
    }

    async fn send(&self, method: Method, url: &str, body: Option<serde_json::Value>) -> Result<reqwest::Response> {
        let mut request = self.client.request(method.clone(), url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        request
            .send()
            .await
            .map_err(|e| Error::dependency(PROVIDER, format!("{} {} failed: {}", method, url, e)))
    }

    async fn expect_json<T: DeserializeOwned>(url: &str, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::dependency(
                PROVIDER,
                format!("{} returned {}: {}", url, status, text),
            ));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| Error::dependency(PROVIDER, format!("Invalid response from {}: {}", url, e)))
    }

    async fn call<T: DeserializeOwned>(&self, method: Method, url: &str, body: Option<serde_json::Value>) -> Result<T> {
        let response = self.send(method, url, body).await?;
        Self::expect_json(url, response).await
    }

    /// Server version reported by `GET /`
    pub async fn server_version(&self) -> Result<Version> {
        let url = format!("{}/", self.base_url);
        let info: ServerInfo = self.call(Method::GET, &url, None).await?;
        Version::parse(info.version.trim_start_matches('v'))
            .map_err(|e| Error::dependency(PROVIDER, format!("Unparseable version '{}': {}", info.version, e)))
    }

    /// `POST points/query`
    pub async fn query_points(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>> {
        let url = self.collection_url("/points/query");
        let body = json!({ "query": vector, "limit": limit, "with_payload": true });
        let envelope: Envelope<QueryResult> = self.call(Method::POST, &url, Some(body)).await?;
        Ok(envelope.result.points)
    }

    /// `POST points/search`
    pub async fn search_points(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>> {
        let url = self.collection_url("/points/search");
        let body = json!({ "vector": vector, "limit": limit, "with_payload": true });
        let envelope: Envelope<Vec<ScoredPoint>> = self.call(Method::POST, &url, Some(body)).await?;
        Ok(envelope.result)
    }

    /// `GET /collections/{name}`; a 404 means the collection is missing
    pub async fn collection_status(&self) -> Result<CollectionStatus> {
        let url = self.collection_url("");
        let response = self.send(Method::GET, &url, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(CollectionStatus::missing());
        }
        let envelope: Envelope<CollectionInfo> = Self::expect_json(&url, response).await?;
        Ok(CollectionStatus {
            exists: true,
            points_count: envelope.result.points_count,
        })
    }

    /// Create the collection with cosine distance unless it exists
    pub async fn ensure_collection(&self, dimensions: usize) -> Result<()> {
        if self.collection_status().await?.exists {
            return Ok(());
        }
        let url = self.collection_url("");
        let body = json!({ "vectors": { "size": dimensions, "distance": "Cosine" } });
        let _: Envelope<serde_json::Value> = self.call(Method::PUT, &url, Some(body)).await?;
        tracing::info!("Created collection '{}' ({} dimensions)", self.collection, dimensions);
        Ok(())
    }

    /// Drop the collection; a missing collection is not an error
    pub async fn delete_collection(&self) -> Result<()> {
        let url = self.collection_url("");
        let response = self.send(Method::DELETE, &url, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        let _: Envelope<serde_json::Value> = Self::expect_json(&url, response).await?;
        Ok(())
    }

    /// `PUT points?wait=true`
    pub async fn upsert(&self, points: &[VectorPoint]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        #[derive(Serialize)]
        struct Upsert<'a> {
            points: &'a [VectorPoint],
        }
        let url = self.collection_url("/points?wait=true");
        let body = serde_json::to_value(Upsert { points })?;
        let _: Envelope<serde_json::Value> = self.call(Method::PUT, &url, Some(body)).await?;
        Ok(())
    }

    /// Whether the server answers `GET /`
    pub async fn health_check(&self) -> Result<bool> {
        match self.send(Method::GET, &format!("{}/", self.base_url), None).await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}

/// Search through `points/query`
pub struct QdrantQueryApi {
    client: Arc<QdrantClient>,
}

impl QdrantQueryApi {
    pub fn new(client: Arc<QdrantClient>) -> Self {
        Self { client }
    }
}

/// Search through the older `points/search`
pub struct QdrantSearchApi {
    client: Arc<QdrantClient>,
}

impl QdrantSearchApi {
    pub fn new(client: Arc<QdrantClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl VectorStoreProvider for QdrantQueryApi {
    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>> {
        self.client.query_points(vector, limit).await
    }

    async fn collection_status(&self) -> Result<CollectionStatus> {
        self.client.collection_status().await
    }

    async fn ensure_collection(&self, dimensions: usize) -> Result<()> {
        self.client.ensure_collection(dimensions).await
    }

    async fn delete_collection(&self) -> Result<()> {
        self.client.delete_collection().await
    }

    async fn upsert(&self, points: &[VectorPoint]) -> Result<()> {
        self.client.upsert(points).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "qdrant-query"
    }

    fn collection(&self) -> &str {
        self.client.collection()
    }
}

#[async_trait]
impl VectorStoreProvider for QdrantSearchApi {
    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>> {
        self.client.search_points(vector, limit).await
    }

    async fn collection_status(&self) -> Result<CollectionStatus> {
        self.client.collection_status().await
    }

    async fn ensure_collection(&self, dimensions: usize) -> Result<()> {
        self.client.ensure_collection(dimensions).await
    }

    async fn delete_collection(&self) -> Result<()> {
        self.client.delete_collection().await
    }

    async fn upsert(&self, points: &[VectorPoint]) -> Result<()> {
        self.client.upsert(points).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "qdrant-search"
    }

    fn collection(&self) -> &str {
        self.client.collection()
    }
}

/// Endpoint to use for a server version; unknown versions get `points/query`
pub fn api_for_version(version: Option<&Version>) -> SearchApi {
    match version {
        Some(v) if *v < Version::new(1, 10, 0) => SearchApi::Search,
        _ => SearchApi::Query,
    }
}

/// Build the vector store for `url`, resolving [`SearchApi::Auto`] against the server
pub async fn connect(url: &str, config: &QdrantConfig) -> Result<Arc<dyn VectorStoreProvider>> {
    let client = Arc::new(QdrantClient::new(url, config)?);

    let api = match config.search_api {
        SearchApi::Auto => match client.server_version().await {
            Ok(version) => {
                tracing::info!("Qdrant server version {}", version);
                api_for_version(Some(&version))
            }
            Err(e) => {
                tracing::warn!("Could not read Qdrant version ({}), using points/query", e);
                api_for_version(None)
            }
        },
        explicit => explicit,
    };

    Ok(match api {
        SearchApi::Search => Arc::new(QdrantSearchApi::new(client)),
        _ => Arc::new(QdrantQueryApi::new(client)),
    })
}
