//! Query orchestration
//!
//! A query moves through `Received -> Validated -> Retrieved -> Answered -> Responded`.
//! Any failure ends the query with an error; no partial answer is ever returned.
//! Validation runs before any provider is contacted, and every provider call
//! runs under the configured stage timeout.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::Instrument;
use uuid::Uuid;

use crate::config::{RagConfig, RetrievalConfig};
use crate::error::{Error, Result};
use crate::generation::{select_strategy, AnswerStrategy, PromptBuilder};
use crate::providers::Providers;
use crate::retrieval::Retriever;
use crate::types::{Answer, Query, QueryRequest, QueryResponse};

/// Position of a query in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStage {
    Received,
    Validated,
    Retrieved,
    Answered,
    Responded,
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryStage::Received => "received",
            QueryStage::Validated => "validated",
            QueryStage::Retrieved => "retrieved",
            QueryStage::Answered => "answered",
            QueryStage::Responded => "responded",
        };
        f.write_str(name)
    }
}

/// Runs queries end to end. Cheap to clone; shared by all requests.
#[derive(Clone)]
pub struct QueryPipeline {
    retriever: Retriever,
    strategy: Arc<dyn AnswerStrategy>,
    limits: RetrievalConfig,
    corpus_label: String,
    stage_timeout: Duration,
}

impl QueryPipeline {
    /// Build the pipeline, choosing the answer strategy from the configuration
    pub fn new(providers: &Providers, config: &RagConfig) -> Result<Self> {
        let strategy = select_strategy(&config.answer, providers.llm.clone())?;
        Ok(Self::with_strategy(Retriever::new(providers), strategy, config))
    }

    /// Build the pipeline around an explicit strategy
    pub fn with_strategy(
        retriever: Retriever,
        strategy: Arc<dyn AnswerStrategy>,
        config: &RagConfig,
    ) -> Self {
        Self {
            retriever,
            strategy,
            limits: config.retrieval.clone(),
            corpus_label: config.answer.corpus_label.clone(),
            stage_timeout: Duration::from_secs(config.retrieval.stage_timeout_secs),
        }
    }

    /// Override the per-stage time budget
    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// Name of the active answer strategy
    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    /// Answer a request
    pub async fn answer(&self, request: QueryRequest) -> Result<Answer> {
        let span = tracing::info_span!("query", id = %Uuid::new_v4());
        self.run(request).instrument(span).await
    }

    /// Answer a request and shape the wire response
    pub async fn respond(&self, request: QueryRequest) -> Result<QueryResponse> {
        let answer = self.answer(request).await?;
        Ok(QueryResponse::from_answer(answer, self.limits.source_preview_chars))
    }

    async fn run(&self, request: QueryRequest) -> Result<Answer> {
        let start = Instant::now();
        tracing::debug!(stage = %QueryStage::Received, "Question: {:?}", request.question);

        let query = Query::validate(request, &self.limits)?;
        tracing::debug!(stage = %QueryStage::Validated, top_k = query.top_k());

        let vector = self
            .within("embedding", self.retriever.embed_question(query.question()))
            .await?;
        let chunks = self
            .within("search", self.retriever.search(&vector, query.top_k()))
            .await?;
        if chunks.is_empty() {
            return Err(Error::not_found(format!(
                "No relevant content found in the {}",
                self.corpus_label
            )));
        }
        tracing::debug!(stage = %QueryStage::Retrieved, chunks = chunks.len());

        let context = PromptBuilder::build_context(&chunks);
        let text = self
            .within("generation", self.strategy.synthesize(&context, query.question()))
            .await?;
        tracing::debug!(stage = %QueryStage::Answered, strategy = self.strategy.name());

        let answer = Answer {
            text,
            sources: chunks,
            question: query.question().to_string(),
        };
        tracing::info!(
            stage = %QueryStage::Responded,
            sources = answer.sources.len(),
            "Answered in {}ms",
            start.elapsed().as_millis()
        );
        Ok(answer)
    }

    async fn within<T, F>(&self, stage: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.stage_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout {
                stage,
                millis: u64::try_from(self.stage_timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrategyKind;
    use crate::providers::{
        CollectionStatus, EmbeddingProvider, LlmProvider, ScoredPoint, VectorPoint,
        VectorStoreProvider,
    };
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::{assert_err, assert_ok};

    #[derive(Default)]
    struct FakeEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingProvider for FakeEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![0.1, 0.2, 0.3])
        }

        fn name(&self) -> &str {
            "fake"
        }

        fn model(&self) -> &str {
            "fake-embed"
        }
    }

    #[derive(Default)]
    struct FakeStore {
        texts: Vec<&'static str>,
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl FakeStore {
        fn with_texts(texts: &[&'static str]) -> Self {
            Self {
                texts: texts.to_vec(),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl VectorStoreProvider for FakeStore {
        async fn search(&self, _vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self
                .texts
                .iter()
                .take(limit)
                .enumerate()
                .map(|(i, text)| ScoredPoint {
                    score: Some(0.9 - i as f32 * 0.1),
                    payload: json!({"text": text, "source": format!("chapter-{}", i + 1)})
                        .as_object()
                        .cloned(),
                })
                .collect())
        }

        async fn collection_status(&self) -> Result<CollectionStatus> {
            Ok(CollectionStatus {
                exists: true,
                points_count: Some(self.texts.len() as u64),
            })
        }

        async fn ensure_collection(&self, _dimensions: usize) -> Result<()> {
            Ok(())
        }

        async fn delete_collection(&self) -> Result<()> {
            Ok(())
        }

        async fn upsert(&self, _points: &[VectorPoint]) -> Result<()> {
            Ok(())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "fake-store"
        }

        fn collection(&self) -> &str {
            "test"
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LlmProvider for FailingLlm {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Err(Error::dependency("huggingface", "503 Service Unavailable"))
        }

        fn name(&self) -> &str {
            "failing"
        }

        fn model(&self) -> &str {
            "none"
        }
    }

    const HUMANOID: [&str; 3] = [
        "Humanoid robots mimic human form.",
        "They use actuators and sensors.",
        "Applications include manufacturing.",
    ];

    fn pipeline(embedder: Arc<FakeEmbedder>, store: Arc<FakeStore>) -> QueryPipeline {
        let providers = Providers::default()
            .with_embedder(embedder)
            .with_vector_store(store);
        QueryPipeline::new(&providers, &RagConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_invalid_requests_never_reach_providers() {
        let embedder = Arc::new(FakeEmbedder::default());
        let store = Arc::new(FakeStore::with_texts(&HUMANOID));
        let pipeline = pipeline(embedder.clone(), store.clone());

        for request in [
            QueryRequest::new(""),
            QueryRequest::new("   "),
            QueryRequest::new("What is a robot?").with_top_k(0),
            QueryRequest::new("What is a robot?").with_top_k(11),
            QueryRequest::new("What is a robot?").with_top_k(-2),
        ] {
            let err = pipeline.answer(request).await.unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)));
        }

        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_retrieval_is_not_found() {
        let pipeline = pipeline(Arc::new(FakeEmbedder::default()), Arc::new(FakeStore::default()));
        let err = pipeline.answer(QueryRequest::new("What is a robot?")).await.unwrap_err();
        match err {
            Error::NotFound(msg) => assert_eq!(msg, "No relevant content found in the textbook"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_humanoid_scenario_keeps_retrieval_order() {
        let store = Arc::new(FakeStore::with_texts(&HUMANOID));
        let pipeline = pipeline(Arc::new(FakeEmbedder::default()), store);
        assert_eq!(pipeline.strategy_name(), "extractive");

        let answer = pipeline
            .answer(QueryRequest::new("What is humanoid robotics?").with_top_k(3))
            .await
            .unwrap();

        let texts: Vec<&str> = answer.sources.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, HUMANOID.to_vec());
        assert_eq!(answer.sources[0].source, "chapter-1");
        assert_eq!(answer.question, "What is humanoid robotics?");
        assert!(answer.text.contains("Humanoid robots mimic human form"));
    }

    #[tokio::test]
    async fn test_top_k_limits_sources() {
        let store = Arc::new(FakeStore::with_texts(&HUMANOID));
        let pipeline = pipeline(Arc::new(FakeEmbedder::default()), store);

        let answer = assert_ok!(pipeline.answer(QueryRequest::new("sensors").with_top_k(1)).await);
        assert_eq!(answer.sources.len(), 1);
    }

    #[tokio::test]
    async fn test_generation_failure_yields_no_answer() {
        let providers = Providers::default()
            .with_embedder(Arc::new(FakeEmbedder::default()))
            .with_vector_store(Arc::new(FakeStore::with_texts(&HUMANOID)))
            .with_llm(Arc::new(FailingLlm));
        let mut config = RagConfig::default();
        config.answer.strategy = StrategyKind::Generative;
        let pipeline = QueryPipeline::new(&providers, &config).unwrap();

        let err = pipeline
            .respond(QueryRequest::new("What is humanoid robotics?"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DependencyUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_missing_vector_store() {
        let providers = Providers::default().with_embedder(Arc::new(FakeEmbedder::default()));
        let pipeline = QueryPipeline::new(&providers, &RagConfig::default()).unwrap();
        let err = assert_err!(pipeline.answer(QueryRequest::new("anything")).await);
        assert!(matches!(err, Error::DependencyUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_slow_stage_times_out() {
        let store = Arc::new(FakeStore {
            texts: HUMANOID.to_vec(),
            delay: Some(Duration::from_secs(5)),
            ..FakeStore::default()
        });
        let pipeline = pipeline(Arc::new(FakeEmbedder::default()), store)
            .with_stage_timeout(Duration::from_millis(20));

        let err = pipeline.answer(QueryRequest::new("robots")).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { stage: "search", millis: 20 }));
        assert!(err.to_string().ends_with("after 20ms"));
    }

    #[tokio::test]
    async fn test_same_input_same_answer() {
        let store = Arc::new(FakeStore::with_texts(&HUMANOID));
        let pipeline = pipeline(Arc::new(FakeEmbedder::default()), store);

        let first = assert_ok!(pipeline.respond(QueryRequest::new("Which sensors?")).await);
        let second = assert_ok!(pipeline.respond(QueryRequest::new("Which sensors?")).await);
        assert_eq!(first.answer, second.answer);
    }
}
