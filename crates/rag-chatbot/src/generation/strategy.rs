//! Answer strategies
//!
//! A strategy turns retrieved context plus the question into answer text. The
//! generative strategy delegates to an [`LlmProvider`]; the extractive one
//! never leaves the process. Which one serves requests is decided once at
//! startup.

use async_trait::async_trait;
use std::sync::Arc;

use super::extractive::ExtractiveSummarizer;
use super::prompt::PromptBuilder;
use crate::config::{AnswerConfig, StrategyKind};
use crate::error::{Error, Result};
use crate::providers::LlmProvider;

/// Produces answer text from context and question
#[async_trait]
pub trait AnswerStrategy: Send + Sync {
    /// Answer `question` using `context`
    async fn synthesize(&self, context: &str, question: &str) -> Result<String>;

    /// Strategy name for logging
    fn name(&self) -> &str;
}

/// Prompts a generation model with the context and returns its reply verbatim
pub struct GenerativeAnswer {
    llm: Arc<dyn LlmProvider>,
    corpus_label: String,
}

impl GenerativeAnswer {
    pub fn new(llm: Arc<dyn LlmProvider>, corpus_label: impl Into<String>) -> Self {
        Self {
            llm,
            corpus_label: corpus_label.into(),
        }
    }
}

#[async_trait]
impl AnswerStrategy for GenerativeAnswer {
    async fn synthesize(&self, context: &str, question: &str) -> Result<String> {
        let prompt = PromptBuilder::build_qa_prompt(&self.corpus_label, context, question);
        tracing::debug!(
            "Prompting {} ({}) with {} chars",
            self.llm.name(),
            self.llm.model(),
            prompt.len()
        );
        self.llm.generate(&prompt).await
    }

    fn name(&self) -> &str {
        "generative"
    }
}

#[async_trait]
impl AnswerStrategy for ExtractiveSummarizer {
    async fn synthesize(&self, context: &str, question: &str) -> Result<String> {
        Ok(ExtractiveSummarizer::synthesize(self, context, question))
    }

    fn name(&self) -> &str {
        "extractive"
    }
}

/// Pick the strategy for `config`. Forcing generation without a model is a configuration error.
pub fn select_strategy(
    config: &AnswerConfig,
    llm: Option<Arc<dyn LlmProvider>>,
) -> Result<Arc<dyn AnswerStrategy>> {
    let strategy: Arc<dyn AnswerStrategy> = match (config.strategy, llm) {
        (StrategyKind::Extractive, _) | (StrategyKind::Auto, None) => {
            Arc::new(ExtractiveSummarizer::new(config))
        }
        (StrategyKind::Generative, Some(llm)) | (StrategyKind::Auto, Some(llm)) => {
            Arc::new(GenerativeAnswer::new(llm, config.corpus_label.clone()))
        }
        (StrategyKind::Generative, None) => {
            return Err(Error::Config(
                "generative answers require HF_API_TOKEN and GENERATION_MODEL_NAME".to_string(),
            ));
        }
    };

    tracing::info!("Answer strategy: {}", strategy.name());
    Ok(strategy)
}
