//! Answer synthesis from retrieved context

pub mod extractive;
pub mod prompt;
pub mod strategy;

pub use extractive::ExtractiveSummarizer;
pub use prompt::PromptBuilder;
pub use strategy::{select_strategy, AnswerStrategy, GenerativeAnswer};
