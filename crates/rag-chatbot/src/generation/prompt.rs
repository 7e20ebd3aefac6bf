//! Prompt templates for RAG generation

use crate::types::RetrievedChunk;

/// Separator placed between chunk texts in the context
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Join chunk texts in retrieval order, separated by blank lines
    pub fn build_context(chunks: &[RetrievedChunk]) -> String {
        chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR)
    }

    /// Build a question-answering prompt grounded in `context`
    pub fn build_qa_prompt(corpus_label: &str, context: &str, question: &str) -> String {
        format!(
            r#"Based on the following context from the {corpus}, please answer the question.

Context:
{context}

Question: {question}

Answer:"#,
            corpus = corpus_label,
            context = context,
            question = question
        )
    }
}
