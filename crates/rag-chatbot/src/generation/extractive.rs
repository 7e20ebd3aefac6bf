//! Keyword-overlap answer extraction
//!
//! Used when no generation model is available. Context sentences are ranked by
//! how many question keywords they contain (case-insensitive substring match)
//! and the best few are returned inside a fixed template. This is extractive
//! summarisation, not semantic QA: paraphrased questions that share no words
//! with the text fall through to the opening sentences of the context.

use crate::config::AnswerConfig;

/// Sentence extractor driven by question keywords
#[derive(Debug, Clone)]
pub struct ExtractiveSummarizer {
    /// Words must be longer than this (in chars) to be keywords
    keyword_min_len: usize,
    /// Number of sentences kept
    max_sentences: usize,
    /// Corpus name used in the answer template
    corpus_label: String,
}

impl Default for ExtractiveSummarizer {
    fn default() -> Self {
        Self::new(&AnswerConfig::default())
    }
}

impl ExtractiveSummarizer {
    /// Create a summarizer from the answer configuration
    pub fn new(config: &AnswerConfig) -> Self {
        Self {
            keyword_min_len: config.keyword_min_len,
            max_sentences: config.max_sentences.max(1),
            corpus_label: config.corpus_label.clone(),
        }
    }

    /// Lowercased question words longer than the configured minimum.
    /// Leading and trailing punctuation is stripped, so `robotics?` becomes `robotics`.
    pub fn keywords(&self, question: &str) -> Vec<String> {
        question
            .to_lowercase()
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
            .filter(|w| w.chars().count() > self.keyword_min_len)
            .collect()
    }

    /// Sentences chosen to answer `question`, best first
    pub fn select_sentences(&self, context: &str, question: &str) -> Vec<String> {
        let flat = context.replace('\n', " ");
        let sentences: Vec<&str> = flat.split('.').collect();
        let keywords = self.keywords(question);

        let mut ranked: Vec<(&str, usize)> = sentences
            .iter()
            .filter_map(|sentence| {
                let lower = sentence.to_lowercase();
                let matches = keywords.iter().filter(|w| lower.contains(w.as_str())).count();
                (matches > 0).then(|| (sentence.trim(), matches))
            })
            .collect();

        // Stable sort: equal scores keep context order
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        let chosen: Vec<String> = ranked
            .into_iter()
            .take(self.max_sentences)
            .map(|(s, _)| s.to_string())
            .collect();
        if !chosen.is_empty() {
            return chosen;
        }

        sentences
            .into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .take(self.max_sentences)
            .map(str::to_string)
            .collect()
    }

    /// Build an answer for `question` from `context`. Never returns an empty string.
    pub fn synthesize(&self, context: &str, question: &str) -> String {
        let selected = self.select_sentences(context, question);
        let content = selected.join(". ");
        let content = content.trim();

        if content.is_empty() {
            return format!(
                "Based on the {label} content, I could not find specific information to answer: '{question}'. Please refer to the {label} for more details.",
                label = self.corpus_label,
                question = question
            );
        }

        format!(
            "Based on the {label}:\n\n{content}.\n\nThis information addresses your question: '{question}'.",
            label = self.corpus_label,
            content = content,
            question = question
        )
    }
}
