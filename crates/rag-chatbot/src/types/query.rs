//! Query request types

use serde::{Deserialize, Serialize};

use crate::config::RetrievalConfig;
use crate::error::{Error, Result};

/// Body of `POST /api/query`
///
/// Older front ends send `{"query": "..."}`, which is accepted as the question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    #[serde(alias = "query")]
    pub question: String,

    /// Number of chunks to retrieve (server default when omitted).
    /// Signed so that negative input is reported as a bad argument.
    #[serde(default)]
    pub top_k: Option<i64>,
}

impl QueryRequest {
    /// Create a request with the server's default `top_k`
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            top_k: None,
        }
    }

    /// Set the number of chunks to retrieve
    pub fn with_top_k(mut self, k: i64) -> Self {
        self.top_k = Some(k);
        self
    }
}

/// A validated query. Only constructed through [`Query::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    question: String,
    top_k: usize,
}

impl Query {
    /// Check a request against the retrieval limits
    pub fn validate(request: QueryRequest, limits: &RetrievalConfig) -> Result<Self> {
        if request.question.trim().is_empty() {
            return Err(Error::invalid_argument("Question cannot be empty"));
        }

        let top_k = request.top_k.unwrap_or(limits.default_top_k as i64);
        if top_k < 1 || top_k > limits.max_top_k as i64 {
            return Err(Error::invalid_argument(format!(
                "top_k must be between 1 and {}",
                limits.max_top_k
            )));
        }

        Ok(Self {
            question: request.question,
            top_k: top_k as usize,
        })
    }

    /// The question as received
    pub fn question(&self) -> &str {
        &self.question
    }

    /// Number of chunks to retrieve
    pub fn top_k(&self) -> usize {
        self.top_k
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_question_rejected() {
        let limits = RetrievalConfig::default();
        for q in ["", "   ", "\n\t"] {
            let err = Query::validate(QueryRequest::new(q), &limits).unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)));
        }
    }

    #[test]
    fn test_top_k_bounds() {
        let limits = RetrievalConfig::default();
        for k in [0, -1, 11, 100] {
            let req = QueryRequest::new("What is a humanoid?").with_top_k(k);
            assert!(Query::validate(req, &limits).is_err(), "top_k {} accepted", k);
        }
        for k in [1, 5, 10] {
            let req = QueryRequest::new("What is a humanoid?").with_top_k(k);
            assert_eq!(Query::validate(req, &limits).unwrap().top_k(), k as usize);
        }
    }

    #[test]
    fn test_default_top_k_applied() {
        let query = Query::validate(QueryRequest::new("Why?"), &RetrievalConfig::default()).unwrap();
        assert_eq!(query.top_k(), 3);
    }

    #[test]
    fn test_query_alias_accepted() {
        let req: QueryRequest = serde_json::from_str(r#"{"query": "What is ROS?"}"#).unwrap();
        assert_eq!(req.question, "What is ROS?");
        assert!(req.top_k.is_none());

        let req: QueryRequest =
            serde_json::from_str(r#"{"question": "What is ROS?", "top_k": 5}"#).unwrap();
        assert_eq!(req.top_k, Some(5));
    }
}
