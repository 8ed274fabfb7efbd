//! Knowledge lookup contract

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures of a single lookup. None of these abort a resolution; the
/// resolver moves on to the next candidate.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LookupError {
    /// The title names several articles; carries the candidate titles
    #[error("'{title}' is ambiguous ({} options)", options.len())]
    Ambiguous { title: String, options: Vec<String> },
    #[error("No article for '{0}'")]
    NotFound(String),
    #[error("Knowledge service error: {0}")]
    Service(String),
}

/// A fetched article summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Canonical title as reported by the source (after redirects)
    pub title: String,
    pub summary: String,
}

/// A searchable encyclopedia-like source
#[async_trait]
pub trait KnowledgeSource: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// Candidate titles for a free-text query, best first
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, LookupError>;

    /// Summary of an exact title, at most `sentences` sentences long
    async fn fetch_summary(&self, title: &str, sentences: usize) -> Result<Article, LookupError>;
}
