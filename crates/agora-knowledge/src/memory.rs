//! In-memory knowledge source for tests and offline runs

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::similarity::tokenize;
use crate::source::{Article, KnowledgeSource, LookupError};
use crate::terms::key_points;

#[derive(Debug, Clone)]
enum Entry {
    Article(String),
    Disambiguation(Vec<String>),
}

/// A fixed set of articles and disambiguation pages. Search matches titles
/// sharing at least one token with the query, exact title first.
#[derive(Debug, Default)]
pub struct InMemorySource {
    entries: Vec<(String, Entry)>,
    outages: HashSet<String>,
    search_outage: bool,
    latency: Duration,
    fetches: AtomicUsize,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an article
    pub fn with_article(mut self, title: &str, summary: &str) -> Self {
        self.entries
            .push((title.to_string(), Entry::Article(summary.to_string())));
        self
    }

    /// Add a disambiguation page listing `options`
    pub fn with_disambiguation(mut self, title: &str, options: &[&str]) -> Self {
        self.entries.push((
            title.to_string(),
            Entry::Disambiguation(options.iter().map(|o| o.to_string()).collect()),
        ));
        self
    }

    /// Fetching this title fails with a service error
    pub fn with_outage(mut self, title: &str) -> Self {
        self.outages.insert(title.to_lowercase());
        self
    }

    /// Every search fails with a service error
    pub fn with_search_outage(mut self) -> Self {
        self.search_outage = true;
        self
    }

    /// Delay every search and fetch
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of summary fetches attempted
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn find(&self, title: &str) -> Option<&(String, Entry)> {
        self.entries
            .iter()
            .find(|(t, _)| t.eq_ignore_ascii_case(title))
    }
}

#[async_trait]
impl KnowledgeSource for InMemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, LookupError> {
        self.delay().await;
        if self.search_outage {
            return Err(LookupError::Service("search unavailable".to_string()));
        }

        let query_tokens: HashSet<String> = tokenize(query).into_iter().collect();
        let mut scored: Vec<(usize, usize, &str)> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(pos, (title, _))| {
                if title.eq_ignore_ascii_case(query.trim()) {
                    return Some((usize::MAX, pos, title.as_str()));
                }
                let shared = tokenize(title)
                    .into_iter()
                    .collect::<HashSet<_>>()
                    .intersection(&query_tokens)
                    .count();
                (shared > 0).then_some((shared, pos, title.as_str()))
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(_, _, title)| title.to_string())
            .collect())
    }

    async fn fetch_summary(&self, title: &str, sentences: usize) -> Result<Article, LookupError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.delay().await;

        if self.outages.contains(&title.to_lowercase()) {
            return Err(LookupError::Service(format!("timeout fetching '{}'", title)));
        }

        match self.find(title) {
            Some((canonical, Entry::Article(summary))) => Ok(Article {
                title: canonical.clone(),
                summary: key_points(summary, sentences).join(" "),
            }),
            Some((canonical, Entry::Disambiguation(options))) => Err(LookupError::Ambiguous {
                title: canonical.clone(),
                options: options.clone(),
            }),
            None => Err(LookupError::NotFound(title.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> InMemorySource {
        InMemorySource::new()
            .with_article("Privacy", "Privacy is seclusion. It has many forms. A third sentence.")
            .with_article("Information privacy", "Data protection.")
            .with_disambiguation("Jaguar", &["Jaguar (animal)", "Jaguar (car)"])
            .with_outage("Information privacy")
    }

    #[tokio::test]
    async fn test_search_ranks_exact_title_first() {
        let titles = source().search("information privacy", 10).await.unwrap();
        assert_eq!(titles, vec!["Information privacy", "Privacy"]);
        assert!(source().search("volcano", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_variants() {
        let source = source();
        let article = source.fetch_summary("privacy", 2).await.unwrap();
        assert_eq!(article.title, "Privacy");
        assert_eq!(article.summary, "Privacy is seclusion. It has many forms.");

        assert!(matches!(
            source.fetch_summary("jaguar", 2).await,
            Err(LookupError::Ambiguous { options, .. }) if options.len() == 2
        ));
        assert!(matches!(
            source.fetch_summary("Information privacy", 2).await,
            Err(LookupError::Service(_))
        ));
        assert!(matches!(
            source.fetch_summary("Atlantis", 2).await,
            Err(LookupError::NotFound(_))
        ));
        assert_eq!(source.fetch_count(), 4);
    }
}
