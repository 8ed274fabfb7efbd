//! Wikipedia source over the MediaWiki action API

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::source::{Article, KnowledgeSource, LookupError};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    query: Option<PageQuery>,
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    #[serde(default)]
    pages: HashMap<String, Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    missing: Option<serde_json::Value>,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    pageprops: Option<HashMap<String, serde_json::Value>>,
    #[serde(default)]
    links: Vec<Link>,
}

#[derive(Debug, Deserialize)]
struct Link {
    ns: i64,
    title: String,
}

/// Wikipedia in a given language
#[derive(Debug)]
pub struct WikipediaSource {
    endpoint: String,
    client: reqwest::Client,
}

impl WikipediaSource {
    /// English Wikipedia
    pub fn new() -> Self {
        Self::with_language("en", Duration::from_secs(10))
    }

    pub fn with_language(lang: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("agora/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self {
            endpoint: format!("https://{}.wikipedia.org/w/api.php", lang),
            client,
        }
    }

    async fn query<T: for<'de> Deserialize<'de>>(
        &self,
        params: &[(&str, &str)],
    ) -> Result<T, LookupError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("action", "query"), ("format", "json")])
            .query(params)
            .send()
            .await
            .map_err(|e| LookupError::Service(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LookupError::Service(format!("Status: {}", response.status())));
        }

        response
            .json()
            .await
            .map_err(|e| LookupError::Service(e.to_string()))
    }

    async fn disambiguation_options(&self, title: &str) -> Result<Vec<String>, LookupError> {
        let response: PageResponse = self
            .query(&[
                ("prop", "links"),
                ("titles", title),
                ("plnamespace", "0"),
                ("pllimit", "max"),
            ])
            .await?;

        Ok(response
            .query
            .into_iter()
            .flat_map(|q| q.pages.into_values())
            .flat_map(|p| p.links)
            .filter(|l| l.ns == 0)
            .map(|l| l.title)
            .collect())
    }
}

impl Default for WikipediaSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KnowledgeSource for WikipediaSource {
    fn name(&self) -> &str {
        "wikipedia"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, LookupError> {
        let limit = limit.to_string();
        let response: SearchResponse = self
            .query(&[
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", &limit),
                ("srprop", ""),
            ])
            .await?;

        Ok(response
            .query
            .map(|q| q.search.into_iter().map(|h| h.title).collect())
            .unwrap_or_default())
    }

    async fn fetch_summary(&self, title: &str, sentences: usize) -> Result<Article, LookupError> {
        let sentences = sentences.to_string();
        let response: PageResponse = self
            .query(&[
                ("prop", "extracts|pageprops"),
                ("titles", title),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("exsentences", &sentences),
                ("redirects", "1"),
            ])
            .await?;

        let page = response
            .query
            .and_then(|q| q.pages.into_values().next())
            .ok_or_else(|| LookupError::NotFound(title.to_string()))?;

        if page.missing.is_some() {
            return Err(LookupError::NotFound(title.to_string()));
        }

        let disambiguation = page
            .pageprops
            .as_ref()
            .is_some_and(|props| props.contains_key("disambiguation"));
        if disambiguation {
            let options = self.disambiguation_options(&page.title).await?;
            return Err(LookupError::Ambiguous {
                title: page.title,
                options,
            });
        }

        match page.extract {
            Some(summary) if !summary.trim().is_empty() => Ok(Article {
                title: page.title,
                summary: summary.trim().to_string(),
            }),
            _ => Err(LookupError::NotFound(title.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_disambiguation_page() {
        let raw = r#"{"query": {"pages": {"123": {
            "pageid": 123, "title": "Jaguar",
            "extract": "Jaguar may refer to:",
            "pageprops": {"disambiguation": ""}
        }}}}"#;
        let parsed: PageResponse = serde_json::from_str(raw).unwrap();
        let page = parsed.query.unwrap().pages.into_values().next().unwrap();
        assert!(page.pageprops.unwrap().contains_key("disambiguation"));
        assert!(page.missing.is_none());
    }

    #[test]
    fn test_parse_missing_page() {
        let raw = r#"{"query": {"pages": {"-1": {"ns": 0, "title": "Nope", "missing": ""}}}}"#;
        let parsed: PageResponse = serde_json::from_str(raw).unwrap();
        let page = parsed.query.unwrap().pages.into_values().next().unwrap();
        assert!(page.missing.is_some());
    }

    #[test]
    fn test_endpoint_language() {
        let source = WikipediaSource::with_language("de", Duration::from_secs(5));
        assert_eq!(source.endpoint, "https://de.wikipedia.org/w/api.php");
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_live_search() {
        let source = WikipediaSource::new();
        let titles = source.search("climate change", 5).await.unwrap();
        assert!(!titles.is_empty());
    }
}
