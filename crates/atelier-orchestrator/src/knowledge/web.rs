//! Web search contract.
//!
//! Providers are tried in a fixed order; each may return empty and each
//! failure is recovered locally. Only sanitized queries reach a provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A single web search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebResult {
    /// Page title.
    pub title: String,
    /// Result snippet.
    pub snippet: String,
    /// Page URL.
    pub url: String,
    /// Which provider produced the hit.
    pub source: String,
}

/// Opaque web-search contract consumed by the retriever.
#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    /// Provider name for telemetry and provenance.
    fn name(&self) -> &str;

    /// Searches the web for up to `k` results.
    ///
    /// # Errors
    /// Returns an error string on transport failure; the retriever moves on
    /// to the next provider.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<WebResult>, String>;
}

/// Queries the providers in order, collecting at most `k` results. Empty
/// returns and failures both fall through to the next provider.
pub async fn search_providers(
    providers: &[std::sync::Arc<dyn WebSearchProvider>],
    query: &str,
    k: usize,
) -> Vec<WebResult> {
    for provider in providers {
        match provider.search(query, k).await {
            Ok(results) if !results.is_empty() => {
                return results.into_iter().take(k).collect();
            }
            Ok(_) => {}
            Err(e) => {
                warn!(provider = provider.name(), error = %e, "web search provider failed");
            }
        }
    }
    Vec::new()
}

/// A provider serving fixed results; used in tests and offline demos.
#[derive(Debug, Default)]
pub struct StaticWebSearch {
    name: String,
    results: Vec<WebResult>,
}

impl StaticWebSearch {
    /// Creates a provider that always returns the given results.
    #[must_use]
    pub fn new<S: Into<String>>(name: S, results: Vec<WebResult>) -> Self {
        Self { name: name.into(), results }
    }
}

#[async_trait]
impl WebSearchProvider for StaticWebSearch {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, _query: &str, k: usize) -> Result<Vec<WebResult>, String> {
        Ok(self.results.iter().take(k).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct FailingProvider;

    #[async_trait]
    impl WebSearchProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        async fn search(&self, _query: &str, _k: usize) -> Result<Vec<WebResult>, String> {
            Err("connection refused".to_string())
        }
    }

    fn hit(title: &str) -> WebResult {
        WebResult {
            title: title.to_string(),
            snippet: "snippet".to_string(),
            url: format!("https://example.org/{title}"),
            source: "static".to_string(),
        }
    }

    #[tokio::test]
    async fn test_falls_through_failed_and_empty_providers() {
        let providers: Vec<Arc<dyn WebSearchProvider>> = vec![
            Arc::new(FailingProvider),
            Arc::new(StaticWebSearch::new("empty", Vec::new())),
            Arc::new(StaticWebSearch::new("third", vec![hit("tate-modern")])),
        ];
        let results = search_providers(&providers, "adaptive reuse", 5).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "tate-modern");
    }

    #[tokio::test]
    async fn test_respects_result_cap() {
        let providers: Vec<Arc<dyn WebSearchProvider>> = vec![Arc::new(StaticWebSearch::new(
            "many",
            (0..10).map(|i| hit(&format!("p{i}"))).collect(),
        ))];
        let results = search_providers(&providers, "q", 5).await;
        assert_eq!(results.len(), 5);
    }

    #[tokio::test]
    async fn test_all_providers_exhausted_returns_empty() {
        let providers: Vec<Arc<dyn WebSearchProvider>> = vec![Arc::new(FailingProvider)];
        assert!(search_providers(&providers, "q", 5).await.is_empty());
    }
}
