//! Vector store contract and retrieval value types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Metadata carried with a stored passage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PassageMetadata {
    /// Passage title (e.g., project name).
    pub title: String,
    /// Where the passage came from.
    pub source: String,
    /// Optional link to the source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Passage kind (e.g., "precedent", "principle", "standard").
    pub kind: String,
}

/// A passage returned by the vector store, with its raw distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPassage {
    /// Passage text.
    pub content: String,
    /// Passage metadata.
    pub metadata: PassageMetadata,
    /// Raw distance from the query; similarity is `1 - distance`.
    pub distance: f64,
}

/// A ranked passage as the agents consume it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPassage {
    /// Passage text.
    pub content: String,
    /// Passage metadata.
    pub metadata: PassageMetadata,
    /// Similarity to the query, in [0,1].
    pub similarity: f64,
}

impl From<StoredPassage> for RankedPassage {
    fn from(passage: StoredPassage) -> Self {
        Self {
            content: passage.content,
            metadata: passage.metadata,
            similarity: (1.0 - passage.distance).clamp(0.0, 1.0),
        }
    }
}

/// Opaque vector-store contract consumed by the retriever.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Searches the store for the `k` nearest passages to the query text.
    ///
    /// # Errors
    /// Returns an error string when the store is unreachable; the retriever
    /// recovers locally and never surfaces this to the learner.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<StoredPassage>, String>;
}

/// A small in-memory store scored by keyword overlap. Backs the offline
/// tests and doubles as a seedable default when no external store is wired.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    passages: Vec<(String, PassageMetadata)>,
}

impl InMemoryVectorStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { passages: Vec::new() }
    }

    /// Adds a passage to the store.
    pub fn add<S: Into<String>>(&mut self, content: S, metadata: PassageMetadata) {
        self.passages.push((content.into(), metadata));
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<StoredPassage>, String> {
        let query_words: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if query_words.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<StoredPassage> = self
            .passages
            .iter()
            .filter_map(|(content, metadata)| {
                let lower = content.to_lowercase();
                let hits =
                    query_words.iter().filter(|w| lower.contains(w.as_str())).count();
                if hits == 0 {
                    return None;
                }
                let similarity = hits as f64 / query_words.len() as f64;
                Some(StoredPassage {
                    content: content.clone(),
                    metadata: metadata.clone(),
                    distance: 1.0 - similarity,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_is_one_minus_distance() {
        let passage = StoredPassage {
            content: "courtyards temper climate".to_string(),
            metadata: PassageMetadata::default(),
            distance: 0.25,
        };
        let ranked = RankedPassage::from(passage);
        assert!((ranked.similarity - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_similarity_clamped_to_unit_interval() {
        let passage = StoredPassage {
            content: "x".to_string(),
            metadata: PassageMetadata::default(),
            distance: 1.7,
        };
        assert_eq!(RankedPassage::from(passage).similarity, 0.0);
    }

    #[tokio::test]
    async fn test_in_memory_store_ranks_by_overlap() {
        let mut store = InMemoryVectorStore::new();
        store.add(
            "Courtyard circulation in community centers",
            PassageMetadata { title: "A".to_string(), ..PassageMetadata::default() },
        );
        store.add(
            "Structural timber detailing",
            PassageMetadata { title: "B".to_string(), ..PassageMetadata::default() },
        );

        let results = store.search("courtyard circulation", 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].metadata.title, "A");
        assert!(results[0].distance < 0.5);
    }

    #[tokio::test]
    async fn test_empty_query_returns_nothing() {
        let store = InMemoryVectorStore::new();
        assert!(store.search("", 5).await.unwrap().is_empty());
    }
}
