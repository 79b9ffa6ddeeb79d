//! Semantic Similarity Lookup
//!
//! The contextual engine asks an external collaborator for items related to
//! the one just reviewed so they can be interleaved. The lookup is optional
//! and any failure falls back to the item's own related ids.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Request for items similar to `item_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityQuery {
    /// Item to find neighbours of
    pub item_id: String,
    /// Maximum number of results
    pub limit: usize,
    /// Minimum similarity in `[0, 1]`
    pub min_similarity: f64,
}

/// One neighbour returned by the lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarItem {
    /// Neighbour identifier
    pub item_id: String,
    /// Similarity in `[0, 1]`
    pub similarity: f64,
}

/// Lookup failure. Never surfaced to callers of the scheduler.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimilarityError {
    /// No index available for this item or deployment
    #[error("Similarity lookup unavailable: {0}")]
    Unavailable(String),
    /// Backend returned an error
    #[error("Similarity backend error: {0}")]
    Backend(String),
    /// Lookup did not answer in time
    #[error("Similarity lookup timed out after {0:?}")]
    Timeout(Duration),
}

/// External semantic-similarity collaborator
#[async_trait]
pub trait SimilarityLookup: Send + Sync {
    /// Neighbours of `query.item_id`, most similar first
    async fn find_similar(&self, query: SimilarityQuery)
    -> Result<Vec<SimilarItem>, SimilarityError>;
}

/// Keep neighbours at or above the threshold, most similar first, capped at
/// the limit. Applied to whatever a collaborator returns.
pub fn select_neighbours(mut items: Vec<SimilarItem>, query: &SimilarityQuery) -> Vec<String> {
    items.retain(|item| item.similarity >= query.min_similarity && item.item_id != query.item_id);
    items.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    items
        .into_iter()
        .take(query.limit)
        .map(|item| item.item_id)
        .collect()
}

// ============================================================================
// IN-MEMORY INDEX
// ============================================================================

/// Precomputed neighbour lists held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemorySimilarity {
    neighbours: HashMap<String, Vec<SimilarItem>>,
}

impl InMemorySimilarity {
    /// Empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a symmetric similarity between two items
    pub fn link(&mut self, a: &str, b: &str, similarity: f64) {
        self.neighbours
            .entry(a.to_string())
            .or_default()
            .push(SimilarItem {
                item_id: b.to_string(),
                similarity,
            });
        self.neighbours
            .entry(b.to_string())
            .or_default()
            .push(SimilarItem {
                item_id: a.to_string(),
                similarity,
            });
    }

    /// Number of indexed items
    pub fn len(&self) -> usize {
        self.neighbours.len()
    }

    /// True when nothing is indexed
    pub fn is_empty(&self) -> bool {
        self.neighbours.is_empty()
    }
}

#[async_trait]
impl SimilarityLookup for InMemorySimilarity {
    async fn find_similar(
        &self,
        query: SimilarityQuery,
    ) -> Result<Vec<SimilarItem>, SimilarityError> {
        let neighbours = self
            .neighbours
            .get(&query.item_id)
            .ok_or_else(|| SimilarityError::Unavailable(format!("{} not indexed", query.item_id)))?;

        let mut matches: Vec<SimilarItem> = neighbours
            .iter()
            .filter(|n| n.similarity >= query.min_similarity)
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        matches.truncate(query.limit);
        Ok(matches)
    }
}
