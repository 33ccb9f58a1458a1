//! Embedding store used to retrieve lore and entity context for AI prompts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::EntityType;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VectorStoreError {
    #[error("vector has dimension {found}, store expects {expected}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("store holds {vectors} vectors but {metadata} metadata records")]
    LengthMismatch { vectors: usize, metadata: usize },
}

/// What an embedding was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMetadata {
    pub entity_id: String,
    pub entity_type: EntityType,
    pub text: String,
}

/// A retrieval hit.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMetadata<'a> {
    pub metadata: &'a VectorMetadata,
    pub score: f32,
}

/// Parallel arrays of embeddings and the records they describe.
///
/// `vectors[i]` is the embedding of `metadata[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct VectorStore {
    vectors: Vec<Vec<f32>>,
    metadata: Vec<VectorMetadata>,
}

impl VectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    /// Dimension of stored vectors, if any are stored.
    pub fn dimension(&self) -> Option<usize> {
        self.vectors.first().map(Vec::len)
    }

    pub fn metadata(&self) -> &[VectorMetadata] {
        &self.metadata
    }

    /// Add an embedding. Replaces an existing entry for the same entity.
    pub fn insert(
        &mut self,
        vector: Vec<f32>,
        metadata: VectorMetadata,
    ) -> Result<(), VectorStoreError> {
        if let Some(expected) = self.dimension() {
            if vector.len() != expected {
                return Err(VectorStoreError::DimensionMismatch {
                    expected,
                    found: vector.len(),
                });
            }
        }

        if let Some(pos) = self
            .metadata
            .iter()
            .position(|m| m.entity_id == metadata.entity_id && m.entity_type == metadata.entity_type)
        {
            self.vectors[pos] = vector;
            self.metadata[pos] = metadata;
        } else {
            self.vectors.push(vector);
            self.metadata.push(metadata);
        }
        Ok(())
    }

    /// Remove every record of an entity. Returns how many were removed.
    pub fn remove_entity(&mut self, entity_id: &str) -> usize {
        let before = self.metadata.len();
        let mut keep = self.metadata.iter().map(|m| m.entity_id != entity_id);
        self.vectors.retain(|_| keep.next().unwrap_or(true));
        self.metadata.retain(|m| m.entity_id != entity_id);
        before - self.metadata.len()
    }

    /// Check the parallel-array invariants, e.g. after loading a save.
    pub fn validate(&self) -> Result<(), VectorStoreError> {
        if self.vectors.len() != self.metadata.len() {
            return Err(VectorStoreError::LengthMismatch {
                vectors: self.vectors.len(),
                metadata: self.metadata.len(),
            });
        }
        if let Some(expected) = self.dimension() {
            if let Some(bad) = self.vectors.iter().find(|v| v.len() != expected) {
                return Err(VectorStoreError::DimensionMismatch {
                    expected,
                    found: bad.len(),
                });
            }
        }
        Ok(())
    }

    /// The `k` records most similar to `query` by cosine similarity.
    ///
    /// Ties keep insertion order. Vectors of the wrong dimension are skipped.
    pub fn top_k(&self, query: &[f32], k: usize) -> Vec<ScoredMetadata<'_>> {
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .filter(|(_, v)| v.len() == query.len())
            .map(|(i, v)| (i, cosine_similarity(query, v)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        scored
            .into_iter()
            .take(k)
            .filter_map(|(i, score)| {
                self.metadata
                    .get(i)
                    .map(|metadata| ScoredMetadata { metadata, score })
            })
            .collect()
    }
}

/// Cosine similarity; 0.0 when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(id: &str) -> VectorMetadata {
        VectorMetadata {
            entity_id: id.into(),
            entity_type: EntityType::Lore,
            text: format!("lore {}", id),
        }
    }

    #[test]
    fn test_top_k_orders_by_similarity() {
        let mut store = VectorStore::new();
        store.insert(vec![1.0, 0.0], meta("east")).unwrap();
        store.insert(vec![0.0, 1.0], meta("north")).unwrap();
        store.insert(vec![0.7, 0.7], meta("north-east")).unwrap();

        let hits = store.top_k(&[1.0, 0.1], 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].metadata.entity_id, "east");
        assert_eq!(hits[1].metadata.entity_id, "north-east");
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut store = VectorStore::new();
        store.insert(vec![1.0, 0.0], meta("a")).unwrap();
        store.insert(vec![2.0, 0.0], meta("b")).unwrap();

        let hits = store.top_k(&[1.0, 0.0], 2);
        assert_eq!(hits[0].metadata.entity_id, "a");
        assert_eq!(hits[1].metadata.entity_id, "b");
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut store = VectorStore::new();
        store.insert(vec![1.0, 0.0], meta("a")).unwrap();
        let err = store.insert(vec![1.0], meta("b")).unwrap_err();
        assert_eq!(
            err,
            VectorStoreError::DimensionMismatch {
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_reinsert_replaces_and_remove_keeps_arrays_parallel() {
        let mut store = VectorStore::new();
        store.insert(vec![1.0, 0.0], meta("a")).unwrap();
        store.insert(vec![0.0, 1.0], meta("b")).unwrap();
        store.insert(vec![0.5, 0.5], meta("a")).unwrap();
        assert_eq!(store.len(), 2);

        assert_eq!(store.remove_entity("a"), 1);
        assert!(store.validate().is_ok());
        let hits = store.top_k(&[0.0, 1.0], 5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata.entity_id, "b");
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
