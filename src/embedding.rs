//! Precomputed example embeddings for demonstration filtering.
//!
//! The embedding model itself is an external collaborator: callers load the
//! per-split matrices however they like (the conventional file layout is
//! `{split}_{model}.npy` next to the data, see
//! [`SplitMode::embedding_split_name`](crate::data::SplitMode::embedding_split_name))
//! and hand them over as row-per-example matrices.

use ndarray::{Array2, ArrayView1};

use crate::error::{PlantillaError, Result};

/// Support-pool and query-pool embeddings, one row per example.
#[derive(Debug, Clone)]
pub struct EmbeddingStore {
    support: Array2<f32>,
    query: Array2<f32>,
}

impl EmbeddingStore {
    /// Wrap precomputed matrices.
    #[must_use]
    pub fn new(support: Array2<f32>, query: Array2<f32>) -> Self {
        Self { support, query }
    }

    /// Check row counts against the example pools.
    ///
    /// # Errors
    ///
    /// [`PlantillaError::EmbeddingShapeMismatch`] when either matrix does
    /// not have one row per pool example.
    pub fn validate(&self, support_examples: usize, query_examples: usize) -> Result<()> {
        if self.support.nrows() != support_examples {
            return Err(PlantillaError::EmbeddingShapeMismatch {
                pool: "support",
                rows: self.support.nrows(),
                examples: support_examples,
            });
        }
        if self.query.nrows() != query_examples {
            return Err(PlantillaError::EmbeddingShapeMismatch {
                pool: "query",
                rows: self.query.nrows(),
                examples: query_examples,
            });
        }
        Ok(())
    }

    /// Embedding of support example `index`.
    #[must_use]
    pub fn support(&self, index: usize) -> ArrayView1<'_, f32> {
        self.support.row(index)
    }

    /// Embedding of query example `index`.
    #[must_use]
    pub fn query(&self, index: usize) -> ArrayView1<'_, f32> {
        self.query.row(index)
    }
}

/// Cosine similarity between two embedding vectors.
///
/// Zero vectors score 0 rather than NaN.
#[must_use]
pub fn cosine_similarity(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f32 {
    let dot = a.dot(&b);
    let norm = a.dot(&a).sqrt() * b.dot(&b).sqrt();
    if norm == 0.0 {
        0.0
    } else {
        dot / norm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_cosine_similarity_parallel_and_orthogonal() {
        let a = array![1.0, 0.0];
        let b = array![2.0, 0.0];
        let c = array![0.0, 3.0];
        assert_relative_eq!(cosine_similarity(a.view(), b.view()), 1.0);
        assert_relative_eq!(cosine_similarity(a.view(), c.view()), 0.0);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let a = array![1.0, 1.0];
        let b = array![-1.0, -1.0];
        assert_relative_eq!(cosine_similarity(a.view(), b.view()), -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_similarity_zero_vector_guard() {
        let a = array![0.0, 0.0];
        let b = array![1.0, 2.0];
        assert_eq!(cosine_similarity(a.view(), b.view()), 0.0);
    }

    #[test]
    fn test_store_validation() {
        let store = EmbeddingStore::new(Array2::zeros((3, 4)), Array2::zeros((2, 4)));
        assert!(store.validate(3, 2).is_ok());
        assert!(matches!(
            store.validate(4, 2).unwrap_err(),
            PlantillaError::EmbeddingShapeMismatch { pool: "support", rows: 3, examples: 4 }
        ));
        assert!(matches!(
            store.validate(3, 5).unwrap_err(),
            PlantillaError::EmbeddingShapeMismatch { pool: "query", .. }
        ));
    }
}
