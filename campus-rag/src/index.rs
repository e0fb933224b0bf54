//! Exact nearest-neighbour index under squared Euclidean distance.
//!
//! [`FlatL2Index`] stores vectors contiguously and answers k-NN queries by
//! brute force. It is immutable once built: a rebuild produces a new index
//! that callers swap in, so readers never see a partially-populated one.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// One k-NN hit: a corpus position and its squared L2 distance to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Position of the vector in build order.
    pub position: usize,
    /// `sum((a_i - b_i)^2)`.
    pub distance: f32,
}

/// Squared Euclidean distance between two equal-length vectors.
///
/// Callers must check lengths; extra elements in the longer slice are ignored.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Ascending distance, NaN last, ties by ascending position.
fn neighbor_order(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance
        .is_nan()
        .cmp(&b.distance.is_nan())
        .then_with(|| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal))
        .then_with(|| a.position.cmp(&b.position))
}

/// A brute-force L2 index over fixed-dimension vectors.
#[derive(Debug, Clone)]
pub struct FlatL2Index {
    dimensions: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    /// Build an index from `vectors`, stored in the given order.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmptyIndex`] if `vectors` is empty.
    /// - [`RagError::DimensionMismatch`] if any vector's length differs from
    ///   the first one's, or if the first vector is empty.
    pub fn build(vectors: Vec<Vec<f32>>) -> Result<Self> {
        let dimensions = vectors.first().map(Vec::len).ok_or(RagError::EmptyIndex)?;
        if dimensions == 0 {
            return Err(RagError::DimensionMismatch { expected: 1, actual: 0 });
        }

        let mut data = Vec::with_capacity(dimensions * vectors.len());
        for vector in &vectors {
            if vector.len() != dimensions {
                let actual = vector.len();
                return Err(RagError::DimensionMismatch { expected: dimensions, actual });
            }
            data.extend_from_slice(vector);
        }

        Ok(Self { dimensions, data })
    }

    /// Return up to `k` nearest vectors to `query`, closest first.
    ///
    /// Returns fewer than `k` entries when the index holds fewer vectors, and
    /// none when `k` is zero.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] if `query` has the wrong length.
    pub fn knn(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimensions {
            let actual = query.len();
            return Err(RagError::DimensionMismatch { expected: self.dimensions, actual });
        }

        let mut neighbors: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimensions)
            .enumerate()
            .map(|(position, vector)| Neighbor { position, distance: squared_l2(vector, query) })
            .collect();

        let k = k.min(neighbors.len());
        if k == 0 {
            return Ok(Vec::new());
        }
        if k < neighbors.len() {
            neighbors.select_nth_unstable_by(k - 1, neighbor_order);
            neighbors.truncate(k);
        }
        neighbors.sort_unstable_by(neighbor_order);
        Ok(neighbors)
    }

    /// Stored vector at `position`.
    #[cfg(test)]
    pub(crate) fn vector(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dimensions)?;
        self.data.get(start..start + self.dimensions)
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.data.len() / self.dimensions
    }

    /// Always `false` for a successfully built index.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Dimensionality shared by every stored vector.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}
