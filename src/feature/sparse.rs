//! Sparse feature vectors.

use serde::{Deserialize, Serialize};

/// A sparse vector with sorted, unique column indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    dim: usize,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl SparseVector {
    /// Create an all-zero vector of dimension `dim`.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Create an empty vector with room for `capacity` non-zero entries.
    pub fn with_capacity(dim: usize, capacity: usize) -> Self {
        Self {
            dim,
            indices: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    /// Build from unordered `(index, value)` pairs.
    ///
    /// Pairs are sorted by index, duplicates are summed, zeros and
    /// out-of-range indices are dropped.
    pub fn from_pairs(dim: usize, mut pairs: Vec<(usize, f64)>) -> Self {
        pairs.sort_by_key(|(idx, _)| *idx);
        let mut vector = Self::with_capacity(dim, pairs.len());
        for (idx, value) in pairs {
            if idx >= dim {
                continue;
            }
            match vector.indices.last() {
                Some(&last) if last == idx => {
                    if let Some(v) = vector.values.last_mut() {
                        *v += value;
                    }
                }
                _ => {
                    vector.indices.push(idx);
                    vector.values.push(value);
                }
            }
        }
        vector.prune_zeros();
        vector
    }

    /// Append an entry. `idx` must be greater than every index already present.
    pub(crate) fn push(&mut self, idx: usize, value: f64) {
        debug_assert!(idx < self.dim);
        debug_assert!(self.indices.last().is_none_or(|&last| last < idx));
        if value != 0.0 {
            self.indices.push(idx);
            self.values.push(value);
        }
    }

    fn prune_zeros(&mut self) {
        let mut keep = 0;
        for i in 0..self.indices.len() {
            if self.values[i] != 0.0 {
                self.indices[keep] = self.indices[i];
                self.values[keep] = self.values[i];
                keep += 1;
            }
        }
        self.indices.truncate(keep);
        self.values.truncate(keep);
    }

    /// Logical dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored non-zero entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Iterate `(index, value)` in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Value at `idx` (zero when absent).
    pub fn get(&self, idx: usize) -> f64 {
        self.indices
            .binary_search(&idx)
            .map_or(0.0, |pos| self.values[pos])
    }

    /// Dot product with a dense weight vector. Indices past its end count as zero.
    pub fn dot(&self, weights: &[f64]) -> f64 {
        self.iter()
            .filter_map(|(idx, value)| weights.get(idx).map(|w| w * value))
            .sum()
    }

    /// Squared Euclidean norm.
    pub fn squared_norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum()
    }

    /// Scale every entry so the vector has unit Euclidean norm (no-op for zero vectors).
    pub fn l2_normalize(&mut self) {
        let norm = self.squared_norm().sqrt();
        if norm > 0.0 {
            for value in &mut self.values {
                *value /= norm;
            }
        }
    }

    /// Keep only columns below `limit`, shrinking the dimension to `limit`.
    pub fn truncate(&self, limit: usize) -> SparseVector {
        let limit = limit.min(self.dim);
        let mut out = SparseVector::with_capacity(limit, self.nnz());
        for (idx, value) in self.iter().take_while(|(idx, _)| *idx < limit) {
            out.push(idx, value);
        }
        out
    }

    /// Dense copy.
    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.dim];
        for (idx, value) in self.iter() {
            dense[idx] = value;
        }
        dense
    }
}
