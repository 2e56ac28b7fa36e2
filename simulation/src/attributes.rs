//! Attribute space: the true opinion vectors of every node

use rand::Rng;

use murmur_core::{NodeIndex, Opinion};

/// Dense `n × k` matrix of `±1` opinions plus the `k × k` correlation matrix
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSpace {
    dimensions: usize,
    values: Vec<Opinion>,
    /// Carried for export; currently always the identity
    correlations: Vec<Vec<f64>>,
}

impl AttributeSpace {
    /// Draw every coordinate independently and uniformly from `{-1, +1}`
    pub fn random<R: Rng + ?Sized>(n: usize, dimensions: usize, rng: &mut R) -> Self {
        let values = (0..n * dimensions)
            .map(|_| if rng.random::<bool>() { 1 } else { -1 })
            .collect();
        Self {
            dimensions,
            values,
            correlations: identity(dimensions),
        }
    }

    /// Build from explicit rows; every row must have `dimensions` entries
    pub fn from_rows(rows: &[Vec<Opinion>], dimensions: usize, correlations: Vec<Vec<f64>>) -> Self {
        let values = rows.iter().flat_map(|row| row.iter().copied()).collect();
        Self {
            dimensions,
            values,
            correlations,
        }
    }

    pub fn node_count(&self) -> usize {
        self.values.len().checked_div(self.dimensions).unwrap_or(0)
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn correlations(&self) -> &[Vec<f64>] {
        &self.correlations
    }

    /// Opinion vector of a node
    pub fn opinion(&self, node: NodeIndex) -> &[Opinion] {
        let start = node * self.dimensions;
        &self.values[start..start + self.dimensions]
    }

    pub fn set_opinion(&mut self, node: NodeIndex, values: &[Opinion]) {
        let start = node * self.dimensions;
        self.values[start..start + self.dimensions].copy_from_slice(values);
    }

    /// Flip one coordinate and return its new value
    pub fn flip(&mut self, node: NodeIndex, dim: usize) -> Opinion {
        let slot = &mut self.values[node * self.dimensions + dim];
        *slot = -*slot;
        *slot
    }

    /// All opinion vectors, one row per node
    pub fn rows(&self) -> Vec<Vec<Opinion>> {
        if self.dimensions == 0 {
            return Vec::new();
        }
        self.values.chunks(self.dimensions).map(<[Opinion]>::to_vec).collect()
    }

    /// Per-coordinate mean over the given nodes; zeros for an empty set
    pub fn average_over(&self, nodes: impl IntoIterator<Item = NodeIndex>) -> Vec<f64> {
        let mut sums = vec![0.0; self.dimensions];
        let mut count = 0usize;
        for node in nodes {
            for (sum, &value) in sums.iter_mut().zip(self.opinion(node)) {
                *sum += f64::from(value);
            }
            count += 1;
        }
        if count > 0 {
            for sum in &mut sums {
                *sum /= count as f64;
            }
        }
        sums
    }

    /// Per-coordinate mean over every node
    pub fn global_average(&self) -> Vec<f64> {
        self.average_over(0..self.node_count())
    }
}

pub(crate) fn identity(dimensions: usize) -> Vec<Vec<f64>> {
    (0..dimensions)
        .map(|i| (0..dimensions).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect()
}
