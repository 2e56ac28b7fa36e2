//! Raw and normalised edge weights
//!
//! Both matrices are dense `n × n`, indexed `[v][u]` for the weight of the
//! edge `v -> u`. Every column of the normalised matrix sums to one over the
//! node's neighbours plus itself.

use rand::Rng;
use tracing::warn;

use murmur_core::{NodeIndex, WeightMode};

use crate::graph::Graph;

/// Weight a node gives its own opinion
pub const SELF_WEIGHT: f64 = 1.0;

/// Allowed drift of a normalised column sum from one
pub const NORMALIZATION_TOLERANCE: f64 = 1e-5;

/// Draw a raw weight for a new edge
pub fn draw_weight<R: Rng + ?Sized>(mode: WeightMode, rng: &mut R) -> f64 {
    match mode {
        WeightMode::Fixed(w) => w,
        WeightMode::Random => rng.random::<f64>(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeightModel {
    n: usize,
    raw: Vec<f64>,
    normalized: Vec<f64>,
}

impl WeightModel {
    /// All-zero weights for `n` nodes
    pub fn new(n: usize) -> Self {
        Self {
            n,
            raw: vec![0.0; n * n],
            normalized: vec![0.0; n * n],
        }
    }

    fn index(&self, from: NodeIndex, to: NodeIndex) -> usize {
        from * self.n + to
    }

    /// Raw weight of the edge `from -> to`
    pub fn raw(&self, from: NodeIndex, to: NodeIndex) -> f64 {
        self.raw[self.index(from, to)]
    }

    /// Normalised weight of the edge `from -> to`
    pub fn normalized(&self, from: NodeIndex, to: NodeIndex) -> f64 {
        self.normalized[self.index(from, to)]
    }

    pub fn set_raw(&mut self, from: NodeIndex, to: NodeIndex, weight: f64) {
        let idx = self.index(from, to);
        self.raw[idx] = weight;
    }

    /// Assign weights to every edge of a freshly generated graph
    pub fn initialize<R: Rng + ?Sized>(&mut self, graph: &Graph, mode: WeightMode, rng: &mut R) {
        // Undirected edges are listed once and share one draw
        for (from, to) in graph.edges() {
            let weight = draw_weight(mode, rng);
            self.set_raw(from, to, weight);
            if !graph.is_directed() {
                self.set_raw(to, from, weight);
            }
        }

        for node in 0..self.n {
            self.set_raw(node, node, SELF_WEIGHT);
        }
        for node in 0..self.n {
            self.update_column(graph, node);
        }

        self.check_normalization();
    }

    /// Recompute the normalised column of `node` from its raw incoming weights
    pub fn update_column(&mut self, graph: &Graph, node: NodeIndex) {
        for from in 0..self.n {
            let idx = self.index(from, node);
            self.normalized[idx] = 0.0;
        }

        let total = self.raw(node, node)
            + graph
                .neighbors(node)
                .iter()
                .map(|&from| self.raw(from, node))
                .sum::<f64>();
        if total <= 0.0 {
            warn!(node, total, "non-positive weight total; keeping only self weight");
            let idx = self.index(node, node);
            self.normalized[idx] = 1.0;
            return;
        }

        for &from in graph.neighbors(node) {
            let idx = self.index(from, node);
            self.normalized[idx] = self.raw[idx] / total;
        }
        let idx = self.index(node, node);
        self.normalized[idx] = self.raw[idx] / total;
    }

    /// Sum of a normalised column
    pub fn column_sum(&self, node: NodeIndex) -> f64 {
        (0..self.n).map(|from| self.normalized(from, node)).sum()
    }

    /// Columns whose normalised sum drifted from one; each is logged
    pub fn check_normalization(&self) -> Vec<(NodeIndex, f64)> {
        let drifted: Vec<(NodeIndex, f64)> = (0..self.n)
            .map(|node| (node, self.column_sum(node)))
            .filter(|(_, sum)| (sum - 1.0).abs() > NORMALIZATION_TOLERANCE)
            .collect();
        for (node, sum) in &drifted {
            warn!(node, sum, "weights are not normalized");
        }
        drifted
    }
}
