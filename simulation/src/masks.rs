//! Perception masks
//!
//! `M[observer][subject]` is what `observer` perceives of `subject`'s opinion:
//! per coordinate either `0` (hidden) or the true value. Only neighbours and
//! the node itself carry nonzero entries; a node always sees itself fully.

use rand::Rng;

use murmur_core::{NodeIndex, Opinion, Visibility};

use crate::attributes::AttributeSpace;
use crate::graph::Graph;

#[derive(Debug, Clone, PartialEq)]
pub struct MaskModel {
    n: usize,
    dimensions: usize,
    values: Vec<Opinion>,
}

impl MaskModel {
    /// All-hidden masks for `n` nodes with `dimensions` coordinates
    pub fn new(n: usize, dimensions: usize) -> Self {
        Self {
            n,
            dimensions,
            values: vec![0; n * n * dimensions],
        }
    }

    fn offset(&self, observer: NodeIndex, subject: NodeIndex) -> usize {
        (observer * self.n + subject) * self.dimensions
    }

    /// What `observer` perceives of `subject`
    pub fn row(&self, observer: NodeIndex, subject: NodeIndex) -> &[Opinion] {
        let start = self.offset(observer, subject);
        &self.values[start..start + self.dimensions]
    }

    fn row_mut(&mut self, observer: NodeIndex, subject: NodeIndex) -> &mut [Opinion] {
        let start = self.offset(observer, subject);
        let end = start + self.dimensions;
        &mut self.values[start..end]
    }

    pub fn get(&self, observer: NodeIndex, subject: NodeIndex, dim: usize) -> Opinion {
        self.row(observer, subject)[dim]
    }

    pub fn set(&mut self, observer: NodeIndex, subject: NodeIndex, dim: usize, value: Opinion) {
        self.row_mut(observer, subject)[dim] = value;
    }

    /// Which coordinates of `subject` are visible to `observer`
    pub fn revealed(&self, observer: NodeIndex, subject: NodeIndex) -> Vec<bool> {
        self.row(observer, subject).iter().map(|&v| v != 0).collect()
    }

    /// A node sees its own opinion in full
    pub fn set_self(&mut self, node: NodeIndex, truth: &[Opinion]) {
        self.row_mut(node, node).copy_from_slice(truth);
    }

    /// Set a fresh perception of `subject` according to the visibility rule
    pub fn perceive<R: Rng + ?Sized>(
        &mut self,
        observer: NodeIndex,
        subject: NodeIndex,
        truth: &[Opinion],
        visibility: Visibility,
        rng: &mut R,
    ) {
        let row = self.row_mut(observer, subject);
        match visibility {
            Visibility::Visible => row.copy_from_slice(truth),
            Visibility::Random => {
                for (slot, &value) in row.iter_mut().zip(truth) {
                    *slot = if rng.random_bool(0.5) { value } else { 0 };
                }
            }
        }
    }

    /// Hide everything `observer` perceives of `subject`
    pub fn clear(&mut self, observer: NodeIndex, subject: NodeIndex) {
        self.row_mut(observer, subject).fill(0);
    }

    /// Keep every revealed entry about `subject` in step with its true value
    pub fn sync_coordinate(&mut self, subject: NodeIndex, dim: usize, value: Opinion) {
        for observer in 0..self.n {
            let offset = self.offset(observer, subject) + dim;
            if self.values[offset] != 0 {
                self.values[offset] = value;
            }
        }
    }

    /// Self perceptions plus a visibility-rule perception along every edge
    pub fn initialize<R: Rng + ?Sized>(
        &mut self,
        graph: &Graph,
        attributes: &AttributeSpace,
        visibility: Visibility,
        rng: &mut R,
    ) {
        for observer in 0..self.n {
            self.set_self(observer, attributes.opinion(observer));
            for &subject in graph.neighbors(observer) {
                self.perceive(observer, subject, attributes.opinion(subject), visibility, rng);
            }
        }
    }
}
