//! Graph store
//!
//! Directed or undirected adjacency over `n` integer nodes. Edges point from
//! the influencing node to the influenced one, so the nodes a node listens to
//! are its [`Graph::neighbors`] (predecessors when directed, adjacent nodes
//! otherwise).

use std::collections::BTreeSet;

use murmur_core::NodeIndex;

/// Adjacency structure over a fixed node set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    directed: bool,
    /// Nodes each node influences
    successors: Vec<BTreeSet<NodeIndex>>,
    /// Nodes each node is influenced by
    predecessors: Vec<BTreeSet<NodeIndex>>,
}

impl Graph {
    /// Create an edgeless graph with `n` nodes
    pub fn new(n: usize, directed: bool) -> Self {
        Self {
            directed,
            successors: vec![BTreeSet::new(); n],
            predecessors: vec![BTreeSet::new(); n],
        }
    }

    pub fn node_count(&self) -> usize {
        self.successors.len()
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn contains(&self, node: NodeIndex) -> bool {
        node < self.node_count()
    }

    /// Add the edge `from -> to`
    ///
    /// Returns `false` for self-loops, unknown nodes, and edges already present.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex) -> bool {
        if from == to || !self.contains(from) || !self.contains(to) {
            return false;
        }
        let added = self.successors[from].insert(to);
        self.predecessors[to].insert(from);
        if !self.directed {
            self.successors[to].insert(from);
            self.predecessors[from].insert(to);
        }
        added
    }

    /// Remove the edge `from -> to`, returning whether it existed
    pub fn remove_edge(&mut self, from: NodeIndex, to: NodeIndex) -> bool {
        if !self.contains(from) || !self.contains(to) {
            return false;
        }
        let removed = self.successors[from].remove(&to);
        self.predecessors[to].remove(&from);
        if !self.directed {
            self.successors[to].remove(&from);
            self.predecessors[from].remove(&to);
        }
        removed
    }

    /// Whether `from` influences `to`
    pub fn has_edge(&self, from: NodeIndex, to: NodeIndex) -> bool {
        self.successors
            .get(from)
            .map(|succ| succ.contains(&to))
            .unwrap_or(false)
    }

    /// Nodes that influence `node`
    pub fn neighbors(&self, node: NodeIndex) -> &BTreeSet<NodeIndex> {
        &self.predecessors[node]
    }

    /// Nodes that `node` influences
    pub fn successors(&self, node: NodeIndex) -> &BTreeSet<NodeIndex> {
        &self.successors[node]
    }

    /// Total degree: in plus out for directed graphs, adjacency size otherwise
    pub fn degree(&self, node: NodeIndex) -> usize {
        if self.directed {
            self.successors[node].len() + self.predecessors[node].len()
        } else {
            self.successors[node].len()
        }
    }

    /// Number of edges; an undirected edge counts once
    pub fn edge_count(&self) -> usize {
        let arcs: usize = self.successors.iter().map(BTreeSet::len).sum();
        if self.directed { arcs } else { arcs / 2 }
    }

    /// All edges in ascending order; undirected edges are reported once as `(low, high)`
    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex)> + '_ {
        let directed = self.directed;
        self.successors.iter().enumerate().flat_map(move |(from, succ)| {
            succ.iter()
                .copied()
                .filter(move |&to| directed || from < to)
                .map(move |to| (from, to))
        })
    }

    /// Fraction of possible edges present
    pub fn density(&self) -> f64 {
        let n = self.node_count();
        if n < 2 {
            return 0.0;
        }
        let possible = (n * (n - 1)) as f64;
        let m = self.edge_count() as f64;
        if self.directed { m / possible } else { 2.0 * m / possible }
    }
}
