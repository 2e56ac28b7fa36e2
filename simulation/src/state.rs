//! Full network state export and import
//!
//! A [`NetworkState`] holds everything needed to rebuild a simulation without
//! rerunning topology generation: the configuration, opinions, archetypes,
//! resistance, and per-node incoming edges with their weights and masks.
//! Mask entries only record which coordinates are revealed; the values
//! themselves come from the attribute space on import.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use murmur_core::{Archetype, NetworkConfig, NodeIndex, Opinion, StateError};

use crate::attributes::AttributeSpace;
use crate::graph::Graph;
use crate::masks::MaskModel;
use crate::population::Population;
use crate::simulation::Simulation;
use crate::weights::{SELF_WEIGHT, WeightModel};

/// Serializable snapshot of a whole network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkState {
    pub config: NetworkConfig,
    pub tick: u64,
    pub attribute_space: Vec<Vec<Opinion>>,
    pub correlations: Vec<Vec<f64>>,
    pub resistance: Vec<f64>,
    pub types: Vec<Archetype>,
    pub type_dist: BTreeMap<Archetype, f64>,
    pub indexes_by_type: BTreeMap<Archetype, Vec<NodeIndex>>,
    pub nodes: Vec<NodeState>,
}

/// Incoming edges of one node; parents with nothing revealed have no mask entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeState {
    pub idx: NodeIndex,
    /// Nodes influencing this one, ascending
    pub parents: Vec<NodeIndex>,
    /// Raw weight of each parent's edge, aligned with `parents`
    pub weights: Vec<f64>,
    pub masks: Vec<MaskEntry>,
}

/// Which coordinates of a parent's opinion this node can see
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskEntry {
    pub parent: NodeIndex,
    pub revealed: Vec<bool>,
}

impl Simulation {
    /// Capture the full state of the network
    pub fn export_state(&self) -> NetworkState {
        let graph = self.graph();
        let nodes = (0..self.node_count())
            .map(|idx| {
                let parents: Vec<NodeIndex> = graph.neighbors(idx).iter().copied().collect();
                NodeState {
                    idx,
                    weights: parents
                        .iter()
                        .map(|&parent| self.weights().raw(parent, idx))
                        .collect(),
                    masks: parents
                        .iter()
                        .map(|&parent| MaskEntry {
                            parent,
                            revealed: self.masks().revealed(idx, parent),
                        })
                        .filter(|entry| entry.revealed.contains(&true))
                        .collect(),
                    parents,
                }
            })
            .collect();

        NetworkState {
            config: self.config().clone(),
            tick: self.tick,
            attribute_space: self.attributes().rows(),
            correlations: self.attributes().correlations().to_vec(),
            resistance: self.resistance().to_vec(),
            types: self.population().archetypes().to_vec(),
            type_dist: self.population().distribution().clone(),
            indexes_by_type: self.population().indexes_by_type().clone(),
            nodes,
        }
    }

    /// Rebuild a simulation from exported state
    ///
    /// The random stream restarts from the configured seed, or from OS
    /// entropy when there is none.
    pub fn from_state(state: NetworkState) -> Result<Self, StateError> {
        state.validate()?;
        let NetworkState {
            config,
            tick,
            attribute_space,
            correlations,
            resistance,
            types,
            type_dist,
            indexes_by_type,
            nodes,
        } = state;
        let n = config.n;
        let dimensions = config.dimensions;

        let attributes = AttributeSpace::from_rows(&attribute_space, dimensions, correlations);

        let mut graph = Graph::new(n, config.directed);
        let mut weights = WeightModel::new(n);
        for node in &nodes {
            for (&parent, &weight) in node.parents.iter().zip(&node.weights) {
                graph.add_edge(parent, node.idx);
                weights.set_raw(parent, node.idx, weight);
            }
        }
        for node in 0..n {
            weights.set_raw(node, node, SELF_WEIGHT);
        }
        for node in 0..n {
            weights.update_column(&graph, node);
        }

        let mut masks = MaskModel::new(n, dimensions);
        for node in 0..n {
            masks.set_self(node, attributes.opinion(node));
        }
        for node in &nodes {
            for entry in &node.masks {
                let truth = attributes.opinion(entry.parent);
                for (dim, _) in entry.revealed.iter().enumerate().filter(|(_, shown)| **shown) {
                    masks.set(node.idx, entry.parent, dim, truth[dim]);
                }
            }
        }

        let population = Population::from_parts(types, type_dist);
        if population.indexes_by_type() != &indexes_by_type {
            warn!("stored type index does not match node types; rebuilt from types");
        }

        info!(n, edges = graph.edge_count(), tick, "Network state imported");
        Ok(Simulation::from_parts(
            config, tick, graph, attributes, weights, masks, population, resistance,
        ))
    }

    /// Write the exported state as pretty JSON
    pub fn save_json(&self, path: impl AsRef<Path>) -> murmur_core::Result<()> {
        let json = serde_json::to_string_pretty(&self.export_state())
            .map_err(|e| StateError::Serialization(e.to_string()))?;
        std::fs::write(path.as_ref(), json)?;
        info!(path = %path.as_ref().display(), "Saved network state");
        Ok(())
    }

    /// Load a simulation from a JSON state file
    ///
    /// The random stream is reseeded as in [`Simulation::from_state`], so a
    /// loaded run does not continue the draws of the run that saved it.
    pub fn load_json(path: impl AsRef<Path>) -> murmur_core::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let state: NetworkState = serde_json::from_str(&content)
            .map_err(|e| StateError::Deserialization(e.to_string()))?;
        Ok(Self::from_state(state)?)
    }
}

impl NetworkState {
    /// Check that every table agrees on node count and dimensionality
    pub fn validate(&self) -> Result<(), StateError> {
        let n = self.config.n;
        let k = self.config.dimensions;
        let inconsistent = |msg: String| Err(StateError::Inconsistent(msg));

        if k == 0 {
            return inconsistent("dimensions must be at least 1".into());
        }
        if self.attribute_space.len() != n {
            return inconsistent(format!(
                "attribute space has {} rows for {n} nodes",
                self.attribute_space.len()
            ));
        }
        if let Some((node, row)) = self
            .attribute_space
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != k || row.iter().any(|&v| v != 1 && v != -1))
        {
            return inconsistent(format!("node {node} has invalid opinion {row:?}"));
        }
        if self.correlations.len() != k || self.correlations.iter().any(|row| row.len() != k) {
            return inconsistent(format!("correlations must be {k}x{k}"));
        }
        if self.resistance.len() != n || self.types.len() != n {
            return inconsistent(format!(
                "expected {n} resistance values and types, got {} and {}",
                self.resistance.len(),
                self.types.len()
            ));
        }
        if let Some(r) = self.resistance.iter().find(|r| !(0.0..=1.0).contains(*r)) {
            return inconsistent(format!("resistance {r} outside [0, 1]"));
        }

        for node in &self.nodes {
            if node.idx >= n {
                return inconsistent(format!("node {} not in graph", node.idx));
            }
            if node.parents.len() != node.weights.len() {
                return inconsistent(format!(
                    "node {} has {} parents but {} weights",
                    node.idx,
                    node.parents.len(),
                    node.weights.len()
                ));
            }
            if let Some(&parent) = node.parents.iter().find(|&&p| p >= n || p == node.idx) {
                return inconsistent(format!("node {} has invalid parent {parent}", node.idx));
            }
            // Random weights are drawn from [0, 1), so zero is a valid edge weight
            if let Some(w) = node.weights.iter().find(|&&w| !(w >= 0.0 && w.is_finite())) {
                return inconsistent(format!("node {} has invalid weight {w}", node.idx));
            }
            for entry in &node.masks {
                if !node.parents.contains(&entry.parent) || entry.revealed.len() != k {
                    return inconsistent(format!(
                        "node {} has an invalid mask for {}",
                        node.idx, entry.parent
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_core::{MurmurError, Visibility};

    fn sample() -> Simulation {
        Simulation::new(NetworkConfig {
            n: 5,
            topology: "cycle".into(),
            dimensions: 2,
            visibility: Visibility::Random,
            seed: Some(21),
            ..Default::default()
        })
    }

    #[test]
    fn test_export_lists_incoming_edges() {
        let sim = sample();
        let state = sim.export_state();

        assert_eq!(state.nodes.len(), 5);
        assert_eq!(state.nodes[0].parents, vec![1, 4]);
        assert_eq!(state.nodes[0].weights, vec![1.0, 1.0]);
        for node in &state.nodes {
            for parent in &node.parents {
                let revealed = sim.masks().revealed(node.idx, *parent);
                match node.masks.iter().find(|entry| entry.parent == *parent) {
                    Some(entry) => assert_eq!(entry.revealed, revealed),
                    None => assert!(revealed.iter().all(|shown| !shown)),
                }
            }
        }
    }

    #[test]
    fn test_state_roundtrip() {
        let mut sim = sample();
        sim.run(2);
        let state = sim.export_state();
        let restored = Simulation::from_state(state.clone()).unwrap();

        assert_eq!(restored.tick, 2);
        assert_eq!(restored.graph(), sim.graph());
        assert_eq!(restored.attributes(), sim.attributes());
        assert_eq!(restored.masks(), sim.masks());
        assert_eq!(restored.weights(), sim.weights());
        assert_eq!(restored.export_state(), state);
    }

    #[test]
    fn test_rejects_inconsistent_state() {
        let mut state = sample().export_state();
        state.nodes[2].weights.pop();
        assert!(matches!(
            Simulation::from_state(state),
            Err(StateError::Inconsistent(_))
        ));

        let mut state = sample().export_state();
        state.attribute_space[1] = vec![1, 0];
        assert!(Simulation::from_state(state).is_err());

        let mut state = sample().export_state();
        state.nodes[0].parents[0] = 9;
        assert!(Simulation::from_state(state).is_err());

        let mut state = sample().export_state();
        state.nodes[3].weights[1] = -0.5;
        assert!(Simulation::from_state(state).is_err());
    }

    #[test]
    fn test_zero_weight_edge_imports() {
        let mut state = sample().export_state();
        state.nodes[0].weights[0] = 0.0;
        let restored = Simulation::from_state(state.clone()).unwrap();

        assert!(restored.graph().has_edge(1, 0));
        assert_eq!(restored.weights().raw(1, 0), 0.0);
        assert!(restored.weights().check_normalization().is_empty());
        assert_eq!(restored.export_state(), state);
    }

    #[test]
    fn test_json_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network.json");
        let sim = sample();
        sim.save_json(&path).unwrap();

        let loaded = Simulation::load_json(&path).unwrap();
        assert_eq!(loaded.export_state(), sim.export_state());

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Simulation::load_json(&path),
            Err(MurmurError::State(StateError::Deserialization(_)))
        ));
    }
}
