//! # murmur
//!
//! Opinion diffusion over a dynamic social graph.
//!
//! ## Overview
//!
//! Every node holds a vector of binary opinions (+1/-1) across a fixed number
//! of dimensions. Nodes perceive their neighbours through per-coordinate
//! masks, average what they see, and flip coordinates according to their
//! behavioural archetype. Edges are cut when a neighbour's opinions yield too
//! little reward, and new ones form at random.
//!
//! - **Reinforcers** drift toward the local majority
//! - **Disruptors** drift away from it
//! - **Resistance** sets how strong a majority must be before a node moves
//!
//! ## Architecture
//!
//! - **Graph** (`graph.rs`): Directed or undirected adjacency with ordered neighbour sets
//! - **Topology** (`topology.rs`): Complete, cycle, star, random, scale-free, small-world generators
//! - **Attributes** (`attributes.rs`): The opinion matrix and its averages
//! - **Weights** (`weights.rs`): Raw and column-normalised influence weights
//! - **Masks** (`masks.rs`): What each node can see of each neighbour
//! - **Population** (`population.rs`): Archetype mix and resistance assignment
//! - **Reward** (`reward.rs`): Archetype-dependent reward from perceived distance
//! - **Simulation** (`simulation.rs`): Update and rewiring dynamics
//! - **State** (`state.rs`): JSON export and import of a full network
//! - **Stats** (`stats.rs`): Centralities and per-step tracking
//! - **Console** (`console.rs`): Line-oriented command interpreter
//! - **Scenarios** (`scenarios.rs`): Pre-built demonstration runs
//!
//! ## Example
//!
//! ```rust,ignore
//! use murmur_simulation::*;
//!
//! let mut sim = Simulation::new(NetworkConfig {
//!     n: 30,
//!     topology: "small world".into(),
//!     dimensions: 3,
//!     seed: Some(42),
//!     ..Default::default()
//! });
//!
//! sim.run(20);
//! println!("{}", sim.state_summary());
//! sim.save_json("network.json")?;
//! ```

pub mod attributes;
pub mod console;
pub mod graph;
pub mod masks;
pub mod population;
pub mod reward;
pub mod scenarios;
pub mod simulation;
pub mod state;
pub mod stats;
pub mod topology;
pub mod types;
pub mod weights;

#[cfg(test)]
mod integration_scenarios;

// Re-export main types
pub use attributes::AttributeSpace;
pub use console::{Command, CommandError, CommandOutcome, Console, Query, ResistanceTarget};
pub use graph::Graph;
pub use masks::MaskModel;
pub use population::Population;
pub use simulation::{Simulation, Snapshots};
pub use state::{MaskEntry, NetworkState, NodeState};
pub use stats::Statistic;
pub use types::{AttributeSnapshot, SimEvent, SimStats};
pub use weights::WeightModel;

// Re-export core types for convenience
pub use murmur_core::{
    Archetype, ConfigError, MurmurError, NetworkConfig, NodeIndex, Opinion, ReferenceError,
    StateError, Topology, Visibility,
};
