//! Error types for murmur
//!
//! Nothing in here is fatal to a running simulation: configuration errors are
//! logged and the offending entry skipped, invalid references leave state
//! untouched. The enums exist so callers can tell those cases apart.

use thiserror::Error;

use crate::NodeIndex;

/// Top-level error type for murmur
#[derive(Debug, Error)]
pub enum MurmurError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid reference: {0}")]
    Reference(#[from] ReferenceError),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors in the parameters used to build or mutate a network
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Unknown topology: '{0}'")]
    UnknownTopology(String),

    #[error("Archetype proportions must sum to 1 (got {0})")]
    ProportionSum(f64),

    #[error("Resistance for [{target}] must be between 0 and 1 (got {value})")]
    ResistanceOutOfRange { target: String, value: f64 },

    #[error("Unknown archetype: '{0}'")]
    UnknownArchetype(String),

    #[error("Probability '{name}' must be between 0 and 1 (got {value})")]
    ProbabilityOutOfRange { name: &'static str, value: f64 },

    #[error("Invalid value for '{field}': {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Small-world neighbourhood {k} exceeds node count {n}")]
    NeighbourhoodTooLarge { k: usize, n: usize },

    #[error("Failed to read config file: {0}")]
    Read(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),
}

/// Operations naming nodes, dimensions, or edges that do not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("Node {node} not in graph (n = {n})")]
    NodeOutOfRange { node: NodeIndex, n: usize },

    #[error("Dimension {dim} out of range (dimensions = {dimensions})")]
    DimensionOutOfRange { dim: usize, dimensions: usize },

    #[error("Nodes {from} and {to} are not connected")]
    NotAdjacent { from: NodeIndex, to: NodeIndex },

    #[error("Operation not allowed on node {0} and itself")]
    SelfReference(NodeIndex),
}

/// Errors importing or exporting full simulation state
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Inconsistent state: {0}")]
    Inconsistent(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

/// Result alias used across murmur crates
pub type Result<T> = std::result::Result<T, MurmurError>;
