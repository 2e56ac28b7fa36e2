//! Event and snapshot types produced by the simulation

use serde::{Deserialize, Serialize};

use murmur_core::{NodeIndex, Opinion};

/// Something that changed during a step or through a direct mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimEvent {
    /// A node adopted the opposite value on one coordinate
    OpinionFlipped {
        node: NodeIndex,
        dimension: usize,
        value: Opinion,
        tick: u64,
    },
    /// `from` now influences `to`
    Connected {
        from: NodeIndex,
        to: NodeIndex,
        tick: u64,
    },
    /// `from` no longer influences `to`
    Disconnected {
        from: NodeIndex,
        to: NodeIndex,
        tick: u64,
    },
}

impl SimEvent {
    pub fn tick(&self) -> u64 {
        match self {
            SimEvent::OpinionFlipped { tick, .. }
            | SimEvent::Connected { tick, .. }
            | SimEvent::Disconnected { tick, .. } => *tick,
        }
    }
}

/// Counters accumulated over the life of a simulation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimStats {
    pub steps: u64,
    pub flips: u64,
    pub connections: u64,
    pub disconnections: u64,
}

/// Copy of the attribute space taken after a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSnapshot {
    pub tick: u64,
    pub opinions: Vec<Vec<Opinion>>,
}
