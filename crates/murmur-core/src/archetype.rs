//! Behavioural archetypes
//!
//! Every node belongs to exactly one archetype. The archetype decides two
//! things: which way the node's opinion update leans ([`Family`]) and how the
//! node scores what it perceives of a neighbour ([`RewardShape`]).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Behavioural archetype of a node
#[allow(clippy::upper_case_acronyms)]
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Archetype {
    #[default]
    R,
    E,
    SC,
    DA,
    RWC,
    SR,
}

/// Direction an archetype's opinion update pushes toward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// Leaves a coordinate alone when it already agrees with the neighbourhood
    Consensus,
    /// Leaves a coordinate alone when it already disagrees with the neighbourhood
    Divergence,
}

/// How an archetype turns a perceived Hamming distance into a reward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RewardShape {
    /// `1 - d`
    Agreement,
    /// `d`
    Disagreement,
    /// `1 - 2|d - 0.5|`
    Balance,
}

impl Archetype {
    /// All archetypes, in canonical order
    pub const ALL: [Archetype; 6] = [
        Archetype::R,
        Archetype::E,
        Archetype::SC,
        Archetype::DA,
        Archetype::RWC,
        Archetype::SR,
    ];

    pub fn family(self) -> Family {
        match self {
            Archetype::R | Archetype::E | Archetype::SC => Family::Consensus,
            Archetype::DA | Archetype::RWC | Archetype::SR => Family::Divergence,
        }
    }

    pub fn reward_shape(self) -> RewardShape {
        match self {
            Archetype::R | Archetype::DA => RewardShape::Agreement,
            Archetype::E | Archetype::RWC => RewardShape::Disagreement,
            Archetype::SC | Archetype::SR => RewardShape::Balance,
        }
    }

    /// Short tag used in configuration files and console commands
    pub fn tag(self) -> &'static str {
        match self {
            Archetype::R => "R",
            Archetype::E => "E",
            Archetype::SC => "SC",
            Archetype::DA => "DA",
            Archetype::RWC => "RWC",
            Archetype::SR => "SR",
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Archetype {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Archetype::ALL
            .into_iter()
            .find(|a| a.tag().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownArchetype(s.to_string()))
    }
}

impl RewardShape {
    /// Reward for a Hamming distance fraction `d` in `[0, 1]`
    pub fn score(self, d: f64) -> f64 {
        match self {
            RewardShape::Agreement => 1.0 - d,
            RewardShape::Disagreement => d,
            RewardShape::Balance => 1.0 - (d - 0.5).abs() * 2.0,
        }
    }
}
