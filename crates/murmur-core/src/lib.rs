//! # Murmur Core
//!
//! Shared vocabulary for the murmur opinion-diffusion simulator.
//!
//! The simulation crate owns all mutable state; this crate only defines the
//! types that describe it and the configuration used to build it.
//!
//! ## Key Types
//!
//! - [`Archetype`]: closed set of behavioural archetypes, grouped into update
//!   [`Family`] and [`RewardShape`]
//! - [`NetworkConfig`]: every parameter needed to build a network from scratch
//! - [`Topology`], [`Visibility`], [`WeightMode`], [`ResistanceSpec`], [`Averaging`]
//! - [`MurmurError`] and its per-concern families

pub mod archetype;
pub mod config;
pub mod error;

pub use archetype::*;
pub use config::*;
pub use error::*;

/// Index of a node in the network (`0..n`).
pub type NodeIndex = usize;

/// A single opinion coordinate: `+1` or `-1` for true values, `0` for a hidden mask entry.
pub type Opinion = i8;
