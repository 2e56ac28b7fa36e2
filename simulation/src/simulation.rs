//! Simulation engine for murmur
//!
//! Implements discrete-time opinion diffusion. Each step runs three phases:
//! - Update: nodes flip opinion coordinates relative to their local average
//! - Rewire out: low-reward influences are dropped
//! - Rewire in: a handful of random candidates are befriended
//!
//! Every random draw comes from one stream, seeded from the configuration
//! when a seed is given, so seeded runs are reproducible.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace, warn};

use murmur_core::{
    Archetype, Averaging, ConfigError, Family, NetworkConfig, NodeIndex, Opinion, ReferenceError,
};

use crate::attributes::AttributeSpace;
use crate::graph::Graph;
use crate::masks::MaskModel;
use crate::population::{Population, assign_resistance, check_resistance};
use crate::reward::reward;
use crate::topology::build_graph;
use crate::types::{AttributeSnapshot, SimEvent, SimStats};
use crate::weights::{WeightModel, draw_weight};

/// Random candidates drawn per node during rewire-in
pub const REWIRE_IN_CANDIDATES: usize = 5;

/// The simulation state
#[derive(Debug)]
pub struct Simulation {
    /// Completed steps
    pub tick: u64,
    /// Recorded events, when `record_events` is set
    pub event_log: Vec<SimEvent>,
    pub stats: SimStats,
    config: NetworkConfig,
    graph: Graph,
    attributes: AttributeSpace,
    weights: WeightModel,
    masks: MaskModel,
    population: Population,
    resistance: Vec<f64>,
    rng: StdRng,
}

impl Simulation {
    /// Build a network from a configuration
    ///
    /// Configuration problems are logged and defaulted; building never fails.
    pub fn new(mut config: NetworkConfig) -> Self {
        config.normalize();
        let mut rng = seeded_rng(config.seed);
        let n = config.n;

        let graph = build_graph(&config, &mut rng);

        let mut weights = WeightModel::new(n);
        weights.initialize(&graph, config.weight, &mut rng);

        let attributes = AttributeSpace::random(n, config.dimensions, &mut rng);

        let mut masks = MaskModel::new(n, config.dimensions);
        masks.initialize(&graph, &attributes, config.visibility, &mut rng);

        let population = Population::mix(&config, &mut rng);
        let (resistance, _) = assign_resistance(&population, &config.resistance, &mut rng);

        info!(
            n,
            edges = graph.edge_count(),
            dimensions = config.dimensions,
            topology = %config.topology,
            "Network initialized"
        );

        Self {
            tick: 0,
            event_log: Vec::new(),
            stats: SimStats::default(),
            config,
            graph,
            attributes,
            weights,
            masks,
            population,
            resistance,
            rng,
        }
    }

    /// Assemble a simulation from already-consistent parts
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        config: NetworkConfig,
        tick: u64,
        graph: Graph,
        attributes: AttributeSpace,
        weights: WeightModel,
        masks: MaskModel,
        population: Population,
        resistance: Vec<f64>,
    ) -> Self {
        let rng = seeded_rng(config.seed);
        Self {
            tick,
            event_log: Vec::new(),
            stats: SimStats::default(),
            config,
            graph,
            attributes,
            weights,
            masks,
            population,
            resistance,
            rng,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn attributes(&self) -> &AttributeSpace {
        &self.attributes
    }

    pub fn weights(&self) -> &WeightModel {
        &self.weights
    }

    pub fn masks(&self) -> &MaskModel {
        &self.masks
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn resistance(&self) -> &[f64] {
        &self.resistance
    }

    pub fn node_count(&self) -> usize {
        self.config.n
    }

    pub fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    /// True opinion vector of a node
    pub fn opinion(&self, node: NodeIndex) -> Result<&[Opinion], ReferenceError> {
        self.check_node(node)?;
        Ok(self.attributes.opinion(node))
    }

    fn check_node(&self, node: NodeIndex) -> Result<(), ReferenceError> {
        if node < self.config.n {
            Ok(())
        } else {
            Err(ReferenceError::NodeOutOfRange {
                node,
                n: self.config.n,
            })
        }
    }

    fn check_dimension(&self, dim: usize) -> Result<(), ReferenceError> {
        if dim < self.config.dimensions {
            Ok(())
        } else {
            Err(ReferenceError::DimensionOutOfRange {
                dim,
                dimensions: self.config.dimensions,
            })
        }
    }

    // ------------------------------------------------------------------
    // Averages and rewards
    // ------------------------------------------------------------------

    /// Per-coordinate local average a node acts on, as configured
    pub fn local_average(&self, node: NodeIndex) -> Result<Vec<f64>, ReferenceError> {
        self.check_node(node)?;
        Ok(self.local_average_of(node))
    }

    fn local_average_of(&self, node: NodeIndex) -> Vec<f64> {
        let mut sums = vec![0.0; self.config.dimensions];
        let influencers = std::iter::once(node).chain(self.graph.neighbors(node).iter().copied());

        match self.config.averaging {
            Averaging::Arithmetic => {
                let mut count = 0usize;
                for subject in influencers {
                    for (sum, &seen) in sums.iter_mut().zip(self.masks.row(node, subject)) {
                        *sum += f64::from(seen);
                    }
                    count += 1;
                }
                sums.into_iter().map(|sum| sum / count as f64).collect()
            }
            Averaging::Weighted => {
                for subject in influencers {
                    let weight = self.weights.normalized(subject, node);
                    for (sum, &seen) in sums.iter_mut().zip(self.masks.row(node, subject)) {
                        *sum += weight * f64::from(seen);
                    }
                }
                sums.into_iter().map(round2).collect()
            }
        }
    }

    /// Per-coordinate mean opinion over every node
    pub fn global_average(&self) -> Vec<f64> {
        self.attributes.global_average()
    }

    /// Per-coordinate mean opinion over the nodes of one archetype; `None` if it has none
    pub fn type_average(&self, archetype: Archetype) -> Option<Vec<f64>> {
        let nodes = self.population.indexes(archetype);
        if nodes.is_empty() {
            return None;
        }
        Some(self.attributes.average_over(nodes.iter().copied()))
    }

    /// Reward `node` gets from what it perceives of `neighbor`
    pub fn reward_for_neighbor(
        &self,
        node: NodeIndex,
        neighbor: NodeIndex,
    ) -> Result<f64, ReferenceError> {
        self.check_node(node)?;
        self.check_node(neighbor)?;
        Ok(self.neighbor_reward(node, neighbor))
    }

    /// Mean reward over all of a node's neighbours; `0` for an isolated node
    pub fn reward_for_node(&self, node: NodeIndex) -> Result<f64, ReferenceError> {
        self.check_node(node)?;
        let neighbors = self.graph.neighbors(node);
        if neighbors.is_empty() {
            return Ok(0.0);
        }
        let total: f64 = neighbors
            .iter()
            .map(|&neighbor| self.neighbor_reward(node, neighbor))
            .sum();
        Ok(total / neighbors.len() as f64)
    }

    fn neighbor_reward(&self, node: NodeIndex, neighbor: NodeIndex) -> f64 {
        reward(
            self.population.archetype(node),
            self.attributes.opinion(node),
            self.masks.row(node, neighbor),
        )
    }

    // ------------------------------------------------------------------
    // Stepping
    // ------------------------------------------------------------------

    /// Run one update, rewire-out, rewire-in cycle
    pub fn step(&mut self) {
        self.tick += 1;
        let flips_before = self.stats.flips;
        let edges_before = self.graph.edge_count();

        self.process_updates();
        self.process_rewire_out();
        self.process_rewire_in();

        self.stats.steps += 1;
        debug!(
            tick = self.tick,
            flips = self.stats.flips - flips_before,
            edges_before,
            edges_after = self.graph.edge_count(),
            "Step complete"
        );
    }

    /// Run `steps` steps
    pub fn run(&mut self, steps: usize) {
        for _ in 0..steps {
            self.step();
        }
        info!("Simulation complete at tick {}", self.tick);
        info!("Stats: {:?}", self.stats);
    }

    /// Lazily step the simulation, yielding the attribute space after each step
    pub fn snapshots(&mut self, steps: usize) -> Snapshots<'_> {
        Snapshots {
            sim: self,
            remaining: steps,
        }
    }

    /// Decide every flip against the pre-step state, then apply them together
    fn process_updates(&mut self) {
        let mut flips = Vec::new();

        for node in 0..self.config.n {
            let family = self.population.archetype(node).family();
            let resistance = self.resistance[node];
            let average = self.local_average_of(node);

            for (dim, (&current, &avg)) in self
                .attributes
                .opinion(node)
                .iter()
                .zip(&average)
                .enumerate()
            {
                let settled = match family {
                    Family::Consensus => f64::from(current) * avg > 0.0,
                    Family::Divergence => f64::from(current) * avg < 0.0,
                };
                if settled {
                    continue;
                }
                if avg.abs() > resistance && self.rng.random::<f64>() < self.config.update {
                    flips.push((node, dim));
                }
            }
        }

        for (node, dim) in flips {
            let value = self.attributes.flip(node, dim);
            self.masks.sync_coordinate(node, dim, value);
            self.stats.flips += 1;
            self.emit_event(SimEvent::OpinionFlipped {
                node,
                dimension: dim,
                value,
                tick: self.tick,
            });
        }
    }

    /// Drop influences whose reward falls below the threshold
    ///
    /// A candidate passes the unfriend probability here and again inside
    /// [`Simulation::disconnect`], so the effective drop rate is `unfriend²`.
    fn process_rewire_out(&mut self) {
        for node in 0..self.config.n {
            let influencers: Vec<NodeIndex> = self.graph.neighbors(node).iter().copied().collect();
            for neighbor in influencers {
                // Already dropped through a mirrored removal this pass
                if !self.graph.has_edge(neighbor, node) {
                    continue;
                }
                let reward = self.neighbor_reward(node, neighbor);
                if reward < self.config.unfriend_threshold
                    && self.rng.random::<f64>() < self.config.unfriend
                    && let Err(e) = self.disconnect(neighbor, node)
                {
                    warn!(error = %e, "rewire-out disconnect failed");
                }
            }
        }
    }

    /// Offer each node a few random new influencers
    fn process_rewire_in(&mut self) {
        let n = self.config.n;
        for node in 0..n {
            let candidates: BTreeSet<NodeIndex> = (0..REWIRE_IN_CANDIDATES)
                .map(|_| self.rng.random_range(0..n))
                .collect();
            for candidate in candidates {
                if self.rng.random::<f64>() < self.config.friend
                    && let Err(e) = self.connect(candidate, node)
                {
                    warn!(error = %e, "rewire-in connect failed");
                }
            }
        }
    }

    fn emit_event(&mut self, event: SimEvent) {
        trace!("Event: {:?}", event);
        if self.config.record_events {
            self.event_log.push(event);
        }
    }

    // ------------------------------------------------------------------
    // Graph mutation
    // ------------------------------------------------------------------

    /// Make `from` influence `to`
    ///
    /// Draws a fresh weight and perception for the edge (refreshing them if it
    /// already existed) and mirrors it for undirected or symmetric networks.
    /// Returns whether a new edge was added; `from == to` is a no-op.
    pub fn connect(&mut self, from: NodeIndex, to: NodeIndex) -> Result<bool, ReferenceError> {
        self.check_node(from)?;
        self.check_node(to)?;
        if from == to {
            return Ok(false);
        }

        let added = self.link(from, to);
        if !self.config.directed {
            let weight = self.weights.raw(from, to);
            self.weights.set_raw(to, from, weight);
            self.masks.perceive(
                from,
                to,
                self.attributes.opinion(to),
                self.config.visibility,
                &mut self.rng,
            );
        } else if self.config.symmetric && self.link(to, from) {
            self.record_connection(to, from);
        }

        self.weights.update_column(&self.graph, from);
        self.weights.update_column(&self.graph, to);

        if added {
            self.record_connection(from, to);
        }
        Ok(added)
    }

    fn link(&mut self, from: NodeIndex, to: NodeIndex) -> bool {
        let added = self.graph.add_edge(from, to);
        let weight = draw_weight(self.config.weight, &mut self.rng);
        self.weights.set_raw(from, to, weight);
        self.masks.perceive(
            to,
            from,
            self.attributes.opinion(from),
            self.config.visibility,
            &mut self.rng,
        );
        added
    }

    fn record_connection(&mut self, from: NodeIndex, to: NodeIndex) {
        self.stats.connections += 1;
        debug!(from, to, tick = self.tick, "Connected");
        self.emit_event(SimEvent::Connected {
            from,
            to,
            tick: self.tick,
        });
    }

    /// Stop `from` influencing `to`, subject to the unfriend probability
    ///
    /// Symmetric networks drop the mirrored edge too. Returns whether any edge
    /// was removed; a failed draw or a missing edge leaves state untouched.
    pub fn disconnect(&mut self, from: NodeIndex, to: NodeIndex) -> Result<bool, ReferenceError> {
        self.check_node(from)?;
        self.check_node(to)?;
        if from == to {
            return Err(ReferenceError::SelfReference(from));
        }
        if self.rng.random::<f64>() >= self.config.unfriend {
            return Ok(false);
        }

        let removed = self.graph.remove_edge(from, to);
        let mirrored = self.config.symmetric && self.graph.remove_edge(to, from);
        if !removed && !mirrored {
            return Ok(false);
        }

        for (a, b) in [(from, to), (to, from)] {
            if !self.graph.has_edge(a, b) {
                self.masks.clear(b, a);
                self.weights.set_raw(a, b, 0.0);
            }
        }
        self.weights.update_column(&self.graph, from);
        self.weights.update_column(&self.graph, to);

        if removed {
            self.record_disconnection(from, to);
        }
        if mirrored {
            self.record_disconnection(to, from);
        }
        Ok(true)
    }

    fn record_disconnection(&mut self, from: NodeIndex, to: NodeIndex) {
        self.stats.disconnections += 1;
        debug!(from, to, tick = self.tick, "Disconnected");
        self.emit_event(SimEvent::Disconnected {
            from,
            to,
            tick: self.tick,
        });
    }

    // ------------------------------------------------------------------
    // Perception
    // ------------------------------------------------------------------

    fn check_influence(&self, from: NodeIndex, to: NodeIndex, dim: usize) -> Result<(), ReferenceError> {
        self.check_node(from)?;
        self.check_node(to)?;
        self.check_dimension(dim)?;
        if from != to && !self.graph.has_edge(from, to) {
            return Err(ReferenceError::NotAdjacent { from, to });
        }
        Ok(())
    }

    /// Let `to` see coordinate `dim` of `from`'s true opinion
    pub fn reveal(&mut self, from: NodeIndex, to: NodeIndex, dim: usize) -> Result<(), ReferenceError> {
        self.check_influence(from, to, dim)?;
        let value = self.attributes.opinion(from)[dim];
        self.masks.set(to, from, dim, value);
        Ok(())
    }

    /// Hide coordinate `dim` of `from`'s opinion from `to`
    pub fn hide(&mut self, from: NodeIndex, to: NodeIndex, dim: usize) -> Result<(), ReferenceError> {
        if from == to {
            return Err(ReferenceError::SelfReference(from));
        }
        self.check_influence(from, to, dim)?;
        self.masks.set(to, from, dim, 0);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Direct mutation
    // ------------------------------------------------------------------

    /// Overwrite a node's opinion; revealed perceptions follow the new values
    pub fn set_opinion(&mut self, node: NodeIndex, values: &[Opinion]) -> murmur_core::Result<()> {
        self.check_node(node)?;
        if values.len() != self.config.dimensions {
            return Err(ReferenceError::DimensionOutOfRange {
                dim: values.len(),
                dimensions: self.config.dimensions,
            }
            .into());
        }
        if let Some(bad) = values.iter().find(|&&v| v != 1 && v != -1) {
            return Err(ConfigError::InvalidValue {
                field: "opinion",
                value: bad.to_string(),
            }
            .into());
        }

        self.attributes.set_opinion(node, values);
        self.masks.set_self(node, values);
        for (dim, &value) in values.iter().enumerate() {
            self.masks.sync_coordinate(node, dim, value);
        }
        Ok(())
    }

    pub fn set_archetype(&mut self, node: NodeIndex, archetype: Archetype) -> Result<(), ReferenceError> {
        self.check_node(node)?;
        self.population.set_archetype(node, archetype);
        Ok(())
    }

    pub fn set_resistance(&mut self, node: NodeIndex, value: f64) -> murmur_core::Result<()> {
        self.check_node(node)?;
        self.resistance[node] = check_resistance(format!("node {node}"), value)?;
        Ok(())
    }

    pub fn set_resistance_all(&mut self, value: f64) -> Result<(), ConfigError> {
        let value = check_resistance("all", value)?;
        self.resistance.fill(value);
        Ok(())
    }

    /// Set the resistance of every node of one archetype; returns how many changed
    pub fn set_resistance_for(&mut self, archetype: Archetype, value: f64) -> Result<usize, ConfigError> {
        let value = check_resistance(archetype.tag(), value)?;
        let nodes = self.population.indexes(archetype);
        for &node in nodes {
            self.resistance[node] = value;
        }
        Ok(nodes.len())
    }

    /// Get a summary of the current state
    pub fn state_summary(&self) -> String {
        let global = self
            .global_average()
            .iter()
            .map(|avg| format!("{avg:+.2}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Tick {}: {} nodes, {} edges (density {:.3}), global average [{}]",
            self.tick,
            self.config.n,
            self.graph.edge_count(),
            self.graph.density(),
            global
        )
    }
}

/// Iterator returned by [`Simulation::snapshots`]
pub struct Snapshots<'a> {
    sim: &'a mut Simulation,
    remaining: usize,
}

impl Iterator for Snapshots<'_> {
    type Item = AttributeSnapshot;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.sim.step();
        Some(AttributeSnapshot {
            tick: self.sim.tick,
            opinions: self.sim.attributes.rows(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Snapshots<'_> {}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
