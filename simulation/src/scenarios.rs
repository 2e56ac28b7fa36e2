//! Pre-defined simulation scenarios for murmur
//!
//! Each scenario builds a seeded network, runs it while printing progress, and
//! returns the final simulation for inspection.

use std::collections::BTreeMap;

use tracing::info;

use murmur_core::{Archetype, NetworkConfig, ResistanceSpec, ResistanceValue, Visibility};

use crate::simulation::Simulation;

fn print_averages(sim: &Simulation) {
    for archetype in Archetype::ALL {
        if let Some(avg) = sim.type_average(archetype) {
            let formatted: Vec<String> = avg.iter().map(|v| format!("{v:+.2}")).collect();
            println!(
                "  {archetype:>3} ({} nodes): [{}]",
                sim.population().indexes(archetype).len(),
                formatted.join(", ")
            );
        }
    }
}

/// Consensus on a small-world graph
///
/// Every node is a reinforcer, so local majorities spread until clusters agree.
pub fn run_consensus_scenario(seed: u64) -> Simulation {
    info!("=== Running Consensus Scenario ===");

    let mut sim = Simulation::new(NetworkConfig {
        n: 40,
        topology: "small world".into(),
        saturation: 0.1,
        rewire: 0.1,
        dimensions: 3,
        seed: Some(seed),
        ..Default::default()
    });

    println!("\n--- Initial State ---");
    println!("  {}", sim.state_summary());

    for round in 1..=5 {
        sim.run(10);
        println!("\n--- After {} steps ---", round * 10);
        println!("  {}", sim.state_summary());
    }

    println!("\n--- Averages by type ---");
    print_averages(&sim);
    println!("\n  Flips: {}", sim.stats.flips);
    sim
}

/// Polarization between reinforcers and disruptors on a complete graph
///
/// Half the nodes push toward the majority, half away from it, with some
/// resistance on each side.
pub fn run_polarization_scenario(seed: u64) -> Simulation {
    info!("=== Running Polarization Scenario ===");

    let mut sim = Simulation::new(NetworkConfig {
        n: 20,
        topology: "complete".into(),
        dimensions: 2,
        type_dist: Some(BTreeMap::from([("R".to_string(), 0.5), ("DA".to_string(), 0.5)])),
        resistance: ResistanceSpec::PerArchetype(BTreeMap::from([
            ("R".to_string(), ResistanceValue::Fixed(0.1)),
            ("DA".to_string(), ResistanceValue::Random),
        ])),
        update: 0.5,
        seed: Some(seed),
        ..Default::default()
    });

    println!("\n--- Initial State ---");
    print_averages(&sim);

    sim.run(20);

    println!("\n--- After 20 steps ---");
    println!("  {}", sim.state_summary());
    print_averages(&sim);
    sim
}

/// Unfriending: explorers drop agreeable neighbours and befriend at random
pub fn run_unfriend_scenario(seed: u64) -> Simulation {
    info!("=== Running Unfriend Scenario ===");

    let mut sim = Simulation::new(NetworkConfig {
        n: 30,
        topology: "random".into(),
        saturation: 0.2,
        dimensions: 4,
        type_dist: Some(BTreeMap::from([("E".to_string(), 0.5), ("R".to_string(), 0.5)])),
        unfriend: 0.8,
        unfriend_threshold: 0.5,
        friend: 0.1,
        update: 0.2,
        record_events: true,
        seed: Some(seed),
        ..Default::default()
    });

    println!("\n--- Initial State ---");
    println!("  {}", sim.state_summary());

    for _ in 0..3 {
        sim.run(5);
        println!("  {}", sim.state_summary());
    }

    println!(
        "\n  Connections: {}, disconnections: {}, events logged: {}",
        sim.stats.connections,
        sim.stats.disconnections,
        sim.event_log.len()
    );
    sim
}

/// Hidden opinions: nodes start seeing half of each neighbour's coordinates
///
/// Node 1 then reveals everything to node 0, and node 0 hides its first
/// coordinate from node 1.
pub fn run_hidden_opinions_scenario(seed: u64) -> Simulation {
    info!("=== Running Hidden Opinions Scenario ===");

    let dimensions = 3;
    let mut sim = Simulation::new(NetworkConfig {
        n: 6,
        topology: "cycle".into(),
        dimensions,
        visibility: Visibility::Random,
        seed: Some(seed),
        ..Default::default()
    });

    println!("\n--- Initial perception of node 1 by node 0 ---");
    println!("  truth {:?}, seen {:?}", sim.attributes().opinion(1), sim.masks().row(0, 1));

    for dim in 0..dimensions {
        if let Err(e) = sim.reveal(1, 0, dim) {
            println!("  {e}");
        }
    }
    if let Err(e) = sim.hide(0, 1, 0) {
        println!("  {e}");
    }

    println!("\n--- After reveal/hide ---");
    println!("  node 0 sees node 1 as {:?}", sim.masks().row(0, 1));
    println!("  node 1 sees node 0 as {:?}", sim.masks().row(1, 0));

    sim.run(5);
    println!("\n  {}", sim.state_summary());
    sim
}
