//! Integration scenarios exercising the full murmur stack
//!
//! These scenarios combine:
//! - configuration parsing (murmur-core TOML)
//! - topology generation and the dynamics engine
//! - the console command interpreter
//! - JSON state export and import
//! - statistics tracking

use std::collections::BTreeMap;

use murmur_core::{Archetype, NetworkConfig, ResistanceSpec, ResistanceValue, Visibility};

use crate::console::{Command, CommandOutcome, Console};
use crate::simulation::Simulation;
use crate::stats::{self, Statistic};

fn from_toml(toml: &str) -> Simulation {
    Simulation::new(NetworkConfig::from_toml_str(toml).unwrap())
}

/// A TOML configuration drives every part of network construction
#[test]
fn test_toml_config_builds_network() {
    let sim = from_toml(
        r#"
        n = 12
        topology = "star"
        dimensions = 3
        seed = 5
        type_dist = { R = 0.5, E = 0.5 }

        [resistance]
        R = 0.25
        E = "random"
        "#,
    );

    assert_eq!(sim.node_count(), 12);
    assert_eq!(sim.dimensions(), 3);
    assert_eq!(sim.graph().edge_count(), 11);
    assert_eq!(sim.graph().degree(0), 11);
    assert_eq!(sim.population().indexes(Archetype::R).len(), 6);
    assert_eq!(sim.population().indexes(Archetype::E).len(), 6);
    for &node in sim.population().indexes(Archetype::R) {
        assert_eq!(sim.resistance()[node], 0.25);
    }
    for &node in sim.population().indexes(Archetype::E) {
        assert!((0.0..1.0).contains(&sim.resistance()[node]));
    }
}

/// Save mid-run, reload, and both copies keep evolving consistently
#[test]
fn test_save_load_and_continue() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let mut sim = Simulation::new(NetworkConfig {
        n: 15,
        topology: "small world".into(),
        saturation: 0.3,
        dimensions: 2,
        visibility: Visibility::Random,
        friend: 0.05,
        unfriend: 0.5,
        seed: Some(17),
        ..Default::default()
    });
    sim.run(4);
    sim.save_json(&path).unwrap();

    let mut loaded = Simulation::load_json(&path).unwrap();
    assert_eq!(loaded.tick, 4);
    assert_eq!(loaded.graph(), sim.graph());
    assert_eq!(loaded.masks(), sim.masks());

    loaded.run(3);
    assert_eq!(loaded.tick, 7);
    assert!(loaded.weights().check_normalization().is_empty());
    for observer in 0..loaded.node_count() {
        assert_eq!(
            loaded.masks().row(observer, observer),
            loaded.attributes().opinion(observer)
        );
    }
}

/// Console commands mutate the simulation the same way the API does
#[test]
fn test_console_session_drives_simulation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("console.json");

    let mut sim = Simulation::new(NetworkConfig {
        n: 6,
        topology: "cycle".into(),
        dimensions: 2,
        seed: Some(3),
        ..Default::default()
    });

    let script = format!(
        "disconnect 0 1\n\
         connect 0 3\n\
         set type 2 DA\n\
         set resistance all 0.4\n\
         step 2\n\
         save {}\n\
         quit\n\
         step 100\n",
        path.display()
    );
    let mut output = Vec::new();
    Console::new(&mut sim)
        .run(script.as_bytes(), &mut output)
        .unwrap();

    assert_eq!(sim.tick, 2);
    assert_eq!(sim.population().archetype(2), Archetype::DA);
    assert!(sim.resistance().iter().all(|&r| r == 0.4));
    assert!(path.exists());

    let saved = Simulation::load_json(&path).unwrap();
    assert_eq!(saved.tick, 2);
    assert_eq!(saved.export_state(), sim.export_state());
}

/// Unknown input does not stop a console session
#[test]
fn test_console_survives_bad_input() {
    let mut sim = Simulation::new(NetworkConfig {
        n: 4,
        topology: "complete".into(),
        seed: Some(8),
        ..Default::default()
    });
    let mut console = Console::new(&mut sim);

    for line in ["frobnicate", "show neighbors 99", "step abc", ""] {
        match Command::parse(line) {
            Ok(command) => {
                assert!(matches!(console.execute(command), CommandOutcome::Continue(_)));
            }
            Err(e) => assert!(!e.to_string().is_empty()),
        }
    }
    assert!(matches!(
        console.execute(Command::Quit),
        CommandOutcome::Quit
    ));
}

/// Reinforcers on a complete graph agree after one step
#[test]
fn test_reinforcers_reach_consensus() {
    let mut sim = Simulation::new(NetworkConfig {
        n: 9,
        topology: "complete".into(),
        dimensions: 1,
        type_dist: Some(BTreeMap::from([("R".to_string(), 1.0)])),
        update: 1.0,
        friend: 0.0,
        unfriend: 0.0,
        seed: Some(11),
        ..Default::default()
    });

    sim.step();
    let first = sim.attributes().opinion(0)[0];
    assert!((0..9).all(|node| sim.attributes().opinion(node)[0] == first));

    let flips = sim.stats.flips;
    sim.run(3);
    assert_eq!(sim.stats.flips, flips);
}

/// Disruptors on a complete graph never settle
#[test]
fn test_disruptors_keep_flipping() {
    let mut sim = Simulation::new(NetworkConfig {
        n: 9,
        topology: "complete".into(),
        dimensions: 1,
        type_dist: Some(BTreeMap::from([("DA".to_string(), 1.0)])),
        resistance: ResistanceSpec::Uniform(ResistanceValue::Fixed(0.0)),
        update: 1.0,
        friend: 0.0,
        unfriend: 0.0,
        seed: Some(11),
        ..Default::default()
    });

    for _ in 0..6 {
        let before = sim.stats.flips;
        sim.step();
        assert!(sim.stats.flips > before, "disruptors settled at tick {}", sim.tick);
    }
}

/// Tracking closes over the same simulation that keeps stepping
#[test]
fn test_track_degree_follows_rewiring() {
    let mut sim = Simulation::new(NetworkConfig {
        n: 8,
        topology: "cycle".into(),
        friend: 1.0,
        unfriend: 0.0,
        update: 0.0,
        seed: Some(2),
        ..Default::default()
    });

    let series = stats::track(&mut sim, Statistic::Degree, 3);
    assert_eq!(series.len(), 8);
    assert!(series.iter().all(|s| s.len() == 4));

    let before: f64 = series.iter().map(|s| s[0]).sum();
    let after: f64 = series.iter().map(|s| s[3]).sum();
    assert!(after > before);
    let last: Vec<f64> = series.iter().map(|s| s[3]).collect();
    assert_eq!(last, stats::degree_centrality(sim.graph()));
}

/// Seeded runs reproduce the exact same event history
#[test]
fn test_seeded_event_history_is_reproducible() {
    let config = NetworkConfig {
        n: 20,
        topology: "random".into(),
        saturation: 0.3,
        dimensions: 3,
        friend: 0.05,
        unfriend: 0.6,
        unfriend_threshold: 0.4,
        record_events: true,
        seed: Some(99),
        ..Default::default()
    };

    let mut a = Simulation::new(config.clone());
    let mut b = Simulation::new(config);
    a.run(6);
    b.run(6);

    assert_eq!(a.event_log, b.event_log);
    assert_eq!(a.stats, b.stats);
    assert_eq!(a.export_state(), b.export_state());
}
