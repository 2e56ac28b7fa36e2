use murmur_simulation::{MurmurError, NetworkConfig, NetworkState, Simulation, StateError, Visibility};
use serde_json::Value;

fn small_cycle() -> Simulation {
    Simulation::new(NetworkConfig {
        n: 5,
        topology: "cycle".into(),
        dimensions: 2,
        visibility: Visibility::Random,
        seed: Some(1234),
        ..Default::default()
    })
}

#[test]
fn json_layout_lists_parents_per_node() {
    let sim = small_cycle();
    let json: Value = serde_json::to_value(sim.export_state()).unwrap();

    assert_eq!(json["config"]["n"], 5);
    assert_eq!(json["attribute_space"].as_array().unwrap().len(), 5);
    assert_eq!(json["correlations"], serde_json::json!([[1.0, 0.0], [0.0, 1.0]]));
    assert_eq!(json["types"].as_array().unwrap().len(), 5);

    let nodes = json["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 5);
    assert_eq!(nodes[2]["idx"], 2);
    assert_eq!(nodes[2]["parents"], serde_json::json!([1, 3]));
    assert_eq!(nodes[2]["weights"], serde_json::json!([1.0, 1.0]));
    for entry in nodes[2]["masks"].as_array().unwrap() {
        assert_eq!(entry["revealed"].as_array().unwrap().len(), 2);
    }
}

#[test]
fn loads_of_one_file_evolve_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cycle.json");

    let mut sim = small_cycle();
    sim.run(3);
    sim.save_json(&path).unwrap();

    let mut first = Simulation::load_json(&path).unwrap();
    let mut second = Simulation::load_json(&path).unwrap();
    assert_eq!(first.export_state(), sim.export_state());

    first.run(4);
    second.run(4);
    assert_eq!(first.export_state(), second.export_state());
    assert_eq!(first.tick, 7);
}

#[test]
fn hand_edited_state_is_validated() {
    let mut state: NetworkState = small_cycle().export_state();
    state.resistance[0] = 1.5;
    assert!(matches!(
        Simulation::from_state(state),
        Err(StateError::Inconsistent(_))
    ));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.json");
    assert!(matches!(Simulation::load_json(&path), Err(MurmurError::Io(_))));
}
