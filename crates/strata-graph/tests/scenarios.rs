//! End-to-end checks from indexer events to positioned snapshots.

use std::collections::HashSet;
use strata_core::{IndexerEvent, ProjectState};
use strata_graph::{LayoutConfig, Rebuild};

fn ingest(json: &str) -> ProjectState {
    let mut state = ProjectState::new();
    for event in IndexerEvent::batch_from_json(json).unwrap() {
        state.apply(event);
    }
    state
}

const ZOO: &str = r#"{
    "event": "project_structure",
    "payload": {
        "files": ["zoo.cpp", "farm.cpp"],
        "imports": {"1": [0]},
        "tags": {
            "0": [
                {"Class": {"name": "Animal", "parents": []}},
                {"Function": {"name": "eat"}},
                {"Class": {"name": "Dog", "parents": [{"Connected": [0, 0]}]}},
                {"Object": {"name": "legs", "class": {"DataType": 10}}},
                {"Class": {"name": "Cat", "parents": [
                    {"Connected": [0, 0]},
                    {"Undiscovered": "Pet"}
                ]}}
            ],
            "1": [
                {"Class": {"name": "Cow", "parents": [{"Connected": [0, 0]}]}},
                {"Class": {"name": "Calf", "parents": [
                    {"Connected": [1, 0]},
                    {"Connected": [0, 2]}
                ]}}
            ]
        },
        "containment": {
            "[0,0]": [[0, 1], [0, 3], [99, 0]],
            "[0,2]": [[0, 1]]
        }
    }
}"#;

#[test]
fn test_animal_dog_scenario() {
    let state = ingest(
        r#"{"event":"project_structure","payload":{
            "files": [],
            "imports": {},
            "tags": {"0": [
                {"Class": {"name": "Animal", "parents": []}},
                {"Class": {"name": "Dog", "parents": [{"Connected": [0, 0]}]}}
            ]},
            "containment": {}
        }}"#,
    );
    let rebuild = Rebuild::run(&state, &LayoutConfig::default());
    let snapshot = rebuild.snapshot();

    assert_eq!(snapshot.nodes.len(), 2);
    assert_eq!(snapshot.nodes[0].id, "0-0");
    assert_eq!(snapshot.nodes[0].display_name, "Animal");
    assert_eq!(snapshot.nodes[1].id, "0-1");
    assert_eq!(snapshot.nodes[1].display_name, "Dog");
    assert_eq!(snapshot.edges.len(), 1);
    assert_eq!(snapshot.edges[0].source, "0-0");
    assert_eq!(snapshot.edges[0].target, "0-1");

    assert_eq!(rebuild.layout.level_of("0-0"), Some(0));
    assert_eq!(rebuild.layout.level_of("0-1"), Some(1));
    assert_eq!(snapshot.nodes[0].position.x, 0.0);
    assert_eq!(snapshot.nodes[1].position.x, 0.0);
}

#[test]
fn test_three_siblings_scenario() {
    let state = ingest(
        r#"{"event":"project_structure","payload":{
            "tags": {"0": [
                {"Class": {"name": "Root", "parents": []}},
                {"Class": {"name": "A", "parents": [{"Connected": [0, 0]}]}},
                {"Class": {"name": "B", "parents": [{"Connected": [0, 0]}]}},
                {"Class": {"name": "C", "parents": [{"Connected": [0, 0]}]}}
            ]}
        }}"#,
    );
    let rebuild = Rebuild::run(&state, &LayoutConfig::default());
    let snapshot = rebuild.snapshot();

    let xs: Vec<f64> = snapshot.nodes[1..].iter().map(|n| n.position.x).collect();
    assert_eq!(xs, vec![-250.0, 0.0, 250.0]);
    for node in &snapshot.nodes[1..] {
        assert_eq!(rebuild.layout.level_of(&node.id), Some(1));
        assert_eq!(node.position.y, 200.0);
    }
}

#[test]
fn test_members_and_dangling_child() {
    let state = ingest(ZOO);
    let rebuild = Rebuild::run(&state, &LayoutConfig::default());
    let animal = rebuild.graph.get_by_id("0-0").unwrap();

    assert_eq!(animal.methods.len(), 1);
    assert_eq!(animal.methods[0].name, "eat");
    assert_eq!(animal.objects.len(), 1);
    assert_eq!(animal.objects[0].type_name.as_deref(), Some("int"));
    assert_eq!(animal.file.as_deref(), Some("zoo.cpp"));
    assert_eq!(rebuild.diagnostics.len(), 1);

    let dog = rebuild.graph.get_by_id("0-2").unwrap();
    assert_eq!(dog.methods[0].name, "eat");
}

#[test]
fn test_graph_invariants() {
    let state = ingest(ZOO);
    let rebuild = Rebuild::run(&state, &LayoutConfig::default());
    let snapshot = rebuild.snapshot();

    let ids: HashSet<&str> = snapshot.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids.len(), snapshot.nodes.len());
    assert_eq!(snapshot.nodes.len(), 5);
    assert_eq!(snapshot.edges.len(), 5);

    for edge in &snapshot.edges {
        assert!(ids.contains(edge.source.as_str()));
        assert!(ids.contains(edge.target.as_str()));
    }

    // Calf keeps its last parent, Dog, for layout.
    assert_eq!(rebuild.layout.level_of("0-2"), Some(1));
    assert_eq!(rebuild.layout.level_of("1-1"), Some(2));

    for level in rebuild.layout.levels() {
        let sum: f64 = level
            .iter()
            .map(|id| rebuild.layout.position_of(id).unwrap().x)
            .sum();
        assert!(sum.abs() < 1e-9);
    }
}

#[test]
fn test_rebuild_is_deterministic_and_idempotent() {
    let first = Rebuild::run(&ingest(ZOO), &LayoutConfig::default()).snapshot();

    let mut state = ingest(ZOO);
    for event in IndexerEvent::batch_from_json(ZOO).unwrap() {
        state.apply(event);
    }
    let second = Rebuild::run(&state, &LayoutConfig::default()).snapshot();

    assert_eq!(first, second);
}

#[test]
fn test_custom_spacing() {
    let config = LayoutConfig {
        node_spacing: 100.0,
        level_height: 80.0,
    };
    let rebuild = Rebuild::run(&ingest(ZOO), &config);

    let calf = rebuild.graph.get_by_id("1-1").unwrap();
    assert_eq!(calf.position.y, 160.0);
}
