//! Integration tests: model → blob → model.

use ng_core::codec::{decode, encode, try_decode};
use ng_core::model::{Graph, GraphModel, Node};
use ng_core::{ForceSimulation, GraphError, NodeId, SimulationConfig, Viewport};
use pretty_assertions::assert_eq;

fn sample() -> GraphModel {
    let mut model = GraphModel::new();
    let alpha = NodeId(1_700_000_000_001);
    let beta = NodeId(1_700_000_000_002);
    model
        .insert_node(Node::new(alpha, "alpha", 20.0).with_position(12.5, -3.0))
        .unwrap();
    model
        .insert_node(Node::new(beta, "beta", 32.0).with_pin(100.0, 80.0))
        .unwrap();
    let gamma = model.add_node("gamma", 20.0).id;
    model.upsert_link(beta, alpha, false, true).unwrap();
    model.upsert_link(gamma, alpha, false, true).unwrap();
    model
}

#[test]
fn roundtrip_preserves_graph() {
    let snapshot = sample().snapshot();
    let decoded = decode(&encode(&snapshot));
    assert_eq!(decoded, snapshot);
}

#[test]
fn roundtrip_after_layout() {
    let mut model = sample();
    let mut sim = ForceSimulation::new(SimulationConfig::default(), Viewport::new(600.0, 400.0));
    for _ in 0..30 {
        sim.tick(&mut model.layout_mut());
    }
    let snapshot = model.snapshot();
    let blob = encode(&snapshot);

    assert_eq!(decode(&blob), snapshot);
    // Velocity and alpha are not part of the blob
    assert!(!blob.contains("\"vx\":"));
    assert!(!blob.contains("\"alpha\":"));
}

#[test]
fn encoding_is_deterministic() {
    let model = sample();
    assert_eq!(encode(&model.snapshot()), encode(&model.clone().snapshot()));
}

#[test]
fn garbage_decodes_empty() {
    assert_eq!(decode("{{{"), Graph::default());
    assert_eq!(decode(""), Graph::default());
    assert!(matches!(try_decode("null"), Err(GraphError::Decode(_))));
}

#[test]
fn loaded_ids_do_not_collide_with_new_ones() {
    let blob = encode(&sample().snapshot());
    let mut model = GraphModel::from_graph(decode(&blob));
    let fresh = model.add_node("new", 20.0).id;
    assert_eq!(fresh, NodeId(1_700_000_000_004));
}

#[test]
fn loading_the_largest_id_keeps_new_ids_unique() {
    let blob = r#"{"nodes":[{"id":18446744073709551615,"label":"last","r":20}],"links":[]}"#;
    let mut model = GraphModel::from_graph(decode(blob));
    assert_eq!(model.node_count(), 1);

    let a = model.add_node("a", 20.0).id;
    let b = model.add_node("b", 20.0).id;
    assert_ne!(a, b);
    assert_ne!(a, NodeId(u64::MAX));
    assert_ne!(b, NodeId(u64::MAX));
    assert_eq!(model.node_count(), 3);
    assert_eq!(model.node(NodeId(u64::MAX)).unwrap().label, "last");
}

#[test]
fn merge_scenario_on_model() {
    let mut model = GraphModel::new();
    for id in 1..=3 {
        model
            .insert_node(Node::new(NodeId(id), format!("n{id}"), 20.0))
            .unwrap();
    }
    model.upsert_link(NodeId(2), NodeId(3), false, true).unwrap();
    model.upsert_link(NodeId(3), NodeId(2), false, true).unwrap();
    assert_eq!(model.link_count(), 1);
    assert!(model.link(NodeId(2), NodeId(3)).unwrap().is_bidirectional());

    model.remove_node(NodeId(2)).unwrap();
    assert_eq!(model.link_count(), 0);
    let ids: Vec<NodeId> = model.nodes().iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![NodeId(1), NodeId(3)]);
}
