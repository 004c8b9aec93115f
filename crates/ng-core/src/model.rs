//! Graph data model for node-link diagrams.
//!
//! Nodes are circles with a label, a radius, a current position and an
//! optional pin. Links are undirected pairs stored canonically with the
//! smaller node id as `source`; arrowheads are two independent flags
//! (`left` points at the source end, `right` at the target end).
//!
//! `GraphModel` is the single owned structure. Structural edits go through
//! its methods; the force simulation only ever sees a [`LayoutFacet`], which
//! can move nodes but cannot add or remove anything.

use crate::error::GraphError;
use crate::id::{IdAllocator, NodeId};
use petgraph::stable_graph::{NodeIndex, StableUnGraph};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Radius given to nodes created without an explicit size.
pub const DEFAULT_RADIUS: f64 = 20.0;

/// Smallest radius a node may have; keeps `radius > 0`.
pub const MIN_RADIUS: f64 = 1.0;

// ─── Nodes & Links ───────────────────────────────────────────────────────

/// A point in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub radius: f64,
    /// Current position. `None` until the layout places the node.
    pub position: Option<Position>,
    /// Pinned x. When set, the integrator holds the node at this x.
    pub fx: Option<f64>,
    /// Pinned y.
    pub fy: Option<f64>,
}

impl Node {
    pub fn new(id: NodeId, label: impl Into<String>, radius: f64) -> Self {
        Self {
            id,
            label: label.into(),
            radius: clamp_radius(radius),
            position: None,
            fx: None,
            fy: None,
        }
    }

    /// Label used when the host supplies none.
    pub fn default_label(id: NodeId) -> String {
        format!("NODE:{id}")
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Position::new(x, y));
        self
    }

    pub fn with_pin(mut self, x: f64, y: f64) -> Self {
        self.fx = Some(x);
        self.fy = Some(y);
        self
    }

    pub fn is_pinned(&self) -> bool {
        self.fx.is_some() || self.fy.is_some()
    }

    pub fn pin(&self) -> Option<Position> {
        match (self.fx, self.fy) {
            (Some(x), Some(y)) => Some(Position::new(x, y)),
            _ => None,
        }
    }
}

fn clamp_radius(radius: f64) -> f64 {
    if radius.is_finite() {
        radius.max(MIN_RADIUS)
    } else {
        DEFAULT_RADIUS
    }
}

/// An edge between two nodes, always stored with `source < target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub source: NodeId,
    pub target: NodeId,
    /// Arrowhead at the `source` (smaller id) end.
    pub left: bool,
    /// Arrowhead at the `target` (larger id) end.
    pub right: bool,
}

impl Link {
    /// Build a canonical link from endpoints given in any order.
    ///
    /// `arrow_at_a` / `arrow_at_b` follow the endpoints as passed and are
    /// mapped onto `left` / `right` by which endpoint has the smaller id.
    pub fn between(
        a: NodeId,
        b: NodeId,
        arrow_at_a: bool,
        arrow_at_b: bool,
    ) -> Result<Self, GraphError> {
        if a == b {
            return Err(GraphError::self_link(a));
        }
        Ok(if a < b {
            Self {
                source: a,
                target: b,
                left: arrow_at_a,
                right: arrow_at_b,
            }
        } else {
            Self {
                source: b,
                target: a,
                left: arrow_at_b,
                right: arrow_at_a,
            }
        })
    }

    /// OR another link's flags into this one. Flags are never cleared.
    pub fn merge(&mut self, other: &Link) {
        self.left |= other.left;
        self.right |= other.right;
    }

    pub fn is_bidirectional(&self) -> bool {
        self.left && self.right
    }

    pub fn touches(&self, id: NodeId) -> bool {
        self.source == id || self.target == id
    }
}

// ─── Snapshot ────────────────────────────────────────────────────────────

/// Detached copy of a graph: plain vectors with no shared state.
///
/// Nodes are ordered by id and links by `(source, target)`, so two
/// snapshots of equal models compare equal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

impl Graph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn link(&self, a: NodeId, b: NodeId) -> Option<&Link> {
        let (s, t) = if a < b { (a, b) } else { (b, a) };
        self.links.iter().find(|l| l.source == s && l.target == t)
    }
}

// ─── Graph Model ─────────────────────────────────────────────────────────

/// The live, editable graph.
///
/// Backed by an undirected stable graph so node indices survive removals
/// and removing a node drops its incident edges in one step.
#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    graph: StableUnGraph<Node, Link>,
    id_index: HashMap<NodeId, NodeIndex>,
    ids: IdAllocator,
    /// Bumped on every change to the node or link set.
    generation: u64,
}

impl GraphModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a model from a snapshot, normalizing it on the way in.
    ///
    /// Duplicate node ids keep the first occurrence. Self links and links
    /// to missing nodes are dropped; duplicate pairs are merged.
    pub fn from_graph(graph: Graph) -> Self {
        let mut model = Self::new();
        for node in graph.nodes {
            let id = node.id;
            if let Err(err) = model.insert_node(node) {
                log::warn!("skipping node {id}: {err}");
            }
        }
        for link in graph.links {
            // `left`/`right` always name the smaller/larger id end, even if
            // the incoming record had its endpoints swapped.
            let (s, t) = if link.source < link.target {
                (link.source, link.target)
            } else {
                (link.target, link.source)
            };
            if let Err(err) = model.upsert_link(s, t, link.left, link.right) {
                log::warn!("skipping link {}-{}: {err}", link.source, link.target);
            }
        }
        model
    }

    /// Add a node with a freshly allocated id. Position is left unset.
    pub fn add_node(&mut self, label: impl Into<String>, radius: f64) -> &Node {
        let id = self.ids.allocate(|id| self.id_index.contains_key(&id));
        let idx = self.graph.add_node(Node::new(id, label, radius));
        self.id_index.insert(id, idx);
        self.generation += 1;
        log::debug!("added node {id}");
        &self.graph[idx]
    }

    /// Insert a node that already carries an id (initial data, loads).
    pub fn insert_node(&mut self, mut node: Node) -> Result<NodeIndex, GraphError> {
        if self.id_index.contains_key(&node.id) {
            return Err(GraphError::InvalidOperation(format!(
                "node {} already exists",
                node.id
            )));
        }
        node.radius = clamp_radius(node.radius);
        if node.position.is_some_and(|p| !p.is_finite()) {
            node.position = None;
        }
        node.fx = node.fx.filter(|v| v.is_finite());
        node.fy = node.fy.filter(|v| v.is_finite());

        let id = node.id;
        self.ids.observe(id);
        let idx = self.graph.add_node(node);
        self.id_index.insert(id, idx);
        self.generation += 1;
        Ok(idx)
    }

    /// Remove a node and every link incident to it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, GraphError> {
        let idx = self.id_index.remove(&id).ok_or(GraphError::NotFound(id))?;
        let incident = self.graph.edges(idx).count();
        let node = self
            .graph
            .remove_node(idx)
            .ok_or_else(|| GraphError::InvalidOperation(format!("node {id} already removed")))?;
        self.generation += 1;
        log::debug!("removed node {id} and {incident} incident link(s)");
        Ok(node)
    }

    /// Create the link between `a` and `b`, or merge into the existing one.
    ///
    /// Repeating the gesture between the same pair accumulates direction
    /// flags; it never creates a second link.
    pub fn upsert_link(
        &mut self,
        a: NodeId,
        b: NodeId,
        arrow_at_a: bool,
        arrow_at_b: bool,
    ) -> Result<&Link, GraphError> {
        let link = Link::between(a, b, arrow_at_a, arrow_at_b)?;
        let s = self.index_of(link.source).ok_or(GraphError::NotFound(link.source))?;
        let t = self.index_of(link.target).ok_or(GraphError::NotFound(link.target))?;

        let edge = match self.graph.find_edge(s, t) {
            Some(edge) => {
                self.graph[edge].merge(&link);
                log::debug!("merged link {}-{}", link.source, link.target);
                edge
            }
            None => {
                self.generation += 1;
                log::debug!("created link {}-{}", link.source, link.target);
                self.graph.add_edge(s, t, link)
            }
        };
        Ok(&self.graph[edge])
    }

    /// Remove everything. Id allocation restarts from 1.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.id_index.clear();
        self.ids.reset();
        self.generation += 1;
    }

    /// Deep, independent copy for serialization.
    pub fn snapshot(&self) -> Graph {
        Graph {
            nodes: self.nodes().into_iter().cloned().collect(),
            links: self.links().into_iter().copied().collect(),
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    /// Mutable access to a node's own fields (label, radius, pin).
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.id_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.id_index.contains_key(&id)
    }

    pub fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn link(&self, a: NodeId, b: NodeId) -> Option<&Link> {
        let edge = self.graph.find_edge(self.index_of(a)?, self.index_of(b)?)?;
        Some(&self.graph[edge])
    }

    /// Nodes ordered by id.
    pub fn nodes(&self) -> Vec<&Node> {
        let mut nodes: Vec<&Node> = self.graph.node_weights().collect();
        nodes.sort_by_key(|n| n.id);
        nodes
    }

    /// Links ordered by `(source, target)`.
    pub fn links(&self) -> Vec<&Link> {
        let mut links: Vec<&Link> = self.graph.edge_weights().collect();
        links.sort_by_key(|l| (l.source, l.target));
        links
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn link_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Structural generation; changes whenever the node or link set does.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Position-only access for the layout engine.
    pub fn layout_mut(&mut self) -> LayoutFacet<'_> {
        LayoutFacet {
            graph: &mut self.graph,
            id_index: &self.id_index,
            generation: self.generation,
        }
    }
}

// ─── Layout Facet ────────────────────────────────────────────────────────

/// Narrow view of a [`GraphModel`] handed to the force simulation.
///
/// It can read the structure and write positions and pins, but it has no
/// way to add or remove nodes or links.
pub struct LayoutFacet<'a> {
    graph: &'a mut StableUnGraph<Node, Link>,
    id_index: &'a HashMap<NodeId, NodeIndex>,
    generation: u64,
}

impl LayoutFacet<'_> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&Node> {
        self.graph.node_weight(idx)
    }

    /// Node indices ordered by node id.
    pub fn indices(&self) -> Vec<NodeIndex> {
        let mut indices: Vec<NodeIndex> = self.graph.node_indices().collect();
        indices.sort_by_key(|idx| self.graph[*idx].id);
        indices
    }

    /// Link endpoints as `(source, target)` indices, ordered by node ids.
    pub fn links(&self) -> Vec<(NodeIndex, NodeIndex)> {
        let mut links: Vec<(NodeIndex, NodeIndex, NodeId, NodeId)> = self
            .graph
            .edge_indices()
            .filter_map(|e| {
                let (a, b) = self.graph.edge_endpoints(e)?;
                let link = &self.graph[e];
                let (s, t) = if self.graph[a].id == link.source {
                    (a, b)
                } else {
                    (b, a)
                };
                Some((s, t, link.source, link.target))
            })
            .collect();
        links.sort_by_key(|&(_, _, s, t)| (s, t));
        links.into_iter().map(|(s, t, _, _)| (s, t)).collect()
    }

    pub fn set_position(&mut self, idx: NodeIndex, position: Position) {
        if let Some(node) = self.graph.node_weight_mut(idx) {
            node.position = Some(position);
        }
    }

    pub fn set_pin(&mut self, idx: NodeIndex, fx: Option<f64>, fy: Option<f64>) {
        if let Some(node) = self.graph.node_weight_mut(idx) {
            node.fx = fx;
            node.fy = fy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_with(ids: &[u64]) -> GraphModel {
        let mut model = GraphModel::new();
        for &id in ids {
            model
                .insert_node(Node::new(NodeId(id), format!("n{id}"), DEFAULT_RADIUS))
                .unwrap();
        }
        model
    }

    #[test]
    fn add_node_assigns_fresh_ids() {
        let mut model = model_with(&[7]);
        let id = model.add_node("a", 20.0).id;
        assert_eq!(id, NodeId(8));
        assert!(model.node(id).unwrap().position.is_none());
        assert_eq!(model.node_count(), 2);
    }

    #[test]
    fn add_node_after_max_id_never_duplicates() {
        let mut model = model_with(&[1, u64::MAX]);
        let a = model.add_node("a", 20.0).id;
        let b = model.add_node("b", 20.0).id;
        assert_eq!((a, b), (NodeId(2), NodeId(3)));
        assert_eq!(model.node_count(), 4);
        for id in [1, 2, 3, u64::MAX] {
            assert_eq!(model.node(NodeId(id)).unwrap().id, NodeId(id));
        }
    }

    #[test]
    fn radius_is_kept_positive() {
        let mut model = GraphModel::new();
        let node = model.add_node("tiny", -4.0);
        assert!(node.radius > 0.0);
        let node = model.add_node("nan", f64::NAN);
        assert!(node.radius > 0.0);
    }

    #[test]
    fn upsert_link_is_canonical() {
        let mut model = model_with(&[1, 2]);
        let link = *model.upsert_link(NodeId(2), NodeId(1), false, true).unwrap();
        assert_eq!(link.source, NodeId(1));
        assert_eq!(link.target, NodeId(2));
        // Arrow was at `b` = node 1, the smaller id
        assert!(link.left);
        assert!(!link.right);
    }

    #[test]
    fn upsert_link_merges_opposite_directions() {
        let mut model = model_with(&[1, 2]);
        model.upsert_link(NodeId(1), NodeId(2), false, true).unwrap();
        model.upsert_link(NodeId(2), NodeId(1), false, true).unwrap();

        assert_eq!(model.link_count(), 1);
        let link = model.link(NodeId(1), NodeId(2)).unwrap();
        assert!(link.is_bidirectional());
    }

    #[test]
    fn upsert_link_never_clears_flags() {
        let mut model = model_with(&[1, 2]);
        model.upsert_link(NodeId(1), NodeId(2), true, true).unwrap();
        model.upsert_link(NodeId(1), NodeId(2), false, false).unwrap();
        assert!(model.link(NodeId(1), NodeId(2)).unwrap().is_bidirectional());
    }

    #[test]
    fn self_link_is_rejected() {
        let mut model = model_with(&[1]);
        let err = model.upsert_link(NodeId(1), NodeId(1), true, true).unwrap_err();
        assert!(matches!(err, GraphError::InvalidOperation(_)));
        assert_eq!(model.link_count(), 0);
    }

    #[test]
    fn link_to_missing_node_is_not_found() {
        let mut model = model_with(&[1]);
        let err = model.upsert_link(NodeId(1), NodeId(9), false, true).unwrap_err();
        assert_eq!(err, GraphError::NotFound(NodeId(9)));
    }

    #[test]
    fn remove_node_cascades_to_incident_links_only() {
        let mut model = model_with(&[1, 2, 3, 4]);
        model.upsert_link(NodeId(1), NodeId(2), false, true).unwrap();
        model.upsert_link(NodeId(2), NodeId(3), false, true).unwrap();
        model.upsert_link(NodeId(3), NodeId(4), false, true).unwrap();
        model.upsert_link(NodeId(4), NodeId(2), false, true).unwrap();

        model.remove_node(NodeId(2)).unwrap();

        assert!(!model.contains(NodeId(2)));
        let links = model.links();
        assert_eq!(links.len(), 1);
        assert!(links.iter().all(|l| !l.touches(NodeId(2))));
        assert!(model.link(NodeId(3), NodeId(4)).is_some());
    }

    #[test]
    fn remove_missing_node_is_not_found() {
        let mut model = model_with(&[1]);
        assert_eq!(
            model.remove_node(NodeId(5)).unwrap_err(),
            GraphError::NotFound(NodeId(5))
        );
        model.remove_node(NodeId(1)).unwrap();
        assert_eq!(
            model.remove_node(NodeId(1)).unwrap_err(),
            GraphError::NotFound(NodeId(1))
        );
    }

    #[test]
    fn snapshot_does_not_alias_live_model() {
        let mut model = model_with(&[1, 2]);
        model.upsert_link(NodeId(1), NodeId(2), false, true).unwrap();
        let snap = model.snapshot();

        model.node_mut(NodeId(1)).unwrap().label = "changed".into();
        model.upsert_link(NodeId(1), NodeId(2), true, false).unwrap();
        model.remove_node(NodeId(2)).unwrap();

        assert_eq!(snap.nodes.len(), 2);
        assert_eq!(snap.node(NodeId(1)).unwrap().label, "n1");
        let link = snap.link(NodeId(1), NodeId(2)).unwrap();
        assert!(!link.left && link.right);
    }

    #[test]
    fn from_graph_normalizes_links() {
        let graph = Graph {
            nodes: vec![
                Node::new(NodeId(1), "a", 20.0),
                Node::new(NodeId(2), "b", 20.0),
                Node::new(NodeId(2), "dup", 20.0),
            ],
            links: vec![
                Link {
                    source: NodeId(2),
                    target: NodeId(1),
                    left: false,
                    right: true,
                },
                Link {
                    source: NodeId(1),
                    target: NodeId(2),
                    left: true,
                    right: false,
                },
                Link {
                    source: NodeId(1),
                    target: NodeId(1),
                    left: true,
                    right: true,
                },
                Link {
                    source: NodeId(1),
                    target: NodeId(3),
                    left: false,
                    right: true,
                },
            ],
        };
        let model = GraphModel::from_graph(graph);
        assert_eq!(model.node_count(), 2);
        assert_eq!(model.node(NodeId(2)).unwrap().label, "b");
        assert_eq!(model.link_count(), 1);
        assert!(model.link(NodeId(1), NodeId(2)).unwrap().is_bidirectional());
    }

    #[test]
    fn generation_tracks_structural_changes_only() {
        let mut model = model_with(&[1, 2]);
        let g0 = model.generation();
        let idx = model.index_of(NodeId(1)).unwrap();
        model.layout_mut().set_position(idx, Position::new(3.0, 4.0));
        assert_eq!(model.generation(), g0);

        model.upsert_link(NodeId(1), NodeId(2), false, true).unwrap();
        let g1 = model.generation();
        assert!(g1 > g0);

        // Merging flags does not change the link set
        model.upsert_link(NodeId(2), NodeId(1), false, true).unwrap();
        assert_eq!(model.generation(), g1);
    }

    #[test]
    fn layout_facet_orders_links_by_id() {
        let mut model = model_with(&[3, 1, 2]);
        model.upsert_link(NodeId(3), NodeId(2), false, true).unwrap();
        model.upsert_link(NodeId(2), NodeId(1), false, true).unwrap();

        let layout = model.layout_mut();
        let ids: Vec<(NodeId, NodeId)> = layout
            .links()
            .into_iter()
            .map(|(s, t)| (layout.node(s).unwrap().id, layout.node(t).unwrap().id))
            .collect();
        assert_eq!(ids, vec![(NodeId(1), NodeId(2)), (NodeId(2), NodeId(3))]);
    }
}
