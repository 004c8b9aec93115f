//! Persistence codec: graph snapshot ↔ JSON text blob.
//!
//! The blob carries exactly the saved fields (node id, label, radius,
//! position and pin; link endpoints and arrow flags). Simulation state such
//! as velocity or alpha is never written. Decoding is best-effort: a
//! missing or malformed blob loads as an empty graph.
//!
//! ```json
//! {"nodes":[{"id":1,"label":"A","r":20.0,"x":10.0,"y":20.0,"fx":10.0,"fy":20.0}],
//!  "links":[{"source":1,"target":2,"left":false,"right":true}]}
//! ```

use crate::error::GraphError;
use crate::id::NodeId;
use crate::model::{DEFAULT_RADIUS, Graph, GraphModel, Link, Node, Position};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Key under which the editor stores its blob.
pub const STORAGE_KEY: &str = "node-graph-editor";

// ─── Wire records ───────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    nodes: Vec<NodeRecord>,
    #[serde(default)]
    links: Vec<LinkRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeRecord {
    id: NodeId,
    #[serde(default)]
    label: Option<String>,
    #[serde(default = "default_radius")]
    r: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fx: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fy: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LinkRecord {
    source: NodeId,
    target: NodeId,
    #[serde(default)]
    left: bool,
    #[serde(default)]
    right: bool,
}

fn default_radius() -> f64 {
    DEFAULT_RADIUS
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|v| v.is_finite())
}

impl From<&Node> for NodeRecord {
    fn from(node: &Node) -> Self {
        let position = node.position.filter(Position::is_finite);
        Self {
            id: node.id,
            label: Some(node.label.clone()),
            r: node.radius,
            x: position.map(|p| p.x),
            y: position.map(|p| p.y),
            fx: finite(node.fx),
            fy: finite(node.fy),
        }
    }
}

impl From<NodeRecord> for Node {
    fn from(record: NodeRecord) -> Self {
        let label = record
            .label
            .unwrap_or_else(|| Node::default_label(record.id));
        let mut node = Node::new(record.id, label, record.r);
        if let (Some(x), Some(y)) = (finite(record.x), finite(record.y)) {
            node.position = Some(Position::new(x, y));
        }
        node.fx = finite(record.fx);
        node.fy = finite(record.fy);
        node
    }
}

impl From<&Link> for LinkRecord {
    fn from(link: &Link) -> Self {
        Self {
            source: link.source,
            target: link.target,
            left: link.left,
            right: link.right,
        }
    }
}

impl From<LinkRecord> for Link {
    fn from(record: LinkRecord) -> Self {
        Link {
            source: record.source,
            target: record.target,
            left: record.left,
            right: record.right,
        }
    }
}

// ─── Encode / Decode ────────────────────────────────────────────────────

/// Encode a snapshot as a deterministic JSON blob.
///
/// Nodes are written in id order and links in `(source, target)` order,
/// whatever order the snapshot holds them in.
pub fn encode(graph: &Graph) -> String {
    let mut nodes: Vec<&Node> = graph.nodes.iter().collect();
    nodes.sort_by_key(|n| n.id);
    let mut links: Vec<&Link> = graph.links.iter().collect();
    links.sort_by_key(|l| (l.source, l.target));

    let doc = Document {
        nodes: nodes.into_iter().map(NodeRecord::from).collect(),
        links: links.into_iter().map(LinkRecord::from).collect(),
    };
    serde_json::to_string(&doc).unwrap_or_else(|err| {
        log::warn!("failed to encode graph: {err}");
        r#"{"nodes":[],"links":[]}"#.to_string()
    })
}

/// Decode a blob, reporting why it could not be read.
///
/// The result is normalized through [`GraphModel::from_graph`]: links are
/// canonical and deduplicated, and dangling or self links are dropped.
pub fn try_decode(blob: &str) -> Result<Graph, GraphError> {
    if blob.trim().is_empty() {
        return Err(GraphError::Decode("empty blob".to_string()));
    }
    let doc: Document =
        serde_json::from_str(blob).map_err(|err| GraphError::Decode(err.to_string()))?;
    let graph = Graph {
        nodes: doc.nodes.into_iter().map(Node::from).collect(),
        links: doc.links.into_iter().map(Link::from).collect(),
    };
    Ok(GraphModel::from_graph(graph).snapshot())
}

/// Decode a blob, falling back to an empty graph on any failure.
pub fn decode(blob: &str) -> Graph {
    try_decode(blob).unwrap_or_else(|err| {
        log::warn!("{err}; loading empty graph");
        Graph::default()
    })
}

// ─── Storage ─────────────────────────────────────────────────────────────

/// Key/value storage for encoded blobs (browser local storage, a file,
/// or memory).
pub trait BlobStore {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&mut self, key: &str, blob: String);
    fn remove(&mut self, key: &str);
}

/// In-process store, used by native hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn write(&mut self, key: &str, blob: String) {
        self.entries.insert(key.to_string(), blob);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Saves and loads one graph under [`STORAGE_KEY`].
#[derive(Debug, Clone, Default)]
pub struct Persistence<S> {
    store: S,
}

impl<S: BlobStore> Persistence<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Overwrite the stored blob with `graph`.
    pub fn save(&mut self, graph: &Graph) {
        let blob = encode(graph);
        log::debug!(
            "saving {} node(s), {} link(s) ({} bytes)",
            graph.nodes.len(),
            graph.links.len(),
            blob.len()
        );
        self.store.write(STORAGE_KEY, blob);
    }

    /// Read the stored graph; missing or corrupt blobs load as empty.
    pub fn load(&self) -> Graph {
        match self.store.read(STORAGE_KEY) {
            Some(blob) => decode(&blob),
            None => Graph::default(),
        }
    }

    /// Delete the stored blob.
    pub fn clear(&mut self) {
        self.store.remove(STORAGE_KEY);
    }
}
