//! Frame snapshot handed to the JS renderer as JSON.
//!
//! Everything the host needs to paint one frame: node circles, link paths
//! with their arrowheads, the guide line of a link being drawn, and the
//! pan/zoom to draw them with.

use ng_core::codec::BlobStore;
use ng_editor::ViewTransform;
use ng_editor::session::{EditorSession, HostEvents};
use ng_render::svg_path;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct FrameView {
    pub nodes: Vec<NodeView>,
    pub links: Vec<LinkView>,
    /// SVG path data of the guide line, empty when no link is being drawn.
    pub guide: String,
    /// Margin the host translates the drawing by.
    pub margin: f64,
    /// Pan and zoom applied inside the margin, in layout units.
    pub transform: ViewTransform,
    pub running: bool,
}

#[derive(Debug, Serialize)]
pub struct NodeView {
    pub id: u64,
    pub label: String,
    pub r: f64,
    pub x: f64,
    pub y: f64,
    pub pinned: bool,
}

#[derive(Debug, Serialize)]
pub struct LinkView {
    pub source: u64,
    pub target: u64,
    pub left: bool,
    pub right: bool,
    /// SVG path data; empty when the endpoints coincide.
    pub d: String,
}

pub fn frame<S: BlobStore, H: HostEvents>(session: &EditorSession<S, H>) -> FrameView {
    let nodes = session
        .model()
        .nodes()
        .into_iter()
        .filter_map(|node| {
            let p = node.position?;
            Some(NodeView {
                id: node.id.get(),
                label: node.label.clone(),
                r: node.radius,
                x: p.x,
                y: p.y,
                pinned: node.is_pinned(),
            })
        })
        .collect();
    let links = session
        .link_paths()
        .into_iter()
        .map(|path| LinkView {
            source: path.source.get(),
            target: path.target.get(),
            left: path.start_arrow,
            right: path.end_arrow,
            d: svg_path(path.line),
        })
        .collect();

    FrameView {
        nodes,
        links,
        guide: svg_path(session.guide()),
        margin: session.config().margin,
        transform: session.view(),
        running: session.simulation().is_running(),
    }
}

pub fn frame_json<S: BlobStore, H: HostEvents>(session: &EditorSession<S, H>) -> String {
    serde_json::to_string(&frame(session)).unwrap_or_else(|err| {
        log::warn!("failed to serialize frame: {err}");
        r#"{"nodes":[],"links":[],"guide":"","transform":{"x":0,"y":0,"k":1}}"#.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ng_core::codec::MemoryStore;
    use ng_core::model::{Graph, Link, Node};
    use ng_core::{NodeId, Viewport};
    use ng_editor::{EditorConfig, WheelEvent};
    use pretty_assertions::assert_eq;

    fn session(graph: Graph) -> EditorSession<MemoryStore, ()> {
        let mut session = EditorSession::new(
            EditorConfig::default(),
            Viewport::new(400.0, 300.0),
            MemoryStore::new(),
            (),
        );
        session.set_data(graph);
        session
    }

    #[test]
    fn frame_lists_nodes_and_paths() {
        let s = session(Graph {
            nodes: vec![
                Node::new(NodeId(1), "a", 20.0).with_position(0.0, 0.0),
                Node::new(NodeId(2), "b", 20.0).with_position(100.0, 0.0).with_pin(100.0, 0.0),
            ],
            links: vec![Link {
                source: NodeId(1),
                target: NodeId(2),
                left: false,
                right: true,
            }],
        });
        let view = frame(&s);
        assert_eq!(view.nodes.len(), 2);
        assert!(!view.nodes[0].pinned);
        assert!(view.nodes[1].pinned);
        assert_eq!(view.links[0].d, "M20,0L80,0");
        assert_eq!(view.guide, "");
    }

    #[test]
    fn coincident_link_has_empty_path() {
        let s = session(Graph {
            nodes: vec![
                Node::new(NodeId(1), "a", 20.0).with_pin(50.0, 50.0),
                Node::new(NodeId(2), "b", 20.0).with_pin(50.0, 50.0),
            ],
            links: vec![Link {
                source: NodeId(1),
                target: NodeId(2),
                left: true,
                right: true,
            }],
        });
        let json = frame_json(&s);
        assert!(json.contains(r#""d":"""#));
        assert!(!json.contains("NaN"));
    }

    #[test]
    fn frame_reports_view_transform() {
        let mut s = session(Graph::default());
        let json = frame_json(&s);
        assert!(json.contains(r#""transform":{"x":0.0,"y":0.0,"k":1.0}"#));

        s.handle_wheel(WheelEvent {
            x: 100.0,
            y: 0.0,
            delta_y: -500.0,
        });
        let view = frame(&s);
        assert_eq!(view.transform.k, 2.0);
        assert_eq!(view.transform.x, -100.0);
    }
}
