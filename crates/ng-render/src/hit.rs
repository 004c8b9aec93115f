//! Hit testing: point → node sub-region lookup.
//!
//! Each node is drawn as an outer ring (the link handle), an inner body
//! and a small delete badge offset to its upper right. Nodes are painted
//! in id order, so the walk goes from the highest id down (topmost first).

use kurbo::{Circle, Point, Shape, Vec2};
use ng_core::model::{GraphModel, Node};
use ng_core::NodeId;

/// Which part of a node the pointer is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRegion {
    /// Inner disc.
    Body,
    /// Outer ring between the body and the node radius.
    LinkHandle,
    /// Delete badge.
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub id: NodeId,
    pub region: NodeRegion,
    /// Node center at the time of the hit.
    pub center: Point,
}

/// Geometry of the per-node affordances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitConfig {
    /// Width of the outer ring that acts as link handle.
    pub handle_width: f64,
    /// Offset of the delete badge from the node center.
    pub delete_offset: (f64, f64),
    pub delete_radius: f64,
}

impl Default for HitConfig {
    fn default() -> Self {
        Self {
            handle_width: 5.0,
            delete_offset: (15.0, -15.0),
            delete_radius: 8.0,
        }
    }
}

/// Find the topmost node region at `(px, py)`.
/// Returns `None` over empty canvas and for nodes not yet placed.
pub fn hit_test(model: &GraphModel, px: f64, py: f64, config: &HitConfig) -> Option<Hit> {
    let point = Point::new(px, py);
    model
        .nodes()
        .into_iter()
        .rev()
        .find_map(|node| hit_node(node, point, config))
}

fn hit_node(node: &Node, point: Point, config: &HitConfig) -> Option<Hit> {
    let p = node.position?;
    let center = Point::new(p.x, p.y);
    let (dx, dy) = config.delete_offset;

    // The badge is painted over the node, so it wins where they overlap
    let badge = Circle::new(center + Vec2::new(dx, dy), config.delete_radius);
    let region = if badge.contains(point) {
        NodeRegion::Delete
    } else if Circle::new(center, node.radius).contains(point) {
        let inner = (node.radius - config.handle_width).max(0.0);
        if center.distance(point) < inner {
            NodeRegion::Body
        } else {
            NodeRegion::LinkHandle
        }
    } else {
        return None;
    };

    Some(Hit {
        id: node.id,
        region,
        center,
    })
}
