//! Link and guide-line geometry.
//!
//! A link is drawn as a straight segment between the two node centers,
//! trimmed at each end so arrowheads sit on the circle outline. When the
//! endpoints coincide there is no direction to trim along, and the path
//! is omitted for that frame instead of producing `NaN` coordinates.

use kurbo::{Line, Point};
use ng_core::model::{GraphModel, Position};
use ng_core::NodeId;

/// A drawable link for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkPath {
    pub source: NodeId,
    pub target: NodeId,
    /// Arrowhead at the source end.
    pub start_arrow: bool,
    /// Arrowhead at the target end.
    pub end_arrow: bool,
    /// `None` when the endpoints coincide or are not placed yet.
    pub line: Option<Line>,
}

/// Segment from `source` to `target`, trimmed by the given paddings.
pub fn link_path(
    source: Position,
    target: Position,
    source_padding: f64,
    target_padding: f64,
) -> Option<Line> {
    let (s, t) = (point(source), point(target));
    let delta = t - s;
    let dist = delta.hypot();
    if !(dist.is_finite() && dist > 0.0) {
        return None;
    }
    let norm = delta / dist;
    let line = Line::new(s + norm * source_padding, t - norm * target_padding);
    (line.p0.is_finite() && line.p1.is_finite()).then_some(line)
}

/// Paths for every link in the model, in `(source, target)` order.
///
/// Each end is trimmed by its node's radius plus `padding`.
pub fn link_paths(model: &GraphModel, padding: f64) -> Vec<LinkPath> {
    model
        .links()
        .into_iter()
        .map(|link| {
            let line = match (model.node(link.source), model.node(link.target)) {
                (Some(s), Some(t)) => match (s.position, t.position) {
                    (Some(sp), Some(tp)) => {
                        link_path(sp, tp, s.radius + padding, t.radius + padding)
                    }
                    _ => None,
                },
                _ => None,
            };
            if line.is_none() {
                log::trace!("omitting path for link {}-{}", link.source, link.target);
            }
            LinkPath {
                source: link.source,
                target: link.target,
                start_arrow: link.left,
                end_arrow: link.right,
                line,
            }
        })
        .collect()
}

/// Guide line from the link source's center to the live pointer.
pub fn guide_line(from: Position, to: Point) -> Line {
    Line::new(point(from), to)
}

/// SVG path data (`M x,y L x,y`) for a segment, or `""` when omitted.
pub fn svg_path(line: Option<Line>) -> String {
    match line {
        Some(l) => format!("M{},{}L{},{}", l.p0.x, l.p0.y, l.p1.x, l.p1.y),
        None => String::new(),
    }
}

fn point(p: Position) -> Point {
    Point::new(p.x, p.y)
}
