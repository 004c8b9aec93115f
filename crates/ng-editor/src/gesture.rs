//! Pointer gesture state machine.
//!
//! Turns pointer events (already hit-tested against the graph) into
//! [`Effect`]s for the session to apply. The controller never touches the
//! model itself, so every edit goes through one place.
//!
//! ## Pointer-down on a node
//!
//! | Region       | No modifier  | Ctrl / Cmd   |
//! |--------------|--------------|--------------|
//! | Body         | Drag         | —            |
//! | Link handle  | Drag         | Draw link    |
//! | Delete badge | Confirm delete | Confirm delete |
//!
//! A press on empty canvas without a modifier pans the view.
//!
//! Only one pointer is tracked: while a gesture is active, events from
//! any other pointer are ignored.

use crate::input::{Modifiers, PointerEvent};
use kurbo::Point;
use ng_core::NodeId;
use ng_render::{Hit, NodeRegion};
use smallvec::{SmallVec, smallvec};

/// A request from the controller to the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    /// Pin a node at a position.
    Pin { id: NodeId, x: f64, y: f64 },
    /// Raise the layout's resting temperature.
    Reheat { target: f64 },
    /// Let the layout cool down to rest.
    Cool,
    /// Create or merge the link between `a` and `b`.
    UpsertLink {
        a: NodeId,
        b: NodeId,
        arrow_at_a: bool,
        arrow_at_b: bool,
    },
    /// Ask the host to confirm removing a node.
    ConfirmDelete { id: NodeId },
    /// Move the view so the point grabbed at pointer-down is back under
    /// the pointer. The offset is in layout units.
    Pan { dx: f64, dy: f64 },
}

pub type Effects = SmallVec<[Effect; 2]>;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    NodeDragging {
        pointer: u32,
        node: NodeId,
    },
    LinkDrawing {
        pointer: u32,
        source: NodeId,
        /// Live pointer position, end of the guide line.
        cursor: Point,
    },
    Panning {
        pointer: u32,
        /// Layout point under the pointer when the pan started.
        anchor: Point,
    },
}

pub struct InteractionController {
    state: GestureState,
    /// `alpha_target` requested while dragging.
    drag_alpha_target: f64,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(0.3)
    }
}

impl InteractionController {
    pub fn new(drag_alpha_target: f64) -> Self {
        Self {
            state: GestureState::Idle,
            drag_alpha_target,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == GestureState::Idle
    }

    /// Node the pending link starts from, while drawing one.
    pub fn link_source(&self) -> Option<NodeId> {
        match self.state {
            GestureState::LinkDrawing { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Link source and live pointer position for the guide line.
    pub fn guide(&self) -> Option<(NodeId, Point)> {
        match self.state {
            GestureState::LinkDrawing { source, cursor, .. } => Some((source, cursor)),
            _ => None,
        }
    }

    /// Node being dragged, if any.
    pub fn dragged(&self) -> Option<NodeId> {
        match self.state {
            GestureState::NodeDragging { node, .. } => Some(node),
            _ => None,
        }
    }

    /// Handle a pointer event. `hit` is the node region under the pointer.
    pub fn handle(&mut self, event: &PointerEvent, hit: Option<Hit>) -> Effects {
        if let Some(active) = self.active_pointer()
            && active != event.pointer()
        {
            log::trace!("ignoring pointer {} during gesture", event.pointer());
            return Effects::new();
        }
        match *event {
            PointerEvent::Down {
                pointer,
                x,
                y,
                modifiers,
            } => self.on_down(pointer, Point::new(x, y), modifiers, hit),
            PointerEvent::Move { x, y, .. } => self.on_move(x, y),
            PointerEvent::Up { .. } => self.on_up(hit),
            PointerEvent::Cancel { .. } => self.on_cancel(),
        }
    }

    fn active_pointer(&self) -> Option<u32> {
        match self.state {
            GestureState::Idle => None,
            GestureState::NodeDragging { pointer, .. }
            | GestureState::LinkDrawing { pointer, .. }
            | GestureState::Panning { pointer, .. } => Some(pointer),
        }
    }

    fn on_down(
        &mut self,
        pointer: u32,
        at: Point,
        modifiers: Modifiers,
        hit: Option<Hit>,
    ) -> Effects {
        // A second press without a release means the pointer-up was lost
        let mut effects = self.on_cancel();
        let Some(hit) = hit else {
            if !modifiers.bypass_drag() {
                self.state = GestureState::Panning {
                    pointer,
                    anchor: at,
                };
            }
            return effects;
        };

        let started: Effects = match (hit.region, modifiers.bypass_drag()) {
            (NodeRegion::Delete, _) => {
                log::debug!("delete requested for node {}", hit.id);
                smallvec![Effect::ConfirmDelete { id: hit.id }]
            }
            (NodeRegion::LinkHandle, true) => {
                self.state = GestureState::LinkDrawing {
                    pointer,
                    source: hit.id,
                    cursor: hit.center,
                };
                Effects::new()
            }
            (NodeRegion::Body, true) => Effects::new(),
            (NodeRegion::Body | NodeRegion::LinkHandle, false) => {
                self.state = GestureState::NodeDragging {
                    pointer,
                    node: hit.id,
                };
                smallvec![
                    Effect::Reheat {
                        target: self.drag_alpha_target
                    },
                    Effect::Pin {
                        id: hit.id,
                        x: hit.center.x,
                        y: hit.center.y,
                    },
                ]
            }
        };
        effects.extend(started);
        effects
    }

    fn on_move(&mut self, x: f64, y: f64) -> Effects {
        match &mut self.state {
            GestureState::Idle => Effects::new(),
            GestureState::NodeDragging { node, .. } => smallvec![
                Effect::Pin { id: *node, x, y },
                Effect::Reheat {
                    target: self.drag_alpha_target
                },
            ],
            GestureState::LinkDrawing { cursor, .. } => {
                *cursor = Point::new(x, y);
                Effects::new()
            }
            GestureState::Panning { anchor, .. } => smallvec![Effect::Pan {
                dx: x - anchor.x,
                dy: y - anchor.y,
            }],
        }
    }

    fn on_up(&mut self, hit: Option<Hit>) -> Effects {
        match std::mem::take(&mut self.state) {
            GestureState::Idle | GestureState::Panning { .. } => Effects::new(),
            // The node stays pinned where it was released.
            GestureState::NodeDragging { .. } => smallvec![Effect::Cool],
            GestureState::LinkDrawing { source, .. } => match hit {
                Some(end) if end.id != source => {
                    // Arrow points at the node the gesture ended on
                    smallvec![Effect::UpsertLink {
                        a: source,
                        b: end.id,
                        arrow_at_a: false,
                        arrow_at_b: true,
                    }]
                }
                _ => {
                    log::debug!("link from {source} cancelled");
                    Effects::new()
                }
            },
        }
    }

    fn on_cancel(&mut self) -> Effects {
        match std::mem::take(&mut self.state) {
            GestureState::NodeDragging { .. } => smallvec![Effect::Cool],
            GestureState::Idle
            | GestureState::LinkDrawing { .. }
            | GestureState::Panning { .. } => Effects::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: u64, region: NodeRegion) -> Option<Hit> {
        Some(Hit {
            id: NodeId(id),
            region,
            center: Point::new(id as f64 * 100.0, 50.0),
        })
    }

    fn link_down(ctrl: &mut InteractionController, id: u64) -> Effects {
        ctrl.handle(
            &PointerEvent::down(0.0, 0.0, Modifiers::CTRL),
            hit(id, NodeRegion::LinkHandle),
        )
    }

    #[test]
    fn drag_pins_and_reheats() {
        let mut ctrl = InteractionController::new(0.3);
        let fx = ctrl.handle(
            &PointerEvent::down(100.0, 50.0, Modifiers::NONE),
            hit(1, NodeRegion::Body),
        );
        assert_eq!(
            fx.as_slice(),
            &[
                Effect::Reheat { target: 0.3 },
                Effect::Pin {
                    id: NodeId(1),
                    x: 100.0,
                    y: 50.0
                },
            ]
        );
        assert_eq!(ctrl.dragged(), Some(NodeId(1)));

        let fx = ctrl.handle(&PointerEvent::moved(120.0, 70.0), None);
        assert_eq!(
            fx[0],
            Effect::Pin {
                id: NodeId(1),
                x: 120.0,
                y: 70.0
            }
        );

        let fx = ctrl.handle(&PointerEvent::up(120.0, 70.0), None);
        // Released nodes are not unpinned
        assert_eq!(fx.as_slice(), &[Effect::Cool]);
        assert!(ctrl.is_idle());
    }

    #[test]
    fn link_handle_without_modifier_drags() {
        let mut ctrl = InteractionController::default();
        ctrl.handle(
            &PointerEvent::down(0.0, 0.0, Modifiers::NONE),
            hit(1, NodeRegion::LinkHandle),
        );
        assert_eq!(ctrl.dragged(), Some(NodeId(1)));
        assert_eq!(ctrl.link_source(), None);
    }

    #[test]
    fn link_drawing_tracks_cursor() {
        let mut ctrl = InteractionController::default();
        assert!(link_down(&mut ctrl, 2).is_empty());
        assert_eq!(ctrl.link_source(), Some(NodeId(2)));
        assert_eq!(ctrl.guide(), Some((NodeId(2), Point::new(200.0, 50.0))));

        // Moves never drag the source node
        assert!(ctrl.handle(&PointerEvent::moved(250.0, 60.0), None).is_empty());
        assert_eq!(ctrl.guide(), Some((NodeId(2), Point::new(250.0, 60.0))));
    }

    #[test]
    fn link_released_on_other_node_upserts() {
        let mut ctrl = InteractionController::default();
        link_down(&mut ctrl, 3);
        let fx = ctrl.handle(&PointerEvent::up(0.0, 0.0), hit(2, NodeRegion::Body));
        assert_eq!(
            fx.as_slice(),
            &[Effect::UpsertLink {
                a: NodeId(3),
                b: NodeId(2),
                arrow_at_a: false,
                arrow_at_b: true,
            }]
        );
        assert!(ctrl.is_idle());
        assert_eq!(ctrl.guide(), None);
    }

    #[test]
    fn link_released_on_canvas_or_self_cancels() {
        let mut ctrl = InteractionController::default();
        link_down(&mut ctrl, 1);
        assert!(ctrl.handle(&PointerEvent::up(0.0, 0.0), None).is_empty());
        assert!(ctrl.is_idle());

        link_down(&mut ctrl, 1);
        let fx = ctrl.handle(&PointerEvent::up(0.0, 0.0), hit(1, NodeRegion::Body));
        assert!(fx.is_empty());
        assert!(ctrl.is_idle());
    }

    #[test]
    fn modifier_on_body_does_nothing() {
        let mut ctrl = InteractionController::default();
        let fx = ctrl.handle(
            &PointerEvent::down(0.0, 0.0, Modifiers::CTRL),
            hit(1, NodeRegion::Body),
        );
        assert!(fx.is_empty());
        assert!(ctrl.is_idle());
    }

    #[test]
    fn delete_badge_bypasses_gestures() {
        let mut ctrl = InteractionController::default();
        for mods in [Modifiers::NONE, Modifiers::CTRL] {
            let fx = ctrl.handle(
                &PointerEvent::down(0.0, 0.0, mods),
                hit(4, NodeRegion::Delete),
            );
            assert_eq!(fx.as_slice(), &[Effect::ConfirmDelete { id: NodeId(4) }]);
            assert!(ctrl.is_idle());
        }
    }

    #[test]
    fn canvas_press_pans() {
        let mut ctrl = InteractionController::default();
        assert!(ctrl
            .handle(&PointerEvent::down(5.0, 5.0, Modifiers::NONE), None)
            .is_empty());
        assert!(matches!(ctrl.state(), GestureState::Panning { .. }));

        let fx = ctrl.handle(&PointerEvent::moved(8.0, 1.0), None);
        assert_eq!(fx.as_slice(), &[Effect::Pan { dx: 3.0, dy: -4.0 }]);

        assert!(ctrl.handle(&PointerEvent::up(8.0, 1.0), None).is_empty());
        assert!(ctrl.is_idle());
    }

    #[test]
    fn modifier_on_canvas_stays_idle() {
        let mut ctrl = InteractionController::default();
        assert!(ctrl
            .handle(&PointerEvent::down(5.0, 5.0, Modifiers::CTRL), None)
            .is_empty());
        assert!(ctrl.handle(&PointerEvent::moved(6.0, 6.0), None).is_empty());
        assert!(ctrl.is_idle());
    }

    #[test]
    fn other_pointers_are_ignored_during_gesture() {
        let mut ctrl = InteractionController::default();
        ctrl.handle(
            &PointerEvent::down(0.0, 0.0, Modifiers::NONE),
            hit(1, NodeRegion::Body),
        );
        let second = PointerEvent::Down {
            pointer: 7,
            x: 0.0,
            y: 0.0,
            modifiers: Modifiers::NONE,
        };
        assert!(ctrl.handle(&second, hit(2, NodeRegion::Body)).is_empty());
        assert!(ctrl
            .handle(&PointerEvent::Up { pointer: 7, x: 0.0, y: 0.0 }, None)
            .is_empty());
        assert_eq!(ctrl.dragged(), Some(NodeId(1)));
    }

    #[test]
    fn cancel_ends_gesture() {
        let mut ctrl = InteractionController::default();
        ctrl.handle(
            &PointerEvent::down(0.0, 0.0, Modifiers::NONE),
            hit(1, NodeRegion::Body),
        );
        let fx = ctrl.handle(&PointerEvent::Cancel { pointer: 0 }, None);
        assert_eq!(fx.as_slice(), &[Effect::Cool]);
        assert!(ctrl.is_idle());

        link_down(&mut ctrl, 1);
        assert!(ctrl
            .handle(&PointerEvent::Cancel { pointer: 0 }, None)
            .is_empty());
        assert!(ctrl.is_idle());
    }
}
