//! Editing session: the single owner of the live graph.
//!
//! The session holds the `GraphModel`, the force simulation, the gesture
//! controller and the persistence layer. Pointer events are hit-tested,
//! turned into [`Effect`]s by the controller and applied here; after any
//! structural change the simulation's working set is resynchronized
//! before the next tick.
//!
//! Node positions are in layout space: the container shrunk by `margin`
//! on every side, origin at its top-left. Pointer and wheel input arrive
//! in view space and go through the session's [`ViewTransform`] first.

use crate::config::EditorConfig;
use crate::gesture::{Effect, InteractionController};
use crate::input::{PointerEvent, WheelEvent};
use crate::transform::ViewTransform;
use kurbo::{Line, Point, Vec2};
use ng_core::codec::{BlobStore, Persistence};
use ng_core::model::{Graph, GraphModel, Node};
use ng_core::{ForceSimulation, GraphError, NodeId, Viewport};
use ng_render::{LinkPath, guide_line, hit_test, link_paths};

/// Notifications fired to the host after a user action completes.
pub trait HostEvents {
    fn on_save(&mut self, graph: &Graph);
    fn on_clear(&mut self);
}

/// Hosts that do not listen for events.
impl HostEvents for () {
    fn on_save(&mut self, _graph: &Graph) {}
    fn on_clear(&mut self) {}
}

pub struct EditorSession<S, H> {
    model: GraphModel,
    simulation: ForceSimulation,
    controller: InteractionController,
    persistence: Persistence<S>,
    events: H,
    config: EditorConfig,
    /// Size of the host container, margins included.
    container: Viewport,
    view: ViewTransform,
    /// Node awaiting the host's delete confirmation.
    pending_delete: Option<NodeId>,
}

impl<S: BlobStore, H: HostEvents> EditorSession<S, H> {
    pub fn new(config: EditorConfig, container: Viewport, store: S, events: H) -> Self {
        let layout = container.inset(config.margin);
        Self {
            model: GraphModel::new(),
            simulation: ForceSimulation::new(config.simulation.clone(), layout),
            controller: InteractionController::new(config.drag_alpha_target),
            persistence: Persistence::new(store),
            events,
            config,
            container,
            view: ViewTransform::IDENTITY,
            pending_delete: None,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn simulation(&self) -> &ForceSimulation {
        &self.simulation
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn events(&self) -> &H {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut H {
        &mut self.events
    }

    pub fn store(&self) -> &S {
        self.persistence.store()
    }

    pub fn container(&self) -> Viewport {
        self.container
    }

    /// The area nodes are laid out in.
    pub fn layout_bounds(&self) -> Viewport {
        self.simulation.viewport()
    }

    pub fn pending_delete(&self) -> Option<NodeId> {
        self.pending_delete
    }

    /// Current pan and zoom.
    pub fn view(&self) -> ViewTransform {
        self.view
    }

    // ─── Data ────────────────────────────────────────────────────────────

    /// Replace the graph with host-supplied data and let it relax.
    pub fn set_data(&mut self, graph: Graph) {
        self.model = GraphModel::from_graph(graph);
        self.pending_delete = None;
        self.simulation.set_alpha(self.config.simulation.alpha);
        self.resync();
        log::debug!(
            "loaded {} node(s), {} link(s)",
            self.model.node_count(),
            self.model.link_count()
        );
    }

    /// Add a node. An empty or missing label becomes `NODE:<id>`.
    pub fn add_node(&mut self, label: Option<&str>) -> NodeId {
        let id = self.model.add_node("", self.config.node_radius).id;
        let label = label
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Node::default_label(id));
        if let Some(node) = self.model.node_mut(id) {
            node.label = label;
        }
        self.structure_changed();
        id
    }

    /// Remove a node and its links without asking the host.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, GraphError> {
        let node = self.model.remove_node(id)?;
        if self.pending_delete == Some(id) {
            self.pending_delete = None;
        }
        self.structure_changed();
        Ok(node)
    }

    /// Create or merge a link, as the link gesture does.
    pub fn upsert_link(
        &mut self,
        a: NodeId,
        b: NodeId,
        arrow_at_a: bool,
        arrow_at_b: bool,
    ) -> Result<(), GraphError> {
        let before = self.model.generation();
        self.model.upsert_link(a, b, arrow_at_a, arrow_at_b)?;
        if self.model.generation() != before {
            self.structure_changed();
        }
        Ok(())
    }

    /// Answer a pending delete confirmation.
    ///
    /// Only an affirmative answer removes the node. Returns the removed
    /// node, or `None` when nothing was pending or the host declined.
    pub fn resolve_delete(&mut self, confirmed: bool) -> Result<Option<Node>, GraphError> {
        let Some(id) = self.pending_delete.take() else {
            return Ok(None);
        };
        if !confirmed {
            log::debug!("delete of node {id} declined");
            return Ok(None);
        }
        self.remove_node(id).map(Some)
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Handle a pointer event. Returns `true` if anything visible changed.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        let view = self.view;
        let event = event.map_position(|x, y| {
            let p = view.to_layout(Point::new(x, y));
            (p.x, p.y)
        });
        let hit = event
            .position()
            .and_then(|(x, y)| hit_test(&self.model, x, y, &self.config.hit_config()));
        let was_idle = self.controller.is_idle();
        let effects = self.controller.handle(&event, hit);

        let mut changed = !(was_idle && self.controller.is_idle());
        for effect in effects {
            changed |= self.apply(effect);
        }
        changed
    }

    fn apply(&mut self, effect: Effect) -> bool {
        let result = match effect {
            Effect::Pin { id, x, y } => {
                self.simulation.pin(&mut self.model.layout_mut(), id, x, y)
            }
            Effect::Reheat { target } => {
                self.simulation.reheat(target);
                Ok(())
            }
            Effect::Cool => {
                self.simulation.cool();
                Ok(())
            }
            Effect::UpsertLink {
                a,
                b,
                arrow_at_a,
                arrow_at_b,
            } => self.upsert_link(a, b, arrow_at_a, arrow_at_b),
            Effect::ConfirmDelete { id } => {
                self.pending_delete = Some(id);
                Ok(())
            }
            Effect::Pan { dx, dy } => {
                self.view.pan(Vec2::new(dx, dy) * self.view.k);
                Ok(())
            }
        };
        match result {
            Ok(()) => true,
            Err(err) => {
                log::debug!("gesture declined: {err}");
                false
            }
        }
    }

    /// Zoom around the wheel position. Returns `true` if the scale changed.
    pub fn handle_wheel(&mut self, event: WheelEvent) -> bool {
        let factor = 2f64.powf(-event.delta_y * self.config.wheel_zoom_rate);
        let zoomed = self.view.zoom_at(
            Point::new(event.x, event.y),
            factor,
            self.config.min_zoom,
            self.config.max_zoom,
        );
        if zoomed {
            log::trace!("zoom {:.3}", self.view.k);
        }
        zoomed
    }

    /// Back to no pan and unit zoom.
    pub fn reset_view(&mut self) {
        self.view = ViewTransform::IDENTITY;
    }

    // ─── Layout ──────────────────────────────────────────────────────────

    /// Advance the layout one step. Returns `false` once settled.
    pub fn tick(&mut self) -> bool {
        self.simulation.tick(&mut self.model.layout_mut())
    }

    /// Re-derive layout bounds after the container was resized.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.container = Viewport::new(width, height);
        self.simulation
            .set_viewport(self.container.inset(self.config.margin));
    }

    /// Drawable paths for every link this frame.
    pub fn link_paths(&self) -> Vec<LinkPath> {
        link_paths(&self.model, self.config.link_padding)
    }

    /// Guide line of the link being drawn, if any.
    pub fn guide(&self) -> Option<Line> {
        let (source, cursor) = self.controller.guide()?;
        let position = self.model.node(source)?.position?;
        Some(guide_line(position, cursor))
    }

    fn structure_changed(&mut self) {
        self.resync();
        let alpha = self.simulation.alpha().max(self.config.edit_alpha);
        self.simulation.set_alpha(alpha);
    }

    fn resync(&mut self) {
        self.simulation.sync(&mut self.model.layout_mut());
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    /// Store the current graph and tell the host.
    pub fn save(&mut self) -> Graph {
        let snapshot = self.model.snapshot();
        self.persistence.save(&snapshot);
        self.events.on_save(&snapshot);
        snapshot
    }

    /// Replace the graph with the stored one (empty if missing or corrupt).
    pub fn load(&mut self) {
        let graph = self.persistence.load();
        self.set_data(graph);
    }

    /// Empty the graph, delete the stored blob and tell the host.
    pub fn clear(&mut self) {
        self.model.clear();
        self.pending_delete = None;
        self.resync();
        self.persistence.clear();
        self.events.on_clear();
    }
}
