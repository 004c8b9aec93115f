//! Force-directed layout simulation.
//!
//! A stateful integrator in the style of velocity-Verlet force layouts:
//! each tick accumulates forces into velocities (scaled by `alpha`), damps
//! them and advances positions. `alpha` cools toward `alpha_target`; once
//! it drops below `alpha_min` the layout is settled and `tick` does nothing.
//!
//! The simulation never changes the graph's structure. It reads and writes
//! node positions through a [`LayoutFacet`] and keeps velocities in its own
//! working set, which is rebuilt by [`ForceSimulation::sync`] whenever the
//! model's structural generation moves.

use crate::error::GraphError;
use crate::forces::{self, Body, Jiggle, Spring};
use crate::id::NodeId;
use crate::model::{LayoutFacet, Position};
use petgraph::stable_graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The canvas (layout area) dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Shrink by `margin` on every side, never below zero.
    pub fn inset(self, margin: f64) -> Self {
        Self {
            width: (self.width - 2.0 * margin).max(0.0),
            height: (self.height - 2.0 * margin).max(0.0),
        }
    }

    pub fn center(&self) -> Position {
        Position::new(self.width / 2.0, self.height / 2.0)
    }
}

// ─── Config ───────────────────────────────────────────────────────────────

/// Constants for the force layout and its cooling schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Starting temperature.
    pub alpha: f64,
    /// Below this temperature the layout is settled.
    pub alpha_min: f64,
    /// Fraction of the gap to `alpha_target` closed per tick.
    pub alpha_decay: f64,
    /// Velocity retained per tick (friction).
    pub velocity_decay: f64,
    /// Link rest length as a multiple of the two endpoint radii.
    pub link_distance_scale: f64,
    /// Extra clearance around each circle for collision.
    pub collide_padding: f64,
    pub collide_strength: f64,
    /// Relaxation passes per tick for collision.
    pub collide_iterations: usize,
    /// Many-body strength (negative = repulsion).
    pub charge: f64,
    /// Distances below this are clamped for the many-body force.
    pub charge_distance_min: f64,
    pub center_strength: f64,
    /// Strength of the pull toward the `x = 0` / `y = 0` axes.
    pub axis_strength: f64,
    /// Spacing of the initial spiral used for unplaced nodes.
    pub initial_radius: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            alpha_min: 0.001,
            // Reach alpha_min from 1.0 in ~300 ticks
            alpha_decay: 1.0 - 0.001_f64.powf(1.0 / 300.0),
            velocity_decay: 0.6,
            link_distance_scale: 1.5,
            collide_padding: 8.0,
            collide_strength: 1.0,
            collide_iterations: 16,
            charge: -30.0,
            charge_distance_min: 1.0,
            center_strength: 1.0,
            axis_strength: 0.1,
            initial_radius: 10.0,
        }
    }
}

// ─── Simulation ───────────────────────────────────────────────────────────

pub struct ForceSimulation {
    config: SimulationConfig,
    viewport: Viewport,
    alpha: f64,
    alpha_target: f64,
    /// Node indices, parallel to `ids` and `bodies`, ordered by node id.
    indices: Vec<NodeIndex>,
    ids: Vec<NodeId>,
    bodies: Vec<Body>,
    springs: Vec<Spring>,
    /// Model generation the working set was built from.
    generation: Option<u64>,
    jiggle: Jiggle,
}

impl ForceSimulation {
    pub fn new(config: SimulationConfig, viewport: Viewport) -> Self {
        Self {
            alpha: config.alpha,
            alpha_target: 0.0,
            config,
            viewport,
            indices: Vec::new(),
            ids: Vec::new(),
            bodies: Vec::new(),
            springs: Vec::new(),
            generation: None,
            jiggle: Jiggle::default(),
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Re-derive the centering target after a container resize.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f64 {
        self.alpha_target
    }

    /// Force the temperature, e.g. to let a freshly edited graph relax.
    pub fn set_alpha(&mut self, alpha: f64) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    /// Whether the layout is still moving.
    pub fn is_running(&self) -> bool {
        self.alpha >= self.config.alpha_min
    }

    /// Set the resting temperature. A cold simulation restarts from it.
    pub fn reheat(&mut self, target: f64) {
        let target = target.clamp(0.0, 1.0);
        self.alpha_target = target;
        if !self.is_running() && target >= self.config.alpha_min {
            self.alpha = self.alpha.max(target);
            log::debug!("simulation restarted at alpha {:.3}", self.alpha);
        }
    }

    /// Let the layout cool back down to rest.
    pub fn cool(&mut self) {
        self.alpha_target = 0.0;
    }

    /// Number of nodes in the working set.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Current velocity of a node, if it is in the working set.
    pub fn velocity(&self, id: NodeId) -> Option<(f64, f64)> {
        let i = self.ids.iter().position(|&n| n == id)?;
        Some((self.bodies[i].vx, self.bodies[i].vy))
    }

    pub fn is_stale(&self, layout: &LayoutFacet<'_>) -> bool {
        self.generation != Some(layout.generation())
    }

    /// Rebuild the per-node and per-link working set from the model.
    ///
    /// Velocities of nodes that survive are kept. Nodes without a position
    /// are placed on a spiral around the viewport center (or at their pin).
    pub fn sync(&mut self, layout: &mut LayoutFacet<'_>) {
        let velocities: HashMap<NodeId, (f64, f64)> = self
            .ids
            .iter()
            .zip(&self.bodies)
            .map(|(id, b)| (*id, (b.vx, b.vy)))
            .collect();

        let center = self.viewport.center();
        let indices = layout.indices();
        let mut ids = Vec::with_capacity(indices.len());
        let mut bodies = Vec::with_capacity(indices.len());
        let mut placed = Vec::new();

        for (i, &idx) in indices.iter().enumerate() {
            let Some(node) = layout.node(idx) else {
                continue;
            };
            let position = match (node.position, node.pin()) {
                (Some(p), _) => p,
                (None, Some(pin)) => {
                    placed.push((idx, pin));
                    pin
                }
                (None, None) => {
                    let p = self.spiral(i, center);
                    placed.push((idx, p));
                    p
                }
            };
            let mut body = Body::at(position.x, position.y, node.radius);
            body.fx = node.fx;
            body.fy = node.fy;
            if let Some(&(vx, vy)) = velocities.get(&node.id) {
                body.vx = vx;
                body.vy = vy;
            }
            ids.push(node.id);
            bodies.push(body);
        }

        for (idx, p) in placed {
            layout.set_position(idx, p);
        }

        let slot: HashMap<NodeIndex, usize> =
            indices.iter().enumerate().map(|(i, idx)| (*idx, i)).collect();
        let links: Vec<(usize, usize)> = layout
            .links()
            .into_iter()
            .filter_map(|(s, t)| Some((*slot.get(&s)?, *slot.get(&t)?)))
            .collect();

        self.springs = Spring::build(&links, bodies.len());
        self.indices = indices;
        self.ids = ids;
        self.bodies = bodies;
        self.generation = Some(layout.generation());
        log::debug!(
            "simulation synced: {} node(s), {} link(s)",
            self.bodies.len(),
            self.springs.len()
        );
    }

    fn spiral(&self, i: usize, center: Position) -> Position {
        let golden = std::f64::consts::PI * (3.0 - 5.0_f64.sqrt());
        let r = self.config.initial_radius * (0.5 + i as f64).sqrt();
        let angle = i as f64 * golden;
        Position::new(center.x + r * angle.cos(), center.y + r * angle.sin())
    }

    /// Advance the layout by one step. Returns `false` once settled.
    pub fn tick(&mut self, layout: &mut LayoutFacet<'_>) -> bool {
        if !self.is_running() {
            return false;
        }
        if self.is_stale(layout) {
            self.sync(layout);
        }
        self.load(layout);

        let alpha = self.alpha;
        let cfg = &self.config;
        let center = self.viewport.center();
        let bodies = &mut self.bodies;
        let jiggle = &mut self.jiggle;

        forces::link(bodies, &self.springs, cfg.link_distance_scale, alpha, jiggle);
        forces::collide(
            bodies,
            cfg.collide_padding,
            cfg.collide_strength,
            cfg.collide_iterations,
            jiggle,
        );
        forces::many_body(bodies, cfg.charge, cfg.charge_distance_min, alpha, jiggle);
        forces::center(bodies, center.x, center.y, cfg.center_strength);
        forces::axis_y(bodies, 0.0, cfg.axis_strength, alpha);
        forces::axis_x(bodies, 0.0, cfg.axis_strength, alpha);

        for body in bodies.iter_mut() {
            body.integrate(cfg.velocity_decay);
        }
        self.store(layout);

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        log::trace!("tick alpha={:.4}", self.alpha);
        true
    }

    /// Tick until settled or `max_ticks` is reached. Returns ticks run.
    pub fn run_to_convergence(&mut self, layout: &mut LayoutFacet<'_>, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while ticks < max_ticks && self.tick(layout) {
            ticks += 1;
        }
        ticks
    }

    /// Pin a node at `(x, y)`; the integrator holds it there.
    pub fn pin(
        &mut self,
        layout: &mut LayoutFacet<'_>,
        id: NodeId,
        x: f64,
        y: f64,
    ) -> Result<(), GraphError> {
        if !(x.is_finite() && y.is_finite()) {
            return Err(GraphError::InvalidOperation(format!(
                "non-finite pin for node {id}"
            )));
        }
        let idx = layout.index_of(id).ok_or(GraphError::NotFound(id))?;
        layout.set_pin(idx, Some(x), Some(y));
        layout.set_position(idx, Position::new(x, y));
        Ok(())
    }

    /// Release a pin so the node floats freely again.
    pub fn unpin(&mut self, layout: &mut LayoutFacet<'_>, id: NodeId) -> Result<(), GraphError> {
        let idx = layout.index_of(id).ok_or(GraphError::NotFound(id))?;
        layout.set_pin(idx, None, None);
        Ok(())
    }

    /// Refresh positions, pins and radii from the model.
    fn load(&mut self, layout: &LayoutFacet<'_>) {
        for (body, &idx) in self.bodies.iter_mut().zip(&self.indices) {
            if let Some(node) = layout.node(idx) {
                if let Some(p) = node.position {
                    body.x = p.x;
                    body.y = p.y;
                }
                body.radius = node.radius;
                body.fx = node.fx;
                body.fy = node.fy;
            }
        }
    }

    /// Write positions back. Non-finite results are discarded.
    fn store(&mut self, layout: &mut LayoutFacet<'_>) {
        for (body, &idx) in self.bodies.iter_mut().zip(&self.indices) {
            let p = Position::new(body.x, body.y);
            if p.is_finite() && body.vx.is_finite() && body.vy.is_finite() {
                layout.set_position(idx, p);
            } else {
                log::warn!("discarding non-finite layout step for node at {idx:?}");
                body.vx = 0.0;
                body.vy = 0.0;
            }
        }
    }
}
