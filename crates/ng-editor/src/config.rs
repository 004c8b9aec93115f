use ng_core::SimulationConfig;
use ng_core::model::DEFAULT_RADIUS;
use ng_render::HitConfig;
use serde::{Deserialize, Serialize};

/// Editor-level settings. Hosts may pass any subset as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Radius of nodes created by the "add node" action.
    pub node_radius: f64,
    /// `alpha_target` held while a node is being dragged.
    pub drag_alpha_target: f64,
    /// Temperature the layout is raised to after a structural edit.
    pub edit_alpha: f64,
    /// Space between the container edge and the layout area.
    pub margin: f64,
    /// Extra gap between a link end and the node outline.
    pub link_padding: f64,
    /// Width of the outer ring that starts a link.
    pub handle_width: f64,
    pub delete_offset_x: f64,
    pub delete_offset_y: f64,
    pub delete_radius: f64,
    /// Smallest and largest view scale.
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Zoom exponent per pixel of wheel travel (base 2).
    pub wheel_zoom_rate: f64,
    pub simulation: SimulationConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            node_radius: DEFAULT_RADIUS,
            drag_alpha_target: 0.3,
            edit_alpha: 0.3,
            margin: 50.0,
            link_padding: 0.0,
            handle_width: 5.0,
            delete_offset_x: 15.0,
            delete_offset_y: -15.0,
            delete_radius: 8.0,
            min_zoom: 0.5,
            max_zoom: 2.0,
            wheel_zoom_rate: 0.002,
            simulation: SimulationConfig::default(),
        }
    }
}

impl EditorConfig {
    pub fn hit_config(&self) -> HitConfig {
        HitConfig {
            handle_width: self.handle_width,
            delete_offset: (self.delete_offset_x, self.delete_offset_y),
            delete_radius: self.delete_radius,
        }
    }
}
