//! WASM bridge for Node Graph — exposes the editing session to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. The host forwards pointer
//! events, drives `tick` from `requestAnimationFrame` and paints whatever
//! `frame` returns. Graph data crosses the boundary as the persisted JSON
//! blob format.

mod storage;
mod view;

use ng_core::codec::{encode, try_decode};
use ng_core::model::Graph;
use ng_core::{NodeId, Viewport};
use ng_editor::session::{EditorSession, HostEvents};
use ng_editor::{EditorConfig, Modifiers, PointerEvent, WheelEvent};
use storage::LocalStore;
use wasm_bindgen::prelude::*;

/// Forwards save/clear notifications to JS callbacks.
#[derive(Default)]
struct JsEvents {
    on_save: Option<js_sys::Function>,
    on_clear: Option<js_sys::Function>,
}

impl HostEvents for JsEvents {
    fn on_save(&mut self, graph: &Graph) {
        if let Some(callback) = &self.on_save {
            let blob = JsValue::from_str(&encode(graph));
            if let Err(err) = callback.call1(&JsValue::NULL, &blob) {
                log::warn!("onSave callback failed: {err:?}");
            }
        }
    }

    fn on_clear(&mut self) {
        if let Some(callback) = &self.on_clear
            && let Err(err) = callback.call0(&JsValue::NULL)
        {
            log::warn!("onClear callback failed: {err:?}");
        }
    }
}

/// The WASM-facing editor.
///
/// Pointer coordinates are in view space: container coordinates minus the
/// margin. Node positions in `frame` are in layout space; the host draws
/// them translated by `margin` and then by the frame's `transform`.
#[wasm_bindgen]
pub struct NodeGraphEditor {
    session: EditorSession<LocalStore, JsEvents>,
}

#[wasm_bindgen]
impl NodeGraphEditor {
    /// Create an editor for a container of the given size.
    ///
    /// `config_json` may hold any subset of the editor settings.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64, config_json: Option<String>) -> Self {
        console_error_panic_hook_setup();

        let config = match config_json.as_deref().map(serde_json::from_str::<EditorConfig>) {
            Some(Ok(config)) => config,
            Some(Err(err)) => {
                log::warn!("invalid editor config, using defaults: {err}");
                EditorConfig::default()
            }
            None => EditorConfig::default(),
        };
        Self {
            session: EditorSession::new(
                config,
                Viewport::new(width, height),
                LocalStore,
                JsEvents::default(),
            ),
        }
    }

    /// Replace the graph with host data (persisted blob format).
    /// Returns `false` and loads an empty graph if the data is malformed.
    pub fn set_data(&mut self, json: &str) -> bool {
        match try_decode(json) {
            Ok(graph) => {
                self.session.set_data(graph);
                true
            }
            Err(err) => {
                log::warn!("{err}; loading empty graph");
                self.session.set_data(Graph::default());
                false
            }
        }
    }

    /// Current graph in the persisted blob format.
    pub fn get_data(&self) -> String {
        encode(&self.session.model().snapshot())
    }

    /// Add a node; the label prompt's answer may be empty. Returns the id.
    pub fn add_node(&mut self, label: Option<String>) -> f64 {
        self.session.add_node(label.as_deref()).get() as f64
    }

    /// Remove a node without confirmation. Returns `true` if it existed.
    pub fn remove_node(&mut self, id: f64) -> bool {
        match node_id(id) {
            Some(id) => self.session.remove_node(id).is_ok(),
            None => false,
        }
    }

    /// Node waiting for the host's delete confirmation, if any.
    pub fn pending_delete(&self) -> Option<f64> {
        self.session.pending_delete().map(|id| id.get() as f64)
    }

    /// Answer the delete confirmation. Returns `true` if a node was removed.
    pub fn resolve_delete(&mut self, confirmed: bool) -> bool {
        matches!(self.session.resolve_delete(confirmed), Ok(Some(_)))
    }

    /// Handle pointer down. Returns `true` if a redraw is needed.
    #[allow(clippy::too_many_arguments)]
    pub fn pointer_down(
        &mut self,
        pointer: u32,
        x: f64,
        y: f64,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        let modifiers = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        self.session.handle_pointer(PointerEvent::Down {
            pointer,
            x,
            y,
            modifiers,
        })
    }

    pub fn pointer_move(&mut self, pointer: u32, x: f64, y: f64) -> bool {
        self.session.handle_pointer(PointerEvent::Move { pointer, x, y })
    }

    pub fn pointer_up(&mut self, pointer: u32, x: f64, y: f64) -> bool {
        self.session.handle_pointer(PointerEvent::Up { pointer, x, y })
    }

    pub fn pointer_cancel(&mut self, pointer: u32) -> bool {
        self.session.handle_pointer(PointerEvent::Cancel { pointer })
    }

    /// Zoom around the wheel position. Returns `true` if a redraw is needed.
    pub fn wheel(&mut self, x: f64, y: f64, delta_y: f64) -> bool {
        self.session.handle_wheel(WheelEvent { x, y, delta_y })
    }

    pub fn reset_view(&mut self) {
        self.session.reset_view();
    }

    /// Advance the layout one step. Returns `false` once settled.
    pub fn tick(&mut self) -> bool {
        self.session.tick()
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.session.resize(width, height);
    }

    /// Everything needed to paint the current frame, as JSON.
    pub fn frame(&self) -> String {
        view::frame_json(&self.session)
    }

    /// Save to `localStorage` and fire `onSave`. Returns the blob.
    pub fn save(&mut self) -> String {
        encode(&self.session.save())
    }

    /// Load from `localStorage`; missing or corrupt data loads empty.
    pub fn load(&mut self) {
        self.session.load();
    }

    /// Empty the graph, delete the stored blob and fire `onClear`.
    pub fn clear(&mut self) {
        self.session.clear();
    }

    /// Register the `onSave(blob)` callback.
    pub fn set_on_save(&mut self, callback: js_sys::Function) {
        self.session.events_mut().on_save = Some(callback);
    }

    /// Register the `onClear()` callback.
    pub fn set_on_clear(&mut self, callback: js_sys::Function) {
        self.session.events_mut().on_clear = Some(callback);
    }
}

// ─── Private helpers ─────────────────────────────────────────────────────

/// JS numbers → node ids. Rejects negatives, fractions and non-finite values.
fn node_id(raw: f64) -> Option<NodeId> {
    (raw.is_finite() && raw >= 0.0 && raw.fract() == 0.0).then(|| NodeId(raw as u64))
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Node Graph WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}
