pub mod config;
pub mod gesture;
pub mod input;
pub mod session;
pub mod transform;

pub use config::EditorConfig;
pub use gesture::{Effect, GestureState, InteractionController};
pub use input::{Modifiers, PointerEvent, WheelEvent};
pub use session::{EditorSession, HostEvents};
pub use transform::ViewTransform;
