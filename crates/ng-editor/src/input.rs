//! Input abstraction layer.
//!
//! Normalizes mouse, touch and pen events into a unified `PointerEvent`
//! consumed by the gesture controller. Hosts send view-space coordinates;
//! the session maps them to layout space before hit testing.

/// Modifier keys held during a pointer event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        shift: false,
        ctrl: true,
        alt: false,
        meta: false,
    };

    /// Ctrl (or Cmd on macOS) bypasses node dragging and draws a link instead.
    pub fn bypass_drag(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A normalized pointer event from any pointing device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down {
        pointer: u32,
        x: f64,
        y: f64,
        modifiers: Modifiers,
    },
    Move {
        pointer: u32,
        x: f64,
        y: f64,
    },
    Up {
        pointer: u32,
        x: f64,
        y: f64,
    },
    /// The pointer left the canvas or the platform cancelled it.
    Cancel { pointer: u32 },
}

impl PointerEvent {
    pub fn down(x: f64, y: f64, modifiers: Modifiers) -> Self {
        Self::Down {
            pointer: 0,
            x,
            y,
            modifiers,
        }
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self::Move { pointer: 0, x, y }
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self::Up { pointer: 0, x, y }
    }

    pub fn pointer(&self) -> u32 {
        match self {
            Self::Down { pointer, .. }
            | Self::Move { pointer, .. }
            | Self::Up { pointer, .. }
            | Self::Cancel { pointer } => *pointer,
        }
    }

    /// The same event with its position passed through `f`.
    pub fn map_position(self, f: impl FnOnce(f64, f64) -> (f64, f64)) -> Self {
        match self {
            Self::Down {
                pointer,
                x,
                y,
                modifiers,
            } => {
                let (x, y) = f(x, y);
                Self::Down {
                    pointer,
                    x,
                    y,
                    modifiers,
                }
            }
            Self::Move { pointer, x, y } => {
                let (x, y) = f(x, y);
                Self::Move { pointer, x, y }
            }
            Self::Up { pointer, x, y } => {
                let (x, y) = f(x, y);
                Self::Up { pointer, x, y }
            }
            Self::Cancel { .. } => self,
        }
    }

    /// Extract position if the event carries one.
    pub fn position(&self) -> Option<(f64, f64)> {
        match self {
            Self::Down { x, y, .. } | Self::Move { x, y, .. } | Self::Up { x, y, .. } => {
                Some((*x, *y))
            }
            Self::Cancel { .. } => None,
        }
    }
}

/// A scroll-wheel step over the canvas, in view space.
///
/// `delta_y` is in pixels; positive scrolls down and zooms out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelEvent {
    pub x: f64,
    pub y: f64,
    pub delta_y: f64,
}
