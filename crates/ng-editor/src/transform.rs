//! Pan and zoom of the drawing.
//!
//! Pointer input arrives in view space: container coordinates with the
//! margin already removed. A layout point is drawn at
//! `view = layout * k + (x, y)`.

use kurbo::{Point, Vec2};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewTransform {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        k: 1.0,
    };

    pub fn to_layout(&self, p: Point) -> Point {
        Point::new((p.x - self.x) / self.k, (p.y - self.y) / self.k)
    }

    pub fn to_view(&self, p: Point) -> Point {
        Point::new(p.x * self.k + self.x, p.y * self.k + self.y)
    }

    /// Shift the drawing by a view-space offset.
    pub fn pan(&mut self, delta: Vec2) {
        if delta.is_finite() {
            self.x += delta.x;
            self.y += delta.y;
        }
    }

    /// Scale by `factor` around `anchor` (view space), which stays put.
    ///
    /// The resulting scale is kept within `min..=max`. Returns `false` if
    /// the scale did not change.
    pub fn zoom_at(&mut self, anchor: Point, factor: f64, min: f64, max: f64) -> bool {
        if !factor.is_finite() || factor <= 0.0 || !anchor.is_finite() {
            return false;
        }
        let k = (self.k * factor).max(min).min(max);
        if k == self.k || !k.is_finite() || k <= 0.0 {
            return false;
        }
        let ratio = k / self.k;
        self.x = anchor.x - (anchor.x - self.x) * ratio;
        self.y = anchor.y - (anchor.y - self.y) * ratio;
        self.k = k;
        true
    }
}
