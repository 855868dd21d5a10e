//! Filter padding.
//!
//! Padding is authored in pixels or grid cells and scaled by the placeable's
//! world transform. Custom filters additionally grow their bounds to cover the
//! placeable's rotated box.

use serde::{Deserialize, Serialize};

use crate::params::PlaceableType;

/// Snapshot of the placeable's sprite as seen by the host this frame.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaceableTransform {
    /// World scale (x component of the world transform).
    pub scale: f64,
    /// Sprite rotation in radians.
    pub rotation: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for PlaceableTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotation: 0.0,
            width: 0.0,
            height: 0.0,
        }
    }
}

/// Scene-wide inputs to the padding computation.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaddingEnv {
    /// Grid cell size in pixels.
    pub grid_size: f64,
    /// Lower bound applied to authored padding.
    pub min_padding: f64,
}

impl Default for PaddingEnv {
    fn default() -> Self {
        Self {
            grid_size: 100.0,
            min_padding: 0.0,
        }
    }
}

/// Which padding rule applies to a filter.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PaddingShape {
    pub custom: bool,
    pub sticky: bool,
    pub placeable_type: PlaceableType,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundsPadding {
    pub x: f64,
    pub y: f64,
}

impl BoundsPadding {
    #[inline]
    fn square(v: f64) -> Self {
        Self { x: v, y: v }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaddingState {
    pub raw_padding: f64,
    /// `max(raw_padding, min_padding)`.
    pub original_padding: f64,
    pub current_padding: f64,
    pub bounds_padding: BoundsPadding,
    pub grid_padding: f64,
    pub recalculate_padding: bool,
}

impl PaddingState {
    pub fn new(padding: f64, grid_padding: f64, env: &PaddingEnv) -> Self {
        let mut state = Self {
            raw_padding: 0.0,
            original_padding: 0.0,
            current_padding: 0.0,
            bounds_padding: BoundsPadding::default(),
            grid_padding,
            recalculate_padding: true,
        };
        state.set_padding(padding, env);
        state
    }

    /// Replace the authored padding. Takes effect on the next calculation.
    pub fn set_padding(&mut self, padding: f64, env: &PaddingEnv) {
        self.raw_padding = padding;
        self.original_padding = padding.max(env.min_padding);
    }

    /// Recompute bounds and current padding from a transform snapshot.
    pub fn calculate(&mut self, shape: PaddingShape, t: &PlaceableTransform, env: &PaddingEnv) {
        let scale = t.scale;
        let (sin, cos) = t.rotation.sin_cos();

        let bounds = if self.grid_padding > 0.0 {
            let grid = env.grid_size;
            let img_size = t.width.max(t.height);
            let to_size = if grid >= img_size {
                grid - img_size
            } else if grid > 0.0 {
                img_size % grid
            } else {
                0.0
            };
            scale * (self.grid_padding - 1.0) * grid + to_size * scale / 2.0
        } else {
            scale * self.raw_padding
        };

        if !shape.custom {
            self.bounds_padding = BoundsPadding::square(bounds);
            self.current_padding = bounds;
        } else if shape.sticky {
            self.bounds_padding = BoundsPadding::square(bounds);
            self.current_padding = (bounds * cos).abs() + (bounds * sin).abs();
        } else {
            self.bounds_padding = match shape.placeable_type {
                PlaceableType::Token => BoundsPadding::square(bounds),
                _ => rotated_bounds(bounds, scale, t.width, t.height, sin, cos),
            };
            self.current_padding = bounds;
        }

        self.current_padding += scale * (self.original_padding - self.raw_padding);
    }
}

/// Expand `bounds` so the rotated `w x h` box fits. Degenerate boxes do not expand.
fn rotated_bounds(bounds: f64, scale: f64, w: f64, h: f64, sin: f64, cos: f64) -> BoundsPadding {
    let sx = if w > 0.0 {
        ((w * cos).abs() + (h * sin).abs()) / w - 1.0
    } else {
        0.0
    };
    let sy = if h > 0.0 {
        ((w * sin).abs() + (h * cos).abs()) / h - 1.0
    } else {
        0.0
    };
    BoundsPadding {
        x: bounds + scale * w * sx / 2.0,
        y: bounds + scale * h * sy / 2.0,
    }
}
