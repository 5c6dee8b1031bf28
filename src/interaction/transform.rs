//! Pan/zoom transform and the animated fit-view transition.

use serde::{Deserialize, Serialize};

/// Smallest allowed zoom factor.
pub const MIN_ZOOM: f32 = 0.1;
/// Largest allowed zoom factor.
pub const MAX_ZOOM: f32 = 3.0;
/// Scale applied by the zoom-in button.
pub const ZOOM_IN_FACTOR: f32 = 1.2;
/// Scale applied by the zoom-out button.
pub const ZOOM_OUT_FACTOR: f32 = 0.8;
/// Share of the viewport the content fills after fit view.
pub const FIT_FILL: f32 = 0.8;
/// Duration of the fit-view transition.
pub const FIT_DURATION_MS: f32 = 750.0;

/// Screen = world * k + (x, y).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub x: f32,
    pub y: f32,
    pub k: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        k: 1.0,
    };

    /// Create a transform, clamping the scale to [`MIN_ZOOM`, `MAX_ZOOM`].
    pub fn new(x: f32, y: f32, k: f32) -> Self {
        Self {
            x,
            y,
            k: clamp_zoom(k),
        }
    }

    /// Convert a screen point to world coordinates.
    pub fn screen_to_world(&self, sx: f32, sy: f32) -> (f32, f32) {
        ((sx - self.x) / self.k, (sy - self.y) / self.k)
    }

    /// Convert a world point to screen coordinates.
    pub fn world_to_screen(&self, wx: f32, wy: f32) -> (f32, f32) {
        (wx * self.k + self.x, wy * self.k + self.y)
    }

    /// Scale by `factor` keeping the screen point `(ax, ay)` fixed.
    pub fn zoomed_at(&self, factor: f32, ax: f32, ay: f32) -> Self {
        if !factor.is_finite() || factor <= 0.0 {
            return *self;
        }
        let k = clamp_zoom(self.k * factor);
        let (wx, wy) = self.screen_to_world(ax, ay);
        Self {
            x: ax - wx * k,
            y: ay - wy * k,
            k,
        }
    }

    /// Translate by a screen-space delta.
    pub fn panned(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            k: self.k,
        }
    }

    /// Transform that centers the world box `(min_x, min_y, max_x, max_y)`
    /// in a `width` by `height` viewport, filling [`FIT_FILL`] of it.
    ///
    /// A zero-size box (a single node) gets the largest allowed zoom.
    pub fn fit(bounds: (f32, f32, f32, f32), width: f32, height: f32) -> Self {
        let (min_x, min_y, max_x, max_y) = bounds;
        let box_width = max_x - min_x;
        let box_height = max_y - min_y;
        let scale = (width / box_width).min(height / box_height) * FIT_FILL;
        let k = if scale.is_finite() {
            clamp_zoom(scale)
        } else {
            MAX_ZOOM
        };
        let cx = (min_x + max_x) / 2.0;
        let cy = (min_y + max_y) / 2.0;
        Self {
            x: width / 2.0 - k * cx,
            y: height / 2.0 - k * cy,
            k,
        }
    }

    /// Zoom as a whole percentage, for the status overlay.
    pub fn zoom_percent(&self) -> u32 {
        (self.k * 100.0).round() as u32
    }

    fn lerp(&self, to: &Self, t: f32) -> Self {
        Self {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
            k: self.k + (to.k - self.k) * t,
        }
    }
}

/// Clamp a zoom factor to [`MIN_ZOOM`, `MAX_ZOOM`].
pub fn clamp_zoom(k: f32) -> f32 {
    if k.is_nan() {
        return 1.0;
    }
    k.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Cubic ease-in-out over `[0, 1]`.
pub fn ease_cubic_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}

/// An in-flight transition between two transforms.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformAnimation {
    from: Transform,
    to: Transform,
    elapsed_ms: f32,
    duration_ms: f32,
}

impl TransformAnimation {
    pub fn new(from: Transform, to: Transform, duration_ms: f32) -> Self {
        Self {
            from,
            to,
            elapsed_ms: 0.0,
            duration_ms: duration_ms.max(0.0),
        }
    }

    /// Step by `dt_ms` and return the transform to show.
    pub fn advance(&mut self, dt_ms: f32) -> Transform {
        self.elapsed_ms += dt_ms.max(0.0);
        self.current()
    }

    /// Transform at the current point of the transition.
    pub fn current(&self) -> Transform {
        if self.is_finished() {
            return self.to;
        }
        let t = ease_cubic_in_out(self.elapsed_ms / self.duration_ms);
        self.from.lerp(&self.to, t)
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed_ms >= self.duration_ms
    }

    /// Where the transition ends.
    pub fn target(&self) -> Transform {
        self.to
    }
}
