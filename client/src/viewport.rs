use hexmap_shared::Bounds;

/// Pan/zoom transform from world coordinates to screen pixels.
/// `scale` is pixels per world unit, so `scale == 2^zoom` in slippy-map terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale: f64,
}

pub const MIN_SCALE: f64 = 1.0;
pub const MAX_SCALE: f64 = 524_288.0; // 2^19
const ZOOM_SENSITIVITY: f64 = 0.002;
const FIT_PADDING: f64 = 0.05;

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            scale: MIN_SCALE,
        }
    }
}

impl Viewport {
    pub fn world_to_screen(&self, wx: f64, wy: f64) -> (f64, f64) {
        (
            wx * self.scale + self.offset_x,
            wy * self.scale + self.offset_y,
        )
    }

    pub fn screen_to_world(&self, sx: f64, sy: f64) -> (f64, f64) {
        (
            (sx - self.offset_x) / self.scale,
            (sy - self.offset_y) / self.scale,
        )
    }

    /// Fractional slippy-map zoom level.
    pub fn zoom_level(&self) -> f64 {
        self.scale.log2()
    }

    /// Zoom toward a focus point (screen coordinates). Positive `delta` zooms out.
    pub fn zoom_at(&mut self, delta: f64, screen_x: f64, screen_y: f64) {
        let factor = (-delta * ZOOM_SENSITIVITY).exp();
        let new_scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        let ratio = new_scale / self.scale;

        // The point under the cursor stays fixed.
        self.offset_x = screen_x - (screen_x - self.offset_x) * ratio;
        self.offset_y = screen_y - (screen_y - self.offset_y) * ratio;
        self.scale = new_scale;
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Put world point `(wx, wy)` at the canvas center at slippy-map `zoom`.
    pub fn center_on(&mut self, wx: f64, wy: f64, zoom: f64, canvas_w: f64, canvas_h: f64) {
        self.scale = 2f64.powf(zoom).clamp(MIN_SCALE, MAX_SCALE);
        self.offset_x = canvas_w / 2.0 - wx * self.scale;
        self.offset_y = canvas_h / 2.0 - wy * self.scale;
    }

    /// Fit the viewport to show `bounds` (world coordinates) with padding.
    /// Degenerate bounds or a zero-sized canvas leave the viewport untouched.
    pub fn fit_bounds(&mut self, bounds: Bounds, canvas_w: f64, canvas_h: f64) {
        let world_w = bounds.max_x - bounds.min_x;
        let world_h = bounds.max_y - bounds.min_y;

        if world_w <= 0.0 || world_h <= 0.0 || canvas_w <= 0.0 || canvas_h <= 0.0 {
            return;
        }

        let scale_x = canvas_w / (world_w * (1.0 + FIT_PADDING * 2.0));
        let scale_y = canvas_h / (world_h * (1.0 + FIT_PADDING * 2.0));
        self.scale = scale_x.min(scale_y).clamp(MIN_SCALE, MAX_SCALE);

        let (center_x, center_y) = bounds.center();
        self.offset_x = canvas_w / 2.0 - center_x * self.scale;
        self.offset_y = canvas_h / 2.0 - center_y * self.scale;
    }

    /// World-space rectangle currently covered by a `canvas_w x canvas_h` canvas.
    pub fn visible_world(&self, canvas_w: f64, canvas_h: f64) -> Bounds {
        let (x0, y0) = self.screen_to_world(0.0, 0.0);
        let (x1, y1) = self.screen_to_world(canvas_w, canvas_h);
        let mut bounds = Bounds::point(x0, y0);
        bounds.include(x1, y1);
        bounds
    }
}
