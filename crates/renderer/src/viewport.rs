//! Window size bookkeeping: the pixel-ratio cap and deferred resizes.

/// Offscreen targets never exceed this many pixels per logical pixel.
pub const MAX_PIXEL_RATIO: f64 = 1.5;

/// Sizes the renderer needs for one window state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportSize {
    /// Swapchain size in physical pixels.
    pub surface: (u32, u32),
    /// Size of the trail target everything is drawn into.
    pub render: (u32, u32),
}

impl ViewportSize {
    /// `None` for a zero-area window (minimized).
    pub fn new(physical_width: u32, physical_height: u32, scale_factor: f64) -> Option<Self> {
        if physical_width == 0 || physical_height == 0 {
            return None;
        }
        let scale_factor = if scale_factor.is_finite() && scale_factor > 0.0 { scale_factor } else { 1.0 };
        let shrink = (MAX_PIXEL_RATIO / scale_factor).min(1.0);
        let scaled = |v: u32| ((v as f64 * shrink).round() as u32).max(1);
        Some(Self {
            surface: (physical_width, physical_height),
            render: (scaled(physical_width), scaled(physical_height)),
        })
    }

    pub fn aspect(&self) -> f32 {
        self.render.0 as f32 / self.render.1.max(1) as f32
    }

    /// Bloom targets run at a quarter of the render size.
    pub fn bloom(&self) -> (u32, u32) {
        ((self.render.0 / 4).max(1), (self.render.1 / 4).max(1))
    }
}

/// Collects resize events and hands the latest one out once per tick, so a
/// burst of events during a drag costs a single target rebuild.
#[derive(Debug, Clone, Default)]
pub struct ViewportAdapter {
    current: Option<ViewportSize>,
    pending: Option<(u32, u32, f64)>,
    scale_factor: f64,
}

impl ViewportAdapter {
    pub fn new(physical_width: u32, physical_height: u32, scale_factor: f64) -> Self {
        Self {
            current: ViewportSize::new(physical_width, physical_height, scale_factor),
            pending: None,
            scale_factor,
        }
    }

    /// Record a new window size; applied by the next [`ViewportAdapter::take_pending`].
    pub fn request(&mut self, physical_width: u32, physical_height: u32) {
        self.pending = Some((physical_width, physical_height, self.scale_factor));
    }

    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        self.scale_factor = scale_factor;
        if let Some((w, h, _)) = self.pending {
            self.pending = Some((w, h, scale_factor));
        } else if let Some(size) = self.current {
            self.pending = Some((size.surface.0, size.surface.1, scale_factor));
        }
    }

    /// The size to apply this tick, if it changed. Zero sizes are dropped and
    /// the previous size stays in effect.
    pub fn take_pending(&mut self) -> Option<ViewportSize> {
        let (w, h, scale) = self.pending.take()?;
        let size = ViewportSize::new(w, h, scale)?;
        if self.current == Some(size) {
            return None;
        }
        self.current = Some(size);
        Some(size)
    }

    pub fn current(&self) -> Option<ViewportSize> {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_dpi_is_capped() {
        let size = ViewportSize::new(2000, 1000, 2.0).unwrap();
        assert_eq!(size.surface, (2000, 1000));
        assert_eq!(size.render, (1500, 750));
        assert_eq!(size.bloom(), (375, 187));
    }

    #[test]
    fn low_dpi_is_untouched() {
        let size = ViewportSize::new(1280, 720, 1.0).unwrap();
        assert_eq!(size.render, (1280, 720));
        assert!((size.aspect() - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn zero_size_is_ignored() {
        assert!(ViewportSize::new(0, 720, 1.0).is_none());
        let mut adapter = ViewportAdapter::new(800, 600, 1.0);
        adapter.request(0, 0);
        assert!(adapter.take_pending().is_none());
        assert_eq!(adapter.current().unwrap().render, (800, 600));
    }

    #[test]
    fn only_latest_request_applies() {
        let mut adapter = ViewportAdapter::new(800, 600, 1.0);
        adapter.request(1024, 768);
        adapter.request(640, 480);
        assert_eq!(adapter.take_pending().unwrap().surface, (640, 480));
        assert!(adapter.take_pending().is_none());
    }

    #[test]
    fn unchanged_size_is_not_reapplied() {
        let mut adapter = ViewportAdapter::new(800, 600, 1.0);
        adapter.request(800, 600);
        assert!(adapter.take_pending().is_none());
    }

    #[test]
    fn scale_change_triggers_resize() {
        let mut adapter = ViewportAdapter::new(1600, 1200, 1.0);
        adapter.set_scale_factor(2.0);
        assert_eq!(adapter.take_pending().unwrap().render, (1200, 900));
    }
}
