//! Draw intents handed from the simulation to whatever renders it.

use crate::config::FireworksConfig;
use engine_core::{Rgb, Vec3};

/// One camera-facing soft dot, additively blended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSprite {
    pub position: Vec3,
    /// World-space size; the renderer attenuates it with distance.
    pub size: f32,
    /// Linear color, may exceed 1.0.
    pub color: Rgb,
}

/// Per-frame compositing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameStyle {
    pub trail_opacity: f32,
    pub bloom_strength: f32,
    pub bloom_radius: f32,
    pub fog_density: f32,
    pub background: Rgb,
}

impl FrameStyle {
    pub fn from_config(config: &FireworksConfig) -> Self {
        Self {
            trail_opacity: config.trail_opacity,
            bloom_strength: config.bloom_strength,
            bloom_radius: config.bloom_radius,
            fog_density: config.fog_density,
            background: Rgb::from_hex(config.background),
        }
    }
}

/// Everything to draw this frame. Reused between frames to keep its allocation.
#[derive(Debug, Default)]
pub struct DrawList {
    pub points: Vec<PointSprite>,
    pub style: FrameStyle,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn push(&mut self, position: Vec3, size: f32, color: Rgb) {
        self.points.push(PointSprite { position, size, color });
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
