//! Tunables for the show. Every field has a default so partial config files work.

use serde::{Deserialize, Serialize};

/// Runtime-adjustable show parameters.
///
/// Rates (`fade_speed`, `gravity`, `friction`, speeds) are applied once per
/// frame, not per second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FireworksConfig {
    /// Sparks per explosion.
    pub particle_count: usize,
    /// World-space size of a spark sprite.
    pub particle_size: f32,
    /// Life lost per frame once the hover ends.
    pub fade_speed: f32,
    pub explosion_force: f32,
    /// Seconds the sparks drift before gravity takes over.
    pub hover_duration: f32,
    pub gravity: f32,
    /// Velocity multiplier per frame while hovering.
    pub friction: f32,
    pub rocket_speed: f32,
    pub rocket_size: f32,
    pub bloom_strength: f32,
    pub bloom_radius: f32,
    /// Opacity of the darkening overlay drawn over the trail buffer each frame.
    pub trail_opacity: f32,
    pub sound_enabled: bool,
    /// Master volume of the explosion sound.
    pub volume: f32,
    /// Horizontal range rockets launch from, centered on 0.
    pub spawn_width: f32,
    pub star_count: usize,
    pub fog_density: f32,
    /// Seconds after which an entity is retired no matter what.
    pub max_lifetime: f32,
    /// 0xRRGGBB color the show is screen-blended over.
    pub background: u32,
}

impl Default for FireworksConfig {
    fn default() -> Self {
        Self {
            particle_count: 1500,
            particle_size: 0.8,
            fade_speed: 0.00482,
            explosion_force: 3.3975,
            hover_duration: 1.5,
            gravity: 0.00265,
            friction: 0.95494,
            rocket_speed: 2.0,
            rocket_size: 2.0,
            bloom_strength: 1.5,
            bloom_radius: 0.5,
            trail_opacity: 0.2,
            sound_enabled: true,
            volume: 0.5,
            spawn_width: 150.0,
            star_count: 1000,
            fog_density: 0.002,
            max_lifetime: 30.0,
            background: 0x240a5e,
        }
    }
}

impl FireworksConfig {
    /// Clamp values into ranges the simulation can run with. Logs a warning
    /// when anything had to change.
    pub fn sanitized(&self) -> Self {
        let non_negative = |v: f32| if v.is_finite() { v.max(0.0) } else { 0.0 };
        let clean = Self {
            particle_count: self.particle_count.max(1),
            particle_size: non_negative(self.particle_size),
            fade_speed: non_negative(self.fade_speed),
            explosion_force: non_negative(self.explosion_force),
            hover_duration: non_negative(self.hover_duration),
            gravity: non_negative(self.gravity),
            friction: non_negative(self.friction).min(1.0),
            rocket_speed: non_negative(self.rocket_speed),
            rocket_size: non_negative(self.rocket_size),
            bloom_strength: non_negative(self.bloom_strength),
            bloom_radius: non_negative(self.bloom_radius),
            trail_opacity: non_negative(self.trail_opacity).min(1.0),
            sound_enabled: self.sound_enabled,
            volume: non_negative(self.volume),
            spawn_width: non_negative(self.spawn_width),
            star_count: self.star_count,
            fog_density: non_negative(self.fog_density),
            max_lifetime: if self.max_lifetime > 0.0 { self.max_lifetime } else { Self::default().max_lifetime },
            background: self.background & 0x00ff_ffff,
        };
        if clean != *self {
            log::warn!("Fireworks config had out-of-range values, clamped");
        }
        clean
    }
}
