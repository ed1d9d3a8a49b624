//! A single firework: a rocket that climbs, then a burst of sparks that hover,
//! fall and fade.
//!
//! [`Firework`] is plain data; [`advance`] moves it forward one frame.

use crate::config::FireworksConfig;
use crate::draw::DrawList;
use crate::palette::Palette;
use engine_core::{smoothstep, unit_sphere_direction, Rgb, Vec3};
use rand::Rng;
use std::fmt;

/// Vertical velocity multiplier per frame while climbing.
pub const ASCENT_DAMPING: f32 = 0.99;
/// The rocket bursts once it climbs slower than this.
pub const MIN_ASCENT_SPEED: f32 = 0.2;
/// Velocity multiplier per frame once sparks fall.
pub const FALL_DAMPING: f32 = 0.98;
/// Seconds over which gravity ramps in after the hover.
pub const GRAVITY_BLEND: f32 = 0.5;
/// Spark color gain over the base color at full life.
pub const GLOW_BOOST: f32 = 1.5;

const LAUNCH_ALTITUDE: f32 = -80.0;
const LAUNCH_DEPTH: f32 = 25.0;
const LAUNCH_DRIFT: f32 = 0.25;
const TARGET_ALTITUDE_MIN: f32 = -10.0;
const TARGET_ALTITUDE_MAX: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FireworkId(pub u64);

impl fmt::Display for FireworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Ascending,
    Exploded,
}

/// Reported once, on the frame a rocket bursts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Explosion {
    pub id: FireworkId,
    pub position: Vec3,
    pub particles: usize,
}

/// Spark buffers of an exploded firework. All vectors have the same length,
/// fixed when the burst is created.
#[derive(Debug, Clone, Default)]
pub struct Burst {
    origin: Vec3,
    timer: f32,
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    base_colors: Vec<Rgb>,
    colors: Vec<Rgb>,
    life: Vec<f32>,
}

impl Burst {
    fn spawn<R: Rng + ?Sized>(origin: Vec3, palette: &Palette, config: &FireworksConfig, rng: &mut R) -> Self {
        let count = config.particle_count;
        let base_speed = config.explosion_force * rng.gen_range(0.8f32..1.2);

        let mut velocities = Vec::with_capacity(count);
        let mut base_colors = Vec::with_capacity(count);
        for _ in 0..count {
            let direction = unit_sphere_direction(rng.gen(), rng.gen());
            velocities.push(direction * base_speed * rng.gen_range(0.8f32..1.2));
            base_colors.push(palette.pick(rng) * rng.gen_range(0.5f32..1.3));
        }

        Self {
            origin,
            timer: 0.0,
            positions: vec![origin; count],
            velocities,
            colors: base_colors.iter().map(|c| *c * GLOW_BOOST).collect(),
            base_colors,
            life: vec![1.0; count],
        }
    }

    /// One frame of spark physics. Returns how many sparks were alive going
    /// into the frame.
    fn step(&mut self, dt: f32, config: &FireworksConfig) -> usize {
        self.timer += dt;
        let hover = config.hover_duration;
        let hovering = self.timer < hover;
        let gravity = config.gravity * smoothstep(hover, hover + GRAVITY_BLEND, self.timer);

        let mut alive = 0;
        for i in 0..self.life.len() {
            if self.life[i] <= 0.0 {
                continue;
            }
            alive += 1;

            self.positions[i] += self.velocities[i];
            let velocity = &mut self.velocities[i];
            if hovering {
                *velocity *= config.friction;
            } else {
                velocity.y -= gravity;
                *velocity *= FALL_DAMPING;
                self.life[i] -= config.fade_speed;
            }
            self.colors[i] = self.base_colors[i] * self.life[i].max(0.0) * GLOW_BOOST;
        }
        alive
    }

    fn release(&mut self) {
        *self = Self { origin: self.origin, timer: self.timer, ..Self::default() };
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Seconds since the burst.
    pub fn timer(&self) -> f32 {
        self.timer
    }

    /// Allocated spark count, dead ones included.
    pub fn len(&self) -> usize {
        self.life.len()
    }

    pub fn is_empty(&self) -> bool {
        self.life.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.life.iter().filter(|l| **l > 0.0).count()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn life(&self) -> &[f32] {
        &self.life
    }
}

#[derive(Debug, Clone)]
enum Stage {
    Ascending,
    Exploded(Burst),
}

#[derive(Debug, Clone)]
pub struct Firework {
    pub(crate) id: FireworkId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub target_altitude: f32,
    pub palette: Palette,
    age: f32,
    stage: Stage,
    destroyed: bool,
}

impl Firework {
    /// Rocket with an explicit trajectory.
    pub fn new(position: Vec3, velocity: Vec3, target_altitude: f32, palette: Palette) -> Self {
        Self {
            id: FireworkId::default(),
            position,
            velocity,
            target_altitude,
            palette,
            age: 0.0,
            stage: Stage::Ascending,
            destroyed: false,
        }
    }

    /// Rocket launched from below the scene at horizontal offset `x`, with a
    /// random palette, slight drift and burst altitude.
    pub fn launch<R: Rng + ?Sized>(x: f32, config: &FireworksConfig, rng: &mut R) -> Self {
        let position = Vec3::new(x, LAUNCH_ALTITUDE, rng.gen_range(-LAUNCH_DEPTH..LAUNCH_DEPTH));
        let velocity = Vec3::new(
            rng.gen_range(-LAUNCH_DRIFT..LAUNCH_DRIFT),
            config.rocket_speed * rng.gen_range(0.9f32..1.2),
            rng.gen_range(-LAUNCH_DRIFT..LAUNCH_DRIFT),
        );
        let target = rng.gen_range(TARGET_ALTITUDE_MIN..TARGET_ALTITUDE_MAX);
        Self::new(position, velocity, target, Palette::random(rng))
    }

    pub fn id(&self) -> FireworkId {
        self.id
    }

    pub fn phase(&self) -> Phase {
        match self.stage {
            Stage::Ascending => Phase::Ascending,
            Stage::Exploded(_) => Phase::Exploded,
        }
    }

    /// `None` while the rocket is still climbing.
    pub fn burst(&self) -> Option<&Burst> {
        match &self.stage {
            Stage::Exploded(burst) => Some(burst),
            Stage::Ascending => None,
        }
    }

    /// Seconds since launch.
    pub fn age(&self) -> f32 {
        self.age
    }

    /// Set once every spark has faded (or the lifetime bound hit). The driver
    /// drops destroyed fireworks at the end of the tick.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Release spark buffers and mark for removal.
    pub fn destroy(&mut self) {
        if let Stage::Exploded(burst) = &mut self.stage {
            burst.release();
        }
        self.destroyed = true;
    }

    fn explode<R: Rng + ?Sized>(&mut self, config: &FireworksConfig, rng: &mut R) -> Explosion {
        let burst = Burst::spawn(self.position, &self.palette, config, rng);
        let explosion = Explosion { id: self.id, position: self.position, particles: burst.len() };
        self.stage = Stage::Exploded(burst);
        explosion
    }

    /// Append this firework's sprites: the rocket while climbing, live sparks after.
    pub fn draw_into(&self, config: &FireworksConfig, out: &mut DrawList) {
        if self.destroyed {
            return;
        }
        match &self.stage {
            Stage::Ascending => out.push(self.position, config.rocket_size, self.palette.primary()),
            Stage::Exploded(burst) => {
                for ((position, color), life) in burst.positions.iter().zip(&burst.colors).zip(&burst.life) {
                    if *life > 0.0 {
                        out.push(*position, config.particle_size, *color);
                    }
                }
            }
        }
    }
}

/// Advance `firework` by one frame of `dt` seconds. Returns the explosion on
/// the frame the rocket bursts.
pub fn advance<R: Rng + ?Sized>(
    firework: &mut Firework,
    dt: f32,
    config: &FireworksConfig,
    rng: &mut R,
) -> Option<Explosion> {
    if firework.destroyed {
        return None;
    }
    firework.age += dt;

    match &mut firework.stage {
        Stage::Ascending => {
            firework.position += firework.velocity;
            firework.velocity.y *= ASCENT_DAMPING;
            // either trigger wins
            if firework.velocity.y < MIN_ASCENT_SPEED || firework.position.y >= firework.target_altitude {
                return Some(firework.explode(config, rng));
            }
        }
        Stage::Exploded(burst) => {
            if burst.step(dt, config) == 0 {
                firework.destroy();
                return None;
            }
        }
    }

    if firework.age > config.max_lifetime {
        log::warn!(
            "Firework {} still alive after {:.1}s, retiring it",
            firework.id,
            firework.age
        );
        firework.destroy();
    }
    None
}
