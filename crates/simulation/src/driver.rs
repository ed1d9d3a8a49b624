//! Owns the set of in-flight fireworks and advances them every frame.

use crate::config::FireworksConfig;
use crate::draw::{DrawList, FrameStyle};
use crate::firework::{advance, Explosion, Firework, FireworkId};
use crate::starfield::Starfield;
use rand::{rngs::StdRng, SeedableRng};

/// Running totals since the driver was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShowStats {
    pub launched: u64,
    pub exploded: u64,
    pub retired: u64,
    /// Most fireworks in flight at once.
    pub peak_active: usize,
}

/// What happened during one tick.
#[derive(Debug, Default)]
pub struct TickReport {
    pub explosions: Vec<Explosion>,
    pub retired: usize,
}

pub struct SimulationDriver {
    active: Vec<Firework>,
    starfield: Starfield,
    rng: StdRng,
    next_id: u64,
    stats: ShowStats,
}

impl SimulationDriver {
    pub fn new(config: &FireworksConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Deterministic driver for tests and captures.
    pub fn with_seed(config: &FireworksConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &FireworksConfig, mut rng: StdRng) -> Self {
        let starfield = Starfield::generate(config.star_count, &mut rng);
        Self { active: Vec::new(), starfield, rng, next_id: 0, stats: ShowStats::default() }
    }

    /// Launch a rocket from horizontal offset `x`.
    pub fn spawn(&mut self, x: f32, config: &FireworksConfig) -> FireworkId {
        let firework = Firework::launch(x, config, &mut self.rng);
        self.insert(firework)
    }

    /// Track an already built firework, assigning it a fresh id.
    pub fn insert(&mut self, mut firework: Firework) -> FireworkId {
        self.next_id += 1;
        let id = FireworkId(self.next_id);
        firework.id = id;
        self.active.push(firework);

        self.stats.launched += 1;
        self.stats.peak_active = self.stats.peak_active.max(self.active.len());
        id
    }

    /// Advance every firework by one frame and drop the ones that finished.
    pub fn tick(&mut self, dt: f32, config: &FireworksConfig) -> TickReport {
        let mut report = TickReport::default();

        for firework in &mut self.active {
            if let Some(explosion) = advance(firework, dt, config, &mut self.rng) {
                log::debug!("Firework {} burst at {:?}", explosion.id, explosion.position);
                report.explosions.push(explosion);
            }
        }

        // reverse order keeps swap_remove from skipping anything
        for i in (0..self.active.len()).rev() {
            if self.active[i].is_destroyed() {
                self.active.swap_remove(i);
                report.retired += 1;
            }
        }

        self.stats.exploded += report.explosions.len() as u64;
        self.stats.retired += report.retired as u64;
        report
    }

    /// Fill `out` with everything visible this frame: stars, rockets, sparks.
    pub fn collect_draws(&self, config: &FireworksConfig, out: &mut DrawList) {
        out.clear();
        out.style = FrameStyle::from_config(config);
        self.starfield.draw_into(out);
        for firework in &self.active {
            firework.draw_into(config, out);
        }
    }

    /// Rebuild the background if the configured star count changed.
    pub fn reseed_starfield(&mut self, count: usize) {
        if count != self.starfield.len() {
            self.starfield = Starfield::generate(count, &mut self.rng);
        }
    }

    /// Destroy every firework (teardown).
    pub fn clear(&mut self) {
        for firework in &mut self.active {
            firework.destroy();
        }
        self.stats.retired += self.active.len() as u64;
        self.active.clear();
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn fireworks(&self) -> &[Firework] {
        &self.active
    }

    pub fn stats(&self) -> ShowStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firework::Phase;
    use crate::palette::{ColorMode, Palette};
    use engine_core::Vec3;

    const DT: f32 = 1.0 / 60.0;

    fn config() -> FireworksConfig {
        FireworksConfig { particle_count: 32, star_count: 10, ..FireworksConfig::default() }
    }

    #[test]
    fn ids_are_unique() {
        let config = config();
        let mut driver = SimulationDriver::with_seed(&config, 1);
        let a = driver.spawn(0.0, &config);
        let b = driver.spawn(0.0, &config);
        assert_ne!(a, b);
        assert_eq!(driver.active_count(), 2);
    }

    #[test]
    fn tick_reports_each_explosion_once_and_retires() {
        let config = config();
        let mut driver = SimulationDriver::with_seed(&config, 2);
        for i in 0..5 {
            driver.spawn(i as f32 * 10.0, &config);
        }

        let mut explosions = 0;
        let mut retired = 0;
        for _ in 0..2000 {
            let report = driver.tick(DT, &config);
            explosions += report.explosions.len();
            retired += report.retired;
            if driver.active_count() == 0 {
                break;
            }
        }
        assert_eq!(explosions, 5);
        assert_eq!(retired, 5);
        assert_eq!(driver.active_count(), 0);
        assert_eq!(driver.stats(), ShowStats { launched: 5, exploded: 5, retired: 5, peak_active: 5 });
    }

    #[test]
    fn removal_keeps_survivors() {
        let config = config();
        let mut driver = SimulationDriver::with_seed(&config, 3);
        let palette = Palette::new(ColorMode::Mono, 0.0);
        // bursts immediately; dies long before the slow climber
        let quick = driver.insert(Firework::new(Vec3::ZERO, Vec3::Y, -1000.0, palette));
        let slow = driver.insert(Firework::new(Vec3::ZERO, Vec3::Y * 2.0, 1_000_000.0, palette));
        let quick2 = driver.insert(Firework::new(Vec3::ZERO, Vec3::Y, -1000.0, palette));

        let config = FireworksConfig { hover_duration: 0.0, fade_speed: 0.5, ..config };
        for _ in 0..5 {
            driver.tick(DT, &config);
        }
        let ids: Vec<_> = driver.fireworks().iter().map(Firework::id).collect();
        assert_eq!(ids, vec![slow]);
        assert!(!ids.contains(&quick) && !ids.contains(&quick2));
        assert_eq!(driver.fireworks()[0].phase(), Phase::Ascending);
    }

    #[test]
    fn draws_include_stars_and_rockets() {
        let config = config();
        let mut driver = SimulationDriver::with_seed(&config, 4);
        driver.spawn(0.0, &config);
        let mut list = DrawList::new();
        driver.collect_draws(&config, &mut list);
        assert_eq!(list.len(), 11);
        assert_eq!(list.style.trail_opacity, config.trail_opacity);
    }

    #[test]
    fn clear_empties_active_set() {
        let config = config();
        let mut driver = SimulationDriver::with_seed(&config, 5);
        driver.spawn(0.0, &config);
        driver.spawn(0.0, &config);
        driver.clear();
        assert_eq!(driver.active_count(), 0);
        assert_eq!(driver.stats().retired, 2);
    }
}
