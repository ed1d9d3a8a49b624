//! Turns a user gesture into a rocket.

use crate::config::FireworksConfig;
use crate::driver::SimulationDriver;
use crate::firework::FireworkId;
use audio::{AudioBackend, AudioEngine};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Picks launch positions and wakes the audio engine. There is no cap on
/// fireworks in flight and no queue: every call launches immediately.
pub struct LaunchController {
    rng: StdRng,
}

impl Default for LaunchController {
    fn default() -> Self {
        Self::new()
    }
}

impl LaunchController {
    pub fn new() -> Self {
        Self { rng: StdRng::from_entropy() }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    /// Horizontal launch offset, uniform across `spawn_width`.
    pub fn spawn_offset(&mut self, config: &FireworksConfig) -> f32 {
        (self.rng.gen::<f32>() - 0.5) * config.spawn_width
    }

    /// Bring up audio (launches count as the user gesture that may open or
    /// resume the device) and spawn one rocket.
    pub fn launch<B: AudioBackend>(
        &mut self,
        driver: &mut SimulationDriver,
        audio: &mut AudioEngine<B>,
        config: &FireworksConfig,
    ) -> FireworkId {
        if config.sound_enabled {
            audio.ensure_active();
        }
        let x = self.spawn_offset(config);
        let id = driver.spawn(x, config);
        log::debug!("Launched firework {} at x = {:.1}", id, x);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audio::{AudioStatus, MixerSettings, SilentBackend};

    #[test]
    fn offsets_stay_within_spawn_width() {
        let config = FireworksConfig::default();
        let mut launcher = LaunchController::with_seed(1);
        for _ in 0..1000 {
            let x = launcher.spawn_offset(&config);
            assert!(x.abs() <= config.spawn_width / 2.0);
        }
    }

    #[test]
    fn launch_opens_audio_and_spawns() {
        let config = FireworksConfig { star_count: 0, ..FireworksConfig::default() };
        let mut driver = SimulationDriver::with_seed(&config, 1);
        let mut audio = AudioEngine::new(SilentBackend, MixerSettings::default());
        let mut launcher = LaunchController::with_seed(2);

        assert_eq!(audio.status(), AudioStatus::Dormant);
        launcher.launch(&mut driver, &mut audio, &config);
        launcher.launch(&mut driver, &mut audio, &config);
        assert_eq!(audio.status(), AudioStatus::Active);
        assert_eq!(driver.active_count(), 2);
    }

    #[test]
    fn muted_launch_leaves_audio_closed() {
        let config = FireworksConfig { sound_enabled: false, ..FireworksConfig::default() };
        let mut driver = SimulationDriver::with_seed(&config, 1);
        let mut audio = AudioEngine::new(SilentBackend, MixerSettings::default());
        LaunchController::with_seed(3).launch(&mut driver, &mut audio, &config);
        assert_eq!(audio.status(), AudioStatus::Dormant);
        assert_eq!(driver.active_count(), 1);
    }
}
