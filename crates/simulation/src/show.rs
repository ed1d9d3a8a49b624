//! The whole show behind one handle: config, driver, launcher and audio.

use crate::config::FireworksConfig;
use crate::draw::DrawList;
use crate::driver::{ShowStats, SimulationDriver, TickReport};
use crate::firework::FireworkId;
use crate::launch::LaunchController;
use audio::{AudioBackend, AudioEngine, MixerSettings};

pub struct FireworkShow<B: AudioBackend> {
    config: FireworksConfig,
    driver: SimulationDriver,
    launcher: LaunchController,
    audio: AudioEngine<B>,
    draws: DrawList,
}

impl<B: AudioBackend> FireworkShow<B> {
    pub fn new(config: FireworksConfig, backend: B) -> Self {
        let config = config.sanitized();
        let driver = SimulationDriver::new(&config);
        Self::assemble(config, driver, LaunchController::new(), backend)
    }

    /// Fully deterministic show (spark layout, launch offsets, noise).
    pub fn with_seed(config: FireworksConfig, backend: B, seed: u64) -> Self {
        let config = config.sanitized();
        let driver = SimulationDriver::with_seed(&config, seed);
        let mut show = Self::assemble(config, driver, LaunchController::with_seed(seed ^ 0x5eed), backend);
        show.audio = show.audio.with_seed(seed);
        show
    }

    fn assemble(config: FireworksConfig, driver: SimulationDriver, launcher: LaunchController, backend: B) -> Self {
        let settings = MixerSettings { volume: config.volume, ..MixerSettings::default() };
        Self { audio: AudioEngine::new(backend, settings), config, driver, launcher, draws: DrawList::new() }
    }

    pub fn launch(&mut self) -> FireworkId {
        self.launcher.launch(&mut self.driver, &mut self.audio, &self.config)
    }

    /// Advance one frame; each burst queues its sound once when sound is on.
    /// Synthesis happens off this thread, so a tick never waits on audio.
    pub fn tick(&mut self, dt: f32) -> TickReport {
        let report = self.driver.tick(dt, &self.config);
        if self.config.sound_enabled {
            for _ in &report.explosions {
                self.audio.play_explosion();
            }
        }
        self.audio.pump();
        report
    }

    /// Draw intents for the current state. The list is reused between calls.
    pub fn draw_list(&mut self) -> &DrawList {
        self.driver.collect_draws(&self.config, &mut self.draws);
        &self.draws
    }

    pub fn config(&self) -> &FireworksConfig {
        &self.config
    }

    /// Swap in new settings; fireworks already in flight pick them up next frame.
    pub fn set_config(&mut self, config: FireworksConfig) {
        let config = config.sanitized();
        self.driver.reseed_starfield(config.star_count);
        self.audio.set_volume(config.volume);
        self.config = config;
    }

    /// Flip sound on or off, returning the new state.
    pub fn toggle_sound(&mut self) -> bool {
        self.config.sound_enabled = !self.config.sound_enabled;
        if self.config.sound_enabled {
            self.audio.ensure_active();
        }
        self.config.sound_enabled
    }

    pub fn suspend_audio(&mut self) {
        self.audio.suspend();
    }

    /// Drop every firework and release the audio device.
    pub fn shutdown(&mut self) {
        self.driver.clear();
        self.audio.dispose();
    }

    pub fn active_count(&self) -> usize {
        self.driver.active_count()
    }

    pub fn stats(&self) -> ShowStats {
        self.driver.stats()
    }

    pub fn audio(&self) -> &AudioEngine<B> {
        &self.audio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audio::{AudioStatus, SilentBackend, SilentDevice};

    const DT: f32 = 1.0 / 60.0;

    fn small() -> FireworksConfig {
        FireworksConfig { particle_count: 50, star_count: 20, ..FireworksConfig::default() }
    }

    fn run_until_empty(show: &mut FireworkShow<SilentBackend>) {
        for _ in 0..60 * 30 {
            show.tick(DT);
            if show.active_count() == 0 {
                return;
            }
        }
        panic!("show never finished");
    }

    #[test]
    fn fifty_launches_all_retire() {
        let mut show = FireworkShow::with_seed(small(), SilentBackend, 1);
        for _ in 0..50 {
            show.launch();
        }
        assert_eq!(show.active_count(), 50);

        run_until_empty(&mut show);
        let stats = show.stats();
        assert_eq!(stats.launched, 50);
        assert_eq!(stats.exploded, 50);
        assert_eq!(stats.retired, 50);
        assert_eq!(stats.peak_active, 50);
        // one sound per burst
        assert_eq!(show.audio().device().map(SilentDevice::played), Some(50));
    }

    #[test]
    fn muted_show_stays_silent() {
        let config = FireworksConfig { sound_enabled: false, ..small() };
        let mut show = FireworkShow::with_seed(config, SilentBackend, 2);
        show.launch();
        run_until_empty(&mut show);
        assert_eq!(show.audio().status(), AudioStatus::Dormant);
    }

    #[test]
    fn toggling_sound_opens_audio() {
        let config = FireworksConfig { sound_enabled: false, ..small() };
        let mut show = FireworkShow::with_seed(config, SilentBackend, 3);
        assert!(show.toggle_sound());
        assert_eq!(show.audio().status(), AudioStatus::Active);
        assert!(!show.toggle_sound());
    }

    #[test]
    fn reload_resizes_starfield() {
        let mut show = FireworkShow::with_seed(small(), SilentBackend, 4);
        assert_eq!(show.draw_list().len(), 20);
        show.set_config(FireworksConfig { star_count: 5, ..small() });
        assert_eq!(show.draw_list().len(), 5);
    }

    #[test]
    fn shutdown_releases_everything() {
        let mut show = FireworkShow::with_seed(small(), SilentBackend, 5);
        show.launch();
        show.shutdown();
        assert_eq!(show.active_count(), 0);
        assert_eq!(show.audio().status(), AudioStatus::Disposed);
    }
}
