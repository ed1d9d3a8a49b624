//! Audio engine handle: owns the output device and its lifecycle.

use crate::synth::ExplosionRecipe;
use crate::AudioError;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::time::Duration;

/// Output limiter shared by every sound, so overlapping explosions compress
/// instead of clipping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimiterSettings {
    pub threshold_db: f32,
    pub ratio: f32,
    pub attack: Duration,
    pub release: Duration,
}

impl Default for LimiterSettings {
    fn default() -> Self {
        Self {
            threshold_db: -10.0,
            ratio: 12.0,
            attack: Duration::from_millis(3),
            release: Duration::from_millis(250),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixerSettings {
    /// Master volume applied to the explosion layers (0.5 = reference loudness).
    pub volume: f32,
    pub limiter: LimiterSettings,
}

impl Default for MixerSettings {
    fn default() -> Self {
        Self { volume: 0.5, limiter: LimiterSettings::default() }
    }
}

/// Something that can open an output device.
pub trait AudioBackend {
    type Device: AudioDevice;

    /// Human-readable name for logs.
    fn name(&self) -> &str;

    fn open(&mut self, settings: &MixerSettings) -> Result<Self::Device, AudioError>;
}

/// An open output device. Playback is fire-and-forget.
pub trait AudioDevice {
    fn is_suspended(&self) -> bool;

    fn suspend(&mut self) -> Result<(), AudioError>;

    fn resume(&mut self) -> Result<(), AudioError>;

    /// Queue one explosion. Must not render on the caller's thread; `seed`
    /// drives the noise layer.
    fn play(&mut self, recipe: &ExplosionRecipe, seed: u64) -> Result<(), AudioError>;

    /// Start sounds that finished rendering since the last call.
    fn pump(&mut self) {}

    /// Stop every sound still playing.
    fn stop_all(&mut self);
}

/// Observable lifecycle state of an [`AudioEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioStatus {
    /// No device opened yet; waiting for the first user gesture.
    Dormant,
    Active,
    Suspended,
    /// Opening failed; every sound is silently dropped from now on.
    Unavailable,
    Disposed,
}

enum EngineState<D> {
    Dormant,
    Active(D),
    Unavailable,
    Disposed,
}

/// Explicitly owned audio handle with a create / resume / dispose lifecycle.
pub struct AudioEngine<B: AudioBackend> {
    backend: B,
    settings: MixerSettings,
    recipe: ExplosionRecipe,
    state: EngineState<B::Device>,
    rng: StdRng,
}

impl<B: AudioBackend> AudioEngine<B> {
    /// Create the handle. No device is opened until [`AudioEngine::ensure_active`].
    pub fn new(backend: B, settings: MixerSettings) -> Self {
        Self {
            backend,
            recipe: ExplosionRecipe::new(settings.volume),
            settings,
            state: EngineState::Dormant,
            rng: StdRng::from_entropy(),
        }
    }

    /// Use a fixed seed for the noise layer (tests, reproducible captures).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Open the device on first call, resume it if suspended, otherwise do
    /// nothing. Returns whether sound can currently be played.
    pub fn ensure_active(&mut self) -> bool {
        if matches!(self.state, EngineState::Dormant) {
            self.state = match self.backend.open(&self.settings) {
                Ok(device) => {
                    log::info!("Audio output opened ({})", self.backend.name());
                    EngineState::Active(device)
                }
                Err(e) => {
                    log::warn!("Audio disabled, explosions will be silent: {}", e);
                    EngineState::Unavailable
                }
            };
        }

        if let EngineState::Active(device) = &mut self.state {
            if device.is_suspended() {
                match device.resume() {
                    Ok(()) => log::debug!("Audio output resumed"),
                    Err(e) => log::debug!("Audio resume failed, will retry on next launch: {}", e),
                }
            }
        }
        self.is_active()
    }

    /// Queue one explosion for synthesis. Silent no-op unless active or when
    /// the volume is zero.
    pub fn play_explosion(&mut self) {
        let EngineState::Active(device) = &mut self.state else {
            return;
        };
        if device.is_suspended() || self.settings.volume <= 0.0 {
            return;
        }
        let seed = self.rng.gen::<u64>();
        if let Err(e) = device.play(&self.recipe, seed) {
            log::warn!("Dropped explosion sound: {}", e);
        }
    }

    /// Hand finished sounds to the output. Call once per frame.
    pub fn pump(&mut self) {
        if let EngineState::Active(device) = &mut self.state {
            device.pump();
        }
    }

    /// Pause output (e.g. the window was hidden). The next launch resumes it.
    pub fn suspend(&mut self) {
        if let EngineState::Active(device) = &mut self.state {
            if let Err(e) = device.suspend() {
                log::debug!("Audio suspend failed: {}", e);
            }
        }
    }

    /// Stop all sounds and release the device. Later calls are no-ops.
    pub fn dispose(&mut self) {
        if let EngineState::Active(device) = &mut self.state {
            device.stop_all();
        }
        if !matches!(self.state, EngineState::Disposed) {
            log::debug!("Audio engine disposed");
        }
        self.state = EngineState::Disposed;
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.settings.volume = volume;
        self.recipe = ExplosionRecipe::new(volume);
    }

    pub fn status(&self) -> AudioStatus {
        match &self.state {
            EngineState::Dormant => AudioStatus::Dormant,
            EngineState::Active(device) if device.is_suspended() => AudioStatus::Suspended,
            EngineState::Active(_) => AudioStatus::Active,
            EngineState::Unavailable => AudioStatus::Unavailable,
            EngineState::Disposed => AudioStatus::Disposed,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status() == AudioStatus::Active
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn device(&self) -> Option<&B::Device> {
        match &self.state {
            EngineState::Active(device) => Some(device),
            _ => None,
        }
    }
}

/// Backend whose device accepts and discards everything. Used when running
/// without sound hardware.
#[derive(Debug, Default)]
pub struct SilentBackend;

#[derive(Debug, Default)]
pub struct SilentDevice {
    suspended: bool,
    played: usize,
}

impl SilentDevice {
    /// Number of explosions handed to this device.
    pub fn played(&self) -> usize {
        self.played
    }
}

impl AudioBackend for SilentBackend {
    type Device = SilentDevice;

    fn name(&self) -> &str {
        "silent"
    }

    fn open(&mut self, _settings: &MixerSettings) -> Result<SilentDevice, AudioError> {
        Ok(SilentDevice::default())
    }
}

impl AudioDevice for SilentDevice {
    fn is_suspended(&self) -> bool {
        self.suspended
    }

    fn suspend(&mut self) -> Result<(), AudioError> {
        self.suspended = true;
        Ok(())
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        self.suspended = false;
        Ok(())
    }

    fn play(&mut self, _recipe: &ExplosionRecipe, _seed: u64) -> Result<(), AudioError> {
        self.played += 1;
        Ok(())
    }

    fn stop_all(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Default)]
    struct Counters {
        opened: Cell<usize>,
        resumed: Cell<usize>,
        played: Cell<usize>,
        pumped: Cell<usize>,
        stopped: Cell<usize>,
        seeds: RefCell<Vec<u64>>,
    }

    struct CountingBackend {
        counters: Rc<Counters>,
        fail: bool,
        start_suspended: bool,
    }

    struct CountingDevice {
        counters: Rc<Counters>,
        suspended: bool,
    }

    impl AudioBackend for CountingBackend {
        type Device = CountingDevice;

        fn name(&self) -> &str {
            "counting"
        }

        fn open(&mut self, _settings: &MixerSettings) -> Result<CountingDevice, AudioError> {
            if self.fail {
                return Err(AudioError::Unavailable("no device".into()));
            }
            self.counters.opened.set(self.counters.opened.get() + 1);
            Ok(CountingDevice { counters: self.counters.clone(), suspended: self.start_suspended })
        }
    }

    impl AudioDevice for CountingDevice {
        fn is_suspended(&self) -> bool {
            self.suspended
        }

        fn suspend(&mut self) -> Result<(), AudioError> {
            self.suspended = true;
            Ok(())
        }

        fn resume(&mut self) -> Result<(), AudioError> {
            self.counters.resumed.set(self.counters.resumed.get() + 1);
            self.suspended = false;
            Ok(())
        }

        fn play(&mut self, _recipe: &ExplosionRecipe, seed: u64) -> Result<(), AudioError> {
            self.counters.played.set(self.counters.played.get() + 1);
            self.counters.seeds.borrow_mut().push(seed);
            Ok(())
        }

        fn pump(&mut self) {
            self.counters.pumped.set(self.counters.pumped.get() + 1);
        }

        fn stop_all(&mut self) {
            self.counters.stopped.set(self.counters.stopped.get() + 1);
        }
    }

    fn engine(fail: bool, start_suspended: bool) -> (AudioEngine<CountingBackend>, Rc<Counters>) {
        let counters = Rc::new(Counters::default());
        let backend = CountingBackend { counters: counters.clone(), fail, start_suspended };
        (AudioEngine::new(backend, MixerSettings::default()).with_seed(3), counters)
    }

    #[test]
    fn device_open_is_deferred() {
        let (engine, counters) = engine(false, false);
        assert_eq!(engine.status(), AudioStatus::Dormant);
        assert_eq!(counters.opened.get(), 0);
    }

    #[test]
    fn ensure_active_is_idempotent() {
        let (mut engine, counters) = engine(false, false);
        assert!(engine.ensure_active());
        assert!(engine.ensure_active());
        assert_eq!(counters.opened.get(), 1);
        assert_eq!(engine.status(), AudioStatus::Active);
    }

    #[test]
    fn suspended_device_is_resumed_not_reopened() {
        // devices may come up suspended; the opening call resumes them
        let (mut engine, counters) = engine(false, true);
        assert!(engine.ensure_active());
        assert_eq!(counters.opened.get(), 1);
        assert_eq!(counters.resumed.get(), 1);
        assert!(engine.ensure_active());
        assert_eq!(counters.resumed.get(), 1);

        engine.suspend();
        assert_eq!(engine.status(), AudioStatus::Suspended);
        assert!(engine.ensure_active());
        assert_eq!(counters.opened.get(), 1);
        assert_eq!(counters.resumed.get(), 2);
    }

    #[test]
    fn play_before_activation_is_silent() {
        let (mut engine, counters) = engine(false, false);
        engine.play_explosion();
        assert_eq!(counters.played.get(), 0);
        engine.ensure_active();
        engine.play_explosion();
        engine.play_explosion();
        assert_eq!(counters.played.get(), 2);
    }

    #[test]
    fn each_explosion_gets_fresh_noise() {
        let (mut engine, counters) = engine(false, false);
        engine.ensure_active();
        engine.play_explosion();
        engine.play_explosion();
        let seeds = counters.seeds.borrow();
        assert_eq!(seeds.len(), 2);
        assert_ne!(seeds[0], seeds[1]);
    }

    #[test]
    fn pump_reaches_active_device_only() {
        let (mut engine, counters) = engine(false, false);
        engine.pump();
        assert_eq!(counters.pumped.get(), 0);
        engine.ensure_active();
        engine.pump();
        assert_eq!(counters.pumped.get(), 1);
    }

    #[test]
    fn zero_volume_queues_nothing() {
        let (mut engine, counters) = engine(false, false);
        engine.set_volume(0.0);
        engine.ensure_active();
        engine.play_explosion();
        assert_eq!(counters.played.get(), 0);
    }

    #[test]
    fn unavailable_device_degrades_silently() {
        let (mut engine, counters) = engine(true, false);
        assert!(!engine.ensure_active());
        assert_eq!(engine.status(), AudioStatus::Unavailable);
        engine.play_explosion();
        assert!(!engine.ensure_active());
        assert_eq!(counters.played.get(), 0);
    }

    #[test]
    fn dispose_stops_sounds_and_is_final() {
        let (mut engine, counters) = engine(false, false);
        engine.ensure_active();
        engine.dispose();
        engine.dispose();
        assert_eq!(counters.stopped.get(), 1);
        assert_eq!(engine.status(), AudioStatus::Disposed);
        assert!(!engine.ensure_active());
        engine.play_explosion();
        assert_eq!(counters.played.get(), 0);
        assert_eq!(counters.opened.get(), 1);
    }

    #[test]
    fn silent_backend_counts_clips() {
        let mut engine = AudioEngine::new(SilentBackend, MixerSettings::default()).with_seed(1);
        engine.ensure_active();
        engine.play_explosion();
        assert_eq!(engine.device().map(SilentDevice::played), Some(1));
    }
}
