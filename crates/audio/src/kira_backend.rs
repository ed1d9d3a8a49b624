//! Audio output through kira, with one limiter track shared by all sounds.
//!
//! Explosions are rendered on a dedicated synth thread and sent back as ready
//! [`StaticSoundData`]; [`AudioDevice::pump`] starts them from the frame loop.

use crate::engine::{AudioBackend, AudioDevice, MixerSettings};
use crate::synth::{ExplosionRecipe, SoundClip, SAMPLE_RATE};
use crate::AudioError;
use kira::{
    Frame,
    effect::compressor::CompressorBuilder,
    manager::{
        backend::{Backend, DefaultBackend},
        AudioManager, AudioManagerSettings,
    },
    sound::{
        static_sound::{StaticSoundData, StaticSoundHandle, StaticSoundSettings},
        PlaybackState,
    },
    track::{TrackBuilder, TrackHandle},
    tween::Tween,
};
use rand::{rngs::StdRng, SeedableRng};
use std::fmt;
use std::marker::PhantomData;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

/// Opens an output device on kira backend `K` (the platform default unless a
/// test swaps in kira's mock backend).
pub struct KiraBackend<K: Backend = DefaultBackend> {
    _backend: PhantomData<fn() -> K>,
}

impl KiraBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K: Backend> Default for KiraBackend<K> {
    fn default() -> Self {
        Self { _backend: PhantomData }
    }
}

impl<K: Backend> fmt::Debug for KiraBackend<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KiraBackend")
    }
}

impl<K> AudioBackend for KiraBackend<K>
where
    K: Backend,
    K::Settings: Default,
    K::Error: fmt::Debug,
{
    type Device = KiraDevice<K>;

    fn name(&self) -> &str {
        "kira"
    }

    fn open(&mut self, settings: &MixerSettings) -> Result<KiraDevice<K>, AudioError> {
        let mut manager = AudioManager::<K>::new(AudioManagerSettings::default())
            .map_err(|e| AudioError::Unavailable(format!("{:?}", e)))?;

        let limiter = settings.limiter;
        let track = manager
            .add_sub_track(
                TrackBuilder::new().with_effect(
                    CompressorBuilder::new()
                        .threshold(limiter.threshold_db as f64)
                        .ratio(limiter.ratio as f64)
                        .attack_duration(limiter.attack)
                        .release_duration(limiter.release),
                ),
            )
            .map_err(|e| AudioError::Unavailable(e.to_string()))?;

        let (jobs, ready) = spawn_synth(SAMPLE_RATE)?;
        Ok(KiraDevice {
            manager,
            limiter: track,
            voices: Vec::new(),
            suspended: false,
            jobs,
            ready,
        })
    }
}

/// One explosion waiting to be rendered.
#[derive(Debug, Clone, Copy)]
struct SynthJob {
    recipe: ExplosionRecipe,
    seed: u64,
}

/// Start the synth thread. It exits once either channel end is dropped.
fn spawn_synth(sample_rate: u32) -> Result<(Sender<SynthJob>, Receiver<StaticSoundData>), AudioError> {
    let (job_tx, job_rx) = mpsc::channel::<SynthJob>();
    let (sound_tx, sound_rx) = mpsc::channel();

    thread::Builder::new()
        .name("explosion-synth".into())
        .spawn(move || {
            for job in job_rx {
                let mut rng = StdRng::seed_from_u64(job.seed);
                let clip = job.recipe.render(sample_rate, &mut rng);
                if sound_tx.send(sound_data(&clip)).is_err() {
                    break;
                }
            }
        })
        .map_err(|e| AudioError::Unavailable(format!("synth thread: {}", e)))?;

    Ok((job_tx, sound_rx))
}

/// Wrap a mono clip as kira sound data, duplicating it to both channels.
fn sound_data(clip: &SoundClip) -> StaticSoundData {
    StaticSoundData {
        sample_rate: clip.sample_rate,
        frames: clip.samples.iter().map(|s| Frame::from_mono(*s)).collect(),
        settings: StaticSoundSettings::default(),
        slice: None,
    }
}

/// Live kira manager plus the limiter track every explosion is routed through.
///
/// Dropping the device closes both channels, which stops the synth thread
/// after at most the clip it is currently rendering.
pub struct KiraDevice<K: Backend = DefaultBackend> {
    manager: AudioManager<K>,
    limiter: TrackHandle,
    voices: Vec<StaticSoundHandle>,
    suspended: bool,
    jobs: Sender<SynthJob>,
    ready: Receiver<StaticSoundData>,
}

impl<K: Backend> KiraDevice<K> {
    /// Forget handles of sounds that already finished.
    fn reap(&mut self) {
        self.voices.retain(|handle| handle.state() != PlaybackState::Stopped);
    }

    fn start(&mut self, data: StaticSoundData) {
        let settings = StaticSoundSettings::new().output_destination(&self.limiter);
        match self.manager.play(data.with_settings(settings)) {
            Ok(handle) => self.voices.push(handle),
            Err(e) => log::warn!("Dropped explosion sound: {:?}", e),
        }
    }
}

impl<K: Backend> AudioDevice for KiraDevice<K> {
    fn is_suspended(&self) -> bool {
        self.suspended
    }

    fn suspend(&mut self) -> Result<(), AudioError> {
        self.reap();
        for handle in &mut self.voices {
            let _ = handle.pause(Tween::default());
        }
        self.suspended = true;
        Ok(())
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        self.reap();
        for handle in &mut self.voices {
            let _ = handle.resume(Tween::default());
        }
        self.suspended = false;
        Ok(())
    }

    fn play(&mut self, recipe: &ExplosionRecipe, seed: u64) -> Result<(), AudioError> {
        self.jobs
            .send(SynthJob { recipe: *recipe, seed })
            .map_err(|_| AudioError::Playback("synth thread stopped".into()))?;
        self.pump();
        Ok(())
    }

    fn pump(&mut self) {
        self.reap();
        while let Ok(data) = self.ready.try_recv() {
            // Sounds finished while hidden would all fire at once on return.
            if !self.suspended {
                self.start(data);
            }
        }
    }

    fn stop_all(&mut self) {
        for handle in &mut self.voices {
            let _ = handle.stop(Tween::default());
        }
        self.voices.clear();
        while self.ready.try_recv().is_ok() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kira::manager::backend::mock::MockBackend;
    use kira::track::TrackId;
    use std::time::{Duration, Instant};

    fn open() -> KiraDevice<MockBackend> {
        KiraBackend::<MockBackend>::default()
            .open(&MixerSettings::default())
            .expect("mock backend opens")
    }

    /// Pump until the synth thread has delivered `count` voices.
    fn wait_for_voices(device: &mut KiraDevice<MockBackend>, count: usize) {
        let deadline = Instant::now() + Duration::from_secs(20);
        while device.voices.len() < count {
            assert!(Instant::now() < deadline, "synth thread never delivered");
            thread::sleep(Duration::from_millis(5));
            device.pump();
        }
    }

    #[test]
    fn limiter_is_a_sub_track() {
        let device = open();
        assert_ne!(device.limiter.id(), TrackId::Main);
        assert!(!device.is_suspended());
    }

    #[test]
    fn play_returns_before_rendering() {
        let mut device = open();
        device.play(&ExplosionRecipe::default(), 1).expect("queued");
        // a five second clip cannot be rendered by the time play returns
        assert!(device.voices.is_empty());
        wait_for_voices(&mut device, 1);
    }

    #[test]
    fn rendered_clips_become_voices() {
        let mut device = open();
        device.play(&ExplosionRecipe::default(), 1).expect("queued");
        device.play(&ExplosionRecipe::default(), 2).expect("queued");
        wait_for_voices(&mut device, 2);
        // reaping keeps voices that are still playing
        device.pump();
        assert_eq!(device.voices.len(), 2);
    }

    #[test]
    fn suspend_and_resume_keep_voices() {
        let mut device = open();
        device.play(&ExplosionRecipe::default(), 3).expect("queued");
        wait_for_voices(&mut device, 1);

        device.suspend().expect("suspend");
        assert!(device.is_suspended());
        assert_eq!(device.voices.len(), 1);

        device.resume().expect("resume");
        assert!(!device.is_suspended());
        assert_eq!(device.voices.len(), 1);
    }

    #[test]
    fn clips_finishing_while_suspended_are_dropped() {
        let mut device = open();
        let (tx, rx) = mpsc::channel();
        device.ready = rx;
        let clip = SoundClip { sample_rate: 8_000, samples: vec![0.1; 800] };

        device.suspend().expect("suspend");
        tx.send(sound_data(&clip)).expect("send");
        device.pump();
        assert!(device.voices.is_empty());

        device.resume().expect("resume");
        tx.send(sound_data(&clip)).expect("send");
        device.pump();
        assert_eq!(device.voices.len(), 1);
    }

    #[test]
    fn stop_all_forgets_every_voice() {
        let mut device = open();
        device.play(&ExplosionRecipe::default(), 5).expect("queued");
        wait_for_voices(&mut device, 1);
        device.stop_all();
        assert!(device.voices.is_empty());
    }

    #[test]
    fn clip_becomes_stereo_frames() {
        let clip = SoundClip { sample_rate: 8_000, samples: vec![0.0, 0.5, -0.25] };
        let data = sound_data(&clip);
        assert_eq!(data.sample_rate, 8_000);
        assert_eq!(data.frames.len(), 3);
        assert_eq!(data.frames[1].left, 0.5);
        assert_eq!(data.frames[1].right, 0.5);
        assert_eq!(data.frames[2].right, -0.25);
    }
}
