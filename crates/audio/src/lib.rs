//! Explosion sound synthesis and the audio device lifecycle.
//!
//! Sounds are rendered sample by sample on the CPU ([`synth`]) on a synth
//! thread and handed to kira through a shared limiter track ([`kira_backend`]).
//! [`AudioEngine`] owns the device and defers opening it until the first
//! user-initiated launch.

pub mod engine;
pub mod kira_backend;
pub mod synth;

pub use engine::*;
pub use kira_backend::KiraBackend;
pub use synth::{ExplosionRecipe, SoundClip, SAMPLE_RATE};

/// Failures from the audio output. None of them are fatal to the show.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("audio device unavailable: {0}")]
    Unavailable(String),
    #[error("audio output rejected the sound: {0}")]
    Playback(String),
}

// Re-export for convenience
pub use kira;
