//! Procedural explosion sound: sub-bass drop, filtered noise rumble and a
//! short triangle crack, all starting on the same sample.

use rand::Rng;
use std::f32::consts::{PI, TAU};

/// Rate every clip is rendered at. The output device resamples if needed.
pub const SAMPLE_RATE: u32 = 48_000;

/// Level every gain envelope decays towards.
const GAIN_FLOOR: f32 = 0.01;

/// Q of the rumble low-pass (1 dB resonance, as a linear factor).
const RUMBLE_Q: f32 = 1.122;

/// Exponential ramp from `start` to `end` reached after `duration` seconds and
/// held afterwards. An exponential curve can never leave or reach 0, so a ramp
/// with a non-positive endpoint holds `start` for its whole length.
pub fn exponential_ramp(start: f32, end: f32, duration: f32, t: f32) -> f32 {
    if start <= 0.0 || end <= 0.0 || t <= 0.0 {
        return start;
    }
    if t >= duration {
        return end;
    }
    start * (end / start).powf(t / duration)
}

/// Value that moves exponentially from `start` to `end` over `duration` seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sweep {
    pub start: f32,
    pub end: f32,
    pub duration: f32,
}

impl Sweep {
    pub const fn new(start: f32, end: f32, duration: f32) -> Self {
        Self { start, end, duration }
    }

    pub fn at(&self, t: f32) -> f32 {
        exponential_ramp(self.start, self.end, self.duration, t)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
}

impl Waveform {
    /// One sample at `phase` in turns ([0, 1)). Both shapes start at 0 and rise.
    fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (phase * TAU).sin(),
            Waveform::Triangle => {
                if phase < 0.25 {
                    4.0 * phase
                } else if phase < 0.75 {
                    2.0 - 4.0 * phase
                } else {
                    4.0 * phase - 4.0
                }
            }
        }
    }
}

/// Oscillator with a pitch sweep and a gain envelope, silent after `length`.
#[derive(Debug, Clone, Copy)]
pub struct ToneLayer {
    pub waveform: Waveform,
    pub frequency: Sweep,
    pub gain: Sweep,
    pub length: f32,
}

impl ToneLayer {
    /// Add this layer into `out`, starting at sample 0.
    pub fn render_into(&self, out: &mut [f32], sample_rate: u32) {
        let sr = sample_rate as f32;
        let count = ((self.length * sr) as usize).min(out.len());
        let mut phase = 0.0f32;

        for (i, sample) in out.iter_mut().take(count).enumerate() {
            let t = i as f32 / sr;
            *sample += self.waveform.sample(phase) * self.gain.at(t);
            phase += self.frequency.at(t) / sr;
            if phase >= 1.0 {
                phase -= 1.0;
            }
        }
    }
}

/// White noise through a swept low-pass filter.
#[derive(Debug, Clone, Copy)]
pub struct NoiseLayer {
    pub cutoff: Sweep,
    pub gain: Sweep,
    pub length: f32,
}

impl NoiseLayer {
    pub fn render_into<R: Rng + ?Sized>(&self, out: &mut [f32], sample_rate: u32, rng: &mut R) {
        let sr = sample_rate as f32;
        let count = ((self.length * sr) as usize).min(out.len());
        let mut filter = LowPass::new();

        for (i, sample) in out.iter_mut().take(count).enumerate() {
            let t = i as f32 / sr;
            filter.set_cutoff(self.cutoff.at(t), RUMBLE_Q, sr);
            let noise = rng.gen_range(-1.0f32..1.0);
            *sample += filter.process(noise) * self.gain.at(t);
        }
    }
}

/// Biquad low-pass (RBJ cookbook), coefficients recomputed on demand.
#[derive(Debug, Clone, Copy)]
struct LowPass {
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

impl LowPass {
    fn new() -> Self {
        Self { x1: 0.0, x2: 0.0, y1: 0.0, y2: 0.0, b0: 1.0, b1: 0.0, b2: 0.0, a1: 0.0, a2: 0.0 }
    }

    fn set_cutoff(&mut self, freq: f32, q: f32, sample_rate: f32) {
        let w0 = 2.0 * PI * (freq / sample_rate).min(0.49);
        let alpha = w0.sin() / (2.0 * q);
        let cos_w0 = w0.cos();

        let a0 = 1.0 + alpha;
        self.b0 = ((1.0 - cos_w0) / 2.0) / a0;
        self.b1 = (1.0 - cos_w0) / a0;
        self.b2 = self.b0;
        self.a1 = (-2.0 * cos_w0) / a0;
        self.a2 = (1.0 - alpha) / a0;
    }

    fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;
        output
    }
}

/// Mono PCM clip in [-1, 1]-ish floats (peaks may exceed 1 before the limiter).
#[derive(Debug, Clone, PartialEq)]
pub struct SoundClip {
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl SoundClip {
    pub fn duration_seconds(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
    }

    /// Peak absolute value inside `[from, to)` seconds.
    pub fn peak_between(&self, from: f32, to: f32) -> f32 {
        let sr = self.sample_rate as f32;
        let end = ((to * sr) as usize).min(self.samples.len());
        let start = ((from * sr) as usize).min(end);
        self.samples[start..end].iter().fold(0.0f32, |m, s| m.max(s.abs()))
    }
}

/// The three layers of one explosion.
#[derive(Debug, Clone, Copy)]
pub struct ExplosionRecipe {
    pub sub_bass: ToneLayer,
    pub rumble: NoiseLayer,
    pub crack: ToneLayer,
}

impl Default for ExplosionRecipe {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl ExplosionRecipe {
    /// Layer gains are relative to `volume`; envelopes all decay to a fixed floor.
    pub fn new(volume: f32) -> Self {
        let volume = volume.max(0.0);
        Self {
            sub_bass: ToneLayer {
                waveform: Waveform::Sine,
                frequency: Sweep::new(50.0, 20.0, 2.5),
                gain: Sweep::new(volume * 1.5, GAIN_FLOOR, 5.0),
                length: 5.0,
            },
            rumble: NoiseLayer {
                cutoff: Sweep::new(150.0, 30.0, 4.0),
                gain: Sweep::new(volume, GAIN_FLOOR, 4.5),
                length: 5.0,
            },
            crack: ToneLayer {
                waveform: Waveform::Triangle,
                frequency: Sweep::new(200.0, 50.0, 0.1),
                gain: Sweep::new(volume * 0.3, GAIN_FLOOR, 0.1),
                length: 0.1,
            },
        }
    }

    /// Length of the longest layer in seconds.
    pub fn duration(&self) -> f32 {
        self.sub_bass.length.max(self.rumble.length).max(self.crack.length)
    }

    /// Render all layers summed into one clip. The noise comes from `rng`, so
    /// every explosion sounds slightly different unless the caller reuses a seed.
    pub fn render<R: Rng + ?Sized>(&self, sample_rate: u32, rng: &mut R) -> SoundClip {
        let len = (self.duration() * sample_rate as f32).ceil() as usize;
        let mut samples = vec![0.0f32; len];
        self.sub_bass.render_into(&mut samples, sample_rate);
        self.rumble.render_into(&mut samples, sample_rate, rng);
        self.crack.render_into(&mut samples, sample_rate);
        SoundClip { sample_rate, samples }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    const SR: u32 = 8_000;

    #[test]
    fn ramp_hits_endpoints_and_holds() {
        assert_eq!(exponential_ramp(50.0, 20.0, 2.5, 0.0), 50.0);
        assert!((exponential_ramp(50.0, 20.0, 2.5, 2.5) - 20.0).abs() < 1e-4);
        assert_eq!(exponential_ramp(50.0, 20.0, 2.5, 10.0), 20.0);
        // geometric midpoint
        let mid = exponential_ramp(50.0, 20.0, 2.5, 1.25);
        assert!((mid - (50.0f32 * 20.0).sqrt()).abs() < 1e-3);
    }

    #[test]
    fn ramp_touching_zero_holds_start() {
        assert_eq!(exponential_ramp(0.0, 0.01, 2.0, 1.0), 0.0);
        assert_eq!(exponential_ramp(0.0, 0.01, 2.0, 5.0), 0.0);
        assert_eq!(exponential_ramp(0.5, 0.0, 2.0, 1.0), 0.5);
    }

    #[test]
    fn peak_between_tolerates_reversed_range() {
        let clip = SoundClip { sample_rate: SR, samples: vec![0.5; SR as usize] };
        assert_eq!(clip.peak_between(0.5, 0.1), 0.0);
        assert_eq!(clip.peak_between(0.9, 3.0), 0.5);
    }

    #[test]
    fn clip_spans_longest_layer() {
        let mut rng = StdRng::seed_from_u64(7);
        let clip = ExplosionRecipe::default().render(SR, &mut rng);
        assert_eq!(clip.samples.len(), 5 * SR as usize);
        assert!((clip.duration_seconds() - 5.0).abs() < 1e-3);
    }

    #[test]
    fn crack_is_silent_after_its_length() {
        let recipe = ExplosionRecipe::default();
        let mut out = vec![0.0f32; SR as usize];
        recipe.crack.render_into(&mut out, SR);
        let cut = (0.1 * SR as f32) as usize;
        assert!(out[..cut].iter().any(|s| s.abs() > 0.05));
        assert!(out[cut..].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn sub_bass_decays() {
        let recipe = ExplosionRecipe::default();
        let mut out = vec![0.0f32; 5 * SR as usize];
        recipe.sub_bass.render_into(&mut out, SR);
        let clip = SoundClip { sample_rate: SR, samples: out };
        let early = clip.peak_between(0.0, 0.1);
        let late = clip.peak_between(4.5, 5.0);
        assert!(early > 0.6 && early <= 0.75 + 1e-3);
        assert!(late < 0.02);
    }

    #[test]
    fn sub_bass_pitch_drops() {
        // Count rising zero crossings in the first and last second.
        let recipe = ExplosionRecipe::default();
        let mut out = vec![0.0f32; 5 * SR as usize];
        recipe.sub_bass.render_into(&mut out, SR);
        let crossings = |from: usize, to: usize| {
            out[from..to].windows(2).filter(|w| w[0] < 0.0 && w[1] >= 0.0).count()
        };
        let first = crossings(0, SR as usize);
        let last = crossings(4 * SR as usize, 5 * SR as usize);
        assert!(first > last);
        assert!((19..=22).contains(&last));
    }

    #[test]
    fn rumble_fades_out() {
        let recipe = ExplosionRecipe::default();
        let mut rng = StdRng::seed_from_u64(99);
        let mut out = vec![0.0f32; 5 * SR as usize];
        recipe.rumble.render_into(&mut out, SR, &mut rng);
        let clip = SoundClip { sample_rate: SR, samples: out };
        assert!(clip.peak_between(0.0, 0.5) > 10.0 * clip.peak_between(4.5, 5.0));
    }

    #[test]
    fn zero_volume_is_silent() {
        let mut rng = StdRng::seed_from_u64(1);
        let clip = ExplosionRecipe::new(0.0).render(SR, &mut rng);
        assert_eq!(clip.peak(), 0.0);
    }
}
