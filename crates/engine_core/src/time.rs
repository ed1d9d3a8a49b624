//! Time management for the frame loop.

use crate::cancel::CancelToken;
use std::time::{Duration, Instant};

/// Longest delta a single frame may report. A window that was dragged or
/// minimized for seconds resumes with one ordinary step instead of a jump.
pub const DEFAULT_MAX_DELTA: Duration = Duration::from_millis(100);

/// Manages frame timing and delta time calculation.
#[derive(Debug)]
pub struct Time {
    /// Time of the last frame.
    last_frame: Instant,
    /// Duration of the last frame, after clamping.
    delta: Duration,
    /// Simulated time since start (sum of clamped deltas).
    elapsed: Duration,
    /// Frame count since start.
    frame_count: u64,
    /// Upper bound applied to every delta.
    max_delta: Duration,
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

impl Time {
    /// Create a new time manager.
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
            max_delta: DEFAULT_MAX_DELTA,
        }
    }

    /// Update timing at the start of a new frame from the wall clock.
    pub fn update(&mut self) {
        let now = Instant::now();
        let raw = now - self.last_frame;
        self.last_frame = now;
        self.advance(raw);
    }

    /// Advance by an explicit delta instead of reading the clock.
    pub fn advance(&mut self, raw: Duration) {
        self.delta = raw.min(self.max_delta);
        self.elapsed += self.delta;
        self.frame_count += 1;
    }

    /// Get the delta time in seconds.
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Get the delta time as a Duration.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Get total simulated time in seconds.
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Get the current frame count.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Change the per-frame delta clamp.
    pub fn set_max_delta(&mut self, max_delta: Duration) {
        self.max_delta = max_delta;
    }
}

/// What a tick callback wants the loop to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Stop,
}

/// Fixed-rate tick loop that runs until its token is cancelled or the
/// callback returns [`TickControl::Stop`].
#[derive(Debug, Clone)]
pub struct TickLoop {
    step: Duration,
    token: CancelToken,
    /// Sleep between ticks to hold the rate in wall-clock time.
    paced: bool,
}

impl TickLoop {
    pub fn new(rate_hz: f64, token: CancelToken) -> Self {
        Self {
            step: Duration::from_secs_f64(1.0 / rate_hz.max(1.0)),
            token,
            paced: true,
        }
    }

    /// Run ticks back to back without sleeping (simulated time only).
    pub fn unpaced(mut self) -> Self {
        self.paced = false;
        self
    }

    /// Step size handed to every tick, in seconds.
    pub fn step_seconds(&self) -> f32 {
        self.step.as_secs_f32()
    }

    /// Run the loop. The callback receives the fixed delta in seconds and the
    /// zero-based tick index. Returns the number of ticks executed.
    pub fn run<F>(&self, mut tick: F) -> u64
    where
        F: FnMut(f32, u64) -> TickControl,
    {
        let dt = self.step.as_secs_f32();
        let mut ticks = 0u64;
        let mut next = Instant::now();

        while !self.token.is_cancelled() {
            if tick(dt, ticks) == TickControl::Stop {
                break;
            }
            ticks += 1;

            if self.paced {
                next += self.step;
                let now = Instant::now();
                if next > now {
                    std::thread::sleep(next - now);
                } else {
                    // Fell behind; don't try to catch up with a burst of ticks.
                    next = now;
                }
            }
        }

        log::debug!("tick loop finished after {} ticks", ticks);
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_clamps_long_frames() {
        let mut time = Time::new();
        time.advance(Duration::from_secs(3));
        assert_eq!(time.delta(), DEFAULT_MAX_DELTA);
        assert_eq!(time.frame_count(), 1);
        assert!((time.elapsed_seconds() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn custom_clamp_applies() {
        let mut time = Time::new();
        time.set_max_delta(Duration::from_millis(20));
        time.advance(Duration::from_millis(16));
        time.advance(Duration::from_millis(50));
        assert_eq!(time.delta(), Duration::from_millis(20));
        assert!((time.elapsed_seconds() - 0.036).abs() < 1e-6);
    }

    #[test]
    fn tick_loop_stops_on_request() {
        let token = CancelToken::new();
        let ticks = TickLoop::new(60.0, token).unpaced().run(|dt, index| {
            assert!((dt - 1.0 / 60.0).abs() < 1e-6);
            if index == 9 { TickControl::Stop } else { TickControl::Continue }
        });
        assert_eq!(ticks, 9);
    }

    #[test]
    fn tick_loop_honors_cancellation() {
        let token = CancelToken::new();
        let handle = token.clone();
        let ticks = TickLoop::new(1000.0, token).run(|_, index| {
            if index == 4 {
                handle.cancel();
            }
            TickControl::Continue
        });
        assert_eq!(ticks, 5);
    }

    #[test]
    fn cancelled_token_runs_nothing() {
        let token = CancelToken::new();
        token.cancel();
        let ticks = TickLoop::new(60.0, token).unpaced().run(|_, _| TickControl::Continue);
        assert_eq!(ticks, 0);
    }
}
