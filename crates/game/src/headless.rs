//! Window-less show: launches on a timer, ticks at a fixed rate, reports totals.

use audio::SilentBackend;
use engine_core::{TickControl, TickLoop};
use simulation::{FireworkShow, FireworksConfig, ShowStats};

pub const TICK_RATE: u32 = 60;

/// Launch one firework per second for `seconds`, then keep ticking until every
/// firework has retired (or the lifetime bound passes). Returns the totals.
pub fn run(config: FireworksConfig, seconds: f32, tick_loop: &TickLoop) -> ShowStats {
    let mut show = FireworkShow::new(config, SilentBackend);
    let ticks_per_second = ((1.0 / tick_loop.step_seconds()).round() as u64).max(1);
    let launch_ticks = (seconds.max(0.0) * ticks_per_second as f32).round() as u64;
    let drain_ticks = (show.config().max_lifetime * ticks_per_second as f32).ceil() as u64 + 1;

    tick_loop.run(|dt, tick| {
        if tick < launch_ticks && tick % ticks_per_second == 0 {
            show.launch();
        }
        show.tick(dt);

        let draining = tick >= launch_ticks;
        if draining && (show.active_count() == 0 || tick >= launch_ticks + drain_ticks) {
            TickControl::Stop
        } else {
            TickControl::Continue
        }
    });

    show.shutdown();
    let stats = show.stats();
    log::info!(
        "Headless show: {} launched, {} exploded, {} retired, peak {} in flight",
        stats.launched,
        stats.exploded,
        stats.retired,
        stats.peak_active
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::CancelToken;

    fn small() -> FireworksConfig {
        FireworksConfig { particle_count: 40, star_count: 0, ..FireworksConfig::default() }
    }

    #[test]
    fn one_launch_per_second_all_retire() {
        let tick_loop = TickLoop::new(TICK_RATE as f64, CancelToken::new()).unpaced();
        let stats = run(small(), 3.0, &tick_loop);
        assert_eq!(stats.launched, 3);
        assert_eq!(stats.exploded, 3);
        assert_eq!(stats.retired, 3);
        assert!(stats.peak_active >= 1);
    }

    #[test]
    fn cancelled_token_stops_immediately() {
        let token = CancelToken::new();
        token.cancel();
        let tick_loop = TickLoop::new(TICK_RATE as f64, token).unpaced();
        let stats = run(small(), 5.0, &tick_loop);
        assert_eq!(stats.launched, 0);
    }
}
