//! Explosion color schemes.

use engine_core::Rgb;
use rand::Rng;

/// How many hues an explosion mixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorMode {
    Mono,
    /// Base hue plus its complement.
    Dual,
    /// Three hues spaced a third of the wheel apart.
    Tri,
}

impl ColorMode {
    /// Each mode with probability 1/3.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        match rng.gen_range(0..3) {
            0 => ColorMode::Mono,
            1 => ColorMode::Dual,
            _ => ColorMode::Tri,
        }
    }

    pub fn color_count(self) -> usize {
        match self {
            ColorMode::Mono => 1,
            ColorMode::Dual => 2,
            ColorMode::Tri => 3,
        }
    }
}

/// One to three fully saturated linear colors, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    mode: ColorMode,
    colors: [Rgb; 3],
}

impl Palette {
    /// `base_hue` is in turns.
    pub fn new(mode: ColorMode, base_hue: f32) -> Self {
        let hsl = |offset: f32, lightness: f32| Rgb::from_hsl(base_hue + offset, 1.0, lightness).to_linear();
        let primary = hsl(0.0, 0.6);
        let colors = match mode {
            ColorMode::Mono => [primary; 3],
            // the complement is a touch darker so it doesn't wash out the base
            ColorMode::Dual => [primary, hsl(0.5, 0.5), primary],
            ColorMode::Tri => [primary, hsl(1.0 / 3.0, 0.6), hsl(2.0 / 3.0, 0.6)],
        };
        Self { mode, colors }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mode = ColorMode::random(rng);
        Self::new(mode, rng.gen())
    }

    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors[..self.mode.color_count()]
    }

    /// Color of the rocket.
    pub fn primary(&self) -> Rgb {
        self.colors[0]
    }

    /// Uniformly chosen palette color.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Rgb {
        let colors = self.colors();
        colors[rng.gen_range(0..colors.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn modes_are_equally_likely() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut counts = [0usize; 3];
        let n = 30_000;
        for _ in 0..n {
            match Palette::random(&mut rng).mode() {
                ColorMode::Mono => counts[0] += 1,
                ColorMode::Dual => counts[1] += 1,
                ColorMode::Tri => counts[2] += 1,
            }
        }
        for count in counts {
            let share = count as f32 / n as f32;
            assert!((share - 1.0 / 3.0).abs() < 0.02, "share {}", share);
        }
    }

    #[test]
    fn color_counts_follow_mode() {
        assert_eq!(Palette::new(ColorMode::Mono, 0.1).colors().len(), 1);
        assert_eq!(Palette::new(ColorMode::Dual, 0.1).colors().len(), 2);
        assert_eq!(Palette::new(ColorMode::Tri, 0.1).colors().len(), 3);
    }

    #[test]
    fn dual_uses_complement() {
        // red base: complement is cyan
        let palette = Palette::new(ColorMode::Dual, 0.0);
        let [base, complement] = [palette.colors()[0], palette.colors()[1]];
        assert!(base.r > base.g && base.r > base.b);
        assert!(complement.r < 1e-4);
        assert!((complement.g - complement.b).abs() < 1e-4);
    }

    #[test]
    fn picks_stay_in_palette() {
        let mut rng = StdRng::seed_from_u64(5);
        let palette = Palette::new(ColorMode::Tri, 0.7);
        for _ in 0..100 {
            assert!(palette.colors().contains(&palette.pick(&mut rng)));
        }
    }
}
