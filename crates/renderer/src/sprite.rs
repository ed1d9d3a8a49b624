//! Procedural soft-dot texture shared by every point sprite.

use image::{Rgba, RgbaImage};

/// Edge length of the generated sprite in pixels.
pub const SPRITE_SIZE: u32 = 32;

/// Alpha stops of the radial gradient as (distance from center / radius, alpha).
const ALPHA_STOPS: [(f32, f32); 4] = [(0.0, 1.0), (0.3, 0.9), (0.5, 0.5), (1.0, 0.0)];

/// Alpha at normalized distance `t` from the center, linear between stops.
pub fn falloff(t: f32) -> f32 {
    let t = t.max(0.0);
    for pair in ALPHA_STOPS.windows(2) {
        let (t0, a0) = pair[0];
        let (t1, a1) = pair[1];
        if t <= t1 {
            return a0 + (a1 - a0) * (t - t0) / (t1 - t0);
        }
    }
    0.0
}

/// White square image whose alpha fades radially from the center to the edge.
pub fn soft_circle(size: u32) -> RgbaImage {
    let size = size.max(1);
    let center = size as f32 / 2.0;
    RgbaImage::from_fn(size, size, |x, y| {
        let dx = x as f32 + 0.5 - center;
        let dy = y as f32 + 0.5 - center;
        let t = (dx * dx + dy * dy).sqrt() / center;
        Rgba([255, 255, 255, (falloff(t) * 255.0).round() as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falloff_hits_stops() {
        assert_eq!(falloff(0.0), 1.0);
        assert!((falloff(0.3) - 0.9).abs() < 1e-6);
        assert!((falloff(0.5) - 0.5).abs() < 1e-6);
        assert_eq!(falloff(1.0), 0.0);
        assert_eq!(falloff(1.5), 0.0);
        assert!((falloff(0.75) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn sprite_is_bright_in_middle_and_clear_in_corners() {
        let img = soft_circle(SPRITE_SIZE);
        assert_eq!(img.dimensions(), (32, 32));
        assert!(img.get_pixel(16, 16)[3] > 240);
        assert_eq!(img.get_pixel(0, 0)[3], 0);
        assert_eq!(img.get_pixel(31, 31)[3], 0);
        assert!(img.pixels().all(|p| p[0] == 255 && p[1] == 255 && p[2] == 255));
    }

    #[test]
    fn sprite_is_symmetric() {
        let img = soft_circle(SPRITE_SIZE);
        for y in 0..32 {
            for x in 0..32 {
                assert_eq!(img.get_pixel(x, y)[3], img.get_pixel(31 - x, y)[3]);
                assert_eq!(img.get_pixel(x, y)[3], img.get_pixel(y, x)[3]);
            }
        }
    }
}
