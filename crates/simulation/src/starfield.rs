//! Static background stars.

use crate::draw::DrawList;
use engine_core::{Rgb, Vec3};
use rand::Rng;

/// Edge length of the cube the stars are scattered in, centered on the origin.
pub const STAR_EXTENT: f32 = 1200.0;
pub const STAR_SIZE: f32 = 1.5;
const STAR_COLOR: u32 = 0x888888;

#[derive(Debug, Clone, Default)]
pub struct Starfield {
    stars: Vec<Vec3>,
    color: Rgb,
}

impl Starfield {
    pub fn generate<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Self {
        let half = STAR_EXTENT / 2.0;
        let stars = (0..count)
            .map(|_| {
                Vec3::new(
                    rng.gen_range(-half..half),
                    rng.gen_range(-half..half),
                    rng.gen_range(-half..half),
                )
            })
            .collect();
        Self { stars, color: Rgb::from_hex(STAR_COLOR) }
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    pub fn draw_into(&self, out: &mut DrawList) {
        for star in &self.stars {
            out.push(*star, STAR_SIZE, self.color);
        }
    }
}
