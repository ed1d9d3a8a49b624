//! Scalar and vector helpers shared by the simulation.

use glam::Vec3;
use std::f32::consts::TAU;

/// Hermite interpolation of `x` between `edge0` and `edge1`, clamped to [0, 1].
/// A zero-width interval acts as a step at `edge1`.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if x <= edge0 && x < edge1 {
        return 0.0;
    }
    if x >= edge1 {
        return 1.0;
    }
    let t = (x - edge0) / (edge1 - edge0);
    t * t * (3.0 - 2.0 * t)
}

/// Map two independent uniforms in [0, 1) to a direction on the unit sphere.
///
/// The polar angle comes from `acos(2v - 1)`, which keeps the density uniform
/// over the surface instead of bunching up at the poles.
pub fn unit_sphere_direction(u: f32, v: f32) -> Vec3 {
    let theta = u * TAU;
    let phi = (2.0 * v - 1.0).clamp(-1.0, 1.0).acos();
    let (sin_phi, cos_phi) = phi.sin_cos();
    Vec3::new(sin_phi * theta.cos(), sin_phi * theta.sin(), cos_phi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothstep_endpoints_and_midpoint() {
        assert_eq!(smoothstep(1.5, 2.0, 1.0), 0.0);
        assert_eq!(smoothstep(1.5, 2.0, 1.5), 0.0);
        assert_eq!(smoothstep(1.5, 2.0, 2.5), 1.0);
        assert!((smoothstep(1.5, 2.0, 1.75) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn smoothstep_zero_width_is_step() {
        assert_eq!(smoothstep(0.0, 0.0, -0.1), 0.0);
        assert_eq!(smoothstep(0.0, 0.0, 0.0), 1.0);
    }

    #[test]
    fn sphere_directions_are_unit_length() {
        for i in 0..16 {
            for j in 0..16 {
                let d = unit_sphere_direction(i as f32 / 16.0, j as f32 / 16.0);
                assert!((d.length() - 1.0).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn polar_mapping_is_linear_in_z() {
        // z = cos(acos(2v - 1)) = 2v - 1
        for k in 0..=10 {
            let v = k as f32 / 10.0;
            let d = unit_sphere_direction(0.3, v);
            assert!((d.z - (2.0 * v - 1.0)).abs() < 1e-5);
        }
    }
}
