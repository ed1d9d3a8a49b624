//! Core engine types and utilities for the fireworks show.
//!
//! This crate provides the foundational types used across all engine systems:
//! - Frame timing and the cancellable tick loop
//! - Linear RGB color and HSL conversion
//! - Small scalar helpers shared by simulation and audio

pub mod cancel;
pub mod color;
pub mod math;
pub mod time;

pub use cancel::*;
pub use color::*;
pub use math::*;
pub use time::*;

// Re-export commonly used types
pub use glam::{Mat4, Vec2, Vec3, Vec4};
