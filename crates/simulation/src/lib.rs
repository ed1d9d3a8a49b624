//! Firework simulation: entities, the driver that advances them, and the
//! launch controller that ties launches to the audio engine.
//!
//! Everything here is plain CPU code. Frames leave the crate as a [`DrawList`]
//! of point sprites, so the physics never touches a rendering backend.

pub mod config;
pub mod draw;
pub mod driver;
pub mod firework;
pub mod launch;
pub mod palette;
pub mod show;
pub mod starfield;

pub use config::FireworksConfig;
pub use draw::{DrawList, FrameStyle, PointSprite};
pub use driver::{ShowStats, SimulationDriver, TickReport};
pub use firework::{advance, Burst, Explosion, Firework, FireworkId, Phase};
pub use launch::LaunchController;
pub use palette::{ColorMode, Palette};
pub use show::FireworkShow;
pub use starfield::Starfield;
