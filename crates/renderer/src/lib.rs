//! wgpu renderer for the fireworks show: point sprites with trails, bloom and
//! a screen-blend composite.

pub mod camera;
pub mod pipeline;
pub mod renderer;
pub mod sprite;
pub mod texture;
pub mod vertex;
pub mod viewport;

pub use camera::*;
pub use renderer::*;
pub use texture::*;
pub use vertex::*;
pub use viewport::*;
