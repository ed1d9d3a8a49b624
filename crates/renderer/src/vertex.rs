//! GPU-side instance layout for point sprites.

use bytemuck::{Pod, Zeroable};

/// One sprite instance. Six vertices per instance are generated in the shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PointInstance {
    pub position: [f32; 3],
    /// World-space size, attenuated with depth in the vertex shader.
    pub size: f32,
    /// Linear RGB, alpha unused by the additive pass.
    pub color: [f32; 4],
}

impl PointInstance {
    pub fn new(position: [f32; 3], size: f32, color: [f32; 3]) -> Self {
        Self { position, size, color: [color[0], color[1], color[2], 1.0] }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PointInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // Position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Size
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32,
                },
                // Color
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<PointInstance>(), 32);
        let layout = PointInstance::layout();
        assert_eq!(layout.array_stride, 32);
        assert_eq!(layout.attributes[2].offset, 16);
    }
}
