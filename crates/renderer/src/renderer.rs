//! Main renderer managing wgpu state and the per-frame pass chain.
//!
//! Every frame draws into a persistent HDR "trail" target that is never
//! cleared: a translucent black quad darkens what is already there, then the
//! point sprites are added on top. Bloom is extracted from the trail at quarter
//! resolution and both are composited into the swapchain.

use crate::{
    camera::{Camera, CameraUniform},
    pipeline::{
        create_blur_pipeline, create_bright_pipeline, create_camera_bind_group_layout,
        create_composite_bind_group_layout, create_composite_pipeline, create_fade_pipeline,
        create_point_pipeline, create_post_bind_group_layout, create_texture_bind_group_layout,
    },
    sprite,
    texture::Texture,
    vertex::PointInstance,
    viewport::ViewportSize,
};
use anyhow::Result;
use bytemuck::{Pod, Zeroable};
use std::sync::Arc;
use thiserror::Error;
use wgpu::util::DeviceExt;
use winit::window::Window;

const INITIAL_INSTANCES: u32 = 4096;
/// Luminance high-pass of the bloom: everything above the threshold glows.
const BLOOM_THRESHOLD: f32 = 0.0;
const BLOOM_SMOOTHING: f32 = 0.01;
/// Blur tap distance in bloom texels per unit of bloom radius.
const BLUR_SPREAD: f32 = 2.0;

#[derive(Debug, Error)]
pub enum RenderError {
    /// The surface was reconfigured; the frame should simply be skipped.
    #[error("surface lost or outdated")]
    SurfaceLost,
    #[error("GPU out of memory")]
    OutOfMemory,
    #[error("could not acquire frame: {0}")]
    Acquire(String),
}

/// Compositing parameters for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSettings {
    pub trail_opacity: f32,
    pub bloom_strength: f32,
    pub bloom_radius: f32,
    pub fog_density: f32,
    /// Linear RGB the show is screen-blended over.
    pub background: [f32; 3],
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            trail_opacity: 0.2,
            bloom_strength: 1.5,
            bloom_radius: 0.5,
            fog_density: 0.002,
            background: [0.0; 3],
        }
    }
}

/// Composite shader uniform (must match composite.wgsl CompositeParams).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct CompositeUniform {
    bloom: [f32; 4],
    background: [f32; 4],
}

/// Main renderer state.
pub struct Renderer {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub window: Arc<Window>,
    viewport: ViewportSize,

    camera_buffer: wgpu::Buffer,
    camera_uniform: CameraUniform,
    camera_bind_group: wgpu::BindGroup,
    sprite_bind_group: wgpu::BindGroup,

    // Trail pass
    point_pipeline: wgpu::RenderPipeline,
    fade_pipeline: wgpu::RenderPipeline,
    instance_buffer: wgpu::Buffer,
    max_instances: u32,
    trail: Texture,
    /// Set when the trail target was just (re)created and must be cleared once.
    trail_fresh: bool,

    // Bloom: bright pass + blur
    bloom_a: Texture,
    bloom_b: Texture,
    post_bind_group_layout: wgpu::BindGroupLayout,
    bright_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    bright_uniform_buffer: wgpu::Buffer,
    blur_uniform_h: wgpu::Buffer,
    blur_uniform_v: wgpu::Buffer,

    // Composite into the swapchain
    composite_bind_group_layout: wgpu::BindGroupLayout,
    composite_pipeline: wgpu::RenderPipeline,
    composite_uniform_buffer: wgpu::Buffer,
    linear_sampler: wgpu::Sampler,
}

impl Renderer {
    /// Create a new renderer for the given window.
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();
        let viewport = ViewportSize::new(size.width.max(1), size.height.max(1), window.scale_factor())
            .ok_or_else(|| anyhow::anyhow!("Window has no drawable area"))?;

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("Failed to find suitable GPU adapter"))?;

        log::info!("Using GPU: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("Surface reports no supported formats"))?;

        // Prefer Mailbox (low-latency vsync) if available; otherwise AutoVsync.
        let present_mode = surface_caps
            .present_modes
            .iter()
            .find(|m| matches!(m, wgpu::PresentMode::Mailbox))
            .copied()
            .unwrap_or(wgpu::PresentMode::AutoVsync);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: viewport.surface.0,
            height: viewport.surface.1,
            present_mode,
            alpha_mode: surface_caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        // Camera
        let camera_uniform = CameraUniform::new();
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group_layout = create_camera_bind_group_layout(&device);
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry { binding: 0, resource: camera_buffer.as_entire_binding() }],
        });

        // Sprite
        let linear_sampler = Texture::linear_sampler(&device, "Linear Sampler");
        let texture_bind_group_layout = create_texture_bind_group_layout(&device);
        let sprite_texture =
            Texture::from_image(&device, &queue, &sprite::soft_circle(sprite::SPRITE_SIZE), "Sprite Texture");
        let sprite_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sprite Bind Group"),
            layout: &texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&sprite_texture.view) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(&linear_sampler) },
            ],
        });

        // Trail
        let point_pipeline = create_point_pipeline(&device, &camera_bind_group_layout, &texture_bind_group_layout);
        let fade_pipeline = create_fade_pipeline(&device, &camera_bind_group_layout);
        let max_instances = INITIAL_INSTANCES;
        let instance_buffer = create_instance_buffer(&device, max_instances);
        let trail = Texture::render_target(&device, viewport.render.0, viewport.render.1, "Trail");

        // Bloom textures (1/4 resolution for performance)
        let (bloom_w, bloom_h) = viewport.bloom();
        let bloom_a = Texture::render_target(&device, bloom_w, bloom_h, "Bloom A");
        let bloom_b = Texture::render_target(&device, bloom_w, bloom_h, "Bloom B");

        let post_bind_group_layout = create_post_bind_group_layout(&device);
        let bright_pipeline = create_bright_pipeline(&device, &post_bind_group_layout);
        let blur_pipeline = create_blur_pipeline(&device, &post_bind_group_layout);
        let bright_uniform: [f32; 4] = [BLOOM_THRESHOLD, BLOOM_SMOOTHING, 0.0, 0.0];
        let bright_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Bright Uniform"),
            contents: bytemuck::cast_slice(&bright_uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        // Separate direction uniforms for H and V (avoid overwrite between passes)
        let blur_uniform_h = create_vec4_uniform(&device, "Blur Uniform H", [1.0, 0.0, 1.0, 0.0]);
        let blur_uniform_v = create_vec4_uniform(&device, "Blur Uniform V", [0.0, 1.0, 1.0, 0.0]);

        let composite_bind_group_layout = create_composite_bind_group_layout(&device);
        let composite_pipeline = create_composite_pipeline(&device, config.format, &composite_bind_group_layout);
        let composite_uniform = CompositeUniform { bloom: [1.0, 0.0, 0.0, 0.0], background: [0.0, 0.0, 0.0, 1.0] };
        let composite_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Composite Uniform"),
            contents: bytemuck::cast_slice(&[composite_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        Ok(Self {
            surface,
            device,
            queue,
            config,
            window,
            viewport,
            camera_buffer,
            camera_uniform,
            camera_bind_group,
            sprite_bind_group,
            point_pipeline,
            fade_pipeline,
            instance_buffer,
            max_instances,
            trail,
            trail_fresh: true,
            bloom_a,
            bloom_b,
            post_bind_group_layout,
            bright_pipeline,
            blur_pipeline,
            bright_uniform_buffer,
            blur_uniform_h,
            blur_uniform_v,
            composite_bind_group_layout,
            composite_pipeline,
            composite_uniform_buffer,
            linear_sampler,
        })
    }

    /// Handle window resize. Recreates the trail (dropping its history) and bloom targets.
    pub fn resize(&mut self, viewport: ViewportSize) {
        self.viewport = viewport;
        self.config.width = viewport.surface.0;
        self.config.height = viewport.surface.1;
        self.surface.configure(&self.device, &self.config);

        self.trail = Texture::render_target(&self.device, viewport.render.0, viewport.render.1, "Trail");
        self.trail_fresh = true;
        let (bloom_w, bloom_h) = viewport.bloom();
        self.bloom_a = Texture::render_target(&self.device, bloom_w, bloom_h, "Bloom A");
        self.bloom_b = Texture::render_target(&self.device, bloom_w, bloom_h, "Bloom B");
    }

    /// Upload camera matrices plus the per-frame fog and fade values.
    pub fn update_camera(&mut self, camera: &Camera, settings: &FrameSettings) {
        self.camera_uniform
            .update(camera, self.viewport.render, settings.fog_density, settings.trail_opacity);
        self.queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[self.camera_uniform]));
    }

    /// Draw one frame: fade + sprites into the trail, bloom, composite, present.
    pub fn render_frame(&mut self, points: &[PointInstance], settings: &FrameSettings) -> Result<(), RenderError> {
        self.upload_instances(points);
        self.upload_post_uniforms(settings);

        let output = self.acquire()?;
        let output_view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        self.run_trail_pass(&mut encoder, points.len() as u32);
        self.run_bloom_passes(&mut encoder);
        self.run_composite_pass(&mut encoder, &output_view);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn acquire(&mut self) -> Result<wgpu::SurfaceTexture, RenderError> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(frame),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                Err(RenderError::SurfaceLost)
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(RenderError::OutOfMemory),
            Err(e) => Err(RenderError::Acquire(e.to_string())),
        }
    }

    /// Grow the instance buffer by doubling when a frame needs more room, then upload.
    fn upload_instances(&mut self, points: &[PointInstance]) {
        let needed = points.len() as u32;
        if needed > self.max_instances {
            let mut capacity = self.max_instances.max(1);
            while capacity < needed {
                capacity = capacity.saturating_mul(2);
            }
            log::debug!("Growing instance buffer {} -> {}", self.max_instances, capacity);
            self.instance_buffer = create_instance_buffer(&self.device, capacity);
            self.max_instances = capacity;
        }
        if !points.is_empty() {
            self.queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(points));
        }
    }

    fn upload_post_uniforms(&self, settings: &FrameSettings) {
        let spread = 1.0 + settings.bloom_radius * BLUR_SPREAD;
        let blur_h: [f32; 4] = [1.0, 0.0, spread, 0.0];
        let blur_v: [f32; 4] = [0.0, 1.0, spread, 0.0];
        self.queue.write_buffer(&self.blur_uniform_h, 0, bytemuck::cast_slice(&blur_h));
        self.queue.write_buffer(&self.blur_uniform_v, 0, bytemuck::cast_slice(&blur_v));

        let [r, g, b] = settings.background;
        let composite = CompositeUniform {
            bloom: [settings.bloom_strength, 0.0, 0.0, 0.0],
            background: [r, g, b, 1.0],
        };
        self.queue.write_buffer(&self.composite_uniform_buffer, 0, bytemuck::cast_slice(&[composite]));
    }

    /// Darken the trail target, then add this frame's sprites.
    fn run_trail_pass(&mut self, encoder: &mut wgpu::CommandEncoder, instance_count: u32) {
        let load = if self.trail_fresh {
            wgpu::LoadOp::Clear(wgpu::Color::BLACK)
        } else {
            wgpu::LoadOp::Load
        };
        self.trail_fresh = false;

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Trail Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.trail.view,
                resolve_target: None,
                ops: wgpu::Operations { load, store: wgpu::StoreOp::Store },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.fade_pipeline);
        pass.set_bind_group(0, &self.camera_bind_group, &[]);
        pass.draw(0..3, 0..1);

        if instance_count > 0 {
            pass.set_pipeline(&self.point_pipeline);
            pass.set_bind_group(0, &self.camera_bind_group, &[]);
            pass.set_bind_group(1, &self.sprite_bind_group, &[]);
            pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
            pass.draw(0..6, 0..instance_count);
        }
    }

    /// Run bloom passes: bright extract -> blur H -> blur V. Result ends up in bloom A.
    fn run_bloom_passes(&self, encoder: &mut wgpu::CommandEncoder) {
        let passes = [
            ("Bright Pass", &self.bright_pipeline, &self.trail, &self.bright_uniform_buffer, &self.bloom_a),
            ("Blur H Pass", &self.blur_pipeline, &self.bloom_a, &self.blur_uniform_h, &self.bloom_b),
            ("Blur V Pass", &self.blur_pipeline, &self.bloom_b, &self.blur_uniform_v, &self.bloom_a),
        ];
        for (label, pipeline, source, params, target) in passes {
            self.post_pass(encoder, label, pipeline, &source.view, params, &target.view);
        }
    }

    fn post_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        label: &str,
        pipeline: &wgpu::RenderPipeline,
        source: &wgpu::TextureView,
        params: &wgpu::Buffer,
        target: &wgpu::TextureView,
    ) {
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.post_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(source) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(&self.linear_sampler) },
                wgpu::BindGroupEntry { binding: 2, resource: params.as_entire_binding() },
            ],
        });
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);
    }

    /// Trail + bloom, screen-blended over the background, into the swapchain.
    fn run_composite_pass(&self, encoder: &mut wgpu::CommandEncoder, output_view: &wgpu::TextureView) {
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Composite Bind Group"),
            layout: &self.composite_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&self.trail.view) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(&self.bloom_a.view) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::Sampler(&self.linear_sampler) },
                wgpu::BindGroupEntry { binding: 3, resource: self.composite_uniform_buffer.as_entire_binding() },
            ],
        });
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Composite Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.composite_pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);
    }

    /// Current viewport (surface and render target sizes).
    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    /// Get surface dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }
}

fn create_instance_buffer(device: &wgpu::Device, capacity: u32) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Point Instance Buffer"),
        size: capacity as u64 * std::mem::size_of::<PointInstance>() as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_vec4_uniform(device: &wgpu::Device, label: &str, value: [f32; 4]) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(&value),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}
