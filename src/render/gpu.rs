//! wgpu state for drawing two placed photos and the fade between them.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::photo::Photo;
use crate::processing::layout::center_offset;
use crate::slideshow::FadeFrame;

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    pos: [f32; 2],
    uv: [f32; 2],
}

const QUAD: [Vertex; 4] = [
    //   NDC pos         UV
    Vertex {
        pos: [-1.0, -1.0],
        uv: [0.0, 1.0],
    }, // bottom-left
    Vertex {
        pos: [1.0, -1.0],
        uv: [1.0, 1.0],
    }, // bottom-right
    Vertex {
        pos: [-1.0, 1.0],
        uv: [0.0, 0.0],
    }, // top-left
    Vertex {
        pos: [1.0, 1.0],
        uv: [1.0, 0.0],
    }, // top-right
];

/// Covers the whole screen; used for the black placeholder texture.
const FULL_SCREEN: [f32; 4] = [0.0, 0.0, 1.0, 1.0];

struct Tex {
    view: wgpu::TextureView,
    w: u32,
    h: u32,
}

/// One photo on screen: its texture and where it sits.
struct Slot {
    tex: Tex,
    placement: wgpu::Buffer,
    rect: [f32; 4],
}

pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    pipeline: wgpu::RenderPipeline,
    bind_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    vbuf: wgpu::Buffer,
    sampler: wgpu::Sampler,
    fade_buf: wgpu::Buffer,

    outgoing: Slot,
    incoming: Slot,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self> {
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window.clone())
            .context("failed to create surface")?;
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible GPU adapter found")?;
        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("frame-device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
            memory_hints: wgpu::MemoryHints::default(),
            trace: wgpu::Trace::default(),
        }))
        .context("failed to acquire GPU device")?;

        let caps = surface.get_capabilities(&adapter);
        let Some(&fallback_format) = caps.formats.first() else {
            bail!("surface reports no supported formats");
        };
        let format = caps
            .formats
            .iter()
            .copied()
            .find(wgpu::TextureFormat::is_srgb)
            .unwrap_or(fallback_format);
        let size = window.inner_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            // Fifo paces each fade step to one vblank.
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 1,
        };
        surface.configure(&device, &config);
        info!(
            width = config.width,
            height = config.height,
            format = ?config.format,
            "frame surface configured"
        );

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("photo-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let outgoing = Slot {
            tex: upload_texture(&device, &queue, &[0, 0, 0, 255], 1, 1),
            placement: uniform_buffer(&device, "placement-outgoing"),
            rect: FULL_SCREEN,
        };
        let incoming = Slot {
            tex: upload_texture(&device, &queue, &[0, 0, 0, 255], 1, 1),
            placement: uniform_buffer(&device, "placement-incoming"),
            rect: FULL_SCREEN,
        };
        let fade_buf = uniform_buffer(&device, "fade");
        write32(&queue, &outgoing.placement, outgoing.rect);
        write32(&queue, &incoming.placement, incoming.rect);
        write32(&queue, &fade_buf, [1.0, 0.0, 0.0, 0.0]);

        let vbuf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad"),
            contents: bytemuck::cast_slice(&QUAD),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("crossfade-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/crossfade.wgsl").into()),
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let uniform_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("crossfade-bind-layout"),
            entries: &[
                texture_entry(0),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                texture_entry(2),
                uniform_entry(3),
                uniform_entry(4),
                uniform_entry(5),
            ],
        });
        let bind_group = create_bind_group(
            &device,
            &bind_layout,
            &sampler,
            &outgoing,
            &incoming,
            &fade_buf,
        );

        let vlayout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2],
        };
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("crossfade-pipeline-layout"),
            bind_group_layouts: &[&bind_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("crossfade-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[vlayout],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            bind_layout,
            bind_group,
            vbuf,
            sampler,
            fade_buf,
            outgoing,
            incoming,
        })
    }

    pub const fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        for slot in [&mut self.outgoing, &mut self.incoming] {
            slot.rect = placement_rect(width, height, &slot.tex);
            write32(&self.queue, &slot.placement, slot.rect);
        }
        debug!(width, height, "frame surface resized");
    }

    /// Stage `photo` as the incoming image of the next transition.
    pub fn upload_incoming(&mut self, photo: &Photo) {
        let tex = upload_texture(
            &self.device,
            &self.queue,
            photo.pixels.as_raw(),
            photo.width,
            photo.height,
        );
        let (w, h) = self.size();
        self.incoming.rect = placement_rect(w, h, &tex);
        self.incoming.tex = tex;
        write32(&self.queue, &self.incoming.placement, self.incoming.rect);
        self.rebuild_bind_group();
    }

    /// Make the incoming image the one on screen and reset the incoming slot.
    pub fn promote(&mut self) {
        let placeholder = upload_texture(&self.device, &self.queue, &[0, 0, 0, 255], 1, 1);
        self.outgoing.tex = std::mem::replace(&mut self.incoming.tex, placeholder);
        self.outgoing.rect = std::mem::replace(&mut self.incoming.rect, FULL_SCREEN);
        write32(&self.queue, &self.outgoing.placement, self.outgoing.rect);
        write32(&self.queue, &self.incoming.placement, self.incoming.rect);
        self.rebuild_bind_group();
    }

    /// Draw one frame with the given fade weights.
    pub fn draw(&mut self, weights: FadeFrame) -> Result<()> {
        write32(
            &self.queue,
            &self.fade_buf,
            [
                f32::from(weights.outgoing) / 255.0,
                f32::from(weights.incoming) / 255.0,
                0.0,
                0.0,
            ],
        );

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                info!("frame surface lost; reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("frame surface acquisition timed out");
                return Ok(());
            }
            Err(err) => bail!("surface error: {err}"),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("frame-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
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
            rpass.set_pipeline(&self.pipeline);
            rpass.set_bind_group(0, &self.bind_group, &[]);
            rpass.set_vertex_buffer(0, self.vbuf.slice(..));
            rpass.draw(0..4, 0..1);
        }
        self.queue.submit([encoder.finish()]);
        frame.present();
        Ok(())
    }

    fn rebuild_bind_group(&mut self) {
        self.bind_group = create_bind_group(
            &self.device,
            &self.bind_layout,
            &self.sampler,
            &self.outgoing,
            &self.incoming,
            &self.fade_buf,
        );
    }
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    outgoing: &Slot,
    incoming: &Slot,
    fade_buf: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("crossfade-bind-group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&outgoing.tex.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(&incoming.tex.view),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: outgoing.placement.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: incoming.placement.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 5,
                resource: fade_buf.as_entire_binding(),
            },
        ],
    })
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    pixels: &[u8],
    w: u32,
    h: u32,
) -> Tex {
    let size = wgpu::Extent3d {
        width: w,
        height: h,
        depth_or_array_layers: 1,
    };
    let tex = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("photo"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        tex.as_image_copy(),
        pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * w),
            rows_per_image: Some(h),
        },
        size,
    );
    Tex {
        view: tex.create_view(&wgpu::TextureViewDescriptor::default()),
        w,
        h,
    }
}

// uniforms are 32 bytes each to match WGSL
fn uniform_buffer(device: &wgpu::Device, label: &str) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: 32,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn write32(queue: &wgpu::Queue, buf: &wgpu::Buffer, data4: [f32; 4]) {
    let mut block = [0f32; 8];
    block[0..4].copy_from_slice(&data4);
    queue.write_buffer(buf, 0, bytemuck::bytes_of(&block));
}

fn placement_rect(win_w: u32, win_h: u32, tex: &Tex) -> [f32; 4] {
    if tex.w <= 1 && tex.h <= 1 {
        return FULL_SCREEN;
    }
    screen_rect(win_w, win_h, tex.w, tex.h)
}

/// Centered placement of an `img_w` x `img_h` photo, in screen uv units.
#[allow(clippy::cast_precision_loss)]
fn screen_rect(win_w: u32, win_h: u32, img_w: u32, img_h: u32) -> [f32; 4] {
    let ww = win_w.max(1) as f32;
    let wh = win_h.max(1) as f32;
    let (ox, oy) = center_offset(img_w, img_h, win_w, win_h);
    [
        ox as f32 / ww,
        oy as f32 / wh,
        img_w.max(1) as f32 / ww,
        img_h.max(1) as f32 / wh,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letterboxed_photo_is_centered_vertically() {
        let rect = screen_rect(1920, 1080, 1920, 960);
        assert_eq!(rect[0], 0.0);
        assert!((rect[1] - 60.0 / 1080.0).abs() < 1e-6);
        assert_eq!(rect[2], 1.0);
        assert!((rect[3] - 960.0 / 1080.0).abs() < 1e-6);
    }

    #[test]
    fn pillarboxed_photo_is_centered_horizontally() {
        let rect = screen_rect(1920, 1080, 810, 1080);
        assert!((rect[0] - 555.0 / 1920.0).abs() < 1e-6);
        assert_eq!(rect[1], 0.0);
        assert_eq!(rect[3], 1.0);
    }
}
