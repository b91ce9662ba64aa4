use wgpu::util::DeviceExt;

use crate::math::Tessellation;
use crate::renderer::background::Frame;
use crate::renderer::camera::Eye;
use crate::renderer::frame::{
    BackgroundUniforms, BackgroundVertex, FrameUniforms, SurfaceUniforms, background_quad,
};
use crate::renderer::texture::{Texture, texture_bind_group, texture_bind_group_layout};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("failed to create window surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible GPU adapter found")]
    NoAdapter,

    #[error("failed to open GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("GPU out of memory")]
    OutOfMemory,
}

pub struct SurfaceBuffers {
    pub vertex_buffer: wgpu::Buffer,
    pub normal_buffer: wgpu::Buffer,
    pub tex_coord_buffer: wgpu::Buffer,
    pub vertex_count: u32,
}

impl SurfaceBuffers {
    pub fn new(device: &wgpu::Device, mesh: &Tessellation) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Surface Vertex Buffer"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let normal_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Surface Normal Buffer"),
            contents: bytemuck::cast_slice(&mesh.normals),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let tex_coord_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Surface TexCoord Buffer"),
            contents: bytemuck::cast_slice(&mesh.tex_coords),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            vertex_buffer,
            normal_buffer,
            tex_coord_buffer,
            vertex_count: mesh.vertex_count() as u32,
        }
    }
}

pub struct GpuState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,

    pub pipeline_background: wgpu::RenderPipeline,
    pub pipeline_surface: [wgpu::RenderPipeline; 2], // left = red, right = green|blue

    pub eye_buffers: [wgpu::Buffer; 2],
    pub eye_bind_groups: [wgpu::BindGroup; 2],

    pub background_uniform_buffer: wgpu::Buffer,
    pub background_uniform_bind_group: wgpu::BindGroup,
    pub background_vertex_buffer: wgpu::Buffer,

    texture_layout: wgpu::BindGroupLayout,
    pub surface_texture: Texture,
    pub surface_texture_bind_group: wgpu::BindGroup,
    pub background_texture: Texture,
    pub background_texture_bind_group: wgpu::BindGroup,

    pub surface_buffers: SurfaceBuffers,

    pub depth_texture: wgpu::TextureView,
}

fn background_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<BackgroundVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    }
}

fn surface_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: 12,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        }],
    }
}

fn surface_normal_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: 12,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        }],
    }
}

fn surface_tex_coord_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: 8,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 2,
            format: wgpu::VertexFormat::Float32x2,
        }],
    }
}

pub fn eye_color_mask(eye: Eye) -> wgpu::ColorWrites {
    match eye {
        Eye::Left => wgpu::ColorWrites::RED,
        Eye::Right => wgpu::ColorWrites::GREEN | wgpu::ColorWrites::BLUE,
    }
}

fn uniform_bind_group_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

impl GpuState {
    pub async fn new(
        window: std::sync::Arc<winit::window::Window>,
        mesh: &Tessellation,
        surface_texture_frame: Option<&std::path::Path>,
        vsync: bool,
    ) -> Result<Self, RenderError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        let info = adapter.get_info();
        log::info!("GPU adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
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
            .unwrap_or(surface_caps.formats[0]);
        log::info!("surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: present_mode(vsync),
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders.wgsl").into()),
        });

        let uniform_layout = uniform_bind_group_layout(&device, "Uniform Bind Group Layout");
        let texture_layout = texture_bind_group_layout(&device, "Texture Bind Group Layout");

        let eye_buffers = Eye::BOTH.map(|eye| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(match eye {
                    Eye::Left => "Left Eye Uniform Buffer",
                    Eye::Right => "Right Eye Uniform Buffer",
                }),
                size: std::mem::size_of::<SurfaceUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });

        let eye_bind_groups = Eye::BOTH.map(|eye| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Eye Bind Group"),
                layout: &uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: eye_buffers[eye.index()].as_entire_binding(),
                }],
            })
        });

        let background_uniforms =
            BackgroundUniforms::for_viewport(config.width as f32, config.height as f32);
        let background_uniform_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Background Uniform Buffer"),
                contents: bytemuck::cast_slice(&[background_uniforms]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

        let background_uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Background Uniform Bind Group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: background_uniform_buffer.as_entire_binding(),
            }],
        });

        let background_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Background Vertex Buffer"),
            contents: bytemuck::cast_slice(&background_quad(
                config.width as f32,
                config.height as f32,
            )),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let surface_texture = Texture::surface(&device, &queue, surface_texture_frame);
        let surface_texture_bind_group = texture_bind_group(
            &device,
            &texture_layout,
            &surface_texture,
            "Surface Texture Bind Group",
        );

        let background_texture = Texture::from_frame(
            &device,
            &queue,
            &Frame::solid(1, 1, [0, 0, 0, 255]),
            "Background Texture",
            wgpu::AddressMode::ClampToEdge,
        );
        let background_texture_bind_group = texture_bind_group(
            &device,
            &texture_layout,
            &background_texture,
            "Background Texture Bind Group",
        );

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let pipeline_background = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Background Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_background_main"),
                buffers: &[background_vertex_layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_background_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let pipeline_surface = Eye::BOTH.map(|eye| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(match eye {
                    Eye::Left => "Surface Pipeline (Left Eye)",
                    Eye::Right => "Surface Pipeline (Right Eye)",
                }),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_surface_main"),
                    buffers: &[
                        surface_vertex_layout(),
                        surface_normal_layout(),
                        surface_tex_coord_layout(),
                    ],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_surface_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: config.format,
                        blend: None,
                        write_mask: eye_color_mask(eye),
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleStrip,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        });

        let surface_buffers = SurfaceBuffers::new(&device, mesh);
        let depth_texture = Self::create_depth_texture(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            pipeline_background,
            pipeline_surface,
            eye_buffers,
            eye_bind_groups,
            background_uniform_buffer,
            background_uniform_bind_group,
            background_vertex_buffer,
            texture_layout,
            surface_texture,
            surface_texture_bind_group,
            background_texture,
            background_texture_bind_group,
            surface_buffers,
            depth_texture,
        })
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
    ) -> wgpu::TextureView {
        let size = wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = Self::create_depth_texture(&self.device, &self.config);

            let (width, height) = (new_size.width as f32, new_size.height as f32);
            self.queue.write_buffer(
                &self.background_uniform_buffer,
                0,
                bytemuck::cast_slice(&[BackgroundUniforms::for_viewport(width, height)]),
            );
            self.queue.write_buffer(
                &self.background_vertex_buffer,
                0,
                bytemuck::cast_slice(&background_quad(width, height)),
            );
        }
    }

    pub fn set_vsync(&mut self, enabled: bool) {
        self.config.present_mode = present_mode(enabled);
        self.surface.configure(&self.device, &self.config);
    }

    pub fn update_eyes(&self, frame: &FrameUniforms) {
        for eye in Eye::BOTH {
            self.queue.write_buffer(
                &self.eye_buffers[eye.index()],
                0,
                bytemuck::cast_slice(&[*frame.eye(eye)]),
            );
        }
    }

    pub fn upload_background(&mut self, frame: &Frame) {
        if self
            .background_texture
            .upload(&self.device, &self.queue, frame)
        {
            log::debug!("background resized to {}x{}", frame.width, frame.height);
            self.background_texture_bind_group = texture_bind_group(
                &self.device,
                &self.texture_layout,
                &self.background_texture,
                "Background Texture Bind Group",
            );
        }
    }

    pub fn render_background(&self, view: &wgpu::TextureView, encoder: &mut wgpu::CommandEncoder) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Background Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
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

        render_pass.set_pipeline(&self.pipeline_background);
        render_pass.set_bind_group(0, &self.background_uniform_bind_group, &[]);
        render_pass.set_bind_group(1, &self.background_texture_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.background_vertex_buffer.slice(..));
        render_pass.draw(0..6, 0..1);
    }

    pub fn render_surface(
        &self,
        eye: Eye,
        view: &wgpu::TextureView,
        encoder: &mut wgpu::CommandEncoder,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(match eye {
                Eye::Left => "Surface Render Pass (Left Eye)",
                Eye::Right => "Surface Render Pass (Right Eye)",
            }),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_texture,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let buffers = &self.surface_buffers;
        render_pass.set_pipeline(&self.pipeline_surface[eye.index()]);
        render_pass.set_bind_group(0, &self.eye_bind_groups[eye.index()], &[]);
        render_pass.set_bind_group(1, &self.surface_texture_bind_group, &[]);
        render_pass.set_vertex_buffer(0, buffers.vertex_buffer.slice(..));
        render_pass.set_vertex_buffer(1, buffers.normal_buffer.slice(..));
        render_pass.set_vertex_buffer(2, buffers.tex_coord_buffer.slice(..));
        render_pass.draw(0..buffers.vertex_count, 0..1);
    }
}

fn present_mode(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::AutoVsync
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}
