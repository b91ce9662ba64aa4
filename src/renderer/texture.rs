use std::path::Path;

use crate::renderer::background::Frame;

pub const PLACEHOLDER_TEXEL: [u8; 4] = [0, 0, 255, 255];

pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    label: &'static str,
    address_mode: wgpu::AddressMode,
}

impl Texture {
    pub fn from_frame(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        frame: &Frame,
        label: &'static str,
        address_mode: wgpu::AddressMode,
    ) -> Self {
        let texture = create_texture(device, frame.width, frame.height, label);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            address_mode_w: address_mode,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let texture = Self {
            texture,
            view,
            sampler,
            label,
            address_mode,
        };
        texture.write(queue, frame);
        texture
    }

    pub fn surface(device: &wgpu::Device, queue: &wgpu::Queue, path: Option<&Path>) -> Self {
        let frame = match path.map(Frame::load) {
            Some(Ok(frame)) => {
                log::info!("surface texture loaded ({}x{})", frame.width, frame.height);
                frame
            }
            Some(Err(e)) => {
                log::warn!("surface texture unavailable, using placeholder: {e}");
                Frame::solid(1, 1, PLACEHOLDER_TEXEL)
            }
            None => Frame::solid(1, 1, PLACEHOLDER_TEXEL),
        };

        Self::from_frame(
            device,
            queue,
            &frame,
            "Surface Texture",
            wgpu::AddressMode::Repeat,
        )
    }

    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }

    // true when the texture was recreated and bind groups need rebuilding
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, frame: &Frame) -> bool {
        let resized = self.size() != (frame.width, frame.height);
        if resized {
            *self = Self::from_frame(device, queue, frame, self.label, self.address_mode);
        } else {
            self.write(queue, frame);
        }
        resized
    }

    fn write(&self, queue: &wgpu::Queue, frame: &Frame) {
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &frame.pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * frame.width),
                rows_per_image: Some(frame.height),
            },
            wgpu::Extent3d {
                width: frame.width,
                height: frame.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

fn create_texture(device: &wgpu::Device, width: u32, height: u32, label: &str) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

pub fn texture_bind_group_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

pub fn texture_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    texture: &Texture,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            },
        ],
    })
}
