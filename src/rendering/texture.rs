use wgpu::util::DeviceExt;

use crate::model::TextureData;

pub struct Texture {
    _texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
}

impl Texture {
    pub fn from_wgpu_texture(texture: wgpu::Texture) -> Self {
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            _texture: texture,
            view,
        }
    }

    pub fn base_color(device: &wgpu::Device, queue: &wgpu::Queue, data: &TextureData) -> Self {
        let texture = device.create_texture_with_data(
            queue,
            &Self::base_color_descriptor(&data.name, data.width, data.height),
            wgpu::wgt::TextureDataOrder::LayerMajor,
            &data.pixels,
        );

        Self::from_wgpu_texture(texture)
    }

    /// Whether a `width` x `height` image can be created as a 2D texture when
    /// neither side may exceed `max_dimension`.
    pub fn fits_limits(width: u32, height: u32, max_dimension: u32) -> bool {
        width > 0 && height > 0 && width <= max_dimension && height <= max_dimension
    }

    /// 1x1 white texture for materials without a base color image.
    pub fn white(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let texture = device.create_texture_with_data(
            queue,
            &Self::base_color_descriptor("Default base color", 1, 1),
            wgpu::wgt::TextureDataOrder::LayerMajor,
            &[255, 255, 255, 255],
        );

        Self::from_wgpu_texture(texture)
    }

    fn base_color_descriptor(label: &str, width: u32, height: u32) -> wgpu::TextureDescriptor<'_> {
        wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            // TODO: Generate mipmaps
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

pub struct DepthTexture {
    texture: Texture,
    label: String,
}

impl DepthTexture {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        label: impl Into<String>,
    ) -> Self {
        let label: String = label.into();
        let texture = Self::create_wgpu_texture(device, config, &label);

        DepthTexture {
            texture: Texture::from_wgpu_texture(texture),
            label,
        }
    }

    fn create_wgpu_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        label: &str,
    ) -> wgpu::Texture {
        let size = wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        };

        device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        })
    }

    pub fn resize(&mut self, device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) {
        self.texture =
            Texture::from_wgpu_texture(Self::create_wgpu_texture(device, config, &self.label));
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.texture.view
    }
}
