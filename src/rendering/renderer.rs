use std::sync::Arc;

use anyhow::Context;
use wgpu::CommandEncoderDescriptor;
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    rendering::{
        frame_uniform::FrameUniform,
        render_model::{MaterialResources, RenderMesh},
        scene_pass::{ScenePass, SceneTextureViews},
        texture::{DepthTexture, Texture},
    },
    scene_graph::Scene,
    viewer::RenderBackend,
};

/// Renderer-side resources that only exist once the scene has been uploaded.
struct SceneResources {
    frame_uniform: FrameUniform,
    scene_pass: ScenePass,
    _textures: Vec<Texture>,
    meshes: Vec<RenderMesh>,
}

pub struct Renderer {
    pub window: Arc<Window>,
    pub size: PhysicalSize<u32>,

    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    depth_texture: DepthTexture,
    sampler: wgpu::Sampler,
    material_layout: wgpu::BindGroupLayout,
    fallback_texture: Texture,
    ambient: f32,

    scene: Option<SceneResources>,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, ambient: f32) -> anyhow::Result<Renderer> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable GPU adapter found")?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: None,
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to request device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .context("Surface reports no supported formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        let depth_texture = DepthTexture::new(&device, &config, "Depth Texture");

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Base color sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let material_layout = MaterialResources::create_layout(&device);
        let fallback_texture = Texture::white(&device, &queue);

        Ok(Self {
            window,
            size,
            surface,
            device,
            queue,
            config,
            depth_texture,
            sampler,
            material_layout,
            fallback_texture,
            ambient,
            scene: None,
        })
    }
}

impl RenderBackend for Renderer {
    fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    fn upload_scene(&mut self, scene: &Scene) -> anyhow::Result<()> {
        let max_dimension = self.device.limits().max_texture_dimension_2d;
        let textures: Vec<Texture> = scene
            .textures()
            .iter()
            .map(|data| {
                if Texture::fits_limits(data.width, data.height, max_dimension) {
                    Texture::base_color(&self.device, &self.queue, data)
                } else {
                    log::warn!(
                        "{} is {}x{}, over the device limit of {}; drawing it white",
                        data.name,
                        data.width,
                        data.height,
                        max_dimension
                    );
                    Texture::white(&self.device, &self.queue)
                }
            })
            .collect();

        let materials = MaterialResources {
            layout: &self.material_layout,
            sampler: &self.sampler,
            textures: &textures,
            fallback: &self.fallback_texture,
        };

        let meshes: Vec<RenderMesh> = scene
            .mesh_nodes()
            .filter_map(|(id, node)| {
                let mesh = node.mesh.as_ref()?;
                log::debug!(
                    "Uploading mesh {} with {} primitives",
                    mesh.name,
                    mesh.primitives.len()
                );
                Some(RenderMesh::from_mesh(&self.device, &materials, id, mesh))
            })
            .collect();

        let frame_uniform = FrameUniform::new(&self.device, scene, self.size, self.ambient);
        let scene_pass = ScenePass::create(
            &self.device,
            self.config.format,
            &frame_uniform.bind_group_layout,
            &self.material_layout,
        );

        log::info!(
            "Uploaded {} meshes and {} textures",
            meshes.len(),
            textures.len()
        );

        self.scene = Some(SceneResources {
            frame_uniform,
            scene_pass,
            _textures: textures,
            meshes,
        });

        Ok(())
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture.resize(&self.device, &self.config);
        }
    }

    fn render(&mut self, scene: &Scene) -> Result<(), wgpu::SurfaceError> {
        let Some(resources) = self.scene.as_mut() else {
            return Ok(());
        };

        resources
            .frame_uniform
            .update(&self.queue, scene, self.size);

        for mesh in &resources.meshes {
            mesh.write_instance(&self.queue, scene.world_matrix(mesh.node_id));
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        resources.scene_pass.render(
            &SceneTextureViews {
                color: &view,
                depth: self.depth_texture.view(),
            },
            &mut encoder,
            scene.clear_color,
            &resources.frame_uniform.bind_group,
            &resources.meshes,
        );

        self.queue.submit([encoder.finish()]);

        self.window.pre_present_notify();
        output.present();

        Ok(())
    }
}
