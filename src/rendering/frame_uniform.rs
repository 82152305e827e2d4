use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::{camera::CameraUniform, light::LightUniform, scene_graph::Scene};

/// Per-frame camera and light data, bound at group 0.
pub struct FrameUniform {
    camera: CameraUniform,
    camera_buffer: wgpu::Buffer,
    light_buffer: wgpu::Buffer,
    ambient: f32,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl FrameUniform {
    pub fn new(
        device: &wgpu::Device,
        scene: &Scene,
        size: PhysicalSize<u32>,
        ambient: f32,
    ) -> Self {
        let mut camera = CameraUniform::default();
        camera.update(size, &scene.camera);
        let camera_buffer = camera.create_buffer(device);

        let light_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light uniform buffer"),
            contents: bytemuck::cast_slice(&[LightUniform::new(&scene.light, ambient)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame uniform bind group layout"),
            entries: &[uniform_entry(0), uniform_entry(1)],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame uniform bind group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: light_buffer.as_entire_binding(),
                },
            ],
        });

        Self {
            camera,
            camera_buffer,
            light_buffer,
            ambient,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn update(&mut self, queue: &wgpu::Queue, scene: &Scene, size: PhysicalSize<u32>) {
        self.camera.update(size, &scene.camera);
        self.camera.update_buffer(queue, &self.camera_buffer);

        queue.write_buffer(
            &self.light_buffer,
            0,
            bytemuck::cast_slice(&[LightUniform::new(&scene.light, self.ambient)]),
        );
    }
}
