use std::collections::HashMap;

use anyhow::Context;
use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec2, Vec3};
use gltf::buffer;
use itertools::izip;

use crate::scene_graph::Transform;

/// Name of the synthetic node every import is parented to.
pub const ROOT_NODE_NAME: &str = "__root__";

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coords: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub base_color_factor: [f32; 4],
    /// Index into [`ImportedModel::textures`].
    pub base_color_texture: Option<usize>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color_factor: [1.0; 4],
            base_color_texture: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Primitive {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub material: Material,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    pub primitives: Vec<Primitive>,
}

/// Tightly packed RGBA8 pixels.
#[derive(Debug, Clone)]
pub struct TextureData {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ImportedNode {
    pub name: String,
    pub transform: Transform,
    /// Index of the parent within [`ImportedModel::nodes`]. Parents always precede children.
    pub parent: Option<usize>,
    pub mesh: Option<Mesh>,
}

/// CPU-side result of importing a model file, independent of any scene.
#[derive(Debug, Clone, Default)]
pub struct ImportedModel {
    pub nodes: Vec<ImportedNode>,
    pub textures: Vec<TextureData>,
}

pub type Buffers<'a> = &'a [buffer::Data];

impl ImportedModel {
    /// Number of entries in the mesh list handed out after spawning:
    /// the root plus every node with geometry.
    #[allow(dead_code)]
    pub fn mesh_count(&self) -> usize {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(index, node)| *index == 0 || node.mesh.is_some())
            .count()
    }

    pub fn from_gltf(
        document: &gltf::Document,
        buffers: Buffers,
        images: &[gltf::image::Data],
    ) -> anyhow::Result<ImportedModel> {
        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .context("glTF document has no scenes")?;

        let mut builder = ModelBuilder {
            buffers,
            images,
            model: ImportedModel::default(),
            textures_by_image: HashMap::new(),
        };

        // glTF is right-handed, the viewer is left-handed
        builder.model.nodes.push(ImportedNode {
            name: ROOT_NODE_NAME.to_string(),
            transform: Transform::from_trs(
                Vec3::ZERO,
                Quat::from_rotation_y(std::f32::consts::PI),
                Vec3::new(1.0, 1.0, -1.0),
            ),
            parent: None,
            mesh: None,
        });

        for node in scene.nodes() {
            builder.add_node(&node, 0);
        }

        Ok(builder.model)
    }
}

struct ModelBuilder<'a> {
    buffers: Buffers<'a>,
    images: &'a [gltf::image::Data],
    model: ImportedModel,
    textures_by_image: HashMap<usize, Option<usize>>,
}

impl ModelBuilder<'_> {
    fn add_node(&mut self, node: &gltf::Node, parent: usize) {
        let name = node.name().unwrap_or("Unnamed").to_string();

        if node.skin().is_some() {
            log::debug!("Node {name} is skinned; rendering it in bind pose");
        }

        let mesh = node.mesh().and_then(|mesh| self.read_mesh(&mesh, &name));

        let index = self.model.nodes.len();
        self.model.nodes.push(ImportedNode {
            name,
            transform: Transform::from_gltf(node.transform()),
            parent: Some(parent),
            mesh,
        });

        for child in node.children() {
            self.add_node(&child, index);
        }
    }

    fn read_mesh(&mut self, mesh: &gltf::Mesh, node_name: &str) -> Option<Mesh> {
        let name = mesh
            .name()
            .map(String::from)
            .unwrap_or_else(|| format!("{} (Mesh)", node_name));

        let mut primitives = Vec::new();

        for primitive in mesh.primitives() {
            match self.read_primitive(&primitive) {
                Ok(read) => primitives.push(read),
                Err(e) => log::warn!(
                    "Skipping primitive {} of mesh {}: {:#}",
                    primitive.index(),
                    name,
                    e
                ),
            }
        }

        if primitives.is_empty() {
            log::warn!("Mesh without usable primitives: {}", name);
            return None;
        }

        Some(Mesh { name, primitives })
    }

    fn read_primitive(&mut self, primitive: &gltf::Primitive) -> anyhow::Result<Primitive> {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            anyhow::bail!("Unsupported primitive mode: {:?}", primitive.mode());
        }

        let buffers = self.buffers;
        let reader = primitive.reader(|buffer| buffer_data(buffers, buffer));

        let positions: Vec<Vec3> = reader
            .read_positions()
            .context("Primitive has no positions")?
            .map(Vec3::from)
            .collect();

        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };

        if indices.len() % 3 != 0 {
            anyhow::bail!("Index count {} is not a multiple of 3", indices.len());
        }

        if let Some(out_of_range) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            anyhow::bail!(
                "Index {} out of range for {} vertices",
                out_of_range,
                positions.len()
            );
        }

        let normals: Vec<Vec3> = match reader.read_normals() {
            Some(normals) => normals.map(Vec3::from).collect(),
            None => Vec::new(),
        };
        let normals = if normals.len() == positions.len() {
            normals
        } else {
            generate_normals(&positions, &indices)
        };

        let tex_coords: Vec<Vec2> = match reader.read_tex_coords(0) {
            Some(tex_coords) => tex_coords.into_f32().map(Vec2::from).collect(),
            None => Vec::new(),
        };
        let tex_coords = if tex_coords.len() == positions.len() {
            tex_coords
        } else {
            vec![Vec2::ZERO; positions.len()]
        };

        let vertices = izip!(positions, normals, tex_coords)
            .map(|(position, normal, tex_coords)| Vertex {
                position,
                normal,
                tex_coords,
            })
            .collect();

        Ok(Primitive {
            vertices,
            indices,
            material: self.read_material(&primitive.material()),
        })
    }

    fn read_material(&mut self, material: &gltf::Material) -> Material {
        let pbr = material.pbr_metallic_roughness();

        let base_color_texture = pbr
            .base_color_texture()
            .and_then(|info| self.texture_for_image(info.texture().source().index()));

        Material {
            base_color_factor: pbr.base_color_factor(),
            base_color_texture,
        }
    }

    fn texture_for_image(&mut self, image_index: usize) -> Option<usize> {
        if let Some(slot) = self.textures_by_image.get(&image_index) {
            return *slot;
        }

        let slot = match self.images.get(image_index).map(convert_image_data_to_rgba) {
            Some(Ok(pixels)) => {
                let image = &self.images[image_index];
                self.model.textures.push(TextureData {
                    name: format!("Image {}", image_index),
                    width: image.width,
                    height: image.height,
                    pixels,
                });
                Some(self.model.textures.len() - 1)
            }
            Some(Err(e)) => {
                log::warn!("Dropping base color texture {}: {:#}", image_index, e);
                None
            }
            None => {
                log::warn!("glTF image index out of bounds: {}", image_index);
                None
            }
        };

        self.textures_by_image.insert(image_index, slot);
        slot
    }
}

fn buffer_data<'a>(buffers: Buffers<'a>, buffer: gltf::Buffer) -> Option<&'a [u8]> {
    buffers.get(buffer.index()).map(|data| data.0.as_slice())
}

fn convert_image_data_to_rgba(data: &gltf::image::Data) -> anyhow::Result<Vec<u8>> {
    use gltf::image::Format;

    let pixels = match data.format {
        Format::R8G8B8A8 => data.pixels.clone(),
        Format::R8G8B8 => data
            .pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        Format::R8G8 => data
            .pixels
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        Format::R8 => data.pixels.iter().flat_map(|&l| [l, l, l, 255]).collect(),
        other => anyhow::bail!("Unsupported image format: {:?}", other),
    };

    let expected = data.width as usize * data.height as usize * 4;
    if pixels.len() != expected {
        anyhow::bail!(
            "Image has {} bytes after conversion, expected {}",
            pixels.len(),
            expected
        );
    }

    Ok(pixels)
}

/// Area-weighted smooth normals for meshes that ship without them.
pub fn generate_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];

    for triangle in indices.chunks_exact(3) {
        let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);

        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }

    normals
        .into_iter()
        .map(|normal| normal.normalize_or(Vec3::Y))
        .collect()
}
