use glam::{Mat4, Vec3};
use id_arena::Arena;

use crate::camera::OrbitCamera;
use crate::light::DirectionalLight;
use crate::model::{ImportedModel, TextureData};
use crate::scene_graph::scene_node::{NodeId, SceneNode};

pub struct Scene {
    pub clear_color: wgpu::Color,
    pub camera: OrbitCamera,
    pub light: DirectionalLight,
    nodes: Arena<SceneNode>,
    textures: Vec<TextureData>,
}

impl Scene {
    pub fn new(clear_color: wgpu::Color, camera: OrbitCamera, light: DirectionalLight) -> Self {
        Self {
            clear_color,
            camera,
            light,
            nodes: Arena::new(),
            textures: Vec::new(),
        }
    }

    #[allow(dead_code)]
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    #[allow(dead_code)]
    pub fn get_node_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.name == name)
            .map(|(id, _)| id)
    }

    #[allow(dead_code)]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn textures(&self) -> &[TextureData] {
        &self.textures
    }

    pub fn mesh_nodes(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter().filter(|(_, node)| node.has_geometry())
    }

    /// Adds an imported model and returns its mesh list: the root node first,
    /// followed by every node that carries geometry, in import order.
    pub fn spawn_model(&mut self, model: ImportedModel) -> Vec<NodeId> {
        let texture_offset = self.textures.len();
        self.textures.extend(model.textures);

        let mut ids: Vec<NodeId> = Vec::with_capacity(model.nodes.len());
        let mut meshes = Vec::new();

        for (index, imported) in model.nodes.into_iter().enumerate() {
            let mut mesh = imported.mesh;

            if let Some(mesh) = mesh.as_mut() {
                for primitive in &mut mesh.primitives {
                    if let Some(texture) = primitive.material.base_color_texture.as_mut() {
                        *texture += texture_offset;
                    }
                }
            }

            let is_listed = index == 0 || mesh.is_some();

            let id = self.nodes.alloc(SceneNode {
                name: imported.name,
                transform: imported.transform,
                mesh,
                parent_id: None,
                child_ids: Vec::new(),
            });

            if let Some(parent_id) = imported.parent.and_then(|parent| ids.get(parent).copied()) {
                self.set_node_parent(id, parent_id);
            }

            ids.push(id);

            if is_listed {
                meshes.push(id);
            }
        }

        meshes
    }

    fn set_node_parent(&mut self, child_id: NodeId, parent_id: NodeId) {
        if let Some(child) = self.nodes.get_mut(child_id) {
            child.parent_id = Some(parent_id);
        }

        if let Some(parent) = self.nodes.get_mut(parent_id) {
            parent.child_ids.push(child_id);
        }
    }

    #[allow(dead_code)]
    pub fn set_node_translation(&mut self, id: NodeId, translation: Vec3) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.transform.translation = translation;
        }
    }

    /// Composes the node's transform with all of its ancestors.
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let Some(node) = self.nodes.get(id) else {
            return Mat4::IDENTITY;
        };

        let mut matrix = node.transform.matrix();
        let mut parent_id = node.parent_id;

        while let Some(parent) = parent_id.and_then(|id| self.nodes.get(id)) {
            matrix = parent.transform.matrix() * matrix;
            parent_id = parent.parent_id;
        }

        matrix
    }
}
