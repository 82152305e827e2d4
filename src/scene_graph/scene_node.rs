use id_arena::Id;

use crate::model::Mesh;
use crate::scene_graph::transform::Transform;

pub type NodeId = Id<SceneNode>;

#[derive(Debug, Clone, Default)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub mesh: Option<Mesh>,
    pub parent_id: Option<NodeId>,
    pub child_ids: Vec<NodeId>,
}

impl SceneNode {
    pub fn has_geometry(&self) -> bool {
        self.mesh.is_some()
    }
}
