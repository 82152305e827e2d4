pub mod scene;
pub mod scene_node;
pub mod transform;

pub use scene::Scene;
pub use scene_node::NodeId;
pub use transform::Transform;
