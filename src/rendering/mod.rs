pub mod frame_uniform;
pub mod render_model;
pub mod renderer;
pub mod scene_pass;
pub mod texture;
