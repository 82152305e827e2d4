use std::{future::Future, path::Path};

use anyhow::Context;
use tokio::sync::oneshot;

use crate::model::ImportedModel;

/// Source of models for the viewer. Resolving the returned future is the
/// only point where setup waits on something outside the process.
pub trait MeshImporter {
    fn import(&self, path: &Path) -> impl Future<Output = anyhow::Result<ImportedModel>>;
}

/// Parses glTF and GLB files on a worker thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct GltfImporter;

impl MeshImporter for GltfImporter {
    fn import(&self, path: &Path) -> impl Future<Output = anyhow::Result<ImportedModel>> {
        let path = path.to_path_buf();
        let (sender, receiver) = oneshot::channel();

        let spawned = std::thread::Builder::new()
            .name("gltf-import".to_string())
            .spawn(move || {
                // The receiver only disappears if setup was abandoned.
                let _ = sender.send(import_gltf_file(&path));
            });

        async move {
            spawned.context("Failed to spawn glTF import thread")?;
            let result: anyhow::Result<ImportedModel> = receiver
                .await
                .context("glTF import thread exited without a result")?;
            result
        }
    }
}

pub fn import_gltf_file(path: &Path) -> anyhow::Result<ImportedModel> {
    let (document, buffers, images) = gltf::import(path)
        .with_context(|| format!("Failed to import glTF file {}", path.display()))?;

    ImportedModel::from_gltf(&document, &buffers, &images)
        .with_context(|| format!("Failed to read glTF file {}", path.display()))
}

#[allow(dead_code)]
pub fn import_gltf_slice(bytes: &[u8]) -> anyhow::Result<ImportedModel> {
    let (document, buffers, images) =
        gltf::import_slice(bytes).context("Failed to import glTF data")?;

    ImportedModel::from_gltf(&document, &buffers, &images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ROOT_NODE_NAME;
    use glam::Vec3;

    // One triangle: three VEC3 float positions, no normals, no indices.
    const TRIANGLE_BUFFER: &str =
        "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA";

    fn triangle_gltf(node_translation: [f32; 3]) -> String {
        triangle_json(node_translation, &format!(r#", "uri": "{TRIANGLE_BUFFER}""#))
    }

    /// Same document as [`triangle_gltf`], with the buffer stored in a GLB binary chunk.
    fn triangle_glb(node_translation: [f32; 3]) -> Vec<u8> {
        let mut json = triangle_json(node_translation, "").into_bytes();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }

        let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let bin: &[u8] = bytemuck::cast_slice(&positions);

        let total_length = 12 + 8 + json.len() + 8 + bin.len();
        let mut glb = Vec::with_capacity(total_length);
        glb.extend_from_slice(b"glTF");
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&(total_length as u32).to_le_bytes());
        glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"JSON");
        glb.extend_from_slice(&json);
        glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"BIN\0");
        glb.extend_from_slice(bin);
        glb
    }

    fn triangle_json(node_translation: [f32; 3], extra_buffer_fields: &str) -> String {
        format!(
            r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [{{ "nodes": [0] }}],
  "nodes": [
    {{ "name": "Soldier", "children": [1], "translation": [0.0, 4.0, 0.0] }},
    {{ "name": "Body", "mesh": 0, "translation": [{}, {}, {}] }}
  ],
  "meshes": [{{ "name": "BodyMesh", "primitives": [{{ "attributes": {{ "POSITION": 0 }} }}] }}],
  "accessors": [{{
    "bufferView": 0,
    "componentType": 5126,
    "count": 3,
    "type": "VEC3",
    "min": [0.0, 0.0, 0.0],
    "max": [1.0, 1.0, 0.0]
  }}],
  "bufferViews": [{{ "buffer": 0, "byteLength": 36 }}],
  "buffers": [{{ "byteLength": 36{} }}]
}}"#,
            node_translation[0], node_translation[1], node_translation[2], extra_buffer_fields
        )
    }

    #[test]
    fn imports_hierarchy_under_a_root() {
        let model = import_gltf_slice(triangle_gltf([1.0, 2.0, 3.0]).as_bytes()).unwrap();

        let names: Vec<&str> = model.nodes.iter().map(|node| node.name.as_str()).collect();
        assert_eq!(names, vec![ROOT_NODE_NAME, "Soldier", "Body"]);
        assert_eq!(model.nodes[1].parent, Some(0));
        assert_eq!(model.nodes[2].parent, Some(1));
        assert_eq!(
            model.nodes[2].transform.translation,
            Vec3::new(1.0, 2.0, 3.0)
        );
        assert_eq!(model.mesh_count(), 2);
    }

    #[test]
    fn fills_in_missing_indices_and_normals() {
        let model = import_gltf_slice(triangle_gltf([0.0; 3]).as_bytes()).unwrap();
        let mesh = model.nodes[2].mesh.as_ref().unwrap();
        let primitive = &mesh.primitives[0];

        assert_eq!(mesh.name, "BodyMesh");
        assert_eq!(primitive.indices, vec![0, 1, 2]);
        assert_eq!(primitive.vertices[1].position, Vec3::X);
        for vertex in &primitive.vertices {
            assert!((vertex.normal - Vec3::Z).length() < 1e-6);
        }
        assert_eq!(primitive.material.base_color_texture, None);
    }

    #[test]
    fn malformed_data_is_an_error() {
        assert!(import_gltf_slice(b"not a model").is_err());
    }

    #[test]
    fn missing_file_rejects_the_future() {
        let importer = GltfImporter;
        let result = pollster::block_on(importer.import(Path::new("does/not/exist.glb")));
        let error = format!("{:#}", result.unwrap_err());
        assert!(error.contains("exist.glb"));
    }

    #[test]
    fn imports_a_glb_file_on_the_worker_thread() {
        let file_name = format!("berserk-{}-soldier.glb", std::process::id());
        let path = std::env::temp_dir().join(file_name);
        std::fs::write(&path, triangle_glb([0.0, 5.0, 0.0])).unwrap();

        let result = pollster::block_on(GltfImporter.import(&path));
        std::fs::remove_file(&path).unwrap();
        let model = result.unwrap();

        let names: Vec<&str> = model.nodes.iter().map(|node| node.name.as_str()).collect();
        assert_eq!(names, vec![ROOT_NODE_NAME, "Soldier", "Body"]);
        assert_eq!(model.nodes[0].transform.translation, Vec3::ZERO);
        assert_eq!(
            model.nodes[2].transform.translation,
            Vec3::new(0.0, 5.0, 0.0)
        );

        let mesh = model.nodes[2].mesh.as_ref().unwrap();
        assert_eq!(mesh.primitives[0].vertices.len(), 3);
        assert_eq!(model.mesh_count(), 2);
    }
}
