//! Summaries of exported files and imported scenes

use std::path::Path;

use vulpes_common::{VEM_MAGIC, VES_MAGIC, VemMesh, VesSkeleton, read_vem, read_ves};

use crate::error::ExportError;
use crate::scene::{ObjectData, Scene};

/// A decoded `.vem` or `.ves` file
#[derive(Debug, Clone, PartialEq)]
pub enum Asset {
    Mesh(VemMesh),
    Skeleton(VesSkeleton),
}

/// Decode an exported file, choosing the format from its magic bytes
pub fn read_asset(path: &Path) -> Result<Asset, ExportError> {
    let bytes = std::fs::read(path)?;
    decode_asset(&bytes).ok_or_else(|| ExportError::UnsupportedInput(path.to_path_buf()))?
}

/// `None` if the magic matches neither format
pub fn decode_asset(bytes: &[u8]) -> Option<Result<Asset, ExportError>> {
    let magic = bytes.get(..4)?;
    if magic == VEM_MAGIC {
        Some(read_vem(bytes).map(Asset::Mesh).map_err(Into::into))
    } else if magic == VES_MAGIC {
        Some(read_ves(bytes).map(Asset::Skeleton).map_err(Into::into))
    } else {
        None
    }
}

impl Asset {
    /// Human-readable summary, one line per entry
    pub fn summary(&self) -> Vec<String> {
        match self {
            Asset::Mesh(mesh) => mesh_summary(mesh),
            Asset::Skeleton(skeleton) => skeleton_summary(skeleton),
        }
    }
}

fn mesh_summary(mesh: &VemMesh) -> Vec<String> {
    let mut sections = Vec::new();
    if mesh.normals.is_some() {
        sections.push("normals");
    }
    if mesh.uvs.is_some() {
        sections.push("uvs");
    }
    if mesh.tangent_basis.is_some() {
        sections.push("tangents");
    }
    if mesh.skin.is_some() {
        sections.push("weights");
    }

    let mut lines = vec![format!(
        "mesh: {} vertices ({} triangles), flags=0x{:02X} [{}]",
        mesh.vertex_count(),
        mesh.vertex_count() / 3,
        mesh.flags(),
        sections.join(", ")
    )];
    if let Some(skin) = &mesh.skin {
        lines.push(format!("  {} bones", skin.bones.len()));
        for bone in &skin.bones {
            lines.push(format!("    [{}] {}", bone.index, bone.name));
        }
    }
    lines
}

fn skeleton_summary(skeleton: &VesSkeleton) -> Vec<String> {
    let mut lines = vec![format!(
        "skeleton: {} bones, {} actions at {} fps",
        skeleton.bones.len(),
        skeleton.actions.len(),
        skeleton.frame_rate
    )];
    for bone in &skeleton.bones {
        lines.push(format!("  bone [{}] {}", bone.index, bone.name));
    }
    for action in &skeleton.actions {
        lines.push(format!(
            "  action '{}': {} frames",
            action.name, action.frame_count
        ));
    }
    lines
}

/// One line per scene object: name, kind and a short description
pub fn list_objects(scene: &Scene) -> Vec<String> {
    let mut lines: Vec<String> = scene
        .objects
        .iter()
        .map(|object| {
            let detail = match &object.data {
                ObjectData::Mesh(data) => {
                    let mesh = &data.base;
                    let mut detail = format!(
                        "{} vertices, {} polygons, {} UV layers",
                        mesh.positions.len(),
                        mesh.polygons.len(),
                        mesh.uv_layers.len()
                    );
                    if let Some(parent) = object.parent.and_then(|id| scene.object(id)) {
                        detail.push_str(&format!(", parent '{}'", parent.name));
                    }
                    detail
                }
                ObjectData::Armature(armature) => format!("{} bones", armature.bones.len()),
                ObjectData::Empty => String::new(),
            };
            format!("{} ({}) {}", object.name, object.kind(), detail)
                .trim_end()
                .to_string()
        })
        .collect();

    for action in &scene.actions {
        lines.push(format!(
            "action '{}': frames {} - {}",
            action.name, action.frame_range.0, action.frame_range.1
        ));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Action, Armature, MeshData, PolyMesh, PoseBone, SceneObject};
    use glam::Vec3;
    use vulpes_common::{BoneEntry, VesAction, write_vem, write_ves};

    fn triangle() -> VemMesh {
        VemMesh {
            positions: vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            indices: vec![0, 1, 2],
            normals: Some(vec![[0.0, 0.0, 1.0]; 3]),
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_mesh() {
        let mut bytes = Vec::new();
        write_vem(&mut bytes, &triangle()).unwrap();
        let asset = decode_asset(&bytes).unwrap().unwrap();
        assert_eq!(asset, Asset::Mesh(triangle()));

        let summary = asset.summary();
        assert_eq!(summary[0], "mesh: 3 vertices (1 triangles), flags=0x01 [normals]");
    }

    #[test]
    fn test_decode_skeleton() {
        let skeleton = VesSkeleton {
            frame_rate: 24.0,
            bones: vec![BoneEntry::new(0, "root")],
            actions: vec![VesAction {
                name: "idle".to_string(),
                frame_count: 1,
                translations: vec![vec![[0.0; 3]]],
                rotations: vec![vec![[1.0, 0.0, 0.0, 0.0]]],
            }],
        };
        let mut bytes = Vec::new();
        write_ves(&mut bytes, &skeleton).unwrap();

        let asset = decode_asset(&bytes).unwrap().unwrap();
        let summary = asset.summary();
        assert_eq!(summary[0], "skeleton: 1 bones, 1 actions at 24 fps");
        assert_eq!(summary[1], "  bone [0] root");
        assert_eq!(summary[2], "  action 'idle': 1 frames");
    }

    #[test]
    fn test_unknown_magic() {
        assert!(decode_asset(b"glTF\x02\x00\x00\x00").is_none());
        assert!(decode_asset(b"VU").is_none());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let result = decode_asset(b"VULP\x05\x00");
        assert!(matches!(result, Some(Err(ExportError::Format(_)))));
    }

    #[test]
    fn test_read_asset_unknown_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();
        assert!(matches!(
            read_asset(&path),
            Err(ExportError::UnsupportedInput(_))
        ));
    }

    #[test]
    fn test_list_objects() {
        let mut scene = Scene::new(24.0);
        let rig = scene.add_object(SceneObject::new(
            "Rig",
            ObjectData::Armature(Armature {
                bones: vec![PoseBone::new("root")],
            }),
        ));
        let mesh = PolyMesh::from_polygons(vec![Vec3::ZERO, Vec3::X, Vec3::Y], &[vec![0, 1, 2]]);
        let mut body = SceneObject::new("Body", ObjectData::Mesh(MeshData::new(mesh)));
        body.parent = Some(rig);
        scene.add_object(body);
        scene.add_object(SceneObject::new("Marker", ObjectData::Empty));
        scene.actions.push(Action::new("walk", (0.0, 12.0)));

        let lines = list_objects(&scene);
        assert_eq!(
            lines,
            vec![
                "Rig (armature) 1 bones",
                "Body (mesh) 3 vertices, 1 polygons, 0 UV layers, parent 'Rig'",
                "Marker (empty)",
                "action 'walk': frames 0 - 12",
            ]
        );
    }
}
