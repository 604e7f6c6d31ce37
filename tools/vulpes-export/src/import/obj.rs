//! Wavefront OBJ import
//!
//! Reads `v`, `vt`, `vn` and `f` statements into a single mesh object named
//! after the file. Faces are kept as polygons. Normals and UVs are only
//! imported when every face corner references one.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use glam::{Vec2, Vec3};

use super::y_up_to_host;
use crate::error::ExportError;
use crate::scene::{MeshData, ObjectData, Polygon, PolyMesh, Scene, SceneObject, UvLayer};

/// Load an OBJ file as a scene with one mesh object
pub fn load_scene(path: &Path, frame_rate: f32) -> Result<Scene, ExportError> {
    let file = File::open(path).map_err(|e| ExportError::import(path, e))?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Mesh");
    let mesh = parse_obj(BufReader::new(file)).map_err(|reason| ExportError::import(path, reason))?;

    tracing::debug!(
        "Imported OBJ {:?}: {} vertices, {} faces",
        path,
        mesh.positions.len(),
        mesh.polygons.len()
    );

    let mut object = SceneObject::new(name, ObjectData::Mesh(MeshData::new(mesh)));
    object.world_matrix = y_up_to_host();

    let mut scene = Scene::new(frame_rate);
    scene.add_object(object);
    Ok(scene)
}

/// One face corner: position, texture coordinate and normal indices (0-based)
type Corner = (usize, Option<usize>, Option<usize>);

/// Parse OBJ text into a polygon mesh
pub fn parse_obj(reader: impl BufRead) -> Result<PolyMesh, String> {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut tex_coords: Vec<Vec2> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();
    let mut faces: Vec<Vec<Corner>> = Vec::new();

    for (line_number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| e.to_string())?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0] {
            "v" if parts.len() >= 4 => {
                let x: f32 = parts[1].parse().unwrap_or(0.0);
                let y: f32 = parts[2].parse().unwrap_or(0.0);
                let z: f32 = parts[3].parse().unwrap_or(0.0);
                positions.push(Vec3::new(x, y, z));
            }
            "vt" if parts.len() >= 3 => {
                let u: f32 = parts[1].parse().unwrap_or(0.0);
                let v: f32 = parts[2].parse().unwrap_or(0.0);
                tex_coords.push(Vec2::new(u, v));
            }
            "vn" if parts.len() >= 4 => {
                let x: f32 = parts[1].parse().unwrap_or(0.0);
                let y: f32 = parts[2].parse().unwrap_or(0.0);
                let z: f32 = parts[3].parse().unwrap_or(0.0);
                normals.push(Vec3::new(x, y, z));
            }
            "f" => {
                let counts = (positions.len(), tex_coords.len(), normals.len());
                let corners = parts[1..]
                    .iter()
                    .map(|v| parse_obj_vertex(v, counts))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| format!("line {}: invalid face '{}'", line_number + 1, line))?;
                if corners.len() < 3 {
                    tracing::warn!(
                        "line {}: skipping face with {} corners",
                        line_number + 1,
                        corners.len()
                    );
                    continue;
                }
                faces.push(corners);
            }
            _ => {}
        }
    }

    if faces.is_empty() {
        return Err("no faces found".to_string());
    }

    let loop_count: usize = faces.iter().map(Vec::len).sum();
    let mut mesh = PolyMesh {
        vertex_weights: vec![Vec::new(); positions.len()],
        positions,
        ..Default::default()
    };
    let mut loop_uvs = Vec::with_capacity(loop_count);
    let mut loop_normals = Vec::with_capacity(loop_count);

    for corners in &faces {
        mesh.polygons.push(Polygon {
            loop_start: mesh.loop_vertices.len(),
            loop_count: corners.len(),
        });
        for &(v, vt, vn) in corners {
            mesh.loop_vertices.push(v as u32);
            if let Some(t) = vt {
                loop_uvs.push(tex_coords[t]);
            }
            if let Some(n) = vn {
                loop_normals.push(normals[n]);
            }
        }
    }

    if loop_uvs.len() == loop_count {
        mesh.uv_layers.push(UvLayer {
            name: "UVMap".to_string(),
            uvs: loop_uvs,
        });
    } else if !loop_uvs.is_empty() {
        tracing::warn!("Some face corners have no texture coordinate, ignoring UVs");
    }

    if loop_normals.len() == loop_count {
        mesh.loop_normals = Some(loop_normals);
    } else if !loop_normals.is_empty() {
        tracing::warn!("Some face corners have no normal, ignoring normals");
    }

    Ok(mesh)
}

/// Parse one face corner (`v`, `v/vt`, `v//vn` or `v/vt/vn`)
///
/// Indices are 1-based; negative indices count back from the latest element.
/// Returns `None` for malformed or out-of-range references.
fn parse_obj_vertex(s: &str, counts: (usize, usize, usize)) -> Option<Corner> {
    let mut parts = s.split('/');
    let v = resolve_index(parts.next()?, counts.0)?;
    let vt = match parts.next() {
        Some("") | None => None,
        Some(t) => Some(resolve_index(t, counts.1)?),
    };
    let vn = match parts.next() {
        Some("") | None => None,
        Some(n) => Some(resolve_index(n, counts.2)?),
    };
    Some((v, vt, vn))
}

fn resolve_index(s: &str, count: usize) -> Option<usize> {
    let index: i64 = s.parse().ok()?;
    let resolved = match index {
        0 => return None,
        i if i > 0 => i - 1,
        i => count as i64 + i,
    };
    (0..count as i64)
        .contains(&resolved)
        .then_some(resolved as usize)
}
