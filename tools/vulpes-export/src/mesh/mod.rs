//! Mesh exporter (scene object -> .vem)
//!
//! Pipeline: flatten (triangulate + transform) → normals → tangents → UVs
//! (V flipped) → bone weights → [`VemMesh`]. Everything is validated and
//! built in memory before the output file is created.

pub mod flatten;
pub mod tangent;
pub mod weights;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use glam::{Mat3, Vec2};
use vulpes_common::{MAX_BONES, TangentBasis, VemMesh, global_matrix, write_vem};

use crate::error::ExportError;
use crate::options::MeshExportOptions;
use crate::scene::{Armature, ObjectData, PolyMesh, Scene, SceneObject};

use self::flatten::{FlatMesh, flatten};

/// Convert the selected mesh object to in-memory `.vem` data
pub fn convert_mesh_to_memory(
    scene: &Scene,
    options: &MeshExportOptions,
) -> Result<VemMesh, ExportError> {
    options.validate()?;

    let object = scene
        .selected_object()
        .and_then(|id| scene.object(id))
        .ok_or(ExportError::NoSelectedObject)?;
    let ObjectData::Mesh(data) = &object.data else {
        return Err(ExportError::ObjectNotMesh(object.name.clone()));
    };
    let mesh = data.to_mesh(options.apply_modifiers);
    mesh.validate().map_err(|reason| ExportError::InvalidMesh {
        name: object.name.clone(),
        reason,
    })?;

    // Validate before doing any work
    let needs_uvs = options.export_uvs || (options.export_tangents && mesh.loop_tangents.is_none());
    if needs_uvs && mesh.active_uv_layer().is_none() {
        return Err(ExportError::NoUvLayers(object.name.clone()));
    }
    let armature = if options.export_armature_weights {
        Some(parent_armature(scene, object)?)
    } else {
        None
    };

    let transform = global_matrix(options.scale, options.forward, options.up)? * object.world_matrix;
    let flat = flatten(mesh, transform);
    if flat.mirrored {
        tracing::debug!("Object '{}' is mirrored, flipping normals", object.name);
    }

    let vertex_count = flat.vertex_count();
    let mut vem = VemMesh {
        positions: flat.positions.iter().map(|p| p.to_array()).collect(),
        indices: (0..vertex_count as u32).collect(),
        ..Default::default()
    };

    if options.export_normals {
        vem.normals = Some(flat.normals.iter().map(|n| n.to_array()).collect());
    }

    if options.export_tangents {
        vem.tangent_basis = Some(tangent_basis(mesh, &flat, Mat3::from_mat4(transform)));
    }

    if let Some(layer) = mesh.active_uv_layer().filter(|_| options.export_uvs) {
        vem.uvs = Some(
            flat.corner_loops
                .iter()
                .map(|&l| flip_v(layer.uvs[l]))
                .collect(),
        );
    }

    if let Some(armature) = armature {
        vem.skin = Some(weights::pack_skin(
            armature,
            &object.vertex_groups,
            &mesh.vertex_weights,
            &flat.corner_vertices,
        ));
    }

    Ok(vem)
}

/// Convert the selected mesh object and write it to `output`
pub fn export_vem(
    scene: &Scene,
    output: &Path,
    options: &MeshExportOptions,
) -> Result<VemMesh, ExportError> {
    let vem = convert_mesh_to_memory(scene, options)?;

    let file = File::create(output)?;
    let mut writer = BufWriter::new(file);
    write_vem(&mut writer, &vem)?;
    writer.flush()?;

    tracing::info!(
        "Exported mesh: {} vertices ({} triangles), flags=0x{:02X}, {} bytes",
        vem.vertex_count(),
        vem.vertex_count() / 3,
        vem.flags(),
        vem.encoded_len()
    );

    Ok(vem)
}

/// Texture-space flip applied on export: V is stored as `1 - v`
pub fn flip_v(uv: Vec2) -> [f32; 2] {
    [uv.x, 1.0 - uv.y]
}

fn parent_armature<'a>(
    scene: &'a Scene,
    object: &SceneObject,
) -> Result<&'a Armature, ExportError> {
    let parent = object
        .parent
        .and_then(|id| scene.object(id))
        .ok_or_else(|| ExportError::NoArmature(object.name.clone()))?;
    let ObjectData::Armature(armature) = &parent.data else {
        return Err(ExportError::NoArmature(object.name.clone()));
    };
    if armature.bones.len() > MAX_BONES {
        return Err(ExportError::TooManyBones {
            name: parent.name.clone(),
            count: armature.bones.len(),
        });
    }
    Ok(armature)
}

fn tangent_basis(mesh: &PolyMesh, flat: &FlatMesh, transform: Mat3) -> TangentBasis {
    match (&mesh.loop_tangents, mesh.active_uv_layer()) {
        (Some(tangents), _) => {
            let corner_tangents: Vec<_> = flat.corner_loops.iter().map(|&l| tangents[l]).collect();
            tangent::precomputed_tangents(&corner_tangents, &flat.normals, transform)
        }
        (None, Some(layer)) => {
            // Tangents follow the source UV orientation, before the V flip
            let corner_uvs: Vec<_> = flat.corner_loops.iter().map(|&l| layer.uvs[l]).collect();
            tangent::manual_tangents(&flat.positions, &corner_uvs, &flat.normals)
        }
        // Ruled out by validation
        (None, None) => TangentBasis::default(),
    }
}
