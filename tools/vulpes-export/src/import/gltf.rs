//! glTF/GLB import
//!
//! - Mesh nodes become mesh objects with every triangle primitive merged.
//! - Skins become armature objects; joints become bones in joint order.
//! - Animations become actions keyed by bone name, in frames.
//! - Any other node in the scene becomes an empty.
//!
//! glTF is Y-up, so every world matrix is pre-multiplied by the Y-up to
//! Z-up rotation. Texture V is flipped on import (`1 - v`) to match the host
//! convention; the exporter flips it back.

use std::path::Path;

use ::gltf::animation::util::ReadOutputs;
use ::gltf::animation::{Interpolation, Property};
use ::gltf::mesh::Mode;
use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use hashbrown::HashMap;

use super::{NameRegistry, y_up_to_host};
use crate::error::ExportError;
use crate::scene::{
    Action, Armature, BoneTrack, GroupWeight, Keyframe, MeshData, ObjectData, ObjectId, Polygon,
    PolyMesh, PoseBone, PoseChannels, Scene, SceneObject, UvLayer,
};

type Buffers = [::gltf::buffer::Data];

/// Load a glTF or GLB file as a host scene
pub fn load_scene(path: &Path, frame_rate: f32) -> Result<Scene, ExportError> {
    let (document, buffers, _images) =
        ::gltf::import(path).map_err(|e| ExportError::import(path, e))?;
    let scene = import_document(&document, &buffers, frame_rate)
        .map_err(|reason| ExportError::import(path, reason))?;

    tracing::debug!(
        "Imported glTF {:?}: {} objects, {} actions",
        path,
        scene.objects.len(),
        scene.actions.len()
    );
    Ok(scene)
}

fn import_document(
    document: &::gltf::Document,
    buffers: &Buffers,
    frame_rate: f32,
) -> Result<Scene, String> {
    let root_scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or("file has no scenes")?;

    let mut world: Vec<Option<Mat4>> = vec![None; document.nodes().count()];
    for node in root_scene.nodes() {
        collect_world(&node, Mat4::IDENTITY, &mut world);
    }

    let to_host = y_up_to_host();
    let mut scene = Scene::new(frame_rate);
    let mut object_names = NameRegistry::new();

    // Armatures first so meshes can reference them
    let mut armatures: Vec<(ObjectId, Vec<String>)> = Vec::new();
    let mut joint_names: HashMap<usize, String> = HashMap::new();
    for skin in document.skins() {
        let mut bone_names = NameRegistry::new();
        let bones: Vec<PoseBone> = skin
            .joints()
            .map(|joint| {
                let name = bone_names.unique(joint.name().unwrap_or("Bone"));
                joint_names
                    .entry(joint.index())
                    .or_insert_with(|| name.clone());
                PoseBone::with_rest(name, rest_channels(&joint))
            })
            .collect();
        let names = bones.iter().map(|b| b.name.clone()).collect();

        let name = object_names.unique(skin.name().unwrap_or("Armature"));
        let mut object = SceneObject::new(name, ObjectData::Armature(Armature { bones }));
        object.world_matrix = to_host;
        armatures.push((scene.add_object(object), names));
    }

    for node in document.nodes() {
        let Some(node_world) = world[node.index()] else {
            continue;
        };

        if let Some(mesh) = node.mesh() {
            let base_name = node.name().or(mesh.name()).unwrap_or("Mesh");
            let morph_weights = node.weights().or(mesh.weights());
            let data = import_mesh(&mesh, buffers, morph_weights)
                .map_err(|reason| format!("mesh '{base_name}': {reason}"))?;

            let mut object =
                SceneObject::new(object_names.unique(base_name), ObjectData::Mesh(data));
            object.world_matrix = to_host * node_world;
            let skin = node.skin().and_then(|s| armatures.get(s.index()));
            if let Some((armature, bone_names)) = skin {
                object.parent = Some(*armature);
                object.vertex_groups = bone_names.clone();
            }
            scene.add_object(object);
        } else if !joint_names.contains_key(&node.index()) {
            let mut object = SceneObject::new(
                object_names.unique(node.name().unwrap_or("Empty")),
                ObjectData::Empty,
            );
            object.world_matrix = to_host * node_world;
            scene.add_object(object);
        }
    }

    let mut action_names = NameRegistry::new();
    for animation in document.animations() {
        let name = action_names.unique(animation.name().unwrap_or("Action"));
        let action = import_action(&animation, buffers, &joint_names, frame_rate, name)?;
        scene.actions.push(action);
    }

    Ok(scene)
}

fn collect_world(node: &::gltf::Node, parent: Mat4, world: &mut [Option<Mat4>]) {
    let matrix = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    world[node.index()] = Some(matrix);
    for child in node.children() {
        collect_world(&child, matrix, world);
    }
}

/// Node TRS as bone rest channels; scale is not carried
fn rest_channels(node: &::gltf::Node) -> PoseChannels {
    let (translation, rotation, _scale) = node.transform().decomposed();
    PoseChannels {
        location: Vec3::from_array(translation),
        quaternion: Quat::from_array(rotation),
        ..Default::default()
    }
}

// ============================================================================
// Meshes
// ============================================================================

/// Per-loop attribute that is kept only if every primitive supplies it
struct LoopAttribute<T> {
    values: Vec<T>,
    complete: bool,
}

impl<T: Copy> LoopAttribute<T> {
    fn new() -> Self {
        Self {
            values: Vec::new(),
            complete: true,
        }
    }

    fn finish(self, what: &str) -> Option<Vec<T>> {
        if self.complete {
            Some(self.values)
        } else {
            if !self.values.is_empty() {
                tracing::warn!("Not every primitive has {}, ignoring them", what);
            }
            None
        }
    }
}

/// Per-vertex data, dropped with a warning when the count is wrong
fn per_vertex<T>(data: Option<Vec<T>>, count: usize, what: &str) -> Option<Vec<T>> {
    match data {
        Some(values) if values.len() == count => Some(values),
        Some(values) => {
            tracing::warn!(
                "Primitive has {} {} for {} vertices, ignoring them",
                values.len(),
                what,
                count
            );
            None
        }
        None => None,
    }
}

fn import_mesh(
    mesh: &::gltf::Mesh,
    buffers: &Buffers,
    morph_weights: Option<&[f32]>,
) -> Result<MeshData, String> {
    let mut base = PolyMesh::default();
    let mut normals = LoopAttribute::<Vec3>::new();
    let mut uvs = LoopAttribute::<Vec2>::new();
    let mut tangents = LoopAttribute::<Vec4>::new();
    let mut position_offsets: Vec<Vec3> = Vec::new();
    let mut normal_offsets: Vec<Vec3> = Vec::new();
    let mut morphed = false;

    for primitive in mesh.primitives() {
        if !matches!(primitive.mode(), Mode::Triangles) {
            tracing::warn!(
                "Skipping primitive {}: {:?} is not supported",
                primitive.index(),
                primitive.mode()
            );
            continue;
        }

        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

        let positions: Vec<Vec3> = reader
            .read_positions()
            .ok_or_else(|| format!("primitive {} has no positions", primitive.index()))?
            .map(Vec3::from_array)
            .collect();
        let count = positions.len();
        let offset = base.positions.len() as u32;

        let vertex_normals = per_vertex(
            reader
                .read_normals()
                .map(|iter| iter.map(Vec3::from_array).collect()),
            count,
            "normals",
        );
        let vertex_uvs = per_vertex(
            reader
                .read_tex_coords(0)
                .map(|iter| iter.into_f32().map(|[u, v]| Vec2::new(u, 1.0 - v)).collect()),
            count,
            "texture coordinates",
        );
        let vertex_tangents = per_vertex(
            reader
                .read_tangents()
                .map(|iter| iter.map(Vec4::from_array).collect()),
            count,
            "tangents",
        );

        let indices: Vec<u32> = match reader.read_indices() {
            Some(iter) => iter.into_u32().collect(),
            None => (0..count as u32).collect(),
        };
        if indices.len() % 3 != 0 {
            return Err(format!(
                "primitive {} has {} indices, not a multiple of 3",
                primitive.index(),
                indices.len()
            ));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= count) {
            return Err(format!(
                "primitive {} index {} is out of range for {} vertices",
                primitive.index(),
                bad,
                count
            ));
        }

        // Skin: JOINTS_0 / WEIGHTS_0 become vertex group memberships
        let joints = reader.read_joints(0).map(|iter| iter.into_u16().collect::<Vec<_>>());
        let weights = reader.read_weights(0).map(|iter| iter.into_f32().collect::<Vec<_>>());
        let mut memberships = vec![Vec::new(); count];
        match (joints, weights) {
            (Some(joints), Some(weights)) => {
                for (vertex, (js, ws)) in memberships.iter_mut().zip(joints.iter().zip(&weights)) {
                    *vertex = js
                        .iter()
                        .zip(ws)
                        .filter(|&(_, &w)| w > 0.0)
                        .map(|(&j, &w)| GroupWeight {
                            group: j as usize,
                            weight: w,
                        })
                        .collect();
                }
            }
            (Some(_), None) | (None, Some(_)) => {
                tracing::warn!(
                    "Primitive {} has partial skinning data (joints or weights missing), ignoring skinning",
                    primitive.index()
                );
            }
            (None, None) => {}
        }

        // Morph targets at their default weights
        let mut prim_position_offsets = vec![Vec3::ZERO; count];
        let mut prim_normal_offsets = vec![Vec3::ZERO; count];
        for (target, (target_positions, target_normals, _)) in
            reader.read_morph_targets().enumerate()
        {
            let weight = morph_weights
                .and_then(|w| w.get(target))
                .copied()
                .unwrap_or(0.0);
            if weight == 0.0 {
                continue;
            }
            morphed = true;
            if let Some(deltas) = target_positions {
                for (offset, d) in prim_position_offsets.iter_mut().zip(deltas) {
                    *offset += Vec3::from_array(d) * weight;
                }
            }
            if let Some(deltas) = target_normals {
                for (offset, d) in prim_normal_offsets.iter_mut().zip(deltas) {
                    *offset += Vec3::from_array(d) * weight;
                }
            }
        }

        for triangle in indices.chunks_exact(3) {
            base.polygons.push(Polygon {
                loop_start: base.loop_vertices.len(),
                loop_count: 3,
            });
            for &i in triangle {
                let i = i as usize;
                base.loop_vertices.push(offset + i as u32);
                if let Some(n) = &vertex_normals {
                    normals.values.push(n[i]);
                }
                if let Some(uv) = &vertex_uvs {
                    uvs.values.push(uv[i]);
                }
                if let Some(t) = &vertex_tangents {
                    tangents.values.push(t[i]);
                }
            }
        }
        normals.complete &= vertex_normals.is_some();
        uvs.complete &= vertex_uvs.is_some();
        tangents.complete &= vertex_tangents.is_some();

        base.positions.extend(positions);
        base.vertex_weights.extend(memberships);
        position_offsets.extend(prim_position_offsets);
        normal_offsets.extend(prim_normal_offsets);
    }

    if base.polygons.is_empty() {
        return Err("no triangle primitives".to_string());
    }

    base.loop_normals = normals.finish("normals");
    base.loop_tangents = tangents.finish("tangents");
    if let Some(uvs) = uvs.finish("texture coordinates") {
        base.uv_layers.push(UvLayer {
            name: "UVMap".to_string(),
            uvs,
        });
    }

    let mut data = MeshData::new(base);
    if morphed {
        data.evaluated = Some(apply_offsets(&data.base, &position_offsets, &normal_offsets));
    }
    Ok(data)
}

/// Copy of `mesh` with per-vertex position and normal offsets applied
fn apply_offsets(mesh: &PolyMesh, positions: &[Vec3], normals: &[Vec3]) -> PolyMesh {
    let mut evaluated = mesh.clone();
    for (p, offset) in evaluated.positions.iter_mut().zip(positions) {
        *p += *offset;
    }
    if let Some(loop_normals) = &mut evaluated.loop_normals {
        for (n, &vertex) in loop_normals.iter_mut().zip(&mesh.loop_vertices) {
            *n = (*n + normals[vertex as usize]).normalize_or_zero();
        }
    }
    evaluated
}

// ============================================================================
// Animations
// ============================================================================

/// Convert one animation to an action
///
/// Only translation and rotation channels on skin joints are imported.
/// Step interpolation is sampled linearly; cubic spline keys keep their
/// values and drop their tangents.
fn import_action(
    animation: &::gltf::Animation,
    buffers: &Buffers,
    joint_names: &HashMap<usize, String>,
    frame_rate: f32,
    name: String,
) -> Result<Action, String> {
    let mut tracks: Vec<BoneTrack> = Vec::new();
    let mut time_range = (f32::INFINITY, f32::NEG_INFINITY);

    for channel in animation.channels() {
        let target = channel.target();
        let Some(bone) = joint_names.get(&target.node().index()) else {
            tracing::debug!(
                "Action '{}': skipping channel on non-joint node {}",
                name,
                target.node().index()
            );
            continue;
        };

        let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
        let times: Vec<f32> = reader
            .read_inputs()
            .ok_or_else(|| format!("action '{name}': channel has no keyframe times"))?
            .collect();
        let Some(outputs) = reader.read_outputs() else {
            tracing::warn!("Action '{}': channel on '{}' has no values", name, bone);
            continue;
        };
        let cubic = matches!(channel.sampler().interpolation(), Interpolation::CubicSpline);

        for &t in &times {
            time_range.0 = time_range.0.min(t);
            time_range.1 = time_range.1.max(t);
        }

        let index = match tracks.iter().position(|t| &t.bone == bone) {
            Some(i) => i,
            None => {
                tracks.push(BoneTrack::new(bone.clone()));
                tracks.len() - 1
            }
        };
        let track = &mut tracks[index];

        match outputs {
            ReadOutputs::Translations(values) => {
                let values = spline_values(values.map(Vec3::from_array).collect(), cubic);
                track.location = keyframes(&times, values, frame_rate);
            }
            ReadOutputs::Rotations(values) => {
                let values = spline_values(values.into_f32().map(Quat::from_array).collect(), cubic);
                track.quaternion = keyframes(&times, values, frame_rate);
            }
            _ => {
                let property = match target.property() {
                    Property::Scale => "scale",
                    _ => "morph weight",
                };
                tracing::debug!("Action '{}': ignoring {} channel on '{}'", name, property, bone);
            }
        }
    }

    let mut action = Action::new(name, frame_range(time_range, frame_rate));
    action.tracks = tracks;
    Ok(action)
}

/// Keyframe values of a sampler; cubic spline outputs are (in-tangent, value, out-tangent) triples
fn spline_values<T: Copy>(values: Vec<T>, cubic: bool) -> Vec<T> {
    if cubic {
        values.chunks_exact(3).map(|c| c[1]).collect()
    } else {
        values
    }
}

fn keyframes<T: Copy>(times: &[f32], values: Vec<T>, frame_rate: f32) -> Vec<Keyframe<T>> {
    if times.len() != values.len() {
        tracing::warn!(
            "Sampler has {} times but {} values, using the shorter",
            times.len(),
            values.len()
        );
    }
    times
        .iter()
        .zip(values)
        .map(|(&t, v)| Keyframe::new(t * frame_rate, v))
        .collect()
}

/// Frame range covering the keyed times, at least one frame long
fn frame_range(time_range: (f32, f32), frame_rate: f32) -> (f32, f32) {
    let (min, max) = time_range;
    if min > max {
        return (0.0, 1.0);
    }
    let start = (min * frame_rate).round();
    let end = (max * frame_rate).round();
    if end <= start {
        (start, start + 1.0)
    } else {
        (start, end)
    }
}
