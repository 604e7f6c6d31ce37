//! Bone weight packing
//!
//! Vertex groups are matched to bones by name. Each vertex keeps its four
//! heaviest matched groups; remaining slots are `(0, 0.0)`. Weights are not
//! normalized.

use hashbrown::HashMap;
use vulpes_common::{BONES_PER_VERTEX, BoneEntry, SkinWeights};

use crate::scene::{Armature, GroupWeight};

/// Bone name → bone index
pub fn bone_index_map(armature: &Armature) -> HashMap<&str, u32> {
    armature
        .bones
        .iter()
        .enumerate()
        .map(|(i, bone)| (bone.name.as_str(), i as u32))
        .collect()
}

/// Resolve one vertex's group memberships into four (bone, weight) slots
pub fn pack_vertex(
    memberships: &[GroupWeight],
    group_names: &[String],
    bones: &HashMap<&str, u32>,
) -> ([u32; BONES_PER_VERTEX], [f32; BONES_PER_VERTEX]) {
    let mut matched: Vec<(u32, f32)> = memberships
        .iter()
        .filter_map(|m| {
            let name = group_names.get(m.group)?;
            let bone = bones.get(name.as_str())?;
            Some((*bone, m.weight))
        })
        .collect();

    if matched.len() > BONES_PER_VERTEX {
        // Stable: equal weights keep group order
        matched.sort_by(|a, b| b.1.total_cmp(&a.1));
        matched.truncate(BONES_PER_VERTEX);
    }

    let mut indices = [0u32; BONES_PER_VERTEX];
    let mut weights = [0.0f32; BONES_PER_VERTEX];
    for (slot, (bone, weight)) in matched.into_iter().enumerate() {
        indices[slot] = bone;
        weights[slot] = weight;
    }
    (indices, weights)
}

/// Bone table plus per-corner weights
///
/// `corner_vertices` maps each flattened corner to its source vertex.
pub fn pack_skin(
    armature: &Armature,
    group_names: &[String],
    vertex_weights: &[Vec<GroupWeight>],
    corner_vertices: &[u32],
) -> SkinWeights {
    let bones = bone_index_map(armature);

    // Pack each source vertex once, then expand to corners
    let packed: Vec<_> = vertex_weights
        .iter()
        .map(|memberships| pack_vertex(memberships, group_names, &bones))
        .collect();

    let mut skin = SkinWeights {
        bones: armature
            .bones
            .iter()
            .enumerate()
            .map(|(i, bone)| BoneEntry::new(i as u8, &bone.name))
            .collect(),
        bone_indices: Vec::with_capacity(corner_vertices.len()),
        weights: Vec::with_capacity(corner_vertices.len()),
    };
    for &vertex in corner_vertices {
        let (indices, weights) = packed
            .get(vertex as usize)
            .copied()
            .unwrap_or(([0; BONES_PER_VERTEX], [0.0; BONES_PER_VERTEX]));
        skin.bone_indices.push(indices);
        skin.weights.push(weights);
    }
    skin
}
