//! Programmatic glTF/GLB construction for integration tests.
//!
//! Builds small GLB files in memory so tests don't depend on binary
//! fixtures checked into the repository.

#![allow(dead_code)]

mod binary_packing;
mod glb_assembly;

use serde_json::json;

use binary_packing::BufferBuilder;
use glb_assembly::assemble_glb;

/// Quad corner positions (glTF Y-up)
pub const QUAD_POSITIONS: [[f32; 3]; 4] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, 1.0, 0.0],
    [0.0, 1.0, 0.0],
];

pub const QUAD_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Translation of the `Tip` joint relative to `Root`
pub const TIP_OFFSET: [f32; 3] = [0.0, 1.0, 0.0];

/// Skinned quad on a two-joint rig with one animation
///
/// - nodes: `Root` (joint 0) → `Tip` (joint 1), `Body` (mesh + skin)
/// - skin `Rig`: joints [Root, Tip]
/// - vertices 0/1 are bound to Root, vertices 2/3 to Tip
/// - animation `Wave` over one second: Root slides from the origin to
///   (2, 0, 0), Tip rotates from identity to 90° about Z
pub fn generate_skinned_glb() -> Vec<u8> {
    let mut buffer = BufferBuilder::new();

    let positions = buffer.f32s(&QUAD_POSITIONS);
    let normals = buffer.f32s(&[[0.0, 0.0, 1.0]; 4]);
    let uvs = buffer.f32s(&QUAD_UVS);
    let joints = buffer.u16s(&[[0, 0, 0, 0], [0, 0, 0, 0], [1, 0, 0, 0], [1, 0, 0, 0]]);
    let weights = buffer.f32s(&[[1.0, 0.0, 0.0, 0.0]; 4]);
    let indices = buffer.u16s(&QUAD_INDICES.map(|i| [i]));

    let times = buffer.times(&[0.0, 1.0]);
    let root_translation = buffer.f32s(&[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
    let half = std::f32::consts::FRAC_1_SQRT_2;
    let tip_rotation = buffer.f32s(&[[0.0, 0.0, 0.0, 1.0], [0.0, 0.0, half, half]]);

    let root = json!({
        "asset": { "version": "2.0", "generator": "vulpes-export tests" },
        "scene": 0,
        "scenes": [{ "nodes": [0, 2] }],
        "nodes": [
            { "name": "Root", "children": [1] },
            { "name": "Tip", "translation": TIP_OFFSET },
            { "name": "Body", "mesh": 0, "skin": 0 },
        ],
        "meshes": [{
            "name": "Quad",
            "primitives": [{
                "attributes": {
                    "POSITION": positions,
                    "NORMAL": normals,
                    "TEXCOORD_0": uvs,
                    "JOINTS_0": joints,
                    "WEIGHTS_0": weights,
                },
                "indices": indices,
            }],
        }],
        "skins": [{ "name": "Rig", "joints": [0, 1] }],
        "animations": [{
            "name": "Wave",
            "samplers": [
                { "input": times, "output": root_translation, "interpolation": "LINEAR" },
                { "input": times, "output": tip_rotation, "interpolation": "LINEAR" },
            ],
            "channels": [
                { "sampler": 0, "target": { "node": 0, "path": "translation" } },
                { "sampler": 1, "target": { "node": 1, "path": "rotation" } },
            ],
        }],
        "bufferViews": buffer.views,
        "accessors": buffer.accessors,
    });

    assemble_glb(root, &buffer.data)
}

/// Unskinned quad translated by (0, 0, -2) plus an empty marker node
pub fn generate_static_glb() -> Vec<u8> {
    let mut buffer = BufferBuilder::new();

    let positions = buffer.f32s(&QUAD_POSITIONS);
    let uvs = buffer.f32s(&QUAD_UVS);
    let indices = buffer.u16s(&QUAD_INDICES.map(|i| [i]));

    let root = json!({
        "asset": { "version": "2.0", "generator": "vulpes-export tests" },
        "scenes": [{ "nodes": [0, 1] }],
        "nodes": [
            { "name": "Panel", "mesh": 0, "translation": [0.0, 0.0, -2.0] },
            { "name": "Marker" },
        ],
        "meshes": [{
            "primitives": [{
                "attributes": {
                    "POSITION": positions,
                    "TEXCOORD_0": uvs,
                },
                "indices": indices,
            }],
        }],
        "bufferViews": buffer.views,
        "accessors": buffer.accessors,
    });

    assemble_glb(root, &buffer.data)
}
