//! GLB container assembly.

use serde_json::{Value, json};

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_VERSION: u32 = 2;
const CHUNK_JSON: &[u8; 4] = b"JSON";
const CHUNK_BIN: &[u8; 4] = b"BIN\0";

/// Wrap a glTF document and its single buffer into a binary GLB
///
/// The document's `buffers` entry is replaced to describe `bin`.
pub(crate) fn assemble_glb(mut document: Value, bin: &[u8]) -> Vec<u8> {
    document["buffers"] = json!([{ "byteLength": bin.len() }]);
    let json = serde_json::to_vec(&document).expect("glTF document serializes");

    let mut glb = Vec::new();
    glb.extend_from_slice(GLB_MAGIC);
    glb.extend_from_slice(&GLB_VERSION.to_le_bytes());
    // Total length, patched once both chunks are in
    glb.extend_from_slice(&[0; 4]);

    push_chunk(&mut glb, CHUNK_JSON, &json, b' ');
    push_chunk(&mut glb, CHUNK_BIN, bin, 0);

    let total = u32::try_from(glb.len()).expect("GLB fits in u32");
    glb[8..12].copy_from_slice(&total.to_le_bytes());
    glb
}

/// Append one chunk, padded to 4 bytes with `pad`
fn push_chunk(glb: &mut Vec<u8>, kind: &[u8; 4], payload: &[u8], pad: u8) {
    let padded_len = payload.len().next_multiple_of(4);
    let len = u32::try_from(padded_len).expect("chunk fits in u32");
    glb.extend_from_slice(&len.to_le_bytes());
    glb.extend_from_slice(kind);
    glb.extend_from_slice(payload);
    glb.resize(glb.len() + padded_len - payload.len(), pad);
}
