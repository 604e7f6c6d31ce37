//! Per-corner flattening
//!
//! Fan-triangulates every polygon and emits one vertex per triangle corner,
//! in polygon order then loop order. Every later pass (UVs, tangents,
//! weights) indexes corners in this same order.

use glam::{Mat3, Mat4, Vec3};
use vulpes_common::{is_mirrored, normal_matrix};

use crate::scene::PolyMesh;

/// Triangulated, transformed corners of a mesh
#[derive(Debug, Clone, Default)]
pub struct FlatMesh {
    pub positions: Vec<Vec3>,
    /// Unit normals, negated when the transform mirrors
    pub normals: Vec<Vec3>,
    /// Source loop of each corner
    pub corner_loops: Vec<usize>,
    /// Source vertex of each corner
    pub corner_vertices: Vec<u32>,
    /// Transform had a negative determinant
    pub mirrored: bool,
}

impl FlatMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }
}

/// Flatten `mesh` under `transform` (global export matrix · object world matrix)
pub fn flatten(mesh: &PolyMesh, transform: Mat4) -> FlatMesh {
    let normal_transform = normal_matrix(transform);
    let mirrored = is_mirrored(transform);

    let mut flat = FlatMesh {
        mirrored,
        ..Default::default()
    };
    let capacity = mesh.triangle_count() * 3;
    flat.positions.reserve(capacity);
    flat.normals.reserve(capacity);
    flat.corner_loops.reserve(capacity);
    flat.corner_vertices.reserve(capacity);

    let mut skipped = 0usize;
    for polygon in &mesh.polygons {
        if polygon.loop_count < 3 {
            skipped += 1;
            continue;
        }

        let loops = polygon.loop_start..polygon.loop_start + polygon.loop_count;
        let face_normal = polygon_normal(mesh, loops.clone());

        // Fan triangulation around the first loop
        let first = polygon.loop_start;
        for i in 1..polygon.loop_count - 1 {
            for l in [first, first + i, first + i + 1] {
                let vertex = mesh.loop_vertices[l];
                let source_normal = mesh
                    .loop_normals
                    .as_ref()
                    .map_or(face_normal, |normals| normals[l]);

                flat.positions
                    .push(transform.transform_point3(mesh.positions[vertex as usize]));
                flat.normals
                    .push(transform_normal(normal_transform, source_normal, mirrored));
                flat.corner_loops.push(l);
                flat.corner_vertices.push(vertex);
            }
        }
    }

    if skipped > 0 {
        tracing::warn!("Skipped {} polygons with fewer than 3 corners", skipped);
    }

    flat
}

/// Transform a normal and renormalize it, flipping it for mirrored transforms
pub fn transform_normal(normal_transform: Mat3, normal: Vec3, mirrored: bool) -> Vec3 {
    let n = (normal_transform * normal).normalize_or_zero();
    if mirrored { -n } else { n }
}

/// Sum of edge cross products (Newell); handles concave and non-planar polygons
fn polygon_normal(mesh: &PolyMesh, loops: std::ops::Range<usize>) -> Vec3 {
    let corners: Vec<Vec3> = loops
        .map(|l| mesh.positions[mesh.loop_vertices[l] as usize])
        .collect();
    let mut normal = Vec3::ZERO;
    for (i, current) in corners.iter().enumerate() {
        let next = corners[(i + 1) % corners.len()];
        normal += current.cross(next);
    }
    normal.normalize_or_zero()
}
