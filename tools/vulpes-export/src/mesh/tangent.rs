//! Tangent space
//!
//! Two sources, both producing one tangent and one bitangent per corner:
//! - [`manual_tangents`]: derived from triangle edges and UV deltas, then
//!   Gram-Schmidt orthogonalized against each corner's normal
//! - [`precomputed_tangents`]: per-loop tangent plus bitangent sign supplied
//!   by the mesh source

use glam::{Mat3, Vec2, Vec3, Vec4};
use vulpes_common::TangentBasis;

/// Per-axis tolerance for detecting a triangle whose UVs collapse to a point
const NULL_UV_EPSILON: f32 = 0.001;

/// Tangent and bitangent of one triangle from its positions and UVs
///
/// Collinear UVs (zero determinant) fall back to the unscaled edge
/// combination, normalized. Otherwise the result is scaled by the inverse
/// UV determinant and left unnormalized.
pub fn triangle_tangents(positions: [Vec3; 3], uvs: [Vec2; 3]) -> (Vec3, Vec3) {
    let e1 = positions[1] - positions[0];
    let e2 = positions[2] - positions[0];
    let d1 = uvs[1] - uvs[0];
    let d2 = uvs[2] - uvs[0];

    let tangent = e1 * d2.y - e2 * d1.y;
    let bitangent = e2 * d1.x - e1 * d2.x;

    let denom = d1.x * d2.y - d1.y * d2.x;
    if denom == 0.0 {
        (tangent.normalize_or_zero(), bitangent.normalize_or_zero())
    } else {
        let r = 1.0 / denom;
        (tangent * r, bitangent * r)
    }
}

/// Gram-Schmidt against `normal`, without renormalizing
pub fn orthogonalize(normal: Vec3, tangent: Vec3, bitangent: Vec3) -> (Vec3, Vec3) {
    let t = tangent - normal * normal.dot(tangent);
    let b = bitangent - normal * normal.dot(bitangent) - t * t.dot(bitangent);
    (t, b)
}

/// All three UVs within tolerance of each other
pub fn is_null_uv_triangle(uvs: [Vec2; 3]) -> bool {
    let near = |a: Vec2, b: Vec2| (a - b).abs().max_element() <= NULL_UV_EPSILON;
    near(uvs[0], uvs[1]) && near(uvs[0], uvs[2]) && near(uvs[1], uvs[2])
}

/// Tangent basis for flattened corners from positions, UVs and normals
///
/// All slices are per corner, three corners per triangle.
pub fn manual_tangents(positions: &[Vec3], uvs: &[Vec2], normals: &[Vec3]) -> TangentBasis {
    let mut basis = TangentBasis {
        tangents: Vec::with_capacity(positions.len()),
        bitangents: Vec::with_capacity(positions.len()),
    };

    let mut null_triangles = 0usize;
    let triangles = positions
        .chunks_exact(3)
        .zip(uvs.chunks_exact(3))
        .zip(normals.chunks_exact(3));
    for ((p, uv), n) in triangles {
        let uv = [uv[0], uv[1], uv[2]];
        if is_null_uv_triangle(uv) {
            null_triangles += 1;
        }

        let (tangent, bitangent) = triangle_tangents([p[0], p[1], p[2]], uv);
        for normal in n {
            let (t, b) = orthogonalize(*normal, tangent, bitangent);
            basis.tangents.push(t.to_array());
            basis.bitangents.push(b.to_array());
        }
    }

    if null_triangles > 0 {
        tracing::debug!("{} triangles have collapsed UVs", null_triangles);
    }

    basis
}

/// Tangent basis from per-corner precomputed tangents (xyz + bitangent sign in w)
///
/// Tangents go through the upper 3×3 of the export transform and are
/// renormalized; bitangents are rebuilt as `sign · normal × tangent` from the
/// emitted normals.
pub fn precomputed_tangents(tangents: &[Vec4], normals: &[Vec3], transform: Mat3) -> TangentBasis {
    let mut basis = TangentBasis {
        tangents: Vec::with_capacity(tangents.len()),
        bitangents: Vec::with_capacity(tangents.len()),
    };
    for (t, n) in tangents.iter().zip(normals) {
        let tangent = (transform * t.truncate()).normalize_or_zero();
        let sign = if t.w < 0.0 { -1.0 } else { 1.0 };
        let bitangent = sign * n.cross(tangent);
        basis.tangents.push(tangent.to_array());
        basis.bitangents.push(bitangent.to_array());
    }
    basis
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn v3(a: [f32; 3]) -> Vec3 {
        Vec3::from_array(a)
    }

    #[test]
    fn test_axis_aligned_triangle() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y];
        let uvs = [Vec2::ZERO, Vec2::X, Vec2::Y];
        let normals = [Vec3::Z; 3];
        let basis = manual_tangents(&positions, &uvs, &normals);

        for (t, b) in basis.tangents.iter().zip(&basis.bitangents) {
            assert!(v3(*t).abs_diff_eq(Vec3::X, EPSILON), "{t:?}");
            assert!(v3(*b).abs_diff_eq(Vec3::Y, EPSILON), "{b:?}");
        }
    }

    #[test]
    fn test_uv_stretch_scales_unnormalized() {
        // UVs cover half the triangle along U, so tangent length doubles
        let (t, b) = triangle_tangents(
            [Vec3::ZERO, Vec3::X, Vec3::Y],
            [Vec2::ZERO, Vec2::new(0.5, 0.0), Vec2::Y],
        );
        assert!(t.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), EPSILON));
        assert!(b.abs_diff_eq(Vec3::Y, EPSILON));
    }

    #[test]
    fn test_collinear_uvs_fall_back_normalized() {
        let (t, b) = triangle_tangents(
            [Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 3.0, 0.0)],
            [Vec2::ZERO, Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0)],
        );
        assert!((t.length() - 1.0).abs() < EPSILON);
        assert!((b.length() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_null_uv_triangle_is_zero_not_error() {
        let uvs = [Vec2::splat(0.5), Vec2::splat(0.5005), Vec2::splat(0.5)];
        assert!(is_null_uv_triangle(uvs));
        assert!(!is_null_uv_triangle([Vec2::ZERO, Vec2::X, Vec2::Y]));

        let basis = manual_tangents(
            &[Vec3::ZERO, Vec3::X, Vec3::Y],
            &[Vec2::splat(0.5); 3],
            &[Vec3::Z; 3],
        );
        for t in basis.tangents.iter().chain(&basis.bitangents) {
            assert!(t.iter().all(|c| c.is_finite()));
        }
    }

    #[test]
    fn test_gram_schmidt_removes_normal_component() {
        let normal = Vec3::new(0.0, 0.6, 0.8);
        let (t, b) = orthogonalize(normal, Vec3::new(1.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 1.0));
        assert!(t.dot(normal).abs() < EPSILON);
        assert!(b.dot(normal).abs() < EPSILON);
        // No renormalization: magnitude carries over from the input
        assert!(t.length() > 1.0);
    }

    #[test]
    fn test_precomputed_sign() {
        let normals = [Vec3::Z; 2];
        let tangents = [Vec4::new(1.0, 0.0, 0.0, 1.0), Vec4::new(2.0, 0.0, 0.0, -1.0)];
        let basis = precomputed_tangents(&tangents, &normals, Mat3::IDENTITY);
        assert_eq!(basis.tangents[1], [1.0, 0.0, 0.0]);
        assert!(v3(basis.bitangents[0]).abs_diff_eq(Vec3::Y, EPSILON));
        assert!(v3(basis.bitangents[1]).abs_diff_eq(Vec3::NEG_Y, EPSILON));
    }

    #[test]
    fn test_precomputed_matches_manual_handedness() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y];
        let normals = [Vec3::Z; 3];
        let manual = manual_tangents(&positions, &[Vec2::ZERO, Vec2::X, Vec2::Y], &normals);
        let precomputed =
            precomputed_tangents(&[Vec4::new(1.0, 0.0, 0.0, 1.0); 3], &normals, Mat3::IDENTITY);
        for i in 0..3 {
            assert!(v3(manual.bitangents[i]).abs_diff_eq(v3(precomputed.bitangents[i]), EPSILON));
        }
    }

    #[test]
    fn test_precomputed_transformed() {
        let rotate = Mat3::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let basis = precomputed_tangents(&[Vec4::new(1.0, 0.0, 0.0, 1.0)], &[Vec3::Z], rotate);
        assert!(v3(basis.tangents[0]).abs_diff_eq(Vec3::Y, EPSILON));
        assert!(v3(basis.bitangents[0]).abs_diff_eq(Vec3::NEG_X, EPSILON));
    }
}
