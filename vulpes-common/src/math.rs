//! Vector, matrix and quaternion helpers
//!
//! The host convention is Z-up with -Y facing the viewer (forward = +Y, up = +Z).
//! Exports remap that frame onto the engine's frame with [`axis_conversion`] and
//! fold scale in with [`global_matrix`].

use std::fmt;
use std::str::FromStr;

use glam::{Mat3, Mat4, Quat, Vec3};
use serde::Deserialize;

/// Forward axis of the host scene convention
pub const HOST_FORWARD: Axis = Axis::Y;
/// Up axis of the host scene convention
pub const HOST_UP: Axis = Axis::Z;

/// Errors produced while building transforms
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MathError {
    #[error("invalid axis '{0}' (expected one of X, Y, Z, -X, -Y, -Z)")]
    InvalidAxis(String),

    #[error("forward axis {forward} and up axis {up} must not be parallel")]
    ParallelAxes { forward: Axis, up: Axis },
}

// ============================================================================
// Axis remapping
// ============================================================================

/// Signed coordinate axis, as chosen in export settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Axis {
    X,
    Y,
    Z,
    NegX,
    NegY,
    NegZ,
}

impl Axis {
    /// Unit vector pointing along this axis
    pub const fn vector(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
            Axis::NegX => Vec3::NEG_X,
            Axis::NegY => Vec3::NEG_Y,
            Axis::NegZ => Vec3::NEG_Z,
        }
    }

    /// Two axes are parallel if they share a coordinate, regardless of sign
    pub fn is_parallel_to(self, other: Axis) -> bool {
        self.vector().abs() == other.vector().abs()
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
            Axis::NegX => "-X",
            Axis::NegY => "-Y",
            Axis::NegZ => "-Z",
        };
        f.write_str(s)
    }
}

impl FromStr for Axis {
    type Err = MathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "X" | "+X" => Ok(Axis::X),
            "Y" | "+Y" => Ok(Axis::Y),
            "Z" | "+Z" => Ok(Axis::Z),
            "-X" => Ok(Axis::NegX),
            "-Y" => Ok(Axis::NegY),
            "-Z" => Ok(Axis::NegZ),
            _ => Err(MathError::InvalidAxis(s.to_string())),
        }
    }
}

impl TryFrom<String> for Axis {
    type Error = MathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Orthonormal basis with columns (right, forward, up)
fn orientation_basis(forward: Axis, up: Axis) -> Result<Mat3, MathError> {
    if forward.is_parallel_to(up) {
        return Err(MathError::ParallelAxes { forward, up });
    }
    let f = forward.vector();
    let u = up.vector();
    Ok(Mat3::from_cols(f.cross(u), f, u))
}

/// Rotation that carries the (forward, up) frame `from` onto the frame `to`
///
/// Both frames are right-handed, so the result is always a proper rotation
/// (determinant +1).
pub fn axis_conversion(
    from_forward: Axis,
    from_up: Axis,
    to_forward: Axis,
    to_up: Axis,
) -> Result<Mat3, MathError> {
    let from = orientation_basis(from_forward, from_up)?;
    let to = orientation_basis(to_forward, to_up)?;
    // Bases are orthonormal, so the transpose is the inverse
    Ok(to * from.transpose())
}

/// Global export transform: uniform scale composed with the host → target axis remap
pub fn global_matrix(scale: f32, forward: Axis, up: Axis) -> Result<Mat4, MathError> {
    let remap = axis_conversion(HOST_FORWARD, HOST_UP, forward, up)?;
    Ok(Mat4::from_scale(Vec3::splat(scale)) * Mat4::from_mat3(remap))
}

/// Matrix for transforming normals (inverse transpose of the upper 3×3)
///
/// Singular matrices fall back to the plain upper 3×3.
pub fn normal_matrix(m: Mat4) -> Mat3 {
    let m3 = Mat3::from_mat4(m);
    if m3.determinant() == 0.0 {
        m3
    } else {
        m3.inverse().transpose()
    }
}

/// True when the transform mirrors geometry (negative determinant)
pub fn is_mirrored(m: Mat4) -> bool {
    m.determinant() < 0.0
}

// ============================================================================
// Rotation modes
// ============================================================================

/// Euler axis order. `XYZ` applies X first, then Y, then Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum EulerOrder {
    XYZ,
    XZY,
    YXZ,
    YZX,
    ZXY,
    ZYX,
}

impl EulerOrder {
    /// Axis indices in application order
    const fn axes(self) -> [usize; 3] {
        match self {
            EulerOrder::XYZ => [0, 1, 2],
            EulerOrder::XZY => [0, 2, 1],
            EulerOrder::YXZ => [1, 0, 2],
            EulerOrder::YZX => [1, 2, 0],
            EulerOrder::ZXY => [2, 0, 1],
            EulerOrder::ZYX => [2, 1, 0],
        }
    }
}

/// How a pose bone stores its rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RotationMode {
    #[default]
    Quaternion,
    Euler(EulerOrder),
    AxisAngle,
}

/// A rotation value tagged with its representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rotation {
    Quaternion(Quat),
    Euler(EulerOrder, Vec3),
    AxisAngle { axis: Vec3, angle: f32 },
}

impl Rotation {
    /// Convert to quaternion form
    pub fn to_quat(self) -> Quat {
        match self {
            Rotation::Quaternion(q) => q,
            Rotation::Euler(order, angles) => quat_from_euler(order, angles),
            Rotation::AxisAngle { axis, angle } => quat_from_axis_angle(axis, angle),
        }
    }
}

/// Euler angles (radians, stored as X/Y/Z components) to quaternion
///
/// Rotations are extrinsic in the order given: for `XYZ` the result is `Rz · Ry · Rx`.
pub fn quat_from_euler(order: EulerOrder, angles: Vec3) -> Quat {
    let [first, second, third] = order.axes();
    let about = |axis: usize| Quat::from_axis_angle(Vec3::AXES[axis], angles[axis]);
    about(third) * about(second) * about(first)
}

/// Axis-angle to quaternion. A zero-length axis yields the identity.
pub fn quat_from_axis_angle(axis: Vec3, angle: f32) -> Quat {
    let axis = axis.normalize_or_zero();
    if axis == Vec3::ZERO {
        Quat::IDENTITY
    } else {
        Quat::from_axis_angle(axis, angle)
    }
}

/// Quaternion as `[w, x, y, z]`, the component order used in `.ves` tracks
pub fn quat_to_wxyz(q: Quat) -> [f32; 4] {
    [q.w, q.x, q.y, q.z]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const EPSILON: f32 = 1e-5;

    fn assert_vec3_eq(a: Vec3, b: Vec3) {
        assert!(a.abs_diff_eq(b, EPSILON), "{a:?} != {b:?}");
    }

    #[test]
    fn test_axis_parse_and_display() {
        assert_eq!("-z".parse::<Axis>().unwrap(), Axis::NegZ);
        assert_eq!("Y".parse::<Axis>().unwrap(), Axis::Y);
        assert_eq!("+X".parse::<Axis>().unwrap(), Axis::X);
        assert!("W".parse::<Axis>().is_err());
        assert_eq!(Axis::NegY.to_string(), "-Y");
    }

    #[test]
    fn test_default_export_remap() {
        // Host (forward Y, up Z) to engine (forward -Z, up Y)
        let m = axis_conversion(HOST_FORWARD, HOST_UP, Axis::NegZ, Axis::Y).unwrap();
        assert_vec3_eq(m * Vec3::X, Vec3::X);
        assert_vec3_eq(m * Vec3::Y, Vec3::NEG_Z);
        assert_vec3_eq(m * Vec3::Z, Vec3::Y);
        assert!((m.determinant() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_identity_remap() {
        let m = axis_conversion(Axis::Y, Axis::Z, Axis::Y, Axis::Z).unwrap();
        assert!(m.abs_diff_eq(Mat3::IDENTITY, EPSILON));
    }

    #[test]
    fn test_parallel_axes_rejected() {
        assert_eq!(
            axis_conversion(Axis::Y, Axis::Z, Axis::Z, Axis::NegZ),
            Err(MathError::ParallelAxes {
                forward: Axis::Z,
                up: Axis::NegZ
            })
        );
    }

    #[test]
    fn test_global_matrix_scales_after_remap() {
        let m = global_matrix(2.0, Axis::NegZ, Axis::Y).unwrap();
        assert_vec3_eq(m.transform_point3(Vec3::Z), Vec3::new(0.0, 2.0, 0.0));
        assert!(!is_mirrored(m));
    }

    #[test]
    fn test_normal_matrix_non_uniform_scale() {
        let m = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        // Slanted surface normal must tilt away from the stretched axis
        let n = (normal_matrix(m) * Vec3::new(1.0, 1.0, 0.0)).normalize();
        assert!(n.x < n.y);
    }

    #[test]
    fn test_mirror_detection() {
        assert!(is_mirrored(Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0))));
        let double = Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0))
            * Mat4::from_scale(Vec3::new(1.0, -1.0, 1.0));
        assert!(!is_mirrored(double));
    }

    #[test]
    fn test_euler_single_axis() {
        let q = quat_from_euler(EulerOrder::XYZ, Vec3::new(FRAC_PI_2, 0.0, 0.0));
        assert!(q.abs_diff_eq(Quat::from_rotation_x(FRAC_PI_2), EPSILON));

        let q = quat_from_euler(EulerOrder::ZYX, Vec3::new(0.0, 0.0, FRAC_PI_2));
        assert!(q.abs_diff_eq(Quat::from_rotation_z(FRAC_PI_2), EPSILON));
    }

    #[test]
    fn test_euler_order_matters() {
        let angles = Vec3::new(FRAC_PI_2, FRAC_PI_2, 0.0);
        let xyz = quat_from_euler(EulerOrder::XYZ, angles);
        let yxz = quat_from_euler(EulerOrder::YXZ, angles);

        // XYZ: rotate about X first, then Y
        assert_vec3_eq(xyz * Vec3::Y, Vec3::X);
        // YXZ: rotate about Y first, then X
        assert_vec3_eq(yxz * Vec3::Y, Vec3::Z);
    }

    #[test]
    fn test_axis_angle() {
        let q = quat_from_axis_angle(Vec3::new(0.0, 0.0, 2.0), FRAC_PI_2);
        assert_vec3_eq(q * Vec3::X, Vec3::Y);
        assert_eq!(quat_from_axis_angle(Vec3::ZERO, 1.0), Quat::IDENTITY);
    }

    #[test]
    fn test_rotation_dispatch() {
        let expected = Quat::from_rotation_y(0.5);
        let variants = [
            Rotation::Quaternion(expected),
            Rotation::Euler(EulerOrder::ZXY, Vec3::new(0.0, 0.5, 0.0)),
            Rotation::AxisAngle {
                axis: Vec3::Y,
                angle: 0.5,
            },
        ];
        for rotation in variants {
            assert!(rotation.to_quat().abs_diff_eq(expected, EPSILON), "{rotation:?}");
        }
    }

    #[test]
    fn test_quat_to_wxyz() {
        let q = Quat::from_xyzw(0.1, 0.2, 0.3, 0.9);
        assert_eq!(quat_to_wxyz(q), [0.9, 0.1, 0.2, 0.3]);
    }
}
