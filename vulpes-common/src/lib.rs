//! Shared types and utilities for Vulpes Engine assets
//!
//! This crate provides the pieces shared between:
//! - `vulpes-export` (asset pipeline)
//! - engine-side loaders and inspection tools
//!
//! # Modules
//!
//! - [`math`] - Axis remapping, transform composition and rotation-mode → quaternion conversion
//! - [`formats`] - The `.vem` mesh and `.ves` skeleton binary formats

pub mod formats;
pub mod math;

// Re-export commonly used format items
pub use formats::{
    BONES_PER_VERTEX,
    BinarySerializable,
    BoneEntry,
    FormatError,
    MAX_BONES,
    MAX_NAME_LEN,
    SkinWeights,
    TangentBasis,
    // Mesh format
    VEM_FLAG_NORMALS,
    VEM_FLAG_TANGENTS,
    VEM_FLAG_UVS,
    VEM_FLAG_WEIGHTS,
    VEM_MAGIC,
    VEM_VERSION,
    // Skeleton format
    VES_MAGIC,
    VemHeader,
    VemMesh,
    VesAction,
    VesHeader,
    VesSkeleton,
    read_vem,
    read_ves,
    write_vem,
    write_ves,
};

// Re-export commonly used math items
pub use math::{
    Axis, EulerOrder, MathError, Rotation, RotationMode, axis_conversion, global_matrix,
    is_mirrored, normal_matrix, quat_from_axis_angle, quat_from_euler,
};
