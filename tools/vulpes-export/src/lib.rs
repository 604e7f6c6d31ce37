//! vulpes-export library
//!
//! Turns host scenes (imported from glTF/GLB or OBJ) into Vulpes Engine
//! assets: flattened `.vem` meshes and baked `.ves` skeletons.

pub mod animation;
pub mod error;
pub mod import;
pub mod inspect;
pub mod manifest;
pub mod mesh;
pub mod options;
pub mod scene;
pub mod skeleton;

pub use error::ExportError;
pub use options::{MeshExportOptions, SkeletonExportOptions};
pub use scene::{ObjectKind, Scene};

// Re-export export entry points
pub use mesh::{convert_mesh_to_memory, export_vem};
pub use skeleton::{convert_skeleton_to_memory, export_ves};

// Re-export the formats so callers don't need a direct vulpes-common dependency
pub use vulpes_common::{VemMesh, VesSkeleton, read_vem, read_ves};
