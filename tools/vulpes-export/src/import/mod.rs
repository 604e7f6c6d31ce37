//! Source importers
//!
//! Build a host [`Scene`] from files on disk. Imported geometry is converted
//! to the host convention (Z up, forward +Y) so that export settings behave
//! the same regardless of the source format.

pub mod gltf;
pub mod obj;

use std::path::Path;

use glam::Mat4;
use hashbrown::HashSet;
use vulpes_common::math::{HOST_FORWARD, HOST_UP};
use vulpes_common::{Axis, axis_conversion};

use crate::error::ExportError;
use crate::scene::Scene;

/// Load a scene, picking the importer from the file extension
pub fn load_scene(path: &Path, frame_rate: f32) -> Result<Scene, ExportError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("gltf" | "glb") => self::gltf::load_scene(path, frame_rate),
        Some("obj") => self::obj::load_scene(path, frame_rate),
        _ => Err(ExportError::UnsupportedInput(path.to_path_buf())),
    }
}

/// Rotation from a Y-up source frame (forward -Z) to the host frame
///
/// Maps `(x, y, z)` to `(x, -z, y)`.
pub fn y_up_to_host() -> Mat4 {
    match axis_conversion(Axis::NegZ, Axis::Y, HOST_FORWARD, HOST_UP) {
        Ok(m) => Mat4::from_mat3(m),
        // The axes above are constant and never parallel
        Err(_) => Mat4::IDENTITY,
    }
}

/// Hands out unique names, suffixing repeats with `.001`, `.002`, ...
#[derive(Debug, Default)]
pub struct NameRegistry {
    taken: HashSet<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unique(&mut self, base: &str) -> String {
        let mut name = base.to_string();
        let mut n = 1;
        while self.taken.contains(&name) {
            name = format!("{base}.{n:03}");
            n += 1;
        }
        self.taken.insert(name.clone());
        name
    }
}
