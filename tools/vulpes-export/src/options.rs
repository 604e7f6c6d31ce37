//! Export settings
//!
//! Defaults match the exporter's historical defaults: modifiers applied,
//! normals/UVs/tangents exported, weights off, scale 1, engine frame
//! forward `-Z` and up `Y`.

use serde::Deserialize;
use vulpes_common::{Axis, MathError};

use crate::error::ExportError;

/// Smallest accepted global scale
pub const MIN_SCALE: f32 = 0.01;
/// Largest accepted global scale
pub const MAX_SCALE: f32 = 1000.0;
/// Default sampling rate used when importing animation
pub const DEFAULT_FRAME_RATE: f32 = 24.0;

/// Settings for `.vem` export
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct MeshExportOptions {
    /// Use the modifier-evaluated mesh instead of the base mesh
    pub apply_modifiers: bool,
    pub export_normals: bool,
    pub export_uvs: bool,
    pub export_tangents: bool,
    /// Requires a parent armature
    pub export_armature_weights: bool,
    pub scale: f32,
    pub forward: Axis,
    pub up: Axis,
}

impl Default for MeshExportOptions {
    fn default() -> Self {
        Self {
            apply_modifiers: true,
            export_normals: true,
            export_uvs: true,
            export_tangents: true,
            export_armature_weights: false,
            scale: 1.0,
            forward: Axis::NegZ,
            up: Axis::Y,
        }
    }
}

impl MeshExportOptions {
    pub fn validate(&self) -> Result<(), ExportError> {
        if !(MIN_SCALE..=MAX_SCALE).contains(&self.scale) {
            return Err(ExportError::InvalidScale(self.scale));
        }
        if self.forward.is_parallel_to(self.up) {
            return Err(MathError::ParallelAxes {
                forward: self.forward,
                up: self.up,
            }
            .into());
        }
        Ok(())
    }
}

/// Settings for `.ves` export
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SkeletonExportOptions {
    /// Frames per second used to turn source keyframe times into frames,
    /// and the rate written to the `.ves` header
    pub frame_rate: f32,
}

impl Default for SkeletonExportOptions {
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
        }
    }
}

impl SkeletonExportOptions {
    pub fn validate(&self) -> Result<(), ExportError> {
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(ExportError::InvalidFrameRate(self.frame_rate));
        }
        Ok(())
    }
}
