//! Export errors
//!
//! Every variant is recoverable at the export entry point; the `Display`
//! text is the message shown to the user.

use std::path::PathBuf;

use vulpes_common::{FormatError, MathError};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no object selected")]
    NoSelectedObject,

    #[error("object '{0}' is not a mesh")]
    ObjectNotMesh(String),

    #[error("object '{0}' is not an armature")]
    ObjectNotArmature(String),

    #[error("mesh '{0}' has no UV layers")]
    NoUvLayers(String),

    #[error("mesh '{name}' is malformed: {reason}")]
    InvalidMesh { name: String, reason: String },

    #[error("mesh '{0}' has no parent armature")]
    NoArmature(String),

    #[error("armature '{name}' has {count} bones (maximum is 255)")]
    TooManyBones { name: String, count: usize },

    #[error("scene has {count} actions (maximum is 255)")]
    TooManyActions { count: usize },

    #[error("action '{action}' spans {count} frames (maximum is {})", crate::animation::MAX_FRAMES)]
    TooManyFrames { action: String, count: u32 },

    #[error("failed to evaluate pose at frame {frame}: {reason}")]
    PoseEvaluation { frame: i32, reason: String },

    #[error("global scale {0} is out of range (0.01 - 1000)")]
    InvalidScale(f32),

    #[error("frame rate {0} must be positive")]
    InvalidFrameRate(f32),

    #[error(transparent)]
    Axis(#[from] MathError),

    #[error("unsupported input {0:?} (use .gltf, .glb or .obj)")]
    UnsupportedInput(PathBuf),

    #[error("failed to import {path:?}: {reason}")]
    Import { path: PathBuf, reason: String },

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    pub(crate) fn import(path: &std::path::Path, reason: impl ToString) -> Self {
        Self::Import {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}
