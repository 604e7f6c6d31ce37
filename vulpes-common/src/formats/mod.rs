//! Vulpes Engine binary asset formats
//!
//! Two little-endian formats are produced by the exporter:
//! - [`vem`] - flattened per-corner geometry (`"VULP"`, version 5)
//! - [`ves`] - bone table plus baked per-frame action tracks (`"VULS"`)
//!
//! Both headers implement [`BinarySerializable`]. Only the latest layout of
//! each format is supported; older revisions used different flag bits and
//! 16-bit indices and are rejected by the readers.

mod bones;
mod error;
mod io;
mod serialization;
pub mod vem;
pub mod ves;

pub use bones::{BoneEntry, MAX_BONES, MAX_NAME_LEN, truncate_name};
pub use error::FormatError;
pub use serialization::BinarySerializable;
pub use vem::*;
pub use ves::*;
