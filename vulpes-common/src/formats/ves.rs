//! Vulpes Engine Skeleton binary format (.ves)
//!
//! Bone table plus every action baked to one sample per integer frame.
//!
//! # Layout
//! ```text
//! Header (10 bytes):
//! 0x00: magic "VULS"
//! 0x04: bone_count u8
//! 0x05: action_count u8
//! 0x06: frame_rate f32
//!
//! Bones (bone_count entries):
//!   u8 bone index, u8 name_len, name bytes
//!
//! Actions (action_count entries):
//!   u8 name_len, name bytes
//!   u32 frame_count
//!   for each bone: frame_count × [x, y, z] f32      (local translation)
//!   for each bone: frame_count × [w, x, y, z] f32   (local rotation)
//! ```

use std::io::Write;

use super::bones::{BoneEntry, write_name};
use super::io::{ByteReader, write_f32_arrays};
use super::{FormatError, MAX_BONES};

/// File magic
pub const VES_MAGIC: [u8; 4] = *b"VULS";

/// VES header (10 bytes, magic included)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VesHeader {
    pub bone_count: u8,
    pub action_count: u8,
    pub frame_rate: f32,
}

impl VesHeader {
    pub const SIZE: usize = 10;

    pub fn new(bone_count: u8, action_count: u8, frame_rate: f32) -> Self {
        Self {
            bone_count,
            action_count,
            frame_rate,
        }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&VES_MAGIC);
        bytes[4] = self.bone_count;
        bytes[5] = self.action_count;
        bytes[6..10].copy_from_slice(&self.frame_rate.to_le_bytes());
        bytes
    }

    /// Read header from bytes. Returns `None` if too short or the magic is wrong.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE || bytes[0..4] != VES_MAGIC {
            return None;
        }
        Some(Self {
            bone_count: bytes[4],
            action_count: bytes[5],
            frame_rate: f32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]),
        })
    }
}

/// One baked action
///
/// `translations[bone][frame]` and `rotations[bone][frame]`, rotations as `[w, x, y, z]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VesAction {
    pub name: String,
    pub frame_count: u32,
    pub translations: Vec<Vec<[f32; 3]>>,
    pub rotations: Vec<Vec<[f32; 4]>>,
}

/// Decoded (or ready-to-encode) contents of a `.ves` file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VesSkeleton {
    pub frame_rate: f32,
    pub bones: Vec<BoneEntry>,
    pub actions: Vec<VesAction>,
}

impl VesSkeleton {
    /// Check counts fit the header and every track covers every frame
    pub fn validate(&self) -> Result<(), FormatError> {
        if self.bones.len() > MAX_BONES {
            return Err(FormatError::TooMany {
                what: "bones",
                count: self.bones.len(),
            });
        }
        if self.actions.len() > u8::MAX as usize {
            return Err(FormatError::TooMany {
                what: "actions",
                count: self.actions.len(),
            });
        }
        for action in &self.actions {
            let frames = action.frame_count as usize;
            check_tracks("translation tracks", self.bones.len(), action.translations.len())?;
            check_tracks("rotation tracks", self.bones.len(), action.rotations.len())?;
            for track in &action.translations {
                check_tracks("translation samples", frames, track.len())?;
            }
            for track in &action.rotations {
                check_tracks("rotation samples", frames, track.len())?;
            }
        }
        Ok(())
    }

    pub fn header(&self) -> VesHeader {
        VesHeader::new(
            self.bones.len() as u8,
            self.actions.len() as u8,
            self.frame_rate,
        )
    }
}

fn check_tracks(section: &'static str, expected: usize, found: usize) -> Result<(), FormatError> {
    if expected != found {
        return Err(FormatError::SectionLength {
            section,
            expected,
            found,
        });
    }
    Ok(())
}

/// Write a complete `.ves` file
pub fn write_ves<W: Write>(w: &mut W, skeleton: &VesSkeleton) -> Result<(), FormatError> {
    skeleton.validate()?;

    w.write_all(&skeleton.header().to_bytes())?;

    for bone in &skeleton.bones {
        bone.write(w)?;
    }

    for action in &skeleton.actions {
        write_name(w, &action.name)?;
        w.write_all(&action.frame_count.to_le_bytes())?;
        for track in &action.translations {
            write_f32_arrays(w, track)?;
        }
        for track in &action.rotations {
            write_f32_arrays(w, track)?;
        }
    }

    Ok(())
}

/// Parse a complete `.ves` file
pub fn read_ves(bytes: &[u8]) -> Result<VesSkeleton, FormatError> {
    let mut reader = ByteReader::new(bytes);
    let header: VesHeader = reader.header()?;
    let bone_count = header.bone_count as usize;
    let action_count = header.action_count as usize;
    let frame_rate = header.frame_rate;

    let bones = (0..bone_count)
        .map(|_| BoneEntry::read(&mut reader))
        .collect::<Result<Vec<_>, _>>()?;

    let mut actions = Vec::with_capacity(action_count);
    for _ in 0..action_count {
        let name = reader.name()?;
        let frame_count = reader.u32()?;
        let frames = frame_count as usize;
        let translations = (0..bone_count)
            .map(|_| reader.f32_arrays::<3>(frames))
            .collect::<Result<Vec<_>, _>>()?;
        let rotations = (0..bone_count)
            .map(|_| reader.f32_arrays::<4>(frames))
            .collect::<Result<Vec<_>, _>>()?;
        actions.push(VesAction {
            name,
            frame_count,
            translations,
            rotations,
        });
    }

    reader.finish()?;

    Ok(VesSkeleton {
        frame_rate,
        bones,
        actions,
    })
}
