//! Vulpes Engine Mesh binary format (.vem)
//!
//! Flat, per-corner vertex buffer: one vertex per triangle corner, no sharing.
//! All integers little-endian, all floats IEEE-754 f32.
//!
//! # Layout
//! ```text
//! 0x00: magic "VULP"
//! 0x04: version u16 (5)
//! 0x06: flags u8
//!         bit0 = normals, bit1 = UVs, bit2 = tangents + bitangents, bit3 = bone weights
//! 0x07: vertex_count u32 (= 3 × triangle_count)
//! 0x0B: index_count u32 (= vertex_count)
//! 0x0F: positions       vertex_count × 3 × f32
//! var:  indices         index_count × u32 (0, 1, 2, ..., vertex_count - 1)
//! var:  normals         vertex_count × 3 × f32             (bit0)
//! var:  tangents        vertex_count × 3 × f32             (bit2)
//! var:  bitangents      vertex_count × 3 × f32             (bit2)
//! var:  uvs             vertex_count × 2 × f32, V stored as 1 - v   (bit1)
//! var:  bone table      per bone: u8 index, u8 name_len, name bytes  (bit3)
//! var:  bone indices    vertex_count × 4 × u32             (bit3)
//! var:  bone weights    vertex_count × 4 × f32             (bit3)
//! ```
//!
//! Absent sections occupy zero bytes. The bone table has no count of its own:
//! a reader sizes it from what remains after subtracting the fixed-size
//! weight payload (`vertex_count × 32` bytes).

use std::io::Write;

use super::bones::BoneEntry;
use super::io::{ByteReader, write_f32_arrays, write_u32_arrays};
use super::{FormatError, MAX_BONES};

/// File magic
pub const VEM_MAGIC: [u8; 4] = *b"VULP";
/// Current (and only supported) format revision
pub const VEM_VERSION: u16 = 5;

/// Flag: normals section present
pub const VEM_FLAG_NORMALS: u8 = 1 << 0;
/// Flag: UV section present
pub const VEM_FLAG_UVS: u8 = 1 << 1;
/// Flag: tangent and bitangent sections present
pub const VEM_FLAG_TANGENTS: u8 = 1 << 2;
/// Flag: bone table and per-vertex weights present
pub const VEM_FLAG_WEIGHTS: u8 = 1 << 3;

/// Bone influences stored per vertex
pub const BONES_PER_VERTEX: usize = 4;

/// Size of one vertex's weight payload (4 × u32 indices + 4 × f32 weights)
const WEIGHT_BYTES_PER_VERTEX: usize = BONES_PER_VERTEX * 8;

/// VEM header (15 bytes, magic included)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VemHeader {
    pub version: u16,
    pub flags: u8,
    pub vertex_count: u32,
    pub index_count: u32,
}

impl VemHeader {
    pub const SIZE: usize = 15;

    pub fn new(flags: u8, vertex_count: u32) -> Self {
        Self {
            version: VEM_VERSION,
            flags,
            vertex_count,
            index_count: vertex_count,
        }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&VEM_MAGIC);
        bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
        bytes[6] = self.flags;
        bytes[7..11].copy_from_slice(&self.vertex_count.to_le_bytes());
        bytes[11..15].copy_from_slice(&self.index_count.to_le_bytes());
        bytes
    }

    /// Read header from bytes. Returns `None` if too short or the magic is wrong.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE || bytes[0..4] != VEM_MAGIC {
            return None;
        }
        Some(Self {
            version: u16::from_le_bytes([bytes[4], bytes[5]]),
            flags: bytes[6],
            vertex_count: u32::from_le_bytes([bytes[7], bytes[8], bytes[9], bytes[10]]),
            index_count: u32::from_le_bytes([bytes[11], bytes[12], bytes[13], bytes[14]]),
        })
    }

    pub fn has_normals(&self) -> bool {
        self.flags & VEM_FLAG_NORMALS != 0
    }

    pub fn has_uvs(&self) -> bool {
        self.flags & VEM_FLAG_UVS != 0
    }

    pub fn has_tangents(&self) -> bool {
        self.flags & VEM_FLAG_TANGENTS != 0
    }

    pub fn has_weights(&self) -> bool {
        self.flags & VEM_FLAG_WEIGHTS != 0
    }
}

/// Per-corner tangent frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TangentBasis {
    pub tangents: Vec<[f32; 3]>,
    pub bitangents: Vec<[f32; 3]>,
}

/// Bone table plus four (bone, weight) slots per vertex
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SkinWeights {
    pub bones: Vec<BoneEntry>,
    pub bone_indices: Vec<[u32; BONES_PER_VERTEX]>,
    pub weights: Vec<[f32; BONES_PER_VERTEX]>,
}

/// Decoded (or ready-to-encode) contents of a `.vem` file
///
/// UVs are held exactly as stored, i.e. with V already flipped.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VemMesh {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub tangent_basis: Option<TangentBasis>,
    pub uvs: Option<Vec<[f32; 2]>>,
    pub skin: Option<SkinWeights>,
}

impl VemMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Flags byte derived from which sections are present
    pub fn flags(&self) -> u8 {
        let mut flags = 0u8;
        if self.normals.is_some() {
            flags |= VEM_FLAG_NORMALS;
        }
        if self.uvs.is_some() {
            flags |= VEM_FLAG_UVS;
        }
        if self.tangent_basis.is_some() {
            flags |= VEM_FLAG_TANGENTS;
        }
        if self.skin.is_some() {
            flags |= VEM_FLAG_WEIGHTS;
        }
        flags
    }

    pub fn header(&self) -> VemHeader {
        VemHeader {
            version: VEM_VERSION,
            flags: self.flags(),
            vertex_count: self.positions.len() as u32,
            index_count: self.indices.len() as u32,
        }
    }

    /// Check that every section matches the vertex count
    pub fn validate(&self) -> Result<(), FormatError> {
        let n = self.vertex_count();
        if u32::try_from(n).is_err() {
            return Err(FormatError::SectionLength {
                section: "positions",
                expected: u32::MAX as usize,
                found: n,
            });
        }
        check_len("indices", n, self.indices.len())?;
        if let Some(normals) = &self.normals {
            check_len("normals", n, normals.len())?;
        }
        if let Some(basis) = &self.tangent_basis {
            check_len("tangents", n, basis.tangents.len())?;
            check_len("bitangents", n, basis.bitangents.len())?;
        }
        if let Some(uvs) = &self.uvs {
            check_len("uvs", n, uvs.len())?;
        }
        if let Some(skin) = &self.skin {
            if skin.bones.len() > MAX_BONES {
                return Err(FormatError::TooMany {
                    what: "bones",
                    count: skin.bones.len(),
                });
            }
            check_len("bone indices", n, skin.bone_indices.len())?;
            check_len("bone weights", n, skin.weights.len())?;
        }
        Ok(())
    }

    /// Total encoded size in bytes
    pub fn encoded_len(&self) -> usize {
        let n = self.vertex_count();
        let mut size = VemHeader::SIZE + n * 12 + self.indices.len() * 4;
        if self.normals.is_some() {
            size += n * 12;
        }
        if self.tangent_basis.is_some() {
            size += n * 24;
        }
        if self.uvs.is_some() {
            size += n * 8;
        }
        if let Some(skin) = &self.skin {
            size += skin.bones.iter().map(BoneEntry::encoded_len).sum::<usize>();
            size += n * WEIGHT_BYTES_PER_VERTEX;
        }
        size
    }
}

fn check_len(section: &'static str, expected: usize, found: usize) -> Result<(), FormatError> {
    if expected != found {
        return Err(FormatError::SectionLength {
            section,
            expected,
            found,
        });
    }
    Ok(())
}

/// Write a complete `.vem` file
pub fn write_vem<W: Write>(w: &mut W, mesh: &VemMesh) -> Result<(), FormatError> {
    mesh.validate()?;

    w.write_all(&mesh.header().to_bytes())?;
    write_f32_arrays(w, &mesh.positions)?;

    let mut index_bytes = Vec::with_capacity(mesh.indices.len() * 4);
    for i in &mesh.indices {
        index_bytes.extend_from_slice(&i.to_le_bytes());
    }
    w.write_all(&index_bytes)?;

    if let Some(normals) = &mesh.normals {
        write_f32_arrays(w, normals)?;
    }

    if let Some(basis) = &mesh.tangent_basis {
        write_f32_arrays(w, &basis.tangents)?;
        write_f32_arrays(w, &basis.bitangents)?;
    }

    if let Some(uvs) = &mesh.uvs {
        write_f32_arrays(w, uvs)?;
    }

    if let Some(skin) = &mesh.skin {
        for bone in &skin.bones {
            bone.write(w)?;
        }
        write_u32_arrays(w, &skin.bone_indices)?;
        write_f32_arrays(w, &skin.weights)?;
    }

    Ok(())
}

/// Parse a complete `.vem` file
pub fn read_vem(bytes: &[u8]) -> Result<VemMesh, FormatError> {
    let mut reader = ByteReader::new(bytes);
    let header: VemHeader = reader.header()?;
    if header.version != VEM_VERSION {
        return Err(FormatError::UnsupportedVersion(header.version));
    }
    let VemHeader {
        vertex_count,
        index_count,
        ..
    } = header;
    if vertex_count != index_count {
        return Err(FormatError::CountMismatch {
            vertex_count,
            index_count,
        });
    }
    let n = vertex_count as usize;

    let positions = reader.f32_arrays::<3>(n)?;
    let indices = reader
        .u32_arrays::<1>(index_count as usize)?
        .into_iter()
        .map(|[i]| i)
        .collect();

    let normals = if header.has_normals() {
        Some(reader.f32_arrays::<3>(n)?)
    } else {
        None
    };

    let tangent_basis = if header.has_tangents() {
        let tangents = reader.f32_arrays::<3>(n)?;
        let bitangents = reader.f32_arrays::<3>(n)?;
        Some(TangentBasis {
            tangents,
            bitangents,
        })
    } else {
        None
    };

    let uvs = if header.has_uvs() {
        Some(reader.f32_arrays::<2>(n)?)
    } else {
        None
    };

    let skin = if header.has_weights() {
        Some(read_skin(&mut reader, n)?)
    } else {
        None
    };

    reader.finish()?;

    Ok(VemMesh {
        positions,
        indices,
        normals,
        tangent_basis,
        uvs,
        skin,
    })
}

fn read_skin(reader: &mut ByteReader<'_>, vertex_count: usize) -> Result<SkinWeights, FormatError> {
    let payload = vertex_count.saturating_mul(WEIGHT_BYTES_PER_VERTEX);
    let table_len = reader
        .remaining()
        .checked_sub(payload)
        .ok_or_else(|| FormatError::Truncated {
            offset: reader.position(),
            needed: payload - reader.remaining(),
        })?;

    let table_end = reader.position() + table_len;
    let mut bones = Vec::new();
    while reader.position() < table_end {
        if bones.len() == MAX_BONES {
            return Err(FormatError::BoneTable("more than 255 entries"));
        }
        bones.push(BoneEntry::read(reader)?);
    }
    if reader.position() != table_end {
        return Err(FormatError::BoneTable("last entry overruns the weight data"));
    }

    let bone_indices = reader.u32_arrays::<BONES_PER_VERTEX>(vertex_count)?;
    let weights = reader.f32_arrays::<BONES_PER_VERTEX>(vertex_count)?;

    Ok(SkinWeights {
        bones,
        bone_indices,
        weights,
    })
}
