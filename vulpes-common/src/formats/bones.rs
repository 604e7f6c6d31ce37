//! Bone table entries shared by both formats

use std::io::Write;

use super::FormatError;
use super::io::ByteReader;

/// Maximum bone count (bone indices are stored in a single byte)
pub const MAX_BONES: usize = 255;

/// Maximum encoded length of a bone or action name in bytes
pub const MAX_NAME_LEN: usize = 255;

/// Truncate a name to at most [`MAX_NAME_LEN`] bytes on a character boundary
pub fn truncate_name(name: &str) -> &str {
    if name.len() <= MAX_NAME_LEN {
        return name;
    }
    let mut end = MAX_NAME_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

/// One entry of a bone table: `u8 index, u8 name_len, name bytes`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoneEntry {
    pub index: u8,
    pub name: String,
}

impl BoneEntry {
    pub fn new(index: u8, name: &str) -> Self {
        Self {
            index,
            name: truncate_name(name).to_string(),
        }
    }

    /// Encoded size in bytes
    pub fn encoded_len(&self) -> usize {
        2 + truncate_name(&self.name).len()
    }

    pub(crate) fn write<W: Write>(&self, w: &mut W) -> Result<(), FormatError> {
        w.write_all(&[self.index])?;
        write_name(w, &self.name)
    }

    pub(crate) fn read(reader: &mut ByteReader<'_>) -> Result<Self, FormatError> {
        let index = reader.u8()?;
        let name = reader.name()?;
        Ok(Self { index, name })
    }
}

/// Write a length-prefixed (u8) UTF-8 name
pub(crate) fn write_name<W: Write>(w: &mut W, name: &str) -> Result<(), FormatError> {
    let name = truncate_name(name);
    w.write_all(&[name.len() as u8])?;
    w.write_all(name.as_bytes())?;
    Ok(())
}
