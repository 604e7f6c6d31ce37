//! Little-endian read/write helpers

use std::io::Write;

use super::{BinarySerializable, FormatError};

/// Write a slice of fixed-size f32 arrays as tightly packed little-endian floats
pub(crate) fn write_f32_arrays<W: Write, const N: usize>(
    w: &mut W,
    values: &[[f32; N]],
) -> Result<(), FormatError> {
    let flat: &[f32] = bytemuck::cast_slice(values);
    let mut buffer = Vec::with_capacity(flat.len() * 4);
    for f in flat {
        buffer.extend_from_slice(&f.to_le_bytes());
    }
    w.write_all(&buffer)?;
    Ok(())
}

/// Write a slice of fixed-size u32 arrays as tightly packed little-endian integers
pub(crate) fn write_u32_arrays<W: Write, const N: usize>(
    w: &mut W,
    values: &[[u32; N]],
) -> Result<(), FormatError> {
    let flat: &[u32] = bytemuck::cast_slice(values);
    let mut buffer = Vec::with_capacity(flat.len() * 4);
    for v in flat {
        buffer.extend_from_slice(&v.to_le_bytes());
    }
    w.write_all(&buffer)?;
    Ok(())
}

/// Bounds-checked cursor over an in-memory file
pub(crate) struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [u8], FormatError> {
        if self.remaining() < len {
            return Err(FormatError::Truncated {
                offset: self.pos,
                needed: len - self.remaining(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn magic(&mut self, expected: [u8; 4]) -> Result<(), FormatError> {
        let found: [u8; 4] = self.array()?;
        if found != expected {
            return Err(FormatError::BadMagic { expected, found });
        }
        Ok(())
    }

    /// Fixed-size header at the cursor, magic checked first
    pub fn header<H: BinarySerializable>(&mut self) -> Result<H, FormatError> {
        let start = self.pos;
        self.magic(H::MAGIC)?;
        self.take(H::SIZE - H::MAGIC.len())?;
        H::deserialize(&self.bytes[start..self.pos]).ok_or(FormatError::Truncated {
            offset: start,
            needed: H::SIZE,
        })
    }

    pub fn array<const N: usize>(&mut self) -> Result<[u8; N], FormatError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.take(1)?[0])
    }

    pub fn u32(&mut self) -> Result<u32, FormatError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    /// Length-prefixed (u8) UTF-8 name
    pub fn name(&mut self) -> Result<String, FormatError> {
        let len = self.u8()? as usize;
        let offset = self.pos;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| FormatError::InvalidName(offset))
    }

    pub fn f32_arrays<const N: usize>(&mut self, count: usize) -> Result<Vec<[f32; N]>, FormatError> {
        let bytes = self.take(count.saturating_mul(N * 4))?;
        Ok(bytes
            .chunks_exact(N * 4)
            .map(|chunk| {
                let mut out = [0.0f32; N];
                for (value, b) in out.iter_mut().zip(chunk.chunks_exact(4)) {
                    *value = f32::from_le_bytes([b[0], b[1], b[2], b[3]]);
                }
                out
            })
            .collect())
    }

    pub fn u32_arrays<const N: usize>(&mut self, count: usize) -> Result<Vec<[u32; N]>, FormatError> {
        let bytes = self.take(count.saturating_mul(N * 4))?;
        Ok(bytes
            .chunks_exact(N * 4)
            .map(|chunk| {
                let mut out = [0u32; N];
                for (value, b) in out.iter_mut().zip(chunk.chunks_exact(4)) {
                    *value = u32::from_le_bytes([b[0], b[1], b[2], b[3]]);
                }
                out
            })
            .collect())
    }

    /// Fail if anything is left over
    pub fn finish(self) -> Result<(), FormatError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(FormatError::TrailingBytes(self.remaining()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{VEM_MAGIC, VemHeader, VesHeader};

    #[test]
    fn test_packed_arrays_are_little_endian() {
        let mut out = Vec::new();
        write_f32_arrays(&mut out, &[[1.0f32, -2.0], [0.5, 4.0]]).unwrap();
        write_u32_arrays(&mut out, &[[7u32, 0x0102_0304]]).unwrap();
        assert_eq!(out.len(), 24);
        assert_eq!(&out[4..8], &(-2.0f32).to_le_bytes());
        assert_eq!(&out[20..24], &[4, 3, 2, 1]);

        let mut reader = ByteReader::new(&out);
        assert_eq!(reader.f32_arrays::<2>(2).unwrap(), vec![[1.0, -2.0], [0.5, 4.0]]);
        assert_eq!(reader.u32_arrays::<2>(1).unwrap(), vec![[7, 0x0102_0304]]);
        reader.finish().unwrap();
    }

    #[test]
    fn test_header_advances_past_fixed_part() {
        let mut bytes = VemHeader::new(0x01, 3).to_bytes().to_vec();
        bytes.push(0xAA);

        let mut reader = ByteReader::new(&bytes);
        let header: VemHeader = reader.header().unwrap();
        assert_eq!(header.vertex_count, 3);
        assert_eq!(reader.position(), VemHeader::SIZE);
        assert_eq!(reader.u8().unwrap(), 0xAA);
    }

    #[test]
    fn test_header_checks_magic_before_length() {
        let mut reader = ByteReader::new(&VEM_MAGIC);
        assert!(matches!(
            reader.header::<VesHeader>(),
            Err(FormatError::BadMagic { .. })
        ));

        let mut reader = ByteReader::new(&VEM_MAGIC);
        assert!(matches!(
            reader.header::<VemHeader>(),
            Err(FormatError::Truncated { offset: 4, needed: 11 })
        ));
    }
}
