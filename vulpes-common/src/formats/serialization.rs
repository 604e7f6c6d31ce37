//! Binary serialization trait for format headers.
//!
//! Both Vulpes headers implement `BinarySerializable`. The readers decode the
//! fixed header through it before walking the variable-length sections, while
//! each header keeps its own `to_bytes()` returning a fixed-size array.

/// Trait for binary-serializable format headers.
///
/// Returns `Vec<u8>` because `[u8; Self::SIZE]` in a trait return type is not
/// expressible on stable Rust. Use the type-specific `to_bytes()` where the
/// array form matters.
///
/// # Example
///
/// ```
/// use vulpes_common::formats::{BinarySerializable, VemHeader};
///
/// let header = VemHeader::new(0x03, 36);
/// let bytes = header.serialize();
/// let parsed = VemHeader::deserialize(&bytes).unwrap();
/// assert_eq!(parsed.vertex_count, 36);
/// ```
pub trait BinarySerializable: Sized {
    /// File magic the header starts with.
    const MAGIC: [u8; 4];

    /// Size of the serialized header in bytes, magic included.
    const SIZE: usize;

    /// Serialize to bytes.
    fn serialize(&self) -> Vec<u8>;

    /// Deserialize from bytes.
    ///
    /// Returns `None` if the byte slice is too short or carries the wrong magic.
    fn deserialize(bytes: &[u8]) -> Option<Self>;
}

impl BinarySerializable for super::VemHeader {
    const MAGIC: [u8; 4] = super::VEM_MAGIC;
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}

impl BinarySerializable for super::VesHeader {
    const MAGIC: [u8; 4] = super::VES_MAGIC;
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}
