//! Decoding and encoding errors for `.vem` / `.ves` data

/// Error raised while reading or writing a Vulpes format
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("invalid magic {found:?}, expected {expected:?}")]
    BadMagic { expected: [u8; 4], found: [u8; 4] },

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u16),

    #[error("unexpected end of data at byte {offset} ({needed} more bytes needed)")]
    Truncated { offset: usize, needed: usize },

    #[error("{0} trailing bytes after end of data")]
    TrailingBytes(usize),

    #[error("name at byte {0} is not valid UTF-8")]
    InvalidName(usize),

    #[error("index count {index_count} does not match vertex count {vertex_count}")]
    CountMismatch { vertex_count: u32, index_count: u32 },

    #[error("{section} has {found} entries, expected {expected}")]
    SectionLength {
        section: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("bone table is malformed ({0})")]
    BoneTable(&'static str),

    #[error("too many {what}: {count} (maximum is 255)")]
    TooMany { what: &'static str, count: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
