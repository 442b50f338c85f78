//! Error types for record encoding/decoding and metadata interpretation.

use std::io;

use thiserror::Error;

/// Coarse classification of decode failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E001: Invalid snapshot magic/version
    InvalidMagicOrVersion,
    /// E002: Snapshot integrity failure (checksum, duplicate entries)
    Integrity,
    /// E003: Underlying stream failure
    Transport,
    /// E004: Invalid UTF-8 encoding
    InvalidUtf8,
    /// E005: Truncated or malformed layout
    MalformedEncoding,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::InvalidMagicOrVersion => "E001",
            ErrorCode::Integrity => "E002",
            ErrorCode::Transport => "E003",
            ErrorCode::InvalidUtf8 => "E004",
            ErrorCode::MalformedEncoding => "E005",
        }
    }
}

/// Error while reading a record or snapshot from a byte stream.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    // === E001: Invalid magic/version ===
    #[error("[E001] invalid magic bytes: expected KTMS or KTMSZ, found {found:?}")]
    InvalidMagic { found: [u8; 4] },

    #[error("[E001] unsupported snapshot format version: {version}")]
    UnsupportedVersion { version: u8 },

    // === E002: Integrity ===
    #[error("[E002] snapshot checksum mismatch")]
    ChecksumMismatch,

    #[error("[E002] duplicate snapshot entry for class {name:?}")]
    DuplicateEntry { name: String },

    // === E003: Transport ===
    #[error("[E003] stream error while reading {context}: {message}")]
    Io {
        context: &'static str,
        kind: io::ErrorKind,
        message: String,
    },

    // === E004: Invalid UTF-8 ===
    #[error("[E004] invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },

    // === E005: Malformed encoding ===
    #[error("[E005] unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("[E005] {field} has negative length {len}")]
    NegativeLength { field: &'static str, len: i32 },

    #[error("[E005] {field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("[E005] varint exceeds maximum length (10 bytes)")]
    VarintTooLong,

    #[error("[E005] varint overflow (value exceeds u64)")]
    VarintOverflow,

    #[error("[E005] {count} unexpected trailing bytes")]
    TrailingBytes { count: usize },

    #[error("[E005] zstd decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("[E005] decompressed size {actual} doesn't match declared {declared}")]
    UncompressedSizeMismatch { declared: usize, actual: usize },
}

impl DecodeError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            DecodeError::InvalidMagic { .. } | DecodeError::UnsupportedVersion { .. } => {
                ErrorCode::InvalidMagicOrVersion
            }
            DecodeError::ChecksumMismatch | DecodeError::DuplicateEntry { .. } => {
                ErrorCode::Integrity
            }
            DecodeError::Io { .. } => ErrorCode::Transport,
            DecodeError::InvalidUtf8 { .. } => ErrorCode::InvalidUtf8,
            _ => ErrorCode::MalformedEncoding,
        }
    }

    /// Converts a stream failure, treating a short read as truncation.
    pub fn from_io(context: &'static str, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            DecodeError::UnexpectedEof { context }
        } else {
            DecodeError::Io {
                context,
                kind: err.kind(),
                message: err.to_string(),
            }
        }
    }
}

/// Error while writing a record or snapshot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("{field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("stream error while writing {context}: {message}")]
    Io {
        context: &'static str,
        kind: io::ErrorKind,
        message: String,
    },

    #[error("zstd compression failed: {0}")]
    CompressionFailed(String),
}

impl EncodeError {
    /// Converts a stream failure raised while writing `context`.
    pub fn from_io(context: &'static str, err: io::Error) -> Self {
        EncodeError::Io {
            context,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Error while interpreting a record's raw fields as structured metadata.
///
/// These never reach callers of the declaration view; they are logged and
/// recorded as an absent result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InterpretError {
    #[error("incompatible metadata version {version:?}")]
    IncompatibleVersion { version: Vec<i32> },

    #[error("payload character {ch:?} does not fit in a byte")]
    CharOutOfRange { ch: char },

    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] DecodeError),

    #[error("string table index {index} out of bounds (size: {size})")]
    StringIndexOutOfBounds { index: u64, size: usize },

    #[error("unknown payload field tag {tag}")]
    UnknownTag { tag: u64 },

    #[error("field tag {tag} is not allowed in a {shape} payload")]
    UnexpectedField { tag: u64, shape: &'static str },

    #[error("member flags without a preceding member")]
    OrphanFlags,

    #[error("value {value} does not fit in a flag word")]
    FlagsOverflow { value: u64 },

    #[error("class payload has no class name")]
    MissingClassName,

    #[error("class payload declares more than one class name")]
    DuplicateClassName,

    #[error("synthetic class payload declares more than one function")]
    MultipleLambdas,

    #[error("interpreter panicked: {message}")]
    Panicked { message: String },
}
