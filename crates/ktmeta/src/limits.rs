//! Decode safety limits and snapshot framing constants.
//!
//! Counts and lengths read from a stream are checked against these before
//! anything is allocated, so a corrupted prefix cannot trigger a huge
//! allocation. Record encoding only enforces [`MAX_PREFIX_LEN`].

/// Magic bytes of an uncompressed snapshot.
pub const MAGIC_UNCOMPRESSED: &[u8; 4] = b"KTMS";

/// Magic bytes of a zstd-compressed snapshot.
pub const MAGIC_COMPRESSED: &[u8; 5] = b"KTMSZ";

/// Current snapshot format version.
pub const FORMAT_VERSION: u8 = 1;

/// Oldest snapshot format version this crate can read.
pub const MIN_FORMAT_VERSION: u8 = 1;

/// Maximum byte length of a single string (16 MiB).
pub const MAX_STRING_LEN: usize = 16 * 1024 * 1024;

/// Largest length or count an `i32` prefix can carry.
pub const MAX_PREFIX_LEN: usize = i32::MAX as usize;

/// Maximum element count of a decoded `data1`/`data2` string collection.
pub const MAX_COLLECTION_LEN: usize = 1 << 20;

/// Maximum element count of a decoded `version` sequence.
pub const MAX_VERSION_LEN: usize = MAX_COLLECTION_LEN;

/// Maximum number of records in a snapshot.
pub const MAX_SNAPSHOT_ENTRIES: usize = 1 << 22;

/// Maximum uncompressed snapshot size (1 GiB).
pub const MAX_SNAPSHOT_SIZE: usize = 1024 * 1024 * 1024;

/// Maximum varint length in bytes.
pub const MAX_VARINT_BYTES: usize = 10;

/// Characters per `data1` string produced by the payload writer.
pub const MAX_PAYLOAD_CHUNK: usize = 65_535;

/// Length of the SHA-256 checksum trailing an uncompressed snapshot.
pub const CHECKSUM_LEN: usize = 32;
