//! Snapshots: every record one build observed, keyed by class name.
//!
//! A build persists its snapshot so the next build can diff against it.
//!
//! Uncompressed framing:
//!
//! ```text
//! "KTMS" version:u8 count:i32 (name:string record)* sha256:[u8; 32]
//! ```
//!
//! The checksum covers every byte before it. Compressed framing wraps the
//! whole uncompressed encoding:
//!
//! ```text
//! "KTMSZ" uncompressed_size:varint zstd_frame
//! ```

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::io::Read;

use sha2::{Digest, Sha256};
use tracing::{debug, trace};

use crate::codec::{DataInput, DataOutput, Reader, Writer, read_record, write_record};
use crate::diff::ChangeSummary;
use crate::error::{DecodeError, EncodeError};
use crate::limits::{
    CHECKSUM_LEN, FORMAT_VERSION, MAGIC_COMPRESSED, MAGIC_UNCOMPRESSED, MAX_SNAPSHOT_ENTRIES,
    MAX_SNAPSHOT_SIZE, MIN_FORMAT_VERSION,
};
use crate::model::MetadataRecord;

/// Records of one build, ordered by JVM internal class name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataSnapshot {
    entries: BTreeMap<String, MetadataRecord>,
}

impl MetadataSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record, returning the one it replaced.
    pub fn insert(&mut self, name: impl Into<String>, record: MetadataRecord) -> Option<MetadataRecord> {
        self.entries.insert(name.into(), record)
    }

    pub fn get(&self, name: &str) -> Option<&MetadataRecord> {
        self.entries.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<MetadataRecord> {
        self.entries.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, record)` pairs in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, MetadataRecord> {
        self.entries.iter()
    }

    /// Compares this (current) snapshot against `past`, pairing records by
    /// class name.
    ///
    /// Unchanged classes are omitted. The result is ordered by name.
    pub fn compare(&self, past: &MetadataSnapshot) -> Vec<ClassChange> {
        let mut changes = Vec::new();

        for (name, current) in &self.entries {
            match past.entries.get(name) {
                None => changes.push(ClassChange::Added(name.clone())),
                Some(previous) => {
                    let diff = current.difference(previous);
                    if !diff.unchanged() {
                        changes.push(ClassChange::Changed(name.clone(), diff.summary()));
                    }
                }
            }
        }
        for name in past.entries.keys() {
            if !self.entries.contains_key(name) {
                changes.push(ClassChange::Removed(name.clone()));
            }
        }

        changes.sort_by(|a, b| a.name().cmp(b.name()));
        changes
    }
}

impl FromIterator<(String, MetadataRecord)> for MetadataSnapshot {
    fn from_iter<T: IntoIterator<Item = (String, MetadataRecord)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a MetadataSnapshot {
    type Item = (&'a String, &'a MetadataRecord);
    type IntoIter = btree_map::Iter<'a, String, MetadataRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// How one class differs between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassChange {
    Added(String),
    Removed(String),
    Changed(String, ChangeSummary),
}

impl ClassChange {
    /// The class name this change concerns.
    pub fn name(&self) -> &str {
        match self {
            ClassChange::Added(name) | ClassChange::Removed(name) | ClassChange::Changed(name, _) => {
                name
            }
        }
    }
}

/// Options for encoding snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Wrap the encoding in a zstd frame.
    pub compress: bool,
    /// zstd compression level, used when `compress` is set.
    pub level: i32,
}

impl EncodeOptions {
    /// Compressed encoding at the given zstd level.
    pub fn compressed(level: i32) -> Self {
        Self {
            compress: true,
            level,
        }
    }
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            compress: false,
            level: 3,
        }
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes a snapshot.
pub fn encode_snapshot(snapshot: &MetadataSnapshot, options: EncodeOptions) -> Result<Vec<u8>, EncodeError> {
    let uncompressed = encode_uncompressed(snapshot)?;
    if !options.compress {
        return Ok(uncompressed);
    }

    let compressed = zstd::encode_all(uncompressed.as_slice(), options.level)
        .map_err(|e| EncodeError::CompressionFailed(e.to_string()))?;

    let mut writer = Writer::with_capacity(5 + 10 + compressed.len());
    writer.write_bytes(MAGIC_COMPRESSED);
    writer.write_varint(uncompressed.len() as u64);
    writer.write_bytes(&compressed);

    trace!(
        entries = snapshot.len(),
        uncompressed = uncompressed.len(),
        compressed = writer.len(),
        "encoded compressed snapshot"
    );
    Ok(writer.into_bytes())
}

fn encode_uncompressed(snapshot: &MetadataSnapshot) -> Result<Vec<u8>, EncodeError> {
    let mut writer = Writer::with_capacity(64 + snapshot.len() * 128);

    writer.write_bytes(MAGIC_UNCOMPRESSED);
    writer.write_byte(FORMAT_VERSION);
    writer.write_len(snapshot.len(), MAX_SNAPSHOT_ENTRIES, "snapshot entries")?;
    for (name, record) in snapshot {
        writer.write_utf8(name, "class name")?;
        write_record(record, &mut writer)?;
    }

    let checksum = Sha256::digest(writer.as_bytes());
    writer.write_bytes(&checksum);

    if writer.len() > MAX_SNAPSHOT_SIZE {
        return Err(EncodeError::LengthExceedsLimit {
            field: "snapshot",
            len: writer.len(),
            max: MAX_SNAPSHOT_SIZE,
        });
    }
    Ok(writer.into_bytes())
}

// =============================================================================
// DECODING
// =============================================================================

/// Decodes a snapshot, detecting compressed and uncompressed framing.
pub fn decode_snapshot(input: &[u8]) -> Result<MetadataSnapshot, DecodeError> {
    if input.len() < 4 {
        return Err(DecodeError::UnexpectedEof { context: "magic" });
    }

    // "KTMS" is a prefix of "KTMSZ", so test the longer magic first
    if input.len() >= 5 && &input[0..5] == MAGIC_COMPRESSED {
        let decompressed = decompress_zstd(&input[5..])?;
        decode_uncompressed(&decompressed)
    } else if &input[0..4] == MAGIC_UNCOMPRESSED {
        if input.len() > MAX_SNAPSHOT_SIZE {
            return Err(DecodeError::LengthExceedsLimit {
                field: "snapshot",
                len: input.len(),
                max: MAX_SNAPSHOT_SIZE,
            });
        }
        decode_uncompressed(input)
    } else {
        let mut found = [0u8; 4];
        found.copy_from_slice(&input[0..4]);
        Err(DecodeError::InvalidMagic { found })
    }
}

/// Strips the compressed framing, returning the uncompressed encoding.
pub fn decompress(input: &[u8]) -> Result<Vec<u8>, DecodeError> {
    if input.len() < 5 {
        return Err(DecodeError::UnexpectedEof { context: "magic" });
    }
    if &input[0..5] != MAGIC_COMPRESSED {
        let mut found = [0u8; 4];
        found.copy_from_slice(&input[0..4]);
        return Err(DecodeError::InvalidMagic { found });
    }
    decompress_zstd(&input[5..])
}

fn decode_uncompressed(input: &[u8]) -> Result<MetadataSnapshot, DecodeError> {
    let mut header = Reader::new(input);
    let magic: [u8; 4] = header.read_array("magic")?;
    if &magic != MAGIC_UNCOMPRESSED {
        return Err(DecodeError::InvalidMagic { found: magic });
    }
    let version = header.read_byte("version")?;
    if !(MIN_FORMAT_VERSION..=FORMAT_VERSION).contains(&version) {
        return Err(DecodeError::UnsupportedVersion { version });
    }

    let body_len = input
        .len()
        .checked_sub(CHECKSUM_LEN)
        .filter(|&len| len >= header.position())
        .ok_or(DecodeError::UnexpectedEof { context: "checksum" })?;
    let (body, checksum) = input.split_at(body_len);
    if Sha256::digest(body).as_slice() != checksum {
        return Err(DecodeError::ChecksumMismatch);
    }

    let mut reader = Reader::new(body);
    reader.read_bytes(5, "header")?;
    let count = reader.read_len(MAX_SNAPSHOT_ENTRIES, "snapshot entries")?;

    let mut entries = BTreeMap::new();
    for _ in 0..count {
        let name = reader.read_utf8("class name")?;
        let record = read_record(&mut reader)?;
        if entries.contains_key(&name) {
            return Err(DecodeError::DuplicateEntry { name });
        }
        entries.insert(name, record);
    }

    if !reader.is_empty() {
        return Err(DecodeError::TrailingBytes {
            count: reader.remaining_len(),
        });
    }

    debug!(entries = entries.len(), bytes = input.len(), "decoded snapshot");
    Ok(MetadataSnapshot { entries })
}

fn decompress_zstd(compressed: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut reader = Reader::new(compressed);
    let declared_size = reader.read_varint("uncompressed_size")? as usize;

    if declared_size > MAX_SNAPSHOT_SIZE {
        return Err(DecodeError::LengthExceedsLimit {
            field: "uncompressed_size",
            len: declared_size,
            max: MAX_SNAPSHOT_SIZE,
        });
    }

    let decoder = zstd::Decoder::new(reader.remaining())
        .map_err(|e| DecodeError::DecompressionFailed(e.to_string()))?;

    // Read at most one byte past the declared size so an oversized frame
    // is detected without inflating all of it
    let mut decompressed = Vec::with_capacity(decompressed_capacity(declared_size, compressed.len()));
    decoder
        .take(declared_size as u64 + 1)
        .read_to_end(&mut decompressed)
        .map_err(|e| DecodeError::DecompressionFailed(e.to_string()))?;

    if decompressed.len() != declared_size {
        return Err(DecodeError::UncompressedSizeMismatch {
            declared: declared_size,
            actual: decompressed.len(),
        });
    }

    Ok(decompressed)
}

/// Initial buffer size for a frame declaring `declared_size` bytes.
///
/// The declared size comes from the input, so it is only trusted up to a
/// small multiple of the compressed length; the buffer grows past that.
fn decompressed_capacity(declared_size: usize, compressed_len: usize) -> usize {
    declared_size.min(compressed_len.saturating_mul(4))
}
