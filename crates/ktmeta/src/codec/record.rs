//! Record encoding/decoding.
//!
//! Wire layout, in order:
//!
//! ```text
//! kind          i32
//! version       i32 count, then count x i32
//! data1         i32 count, then count x string
//! data2         i32 count, then count x string
//! extra_string  string
//! package_name  string
//! extra_int     i32
//! ```
//!
//! where `string` is an `i32` byte length followed by UTF-8 bytes. There is no
//! header or checksum at this level; framing belongs to the enclosing store
//! (see [`crate::snapshot`]).

use sha2::{Digest, Sha256};
use tracing::trace;

use crate::codec::primitives::{DataInput, DataOutput, Reader, Writer};
use crate::error::{DecodeError, EncodeError};
use crate::limits::{MAX_COLLECTION_LEN, MAX_PREFIX_LEN, MAX_VERSION_LEN};
use crate::model::MetadataRecord;

// =============================================================================
// DECODING
// =============================================================================

/// Reads one record from `input`.
///
/// The stream is left positioned directly after the record.
pub fn read_record<I: DataInput>(input: &mut I) -> Result<MetadataRecord, DecodeError> {
    let kind = input.read_i32("kind")?;
    let version = input.read_collection(MAX_VERSION_LEN, "version", |r| r.read_i32("version"))?;
    let data1 = input.read_collection(MAX_COLLECTION_LEN, "data1", |r| r.read_utf8("data1"))?;
    let data2 = input.read_collection(MAX_COLLECTION_LEN, "data2", |r| r.read_utf8("data2"))?;
    let extra_string = input.read_utf8("extra_string")?;
    let package_name = input.read_utf8("package_name")?;
    let extra_int = input.read_i32("extra_int")?;

    trace!(kind, data1 = data1.len(), data2 = data2.len(), "decoded metadata record");

    Ok(MetadataRecord::new(
        kind,
        Some(version),
        Some(data1),
        Some(data2),
        Some(extra_string),
        Some(package_name),
        extra_int,
    ))
}

/// Decodes a record that occupies the whole of `input`.
pub fn decode_record(input: &[u8]) -> Result<MetadataRecord, DecodeError> {
    let mut reader = Reader::new(input);
    let record = read_record(&mut reader)?;
    if !reader.is_empty() {
        return Err(DecodeError::TrailingBytes {
            count: reader.remaining_len(),
        });
    }
    Ok(record)
}

// =============================================================================
// ENCODING
// =============================================================================

/// Writes one record to `out`.
///
/// Any record whose lengths fit an `i32` prefix encodes; only transport
/// failures fail in practice.
pub fn write_record<O: DataOutput>(record: &MetadataRecord, out: &mut O) -> Result<(), EncodeError> {
    out.write_i32(record.kind(), "kind")?;
    out.write_collection(record.version(), MAX_PREFIX_LEN, "version", |w, v| {
        w.write_i32(*v, "version")
    })?;
    out.write_collection(record.data1(), MAX_PREFIX_LEN, "data1", |w, s| {
        w.write_utf8(s, "data1")
    })?;
    out.write_collection(record.data2(), MAX_PREFIX_LEN, "data2", |w, s| {
        w.write_utf8(s, "data2")
    })?;
    out.write_utf8(record.extra_string(), "extra_string")?;
    out.write_utf8(record.package_name(), "package_name")?;
    out.write_i32(record.extra_int(), "extra_int")
}

/// Encodes a record to a standalone byte vector.
pub fn encode_record(record: &MetadataRecord) -> Result<Vec<u8>, EncodeError> {
    let mut writer = Writer::with_capacity(encoded_len_hint(record));
    write_record(record, &mut writer)?;
    Ok(writer.into_bytes())
}

/// Estimates the encoded size of a record.
fn encoded_len_hint(record: &MetadataRecord) -> usize {
    let strings = |items: &[String]| items.iter().map(|s| 4 + s.len()).sum::<usize>();
    4 * 7
        + 4 * record.version().len()
        + strings(record.data1())
        + strings(record.data2())
        + record.extra_string().len()
        + record.package_name().len()
}

impl MetadataRecord {
    /// SHA-256 of the record's canonical encoding.
    ///
    /// Equal records always hash equal, since encoding is deterministic.
    pub fn content_hash(&self) -> Result<[u8; 32], EncodeError> {
        let bytes = encode_record(self)?;
        Ok(Sha256::digest(&bytes).into())
    }
}
