//! Primitive encoding/decoding for the record wire format.
//!
//! Integers are fixed-width 32-bit big-endian, strings and collections carry
//! an `i32` length prefix. Varints (LEB128) are only used by snapshot framing
//! and the metadata payload, never by the record layout itself.

use std::io::{Read, Write};

use crate::error::{DecodeError, EncodeError};
use crate::limits::{MAX_PREFIX_LEN, MAX_STRING_LEN, MAX_VARINT_BYTES};

/// Upper bound on speculative preallocation for length-prefixed collections.
const PREALLOC_LIMIT: usize = 1024;

// =============================================================================
// STREAM CAPABILITIES
// =============================================================================

/// Sequential typed read capability over a persisted byte stream.
///
/// Implementors provide the two primitive reads; length-prefixed strings and
/// collections are built on top of them.
pub trait DataInput {
    /// Reads a big-endian `i32`.
    fn read_i32(&mut self, context: &'static str) -> Result<i32, DecodeError>;

    /// Reads exactly `len` bytes and validates them as UTF-8.
    fn read_string_bytes(&mut self, len: usize, field: &'static str) -> Result<String, DecodeError>;

    /// Reads an `i32` length prefix, rejecting negative values and values above `max`.
    fn read_len(&mut self, max: usize, field: &'static str) -> Result<usize, DecodeError> {
        let raw = self.read_i32(field)?;
        if raw < 0 {
            return Err(DecodeError::NegativeLength { field, len: raw });
        }
        let len = raw as usize;
        if len > max {
            return Err(DecodeError::LengthExceedsLimit { field, len, max });
        }
        Ok(len)
    }

    /// Reads a length-prefixed UTF-8 string.
    fn read_utf8(&mut self, field: &'static str) -> Result<String, DecodeError> {
        let len = self.read_len(MAX_STRING_LEN, field)?;
        self.read_string_bytes(len, field)
    }

    /// Reads a count-prefixed collection, decoding each element with `read_elem`.
    fn read_collection<T, F>(
        &mut self,
        max_len: usize,
        field: &'static str,
        mut read_elem: F,
    ) -> Result<Vec<T>, DecodeError>
    where
        Self: Sized,
        F: FnMut(&mut Self) -> Result<T, DecodeError>,
    {
        let count = self.read_len(max_len, field)?;
        let mut items = Vec::with_capacity(count.min(PREALLOC_LIMIT));
        for _ in 0..count {
            items.push(read_elem(&mut *self)?);
        }
        Ok(items)
    }
}

/// Sequential typed write capability, symmetric to [`DataInput`].
pub trait DataOutput {
    /// Writes a big-endian `i32`.
    fn write_i32(&mut self, value: i32, context: &'static str) -> Result<(), EncodeError>;

    /// Writes raw bytes with no prefix.
    fn write_raw(&mut self, bytes: &[u8], context: &'static str) -> Result<(), EncodeError>;

    /// Writes an `i32` length prefix after checking it against `max`.
    fn write_len(&mut self, len: usize, max: usize, field: &'static str) -> Result<(), EncodeError> {
        let max = max.min(i32::MAX as usize);
        if len > max {
            return Err(EncodeError::LengthExceedsLimit { field, len, max });
        }
        self.write_i32(len as i32, field)
    }

    /// Writes a length-prefixed UTF-8 string.
    ///
    /// Only the `i32` prefix bound applies; [`MAX_STRING_LEN`] is a decode limit.
    fn write_utf8(&mut self, s: &str, field: &'static str) -> Result<(), EncodeError> {
        self.write_len(s.len(), MAX_PREFIX_LEN, field)?;
        self.write_raw(s.as_bytes(), field)
    }

    /// Writes a count-prefixed collection, encoding each element with `write_elem`.
    fn write_collection<T, F>(
        &mut self,
        items: &[T],
        max_len: usize,
        field: &'static str,
        mut write_elem: F,
    ) -> Result<(), EncodeError>
    where
        Self: Sized,
        F: FnMut(&mut Self, &T) -> Result<(), EncodeError>,
    {
        self.write_len(items.len(), max_len, field)?;
        for item in items {
            write_elem(&mut *self, item)?;
        }
        Ok(())
    }
}

// =============================================================================
// DECODING
// =============================================================================

/// Reader for decoding an in-memory byte slice.
///
/// Wraps a byte slice and provides methods for reading primitives
/// with bounds checking and error handling.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader from a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the current position in the data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the remaining bytes.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Returns the number of remaining bytes.
    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_byte(&mut self, context: &'static str) -> Result<u8, DecodeError> {
        if self.pos >= self.data.len() {
            return Err(DecodeError::UnexpectedEof { context });
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    /// Reads exactly n bytes.
    #[inline]
    pub fn read_bytes(&mut self, n: usize, context: &'static str) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining_len() {
            return Err(DecodeError::UnexpectedEof { context });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Reads a fixed-size array.
    #[inline]
    pub fn read_array<const N: usize>(&mut self, context: &'static str) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N, context)?);
        Ok(out)
    }

    /// Reads an unsigned varint (LEB128).
    #[inline]
    pub fn read_varint(&mut self, context: &'static str) -> Result<u64, DecodeError> {
        let mut result: u64 = 0;
        let mut shift = 0;

        for i in 0..MAX_VARINT_BYTES {
            let byte = self.read_byte(context)?;
            let value = (byte & 0x7F) as u64;

            if shift >= 64 || (shift == 63 && value > 1) {
                return Err(DecodeError::VarintOverflow);
            }

            result |= value << shift;

            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;

            if i == MAX_VARINT_BYTES - 1 {
                return Err(DecodeError::VarintTooLong);
            }
        }

        Err(DecodeError::VarintTooLong)
    }
}

impl DataInput for Reader<'_> {
    #[inline]
    fn read_i32(&mut self, context: &'static str) -> Result<i32, DecodeError> {
        Ok(i32::from_be_bytes(self.read_array(context)?))
    }

    fn read_string_bytes(&mut self, len: usize, field: &'static str) -> Result<String, DecodeError> {
        let bytes = self.read_bytes(len, field)?;
        // Validate on the borrowed slice, then allocate once
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| DecodeError::InvalidUtf8 { field })
    }
}

/// Reader over any [`std::io::Read`] source.
///
/// Short reads surface as [`DecodeError::UnexpectedEof`]; other transport
/// failures as [`DecodeError::Io`].
#[derive(Debug)]
pub struct StreamReader<R> {
    inner: R,
}

impl<R: Read> StreamReader<R> {
    /// Wraps a byte source.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Returns the wrapped source.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> DataInput for StreamReader<R> {
    fn read_i32(&mut self, context: &'static str) -> Result<i32, DecodeError> {
        let mut buf = [0u8; 4];
        self.inner
            .read_exact(&mut buf)
            .map_err(|e| DecodeError::from_io(context, e))?;
        Ok(i32::from_be_bytes(buf))
    }

    fn read_string_bytes(&mut self, len: usize, field: &'static str) -> Result<String, DecodeError> {
        // take() keeps a lying length prefix from reserving memory up front
        let mut buf = Vec::new();
        (&mut self.inner)
            .take(len as u64)
            .read_to_end(&mut buf)
            .map_err(|e| DecodeError::from_io(field, e))?;
        if buf.len() != len {
            return Err(DecodeError::UnexpectedEof { context: field });
        }
        String::from_utf8(buf).map_err(|_| DecodeError::InvalidUtf8 { field })
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Writer for encoding into an in-memory buffer.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates a new writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Creates a new writer with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Returns a reference to the written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if no bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Writes raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes an unsigned varint (LEB128).
    #[inline]
    pub fn write_varint(&mut self, mut value: u64) {
        let mut buf = [0u8; MAX_VARINT_BYTES];
        let mut len = 0;
        loop {
            let mut byte = (value & 0x7F) as u8;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
            }
            buf[len] = byte;
            len += 1;
            if value == 0 {
                break;
            }
        }
        self.buf.extend_from_slice(&buf[..len]);
    }
}

impl DataOutput for Writer {
    #[inline]
    fn write_i32(&mut self, value: i32, _context: &'static str) -> Result<(), EncodeError> {
        self.buf.extend_from_slice(&value.to_be_bytes());
        Ok(())
    }

    #[inline]
    fn write_raw(&mut self, bytes: &[u8], _context: &'static str) -> Result<(), EncodeError> {
        self.buf.extend_from_slice(bytes);
        Ok(())
    }
}

/// Writer over any [`std::io::Write`] sink.
#[derive(Debug)]
pub struct StreamWriter<W> {
    inner: W,
}

impl<W: Write> StreamWriter<W> {
    /// Wraps a byte sink.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Flushes the wrapped sink.
    pub fn flush(&mut self) -> Result<(), EncodeError> {
        self.inner.flush().map_err(|e| EncodeError::from_io("flush", e))
    }

    /// Returns the wrapped sink.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> DataOutput for StreamWriter<W> {
    fn write_i32(&mut self, value: i32, context: &'static str) -> Result<(), EncodeError> {
        self.write_raw(&value.to_be_bytes(), context)
    }

    fn write_raw(&mut self, bytes: &[u8], context: &'static str) -> Result<(), EncodeError> {
        self.inner
            .write_all(bytes)
            .map_err(|e| EncodeError::from_io(context, e))
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    /// Sink that accepts `budget` bytes and then fails.
    struct FailingSink {
        budget: usize,
    }

    impl Write for FailingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::new(io::ErrorKind::StorageFull, "disk full"));
            }
            let n = buf.len().min(self.budget);
            self.budget -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_i32_is_big_endian() {
        let mut writer = Writer::new();
        writer.write_i32(0x0102_0304, "test").unwrap();
        writer.write_i32(-1, "test").unwrap();
        assert_eq!(writer.as_bytes(), &[1, 2, 3, 4, 0xFF, 0xFF, 0xFF, 0xFF]);

        let mut reader = Reader::new(writer.as_bytes());
        assert_eq!(reader.read_i32("test").unwrap(), 0x0102_0304);
        assert_eq!(reader.read_i32("test").unwrap(), -1);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_string_layout() {
        let mut writer = Writer::new();
        writer.write_utf8("héllo", "test").unwrap();
        // 4-byte length prefix counts UTF-8 bytes, not chars
        assert_eq!(&writer.as_bytes()[..4], &[0, 0, 0, 6]);
        assert_eq!(writer.len(), 10);

        let mut reader = Reader::new(writer.as_bytes());
        assert_eq!(reader.read_utf8("test").unwrap(), "héllo");
    }

    #[test]
    fn test_collection_roundtrip() {
        let items = vec!["a".to_string(), String::new(), "ccc".to_string()];
        let mut writer = Writer::new();
        writer
            .write_collection(&items, 10, "items", |w, s| w.write_utf8(s, "items"))
            .unwrap();

        let mut reader = Reader::new(writer.as_bytes());
        let decoded = reader
            .read_collection(10, "items", |r| r.read_utf8("items"))
            .unwrap();
        assert_eq!(decoded, items);
    }

    #[test]
    fn test_negative_length_rejected() {
        let bytes = (-5i32).to_be_bytes();
        let mut reader = Reader::new(&bytes);
        assert_eq!(
            reader.read_utf8("name"),
            Err(DecodeError::NegativeLength { field: "name", len: -5 })
        );
    }

    #[test]
    fn test_collection_over_limit_rejected() {
        let mut writer = Writer::new();
        writer.write_i32(11, "count").unwrap();
        let mut reader = Reader::new(writer.as_bytes());
        let result = reader.read_collection(10, "items", |r| r.read_i32("items"));
        assert!(matches!(
            result,
            Err(DecodeError::LengthExceedsLimit { len: 11, max: 10, .. })
        ));
    }

    #[test]
    fn test_write_collection_over_limit_rejected() {
        let mut writer = Writer::new();
        let result = writer.write_collection(&[1, 2, 3], 2, "version", |w, v| w.write_i32(*v, "version"));
        assert!(matches!(
            result,
            Err(EncodeError::LengthExceedsLimit { len: 3, max: 2, .. })
        ));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let mut writer = Writer::new();
        writer.write_i32(2, "len").unwrap();
        writer.write_bytes(&[0xC3, 0x28]);
        let mut reader = Reader::new(writer.as_bytes());
        assert_eq!(
            reader.read_utf8("package_name"),
            Err(DecodeError::InvalidUtf8 { field: "package_name" })
        );
    }

    #[test]
    fn test_unexpected_eof() {
        let data = [0u8; 3];
        let mut reader = Reader::new(&data);
        assert_eq!(
            reader.read_i32("kind"),
            Err(DecodeError::UnexpectedEof { context: "kind" })
        );
    }

    #[test]
    fn test_varint_roundtrip() {
        let test_values = [0u64, 1, 127, 128, 255, 256, 16383, 16384, u64::MAX];

        for v in test_values {
            let mut writer = Writer::new();
            writer.write_varint(v);

            let mut reader = Reader::new(writer.as_bytes());
            let decoded = reader.read_varint("test").unwrap();
            assert_eq!(v, decoded, "failed for {}", v);
        }
    }

    #[test]
    fn test_varint_too_long() {
        let data = [0x80u8; 11];
        let mut reader = Reader::new(&data);
        let result = reader.read_varint("test");
        assert!(matches!(result, Err(DecodeError::VarintTooLong)));
    }

    #[test]
    fn test_stream_reader_matches_slice_reader() {
        let mut writer = Writer::new();
        writer.write_i32(42, "n").unwrap();
        writer.write_utf8("kotlin", "s").unwrap();
        let bytes = writer.into_bytes();

        let mut stream = StreamReader::new(bytes.as_slice());
        assert_eq!(stream.read_i32("n").unwrap(), 42);
        assert_eq!(stream.read_utf8("s").unwrap(), "kotlin");
    }

    #[test]
    fn test_stream_reader_truncated_string() {
        let mut writer = Writer::new();
        writer.write_i32(10, "len").unwrap();
        writer.write_bytes(b"short");
        let bytes = writer.into_bytes();

        let mut stream = StreamReader::new(bytes.as_slice());
        assert_eq!(
            stream.read_utf8("extra_string"),
            Err(DecodeError::UnexpectedEof { context: "extra_string" })
        );
    }

    #[test]
    fn test_stream_writer_surfaces_transport_failure() {
        let mut out = StreamWriter::new(FailingSink { budget: 6 });
        out.write_i32(7, "kind").unwrap();
        let err = out.write_utf8("package", "package_name").unwrap_err();
        match err {
            EncodeError::Io { kind, .. } => assert_eq!(kind, io::ErrorKind::StorageFull),
            other => panic!("expected Io, got {other:?}"),
        }
    }
}
