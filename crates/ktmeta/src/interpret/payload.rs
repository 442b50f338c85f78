//! The declaration payload carried in `data1`/`data2`.
//!
//! `data1` holds a byte stream packed one byte per `char` (every char is at
//! most U+00FF) and split across as many strings as needed. `data2` is the
//! string table. The byte stream is a flat sequence of fields:
//!
//! ```text
//! field := tag:varint value:varint
//! ```
//!
//! String-valued fields store an index into the string table. Member flags
//! (tag 9) apply to the member declared immediately before them.

use rustc_hash::FxHashMap;

use crate::codec::primitives::{Reader, Writer};
use crate::error::InterpretError;

pub const CLASS_NAME: u64 = 1;
pub const CLASS_FLAGS: u64 = 2;
pub const SUPERTYPE: u64 = 3;
pub const NESTED_CLASS: u64 = 4;
pub const CONSTRUCTOR: u64 = 5;
pub const FUNCTION: u64 = 6;
pub const PROPERTY: u64 = 7;
pub const TYPE_ALIAS: u64 = 8;
pub const MEMBER_FLAGS: u64 = 9;

/// Returns true for tags this format defines.
pub fn is_known_tag(tag: u64) -> bool {
    (CLASS_NAME..=MEMBER_FLAGS).contains(&tag)
}

/// Unpacks `data1` strings into the payload bytes.
pub fn unpack_bytes(data1: &[String]) -> Result<Vec<u8>, InterpretError> {
    let mut bytes = Vec::with_capacity(data1.iter().map(String::len).sum());
    for chunk in data1 {
        for ch in chunk.chars() {
            let byte = u8::try_from(u32::from(ch)).map_err(|_| InterpretError::CharOutOfRange { ch })?;
            bytes.push(byte);
        }
    }
    Ok(bytes)
}

/// Packs payload bytes into `data1` strings of at most `chunk` chars.
pub fn pack_bytes(bytes: &[u8], chunk: usize) -> Vec<String> {
    bytes
        .chunks(chunk.max(1))
        .map(|part| part.iter().map(|&b| char::from(b)).collect())
        .collect()
}

/// Converts a field value to a flag word.
pub fn flags(value: u64) -> Result<i32, InterpretError> {
    u32::try_from(value)
        .map(|v| v as i32)
        .map_err(|_| InterpretError::FlagsOverflow { value })
}

/// Sequential field reader over an unpacked payload.
pub struct PayloadReader<'a> {
    reader: Reader<'a>,
    strings: &'a [String],
}

impl<'a> PayloadReader<'a> {
    pub fn new(bytes: &'a [u8], strings: &'a [String]) -> Self {
        Self {
            reader: Reader::new(bytes),
            strings,
        }
    }

    /// Reads the next `(tag, value)` pair, `None` at end of payload.
    pub fn next_field(&mut self) -> Result<Option<(u64, u64)>, InterpretError> {
        if self.reader.is_empty() {
            return Ok(None);
        }
        let tag = self.reader.read_varint("payload tag")?;
        let value = self.reader.read_varint("payload value")?;
        Ok(Some((tag, value)))
    }

    /// Resolves a string table index.
    pub fn string(&self, index: u64) -> Result<String, InterpretError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.strings.get(i))
            .cloned()
            .ok_or(InterpretError::StringIndexOutOfBounds {
                index,
                size: self.strings.len(),
            })
    }
}

/// Field writer that interns strings into a table as it goes.
#[derive(Debug, Default)]
pub struct PayloadWriter {
    bytes: Writer,
    strings: Vec<String>,
    index: FxHashMap<String, u64>,
}

impl PayloadWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a raw `(tag, value)` field.
    pub fn field(&mut self, tag: u64, value: u64) {
        self.bytes.write_varint(tag);
        self.bytes.write_varint(value);
    }

    /// Writes a flag-valued field.
    pub fn flags(&mut self, tag: u64, flags: i32) {
        self.field(tag, u64::from(flags as u32));
    }

    /// Writes a string-valued field, interning the string.
    pub fn string(&mut self, tag: u64, s: &str) {
        let index = match self.index.get(s) {
            Some(&index) => index,
            None => {
                let index = self.strings.len() as u64;
                self.strings.push(s.to_owned());
                self.index.insert(s.to_owned(), index);
                index
            }
        };
        self.field(tag, index);
    }

    /// Returns the packed `data1` chunks and the string table.
    pub fn finish(self, chunk: usize) -> (Vec<String>, Vec<String>) {
        (pack_bytes(self.bytes.as_bytes(), chunk), self.strings)
    }
}
