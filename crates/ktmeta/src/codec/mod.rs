//! Binary encoding/decoding.
//!
//! - [`primitives`]: stream capabilities and fixed-width primitives
//! - [`record`]: the record wire layout

pub mod primitives;
pub mod record;

pub use primitives::{DataInput, DataOutput, Reader, StreamReader, StreamWriter, Writer};
pub use record::{decode_record, encode_record, read_record, write_record};
