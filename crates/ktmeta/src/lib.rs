//! Kotlin class-metadata records for incremental dependency graphs.
//!
//! Every class a Kotlin compiler emits carries a `kotlin.Metadata`
//! annotation. An incremental build records its raw fields per class,
//! persists them, and on the next build asks what changed so it can decide
//! what to recompile.
//!
//! This crate provides:
//! - The immutable [`MetadataRecord`] value
//! - A compact binary codec for records and whole-build [`MetadataSnapshot`]s
//! - A field-group [`Diff`] the dependency graph short-circuits on
//! - A lazy, failure-absorbing view of a record's declarations
//!
//! # Quick Start
//!
//! ```rust
//! use ktmeta::{MetadataRecord, RecordBuilder, MetadataKind};
//! use ktmeta::codec::{decode_record, encode_record};
//!
//! let past = RecordBuilder::new(MetadataKind::Class)
//!     .version([1, 9, 0])
//!     .data1(["X"])
//!     .data2(["Y"])
//!     .package_name("com.example")
//!     .build();
//!
//! // Persist and reload
//! let bytes = encode_record(&past).unwrap();
//! let reloaded = decode_record(&bytes).unwrap();
//! assert_eq!(reloaded, past);
//!
//! // The next build moved the class
//! let current = past.to_builder().package_name("com.sample").build();
//! let diff = current.difference(&reloaded);
//! assert!(diff.package_changed());
//! assert!(!diff.data_changed());
//! assert!(!diff.unchanged());
//! ```
//!
//! # Modules
//!
//! - [`model`]: Records, kinds and interpreted declaration shapes
//! - [`codec`]: Record wire layout over byte slices and streams
//! - [`diff`]: Change detection between two records
//! - [`interpret`]: Lazy structural interpretation
//! - [`snapshot`]: Whole-build snapshots with checksum and compression
//! - [`error`]: Error types
//! - [`limits`]: Decode safety limits
//!
//! # Wire Format
//!
//! A record is its seven fields in declaration order. Integers are 4-byte
//! big-endian, strings are an `i32` byte length followed by UTF-8, and
//! sequences are an `i32` count followed by their elements. There is no
//! framing or version tag; snapshots add both.

pub mod codec;
pub mod diff;
pub mod error;
pub mod interpret;
pub mod limits;
pub mod model;
pub mod snapshot;

// Re-export commonly used types at crate root
pub use codec::{decode_record, encode_record, read_record, write_record};
pub use diff::{ChangeGroup, ChangeSummary, Diff, DiffCapable, Difference};
pub use error::{DecodeError, EncodeError, ErrorCode, InterpretError};
pub use interpret::{LenientInterpreter, MetadataInterpreter, read_lenient, write_class_metadata};
pub use model::{
    ClassMetadata, Constructor, DeclarationContainer, KmClass, KmPackage, Member, MetadataKind,
    MetadataRecord, RecordBuilder, Visibility,
};
pub use snapshot::{ClassChange, EncodeOptions, MetadataSnapshot, decode_snapshot, encode_snapshot};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
