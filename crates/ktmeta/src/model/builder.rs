//! Builder API for ergonomic record construction.
//!
//! # Example
//!
//! ```rust
//! use ktmeta::model::{MetadataKind, RecordBuilder};
//!
//! let record = RecordBuilder::new(MetadataKind::FileFacade)
//!     .version([1, 9, 0])
//!     .data1(["\u{0}payload"])
//!     .package_name("com.example")
//!     .build();
//!
//! assert_eq!(record.kind(), 2);
//! assert!(record.data2().is_empty());
//! ```

use crate::model::MetadataRecord;

/// Builder for a [`MetadataRecord`].
///
/// Unset fields take the same defaults as absent arguments to
/// [`MetadataRecord::new`].
#[derive(Debug, Clone, Default)]
pub struct RecordBuilder {
    kind: i32,
    version: Vec<i32>,
    data1: Vec<String>,
    data2: Vec<String>,
    extra_string: String,
    package_name: String,
    extra_int: i32,
}

impl RecordBuilder {
    /// Creates a builder for the given kind.
    pub fn new(kind: impl Into<i32>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Sets the kind tag.
    pub fn kind(mut self, kind: impl Into<i32>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Sets the metadata format version.
    pub fn version(mut self, version: impl IntoIterator<Item = i32>) -> Self {
        self.version = version.into_iter().collect();
        self
    }

    /// Sets the first payload array.
    pub fn data1<S: Into<String>>(mut self, data1: impl IntoIterator<Item = S>) -> Self {
        self.data1 = data1.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the second payload array.
    pub fn data2<S: Into<String>>(mut self, data2: impl IntoIterator<Item = S>) -> Self {
        self.data2 = data2.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the extra string.
    pub fn extra_string(mut self, extra_string: impl Into<String>) -> Self {
        self.extra_string = extra_string.into();
        self
    }

    /// Sets the package name.
    pub fn package_name(mut self, package_name: impl Into<String>) -> Self {
        self.package_name = package_name.into();
        self
    }

    /// Sets the extra flag word.
    pub fn extra_int(mut self, extra_int: i32) -> Self {
        self.extra_int = extra_int;
        self
    }

    /// Builds the record.
    pub fn build(self) -> MetadataRecord {
        MetadataRecord::new(
            self.kind,
            Some(self.version),
            Some(self.data1),
            Some(self.data2),
            Some(self.extra_string),
            Some(self.package_name),
            self.extra_int,
        )
    }
}

impl From<&MetadataRecord> for RecordBuilder {
    /// Starts from an existing record's fields.
    fn from(record: &MetadataRecord) -> Self {
        Self {
            kind: record.kind(),
            version: record.version().to_vec(),
            data1: record.data1().to_vec(),
            data2: record.data2().to_vec(),
            extra_string: record.extra_string().to_owned(),
            package_name: record.package_name().to_owned(),
            extra_int: record.extra_int(),
        }
    }
}

impl MetadataRecord {
    /// Returns a builder initialised from this record, for deriving a
    /// modified copy.
    pub fn to_builder(&self) -> RecordBuilder {
        RecordBuilder::from(self)
    }
}
