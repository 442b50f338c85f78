//! The immutable metadata record.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use crate::model::{ClassMetadata, MetadataKind};

/// Raw fields of one class's `kotlin.Metadata` annotation, as observed by a
/// single build.
///
/// Records are immutable: a later build supersedes a record with a new one
/// rather than mutating it. Absent arrays and strings are normalized to empty
/// at construction, so "missing" and "empty" are the same state.
///
/// Equality and hashing of records consider only the seven raw
/// fields; the memoized declaration view is not part of a record's value.
pub struct MetadataRecord {
    kind: i32,
    version: Vec<i32>,
    data1: Vec<String>,
    data2: Vec<String>,
    extra_string: String,
    package_name: String,
    extra_int: i32,
    /// Memoized interpretation outcome; `Some(None)` records a failure.
    pub(crate) interpreted: OnceLock<Option<ClassMetadata>>,
}

impl MetadataRecord {
    /// Creates a record from explicit field values.
    ///
    /// `None` arrays become empty vectors and `None` strings become empty
    /// strings.
    pub fn new(
        kind: i32,
        version: Option<Vec<i32>>,
        data1: Option<Vec<String>>,
        data2: Option<Vec<String>>,
        extra_string: Option<String>,
        package_name: Option<String>,
        extra_int: i32,
    ) -> Self {
        Self {
            kind,
            version: version.unwrap_or_default(),
            data1: data1.unwrap_or_default(),
            data2: data2.unwrap_or_default(),
            extra_string: extra_string.unwrap_or_default(),
            package_name: package_name.unwrap_or_default(),
            extra_int,
            interpreted: OnceLock::new(),
        }
    }

    /// Returns the raw kind tag.
    pub fn kind(&self) -> i32 {
        self.kind
    }

    /// Returns the kind tag as a [`MetadataKind`].
    pub fn metadata_kind(&self) -> MetadataKind {
        MetadataKind::from_i32(self.kind)
    }

    /// Returns the metadata format version.
    pub fn version(&self) -> &[i32] {
        &self.version
    }

    /// Returns the first payload array.
    pub fn data1(&self) -> &[String] {
        &self.data1
    }

    /// Returns the second payload array (string table).
    pub fn data2(&self) -> &[String] {
        &self.data2
    }

    /// Returns the extra string (e.g. a multi-file part's facade class name).
    pub fn extra_string(&self) -> &str {
        &self.extra_string
    }

    /// Returns the package name.
    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// Returns the extra flag word.
    pub fn extra_int(&self) -> i32 {
        self.extra_int
    }
}

impl Default for MetadataRecord {
    fn default() -> Self {
        Self::new(0, None, None, None, None, None, 0)
    }
}

impl Clone for MetadataRecord {
    // The clone is a new instance with its own (empty) memo cell
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            version: self.version.clone(),
            data1: self.data1.clone(),
            data2: self.data2.clone(),
            extra_string: self.extra_string.clone(),
            package_name: self.package_name.clone(),
            extra_int: self.extra_int,
            interpreted: OnceLock::new(),
        }
    }
}

impl PartialEq for MetadataRecord {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.version == other.version
            && self.data1 == other.data1
            && self.data2 == other.data2
            && self.extra_string == other.extra_string
            && self.package_name == other.package_name
            && self.extra_int == other.extra_int
    }
}

impl Eq for MetadataRecord {}

impl Hash for MetadataRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.version.hash(state);
        self.data1.hash(state);
        self.data2.hash(state);
        self.extra_string.hash(state);
        self.package_name.hash(state);
        self.extra_int.hash(state);
    }
}

impl fmt::Debug for MetadataRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataRecord")
            .field("kind", &self.kind)
            .field("version", &self.version)
            .field("data1", &self.data1)
            .field("data2", &self.data2)
            .field("extra_string", &self.extra_string)
            .field("package_name", &self.package_name)
            .field("extra_int", &self.extra_int)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_absent_fields_normalize_to_empty() {
        let record = MetadataRecord::new(1, None, None, None, None, None, 0);
        assert!(record.version().is_empty());
        assert!(record.data1().is_empty());
        assert!(record.data2().is_empty());
        assert_eq!(record.extra_string(), "");
        assert_eq!(record.package_name(), "");
    }

    #[test]
    fn test_absent_equals_explicit_empty() {
        let absent = MetadataRecord::new(2, None, None, None, None, None, 5);
        let empty = MetadataRecord::new(
            2,
            Some(Vec::new()),
            Some(Vec::new()),
            Some(Vec::new()),
            Some(String::new()),
            Some(String::new()),
            5,
        );
        assert_eq!(absent, empty);
    }

    #[test]
    fn test_accessors_project_fields() {
        let record = MetadataRecord::new(
            5,
            Some(vec![1, 9, 0]),
            Some(strings(&["\u{0}a", "b"])),
            Some(strings(&["foo"])),
            Some("com/example/UtilsKt".into()),
            Some("com.example".into()),
            16,
        );
        assert_eq!(record.kind(), 5);
        assert_eq!(record.metadata_kind(), MetadataKind::MultiFileClassPart);
        assert_eq!(record.version(), &[1, 9, 0]);
        assert_eq!(record.data1(), strings(&["\u{0}a", "b"]).as_slice());
        assert_eq!(record.data2(), strings(&["foo"]).as_slice());
        assert_eq!(record.extra_string(), "com/example/UtilsKt");
        assert_eq!(record.package_name(), "com.example");
        assert_eq!(record.extra_int(), 16);
    }

    #[test]
    fn test_order_of_payload_is_significant() {
        let a = MetadataRecord::new(1, None, Some(strings(&["x", "y"])), None, None, None, 0);
        let b = MetadataRecord::new(1, None, Some(strings(&["y", "x"])), None, None, None, 0);
        assert_ne!(a, b);
    }

    #[test]
    fn test_clone_is_equal() {
        let record = MetadataRecord::new(1, Some(vec![2, 0, 0]), None, None, None, Some("p".into()), 0);
        assert_eq!(record.clone(), record);
    }

    #[test]
    fn test_debug_lists_raw_fields() {
        let record = MetadataRecord::new(3, None, None, None, None, Some("pkg".into()), 0);
        let debug = format!("{record:?}");
        assert!(debug.contains("kind: 3"));
        assert!(debug.contains("package_name: \"pkg\""));
    }
}
