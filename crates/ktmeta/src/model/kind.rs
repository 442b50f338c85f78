//! Structural kind tags carried in a record's `kind` field.

/// The shape a record's raw fields describe.
///
/// Tags outside the known range are preserved as [`MetadataKind::Unknown`]
/// so that a record written by a newer compiler still round-trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    /// An ordinary class, interface, object or annotation class.
    Class,
    /// A file-level declaration container (`FooKt`).
    FileFacade,
    /// A compiler-generated class such as a lambda body.
    SyntheticClass,
    /// The facade of a `@JvmMultifileClass` group.
    MultiFileClassFacade,
    /// One part of a `@JvmMultifileClass` group.
    MultiFileClassPart,
    /// Any other tag.
    Unknown(i32),
}

impl MetadataKind {
    /// Maps a raw tag to a kind.
    pub fn from_i32(tag: i32) -> Self {
        match tag {
            1 => MetadataKind::Class,
            2 => MetadataKind::FileFacade,
            3 => MetadataKind::SyntheticClass,
            4 => MetadataKind::MultiFileClassFacade,
            5 => MetadataKind::MultiFileClassPart,
            other => MetadataKind::Unknown(other),
        }
    }

    /// Returns the raw tag.
    pub fn as_i32(self) -> i32 {
        match self {
            MetadataKind::Class => 1,
            MetadataKind::FileFacade => 2,
            MetadataKind::SyntheticClass => 3,
            MetadataKind::MultiFileClassFacade => 4,
            MetadataKind::MultiFileClassPart => 5,
            MetadataKind::Unknown(tag) => tag,
        }
    }

    /// Returns true if records of this kind can expose a declaration container.
    pub fn has_declarations(self) -> bool {
        matches!(
            self,
            MetadataKind::Class | MetadataKind::FileFacade | MetadataKind::MultiFileClassPart
        )
    }
}

impl From<MetadataKind> for i32 {
    fn from(kind: MetadataKind) -> Self {
        kind.as_i32()
    }
}
