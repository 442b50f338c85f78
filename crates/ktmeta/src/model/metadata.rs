//! Structured declaration shapes produced by interpreting a record.

use crate::model::MetadataKind;

/// Declaration visibility, packed into bits 1..=3 of a flag word.
///
/// Bit 0 is the "has annotations" bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Internal,
    Private,
    Protected,
    Public,
    PrivateToThis,
    Local,
}

impl Visibility {
    const SHIFT: i32 = 1;
    const MASK: i32 = 0b111;

    /// Extracts the visibility from a flag word, `None` for reserved values.
    pub fn from_flags(flags: i32) -> Option<Self> {
        match (flags >> Self::SHIFT) & Self::MASK {
            0 => Some(Visibility::Internal),
            1 => Some(Visibility::Private),
            2 => Some(Visibility::Protected),
            3 => Some(Visibility::Public),
            4 => Some(Visibility::PrivateToThis),
            5 => Some(Visibility::Local),
            _ => None,
        }
    }

    /// Returns `flags` with its visibility bits replaced.
    pub fn apply(self, flags: i32) -> i32 {
        let bits = match self {
            Visibility::Internal => 0,
            Visibility::Private => 1,
            Visibility::Protected => 2,
            Visibility::Public => 3,
            Visibility::PrivateToThis => 4,
            Visibility::Local => 5,
        };
        (flags & !(Self::MASK << Self::SHIFT)) | (bits << Self::SHIFT)
    }

    /// Returns true if the declaration is visible outside its module.
    pub fn is_exported(self) -> bool {
        matches!(self, Visibility::Public | Visibility::Protected)
    }
}

/// A named member: function, property or type alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Member {
    /// Simple name.
    pub name: String,
    /// Flag word (visibility, modality, ...).
    pub flags: i32,
}

impl Member {
    /// Creates a member with the given name and flags.
    pub fn new(name: impl Into<String>, flags: i32) -> Self {
        Self {
            name: name.into(),
            flags,
        }
    }

    /// Returns the member's visibility, if the flag bits are valid.
    pub fn visibility(&self) -> Option<Visibility> {
        Visibility::from_flags(self.flags)
    }
}

/// The navigable member list of a class or package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationContainer {
    pub functions: Vec<Member>,
    pub properties: Vec<Member>,
    pub type_aliases: Vec<Member>,
}

impl DeclarationContainer {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the container declares nothing.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.properties.is_empty() && self.type_aliases.is_empty()
    }

    /// Total number of members.
    pub fn len(&self) -> usize {
        self.functions.len() + self.properties.len() + self.type_aliases.len()
    }

    /// Looks up a function by name (first overload wins).
    pub fn function(&self, name: &str) -> Option<&Member> {
        self.functions.iter().find(|m| m.name == name)
    }

    /// Looks up a property by name.
    pub fn property(&self, name: &str) -> Option<&Member> {
        self.properties.iter().find(|m| m.name == name)
    }

    /// Iterates over every member visible outside its module.
    pub fn exported(&self) -> impl Iterator<Item = &Member> {
        self.functions
            .iter()
            .chain(&self.properties)
            .chain(&self.type_aliases)
            .filter(|m| m.visibility().is_some_and(Visibility::is_exported))
    }
}

/// A class constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Constructor {
    pub flags: i32,
}

/// An interpreted class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KmClass {
    /// JVM internal name, e.g. `com/example/Foo`.
    pub name: String,
    pub flags: i32,
    pub supertypes: Vec<String>,
    pub nested_classes: Vec<String>,
    pub constructors: Vec<Constructor>,
    pub declarations: DeclarationContainer,
}

/// An interpreted package fragment (file facade or multi-file part).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KmPackage {
    pub declarations: DeclarationContainer,
}

/// The closed set of shapes a record can be interpreted as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassMetadata {
    Class(KmClass),
    FileFacade(KmPackage),
    /// A synthetic class, carrying the lambda's function when it has one.
    SyntheticClass { lambda: Option<Member> },
    MultiFileClassFacade { part_class_names: Vec<String> },
    MultiFileClassPart {
        package: KmPackage,
        facade_class_name: String,
    },
    /// A kind tag this interpreter does not understand.
    Unknown { kind: i32 },
}

impl ClassMetadata {
    /// Returns the kind this shape is written with.
    pub fn kind(&self) -> MetadataKind {
        match self {
            ClassMetadata::Class(_) => MetadataKind::Class,
            ClassMetadata::FileFacade(_) => MetadataKind::FileFacade,
            ClassMetadata::SyntheticClass { .. } => MetadataKind::SyntheticClass,
            ClassMetadata::MultiFileClassFacade { .. } => MetadataKind::MultiFileClassFacade,
            ClassMetadata::MultiFileClassPart { .. } => MetadataKind::MultiFileClassPart,
            ClassMetadata::Unknown { kind } => MetadataKind::Unknown(*kind),
        }
    }

    /// Projects the declaration container, for shapes that have one.
    pub fn declaration_container(&self) -> Option<&DeclarationContainer> {
        match self {
            ClassMetadata::Class(class) => Some(&class.declarations),
            ClassMetadata::FileFacade(package) => Some(&package.declarations),
            ClassMetadata::MultiFileClassPart { package, .. } => Some(&package.declarations),
            ClassMetadata::SyntheticClass { .. }
            | ClassMetadata::MultiFileClassFacade { .. }
            | ClassMetadata::Unknown { .. } => None,
        }
    }
}
