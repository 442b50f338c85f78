//! Data model types.
//!
//! - The immutable [`MetadataRecord`] and its [`RecordBuilder`]
//! - Kind tags ([`MetadataKind`])
//! - Interpreted declaration shapes ([`ClassMetadata`] and friends)

pub mod builder;
pub mod kind;
pub mod metadata;
pub mod record;

pub use builder::RecordBuilder;
pub use kind::MetadataKind;
pub use metadata::{
    ClassMetadata, Constructor, DeclarationContainer, KmClass, KmPackage, Member, Visibility,
};
pub use record::MetadataRecord;
