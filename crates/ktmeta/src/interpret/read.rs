//! Lenient interpretation of a record's raw fields.

use crate::error::InterpretError;
use crate::interpret::payload::{
    self, PayloadReader, CLASS_FLAGS, CLASS_NAME, CONSTRUCTOR, FUNCTION, MEMBER_FLAGS,
    NESTED_CLASS, PROPERTY, SUPERTYPE, TYPE_ALIAS,
};
use crate::model::{
    ClassMetadata, Constructor, DeclarationContainer, KmClass, KmPackage, Member, MetadataKind,
    MetadataRecord,
};

/// Interprets `record` as one of the structural shapes.
///
/// Unknown kind tags interpret successfully as [`ClassMetadata::Unknown`].
/// Everything else that does not parse is an error.
pub fn read_lenient(record: &MetadataRecord) -> Result<ClassMetadata, InterpretError> {
    check_version(record.version())?;

    match record.metadata_kind() {
        MetadataKind::Class => {
            let bytes = payload::unpack_bytes(record.data1())?;
            let class = read_class(PayloadReader::new(&bytes, record.data2()))?;
            Ok(ClassMetadata::Class(class))
        }
        MetadataKind::FileFacade => {
            let bytes = payload::unpack_bytes(record.data1())?;
            let package = read_package(PayloadReader::new(&bytes, record.data2()))?;
            Ok(ClassMetadata::FileFacade(package))
        }
        MetadataKind::MultiFileClassPart => {
            let bytes = payload::unpack_bytes(record.data1())?;
            let package = read_package(PayloadReader::new(&bytes, record.data2()))?;
            Ok(ClassMetadata::MultiFileClassPart {
                package,
                facade_class_name: record.extra_string().to_owned(),
            })
        }
        MetadataKind::SyntheticClass => {
            let bytes = payload::unpack_bytes(record.data1())?;
            let lambda = read_lambda(PayloadReader::new(&bytes, record.data2()))?;
            Ok(ClassMetadata::SyntheticClass { lambda })
        }
        MetadataKind::MultiFileClassFacade => Ok(ClassMetadata::MultiFileClassFacade {
            part_class_names: record.data1().to_vec(),
        }),
        MetadataKind::Unknown(kind) => Ok(ClassMetadata::Unknown { kind }),
    }
}

fn check_version(version: &[i32]) -> Result<(), InterpretError> {
    match version.first() {
        Some(&major) if major >= 1 => Ok(()),
        _ => Err(InterpretError::IncompatibleVersion {
            version: version.to_vec(),
        }),
    }
}

/// Which member list the next `MEMBER_FLAGS` field applies to.
#[derive(Clone, Copy)]
enum LastMember {
    None,
    Function,
    Property,
    TypeAlias,
}

/// Applies a member-level field to `container`.
fn apply_member_field(
    tag: u64,
    value: u64,
    fields: &PayloadReader<'_>,
    container: &mut DeclarationContainer,
    last: LastMember,
    shape: &'static str,
) -> Result<LastMember, InterpretError> {
    match tag {
        FUNCTION => {
            container.functions.push(Member::new(fields.string(value)?, 0));
            Ok(LastMember::Function)
        }
        PROPERTY => {
            container.properties.push(Member::new(fields.string(value)?, 0));
            Ok(LastMember::Property)
        }
        TYPE_ALIAS => {
            container.type_aliases.push(Member::new(fields.string(value)?, 0));
            Ok(LastMember::TypeAlias)
        }
        MEMBER_FLAGS => {
            let target = match last {
                LastMember::Function => container.functions.last_mut(),
                LastMember::Property => container.properties.last_mut(),
                LastMember::TypeAlias => container.type_aliases.last_mut(),
                LastMember::None => None,
            };
            target.ok_or(InterpretError::OrphanFlags)?.flags = payload::flags(value)?;
            Ok(last)
        }
        tag if payload::is_known_tag(tag) => Err(InterpretError::UnexpectedField { tag, shape }),
        tag => Err(InterpretError::UnknownTag { tag }),
    }
}

fn read_class(mut fields: PayloadReader<'_>) -> Result<KmClass, InterpretError> {
    let mut class = KmClass::default();
    let mut name = None;
    let mut last = LastMember::None;

    while let Some((tag, value)) = fields.next_field()? {
        match tag {
            CLASS_NAME => {
                if name.is_some() {
                    return Err(InterpretError::DuplicateClassName);
                }
                name = Some(fields.string(value)?);
                last = LastMember::None;
            }
            CLASS_FLAGS => class.flags = payload::flags(value)?,
            SUPERTYPE => class.supertypes.push(fields.string(value)?),
            NESTED_CLASS => class.nested_classes.push(fields.string(value)?),
            CONSTRUCTOR => class.constructors.push(Constructor {
                flags: payload::flags(value)?,
            }),
            _ => {
                last = apply_member_field(tag, value, &fields, &mut class.declarations, last, "class")?;
            }
        }
    }

    class.name = name.ok_or(InterpretError::MissingClassName)?;
    Ok(class)
}

fn read_package(mut fields: PayloadReader<'_>) -> Result<KmPackage, InterpretError> {
    let mut package = KmPackage::default();
    let mut last = LastMember::None;

    while let Some((tag, value)) = fields.next_field()? {
        last = apply_member_field(tag, value, &fields, &mut package.declarations, last, "package")?;
    }

    Ok(package)
}

fn read_lambda(mut fields: PayloadReader<'_>) -> Result<Option<Member>, InterpretError> {
    let mut lambda: Option<Member> = None;

    while let Some((tag, value)) = fields.next_field()? {
        match tag {
            FUNCTION if lambda.is_some() => return Err(InterpretError::MultipleLambdas),
            FUNCTION => lambda = Some(Member::new(fields.string(value)?, 0)),
            MEMBER_FLAGS => {
                lambda.as_mut().ok_or(InterpretError::OrphanFlags)?.flags = payload::flags(value)?;
            }
            tag if payload::is_known_tag(tag) => {
                return Err(InterpretError::UnexpectedField {
                    tag,
                    shape: "synthetic class",
                });
            }
            tag => return Err(InterpretError::UnknownTag { tag }),
        }
    }

    Ok(lambda)
}
