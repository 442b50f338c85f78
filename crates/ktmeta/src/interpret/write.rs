//! Producing records from structured metadata.

use crate::interpret::payload::{
    PayloadWriter, CLASS_FLAGS, CLASS_NAME, CONSTRUCTOR, FUNCTION, MEMBER_FLAGS, NESTED_CLASS,
    PROPERTY, SUPERTYPE, TYPE_ALIAS,
};
use crate::limits::MAX_PAYLOAD_CHUNK;
use crate::model::{ClassMetadata, DeclarationContainer, Member, MetadataRecord, RecordBuilder};

/// Writes `metadata` as a record with the given version and package name.
///
/// The result interprets back to `metadata` through
/// [`read_lenient`](crate::interpret::read_lenient), except for
/// [`ClassMetadata::Unknown`] carrying a known kind tag (1 to 5): that is
/// written as an empty record of the known kind, which reads back as that
/// kind's shape or fails. `extra_int` is left 0; use
/// [`MetadataRecord::to_builder`] to set it.
pub fn write_class_metadata(
    metadata: &ClassMetadata,
    version: &[i32],
    package_name: &str,
) -> MetadataRecord {
    let builder = RecordBuilder::new(metadata.kind())
        .version(version.iter().copied())
        .package_name(package_name);

    match metadata {
        ClassMetadata::Class(class) => {
            let mut w = PayloadWriter::new();
            w.string(CLASS_NAME, &class.name);
            if class.flags != 0 {
                w.flags(CLASS_FLAGS, class.flags);
            }
            for supertype in &class.supertypes {
                w.string(SUPERTYPE, supertype);
            }
            for nested in &class.nested_classes {
                w.string(NESTED_CLASS, nested);
            }
            for constructor in &class.constructors {
                w.flags(CONSTRUCTOR, constructor.flags);
            }
            write_container(&mut w, &class.declarations);
            with_payload(builder, w).build()
        }
        ClassMetadata::FileFacade(package) => {
            let mut w = PayloadWriter::new();
            write_container(&mut w, &package.declarations);
            with_payload(builder, w).build()
        }
        ClassMetadata::MultiFileClassPart {
            package,
            facade_class_name,
        } => {
            let mut w = PayloadWriter::new();
            write_container(&mut w, &package.declarations);
            with_payload(builder, w)
                .extra_string(facade_class_name.as_str())
                .build()
        }
        ClassMetadata::SyntheticClass { lambda } => {
            let mut w = PayloadWriter::new();
            if let Some(lambda) = lambda {
                write_member(&mut w, FUNCTION, lambda);
            }
            with_payload(builder, w).build()
        }
        ClassMetadata::MultiFileClassFacade { part_class_names } => {
            builder.data1(part_class_names.iter().cloned()).build()
        }
        ClassMetadata::Unknown { .. } => builder.build(),
    }
}

fn with_payload(builder: RecordBuilder, payload: PayloadWriter) -> RecordBuilder {
    let (data1, data2) = payload.finish(MAX_PAYLOAD_CHUNK);
    builder.data1(data1).data2(data2)
}

fn write_container(w: &mut PayloadWriter, container: &DeclarationContainer) {
    for function in &container.functions {
        write_member(w, FUNCTION, function);
    }
    for property in &container.properties {
        write_member(w, PROPERTY, property);
    }
    for alias in &container.type_aliases {
        write_member(w, TYPE_ALIAS, alias);
    }
}

fn write_member(w: &mut PayloadWriter, tag: u64, member: &Member) {
    w.string(tag, &member.name);
    if member.flags != 0 {
        w.flags(MEMBER_FLAGS, member.flags);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InterpretError;
    use crate::interpret::read_lenient;
    use crate::model::{Constructor, KmClass, KmPackage, MetadataKind, Visibility};

    fn sample_class() -> KmClass {
        KmClass {
            name: "com/example/Service".into(),
            flags: Visibility::Public.apply(0),
            supertypes: vec!["kotlin/Any".into(), "com/example/Api".into()],
            nested_classes: vec!["Companion".into()],
            constructors: vec![Constructor {
                flags: Visibility::Public.apply(0),
            }],
            declarations: DeclarationContainer {
                functions: vec![
                    Member::new("start", Visibility::Public.apply(0)),
                    Member::new("stop", Visibility::Private.apply(0)),
                    Member::new("start", Visibility::Internal.apply(0)),
                ],
                properties: vec![Member::new("state", Visibility::Public.apply(0))],
                type_aliases: vec![Member::new("Handler", -1)],
            },
        }
    }

    #[test]
    fn every_shape_reads_back() {
        let shapes = vec![
            ClassMetadata::Class(sample_class()),
            ClassMetadata::FileFacade(KmPackage {
                declarations: sample_class().declarations,
            }),
            ClassMetadata::MultiFileClassPart {
                package: KmPackage::default(),
                facade_class_name: "com/example/UtilsKt".into(),
            },
            ClassMetadata::MultiFileClassFacade {
                part_class_names: vec!["com/example/Utils__AKt".into()],
            },
            ClassMetadata::SyntheticClass {
                lambda: Some(Member::new("invoke", 8)),
            },
            ClassMetadata::SyntheticClass { lambda: None },
            ClassMetadata::Unknown { kind: 77 },
        ];

        for shape in shapes {
            let record = write_class_metadata(&shape, &[1, 9, 0], "com.example");
            assert_eq!(record.kind(), shape.kind().as_i32());
            assert_eq!(record.package_name(), "com.example");
            assert_eq!(read_lenient(&record).unwrap(), shape);
        }
    }

    #[test]
    fn unknown_shape_with_known_tag_reads_as_that_kind() {
        let class = write_class_metadata(&ClassMetadata::Unknown { kind: 1 }, &[1, 9, 0], "p");
        assert_eq!(class.metadata_kind(), MetadataKind::Class);
        assert_eq!(read_lenient(&class), Err(InterpretError::MissingClassName));
        assert!(class.class_metadata().is_none());

        let facade = write_class_metadata(&ClassMetadata::Unknown { kind: 2 }, &[1, 9, 0], "p");
        assert_eq!(
            read_lenient(&facade).unwrap(),
            ClassMetadata::FileFacade(KmPackage::default())
        );
    }

    #[test]
    fn payload_uses_string_table() {
        let record = write_class_metadata(&ClassMetadata::Class(sample_class()), &[1, 9, 0], "");
        assert_eq!(record.metadata_kind(), MetadataKind::Class);
        // "start" appears twice in the class but once in the table
        let starts = record.data2().iter().filter(|s| *s == "start").count();
        assert_eq!(starts, 1);
        assert!(record.data1().iter().all(|s| s.chars().all(|c| (c as u32) <= 0xFF)));
    }

    #[test]
    fn identical_metadata_writes_identical_records() {
        let a = write_class_metadata(&ClassMetadata::Class(sample_class()), &[1, 9, 0], "p");
        let b = write_class_metadata(&ClassMetadata::Class(sample_class()), &[1, 9, 0], "p");
        assert!(b.difference(&a).unchanged());
    }

    #[test]
    fn member_change_is_a_data_change() {
        let before = write_class_metadata(&ClassMetadata::Class(sample_class()), &[1, 9, 0], "p");
        let mut changed = sample_class();
        changed.declarations.functions[1].flags = Visibility::Public.apply(0);
        let after = write_class_metadata(&ClassMetadata::Class(changed), &[1, 9, 0], "p");

        let diff = after.difference(&before);
        assert!(diff.data_changed());
        assert!(!diff.package_changed());
        assert!(!diff.version_changed());
    }
}
