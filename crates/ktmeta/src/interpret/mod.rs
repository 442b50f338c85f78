//! Best-effort structural interpretation of records.
//!
//! A record's raw fields can be interpreted as a [`ClassMetadata`] shape,
//! which exposes the declarations callers need for signature and visibility
//! analysis. Interpretation is advisory: a malformed payload, an
//! incompatible version or even a panicking interpreter yields an absent
//! result, never an error, so it can not abort a build.
//!
//! The outcome is memoized per record instance. Records are immutable and
//! interpretation is a pure function of their fields, so the memo never
//! needs invalidating.

mod payload;
mod read;
mod write;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::error::InterpretError;
use crate::model::{ClassMetadata, DeclarationContainer, MetadataRecord};

pub use read::read_lenient;
pub use write::write_class_metadata;

/// The structural-metadata parsing capability.
///
/// Implementations may fail on malformed input; callers of the record's
/// declaration view never see those failures.
pub trait MetadataInterpreter {
    /// Interprets the raw fields of `record`.
    fn interpret(&self, record: &MetadataRecord) -> Result<ClassMetadata, InterpretError>;
}

impl<F> MetadataInterpreter for F
where
    F: Fn(&MetadataRecord) -> Result<ClassMetadata, InterpretError>,
{
    fn interpret(&self, record: &MetadataRecord) -> Result<ClassMetadata, InterpretError> {
        self(record)
    }
}

/// The built-in interpreter, see [`read_lenient`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LenientInterpreter;

impl MetadataInterpreter for LenientInterpreter {
    fn interpret(&self, record: &MetadataRecord) -> Result<ClassMetadata, InterpretError> {
        read_lenient(record)
    }
}

impl MetadataRecord {
    /// Interprets this record with the built-in [`LenientInterpreter`].
    ///
    /// Returns `None` if interpretation failed. The first call computes the
    /// result; later calls return the memoized outcome.
    pub fn class_metadata(&self) -> Option<&ClassMetadata> {
        self.class_metadata_with(&LenientInterpreter)
    }

    /// Interprets this record with `interpreter`.
    ///
    /// The memo is per record, not per interpreter: once any interpreter has
    /// produced an outcome for this record, that outcome is returned.
    pub fn class_metadata_with<I>(&self, interpreter: &I) -> Option<&ClassMetadata>
    where
        I: MetadataInterpreter + ?Sized,
    {
        self.interpreted
            .get_or_init(|| interpret_absorbing(self, interpreter))
            .as_ref()
    }

    /// Projects the member container of the interpreted shape.
    ///
    /// `None` if interpretation failed or the shape has no container
    /// (synthetic classes, multi-file facades, unknown kinds).
    pub fn declaration_container(&self) -> Option<&DeclarationContainer> {
        self.class_metadata()?.declaration_container()
    }

    /// Returns true once an interpretation outcome has been memoized.
    pub fn is_interpreted(&self) -> bool {
        self.interpreted.get().is_some()
    }
}

fn interpret_absorbing<I>(record: &MetadataRecord, interpreter: &I) -> Option<ClassMetadata>
where
    I: MetadataInterpreter + ?Sized,
{
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| interpreter.interpret(record)))
        .unwrap_or_else(|payload| {
            Err(InterpretError::Panicked {
                message: panic_message(payload.as_ref()),
            })
        });

    match outcome {
        Ok(metadata) => Some(metadata),
        Err(err @ InterpretError::Panicked { .. }) => {
            warn!(kind = record.kind(), error = %err, "metadata interpreter panicked");
            None
        }
        Err(err) => {
            debug!(kind = record.kind(), error = %err, "metadata interpretation failed");
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::model::{KmClass, KmPackage, Member, MetadataKind, RecordBuilder};

    fn facade_record() -> MetadataRecord {
        let package = KmPackage {
            declarations: DeclarationContainer {
                functions: vec![Member::new("main", 6)],
                ..DeclarationContainer::default()
            },
        };
        write_class_metadata(&ClassMetadata::FileFacade(package), &[1, 9, 0], "com.example")
    }

    #[test]
    fn test_successful_interpretation_exposes_container() {
        let record = facade_record();
        assert!(!record.is_interpreted());

        let container = record.declaration_container().unwrap();
        assert_eq!(container.functions[0].name, "main");
        assert!(record.is_interpreted());
        assert!(matches!(record.class_metadata(), Some(ClassMetadata::FileFacade(_))));
    }

    #[test]
    fn test_corrupted_payload_is_absent() {
        let corrupted = [
            // Truncated varint
            RecordBuilder::new(MetadataKind::Class).version([1, 9, 0]).data1(["\u{86}"]).build(),
            // Char that can not be a payload byte
            RecordBuilder::new(MetadataKind::Class).version([1, 9, 0]).data1(["\u{2603}"]).build(),
            // String index past the end of the table
            RecordBuilder::new(MetadataKind::FileFacade)
                .version([1, 9, 0])
                .data1(["\u{6}\u{7f}"])
                .data2(["only"])
                .build(),
        ];
        for record in &corrupted {
            assert!(record.class_metadata().is_none(), "{record:?}");
            assert!(record.declaration_container().is_none());
            assert!(record.is_interpreted());
        }
    }

    #[test]
    fn test_shapes_without_container() {
        let unknown = RecordBuilder::new(12).version([1, 9, 0]).build();
        assert_eq!(unknown.class_metadata(), Some(&ClassMetadata::Unknown { kind: 12 }));
        assert!(unknown.declaration_container().is_none());

        let facade = RecordBuilder::new(MetadataKind::MultiFileClassFacade)
            .version([1, 9, 0])
            .data1(["a/PartKt"])
            .build();
        assert!(facade.class_metadata().is_some());
        assert!(facade.declaration_container().is_none());
    }

    #[test]
    fn test_outcome_is_memoized() {
        let calls = AtomicUsize::new(0);
        let counting = |record: &MetadataRecord| {
            calls.fetch_add(1, Ordering::SeqCst);
            read_lenient(record)
        };

        let record = facade_record();
        assert!(record.class_metadata_with(&counting).is_some());
        assert!(record.class_metadata_with(&counting).is_some());
        assert!(record.declaration_container().is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failure_is_memoized() {
        let calls = AtomicUsize::new(0);
        let failing = |_: &MetadataRecord| -> Result<ClassMetadata, InterpretError> {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(InterpretError::MissingClassName)
        };

        let record = facade_record();
        assert!(record.class_metadata_with(&failing).is_none());
        // A working interpreter does not override the memoized failure
        assert!(record.class_metadata().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_interpreter_is_absorbed() {
        let panicking = |_: &MetadataRecord| -> Result<ClassMetadata, InterpretError> {
            panic!("corrupted string table")
        };
        let record = facade_record();
        assert!(record.class_metadata_with(&panicking).is_none());
        assert!(record.is_interpreted());
    }

    #[test]
    fn test_concurrent_first_access_interprets_once() {
        let calls = AtomicUsize::new(0);
        let counting = |record: &MetadataRecord| {
            calls.fetch_add(1, Ordering::SeqCst);
            read_lenient(record)
        };
        let class = KmClass {
            name: "com/example/Shared".into(),
            ..KmClass::default()
        };
        let record = write_class_metadata(&ClassMetadata::Class(class), &[1, 9, 0], "com.example");

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    let metadata = record.class_metadata_with(&counting).unwrap();
                    assert_eq!(metadata.kind(), MetadataKind::Class);
                });
            }
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clone_starts_uninterpreted() {
        let record = facade_record();
        record.class_metadata();
        let copy = record.clone();
        assert!(record.is_interpreted());
        assert!(!copy.is_interpreted());
        assert_eq!(copy.class_metadata(), record.class_metadata());
    }
}
