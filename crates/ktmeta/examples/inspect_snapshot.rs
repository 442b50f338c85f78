//! Simple inspector for persisted metadata snapshots.
//!
//! ```text
//! cargo run --example inspect_snapshot -- build/current.ktms [build/previous.ktms]
//! ```
//!
//! With two paths, also lists what changed between them.

use std::fs;

use ktmeta::{ClassChange, ClassMetadata, MetadataSnapshot, decode_snapshot};

fn load(path: &str) -> MetadataSnapshot {
    println!("Reading: {}", path);
    let data = fs::read(path).expect("Failed to read file");
    println!("File size: {} bytes", data.len());
    decode_snapshot(&data).expect("Failed to decode")
}

fn describe(metadata: Option<&ClassMetadata>) -> String {
    match metadata {
        None => "uninterpretable".to_string(),
        Some(ClassMetadata::Class(class)) => format!(
            "class {} ({} supertypes, {} members)",
            class.name,
            class.supertypes.len(),
            class.declarations.len()
        ),
        Some(ClassMetadata::FileFacade(package)) => {
            format!("file facade ({} members)", package.declarations.len())
        }
        Some(ClassMetadata::MultiFileClassPart {
            package,
            facade_class_name,
        }) => format!(
            "multi-file part of {} ({} members)",
            facade_class_name,
            package.declarations.len()
        ),
        Some(ClassMetadata::MultiFileClassFacade { part_class_names }) => {
            format!("multi-file facade ({} parts)", part_class_names.len())
        }
        Some(ClassMetadata::SyntheticClass { lambda: Some(f) }) => {
            format!("synthetic class (lambda {})", f.name)
        }
        Some(ClassMetadata::SyntheticClass { lambda: None }) => "synthetic class".to_string(),
        Some(ClassMetadata::Unknown { kind }) => format!("unknown kind {}", kind),
    }
}

fn main() {
    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "build/metadata.ktms".to_string());
    let snapshot = load(&path);

    println!("\n=== Classes ({}) ===", snapshot.len());
    let mut uninterpretable = 0;
    for (name, record) in &snapshot {
        let metadata = record.class_metadata();
        if metadata.is_none() {
            uninterpretable += 1;
        }
        println!(
            "  {} [v{:?}, package {:?}]: {}",
            name,
            record.version(),
            record.package_name(),
            describe(metadata)
        );
    }
    if uninterpretable > 0 {
        println!("\n{} classes could not be interpreted", uninterpretable);
    }

    let Some(previous_path) = args.next() else {
        return;
    };
    let previous = load(&previous_path);
    let changes = snapshot.compare(&previous);

    println!("\n=== Changes since {} ({}) ===", previous_path, changes.len());
    for change in &changes {
        match change {
            ClassChange::Added(name) => println!("  + {}", name),
            ClassChange::Removed(name) => println!("  - {}", name),
            ClassChange::Changed(name, summary) => println!("  ~ {} ({})", name, summary),
        }
    }
}
