//! Benchmark for snapshot encoding, decoding and change detection.
//!
//! Reads a JSON class listing if one is given, otherwise synthesizes a
//! project of a few thousand classes.

use std::fs;
use std::time::Instant;

use ktmeta::{
    ClassMetadata, DeclarationContainer, EncodeOptions, KmClass, KmPackage, Member,
    MetadataSnapshot, Visibility, decode_snapshot, encode_snapshot, write_class_metadata,
};
use serde::Deserialize;

const METADATA_VERSION: [i32; 3] = [1, 9, 0];

// =============================================================================
// JSON DATA STRUCTURES
// =============================================================================

#[derive(Debug, Deserialize)]
struct ClassEntry {
    name: String,
    #[serde(default)]
    package: String,
    #[serde(default)]
    facade: bool,
    #[serde(default)]
    supertypes: Vec<String>,
    #[serde(default)]
    functions: Vec<String>,
    #[serde(default)]
    properties: Vec<String>,
    #[serde(default)]
    private_members: Vec<String>,
}

fn container(entry: &ClassEntry) -> DeclarationContainer {
    let public = Visibility::Public.apply(0);
    let private = Visibility::Private.apply(0);
    let mut functions: Vec<Member> = entry.functions.iter().map(|f| Member::new(f.as_str(), public)).collect();
    functions.extend(entry.private_members.iter().map(|f| Member::new(f.as_str(), private)));
    DeclarationContainer {
        functions,
        properties: entry.properties.iter().map(|p| Member::new(p.as_str(), public)).collect(),
        type_aliases: Vec::new(),
    }
}

fn to_metadata(entry: &ClassEntry) -> ClassMetadata {
    if entry.facade {
        ClassMetadata::FileFacade(KmPackage {
            declarations: container(entry),
        })
    } else {
        ClassMetadata::Class(KmClass {
            name: entry.name.clone(),
            flags: Visibility::Public.apply(0),
            supertypes: entry.supertypes.clone(),
            declarations: container(entry),
            ..KmClass::default()
        })
    }
}

fn synthesize(count: usize) -> Vec<ClassEntry> {
    (0..count)
        .map(|i| {
            let package = format!("com.example.module{}", i % 40);
            let simple = format!("Type{}", i);
            ClassEntry {
                name: format!("{}/{}", package.replace('.', "/"), simple),
                package,
                facade: i % 7 == 0,
                supertypes: vec!["kotlin/Any".to_string()],
                functions: (0..(i % 12)).map(|f| format!("op{}", f)).collect(),
                properties: (0..(i % 5)).map(|p| format!("field{}", p)).collect(),
                private_members: (0..(i % 3)).map(|p| format!("helper{}", p)).collect(),
            }
        })
        .collect()
}

fn build_snapshot(entries: &[ClassEntry]) -> MetadataSnapshot {
    entries
        .iter()
        .map(|entry| {
            let record = write_class_metadata(&to_metadata(entry), &METADATA_VERSION, &entry.package);
            (entry.name.clone(), record)
        })
        .collect()
}

fn main() {
    let entries: Vec<ClassEntry> = match std::env::args().nth(1) {
        Some(path) => {
            println!("Loading classes from: {}", path);
            let json = fs::read_to_string(&path).expect("Failed to read class listing");
            serde_json::from_str(&json).expect("Failed to parse JSON")
        }
        None => {
            println!("No class listing given, synthesizing 5000 classes");
            synthesize(5000)
        }
    };

    let build_start = Instant::now();
    let snapshot = build_snapshot(&entries);
    println!("Built {} records in {:?}", snapshot.len(), build_start.elapsed());

    // Encoding (uncompressed)
    let encode_start = Instant::now();
    let encoded = encode_snapshot(&snapshot, EncodeOptions::default()).expect("Failed to encode");
    let encode_time = encode_start.elapsed();
    println!("\nUncompressed: {} bytes in {:?}", encoded.len(), encode_time);
    println!(
        "  Throughput: {:.2} MB/s",
        (encoded.len() as f64 / 1_000_000.0) / encode_time.as_secs_f64()
    );

    // Encoding (compressed)
    let compress_start = Instant::now();
    let compressed = encode_snapshot(&snapshot, EncodeOptions::compressed(3)).expect("Failed to compress");
    let compress_time = compress_start.elapsed();
    println!("\nCompressed (level 3): {} bytes in {:?}", compressed.len(), compress_time);
    println!(
        "  Compression ratio: {:.1}x",
        encoded.len() as f64 / compressed.len() as f64
    );

    // Decoding
    const DECODE_ITERS: u32 = 10;
    for _ in 0..3 {
        let _ = decode_snapshot(&encoded).expect("Failed to decode");
    }
    let decode_start = Instant::now();
    let mut decoded = None;
    for _ in 0..DECODE_ITERS {
        decoded = Some(decode_snapshot(&encoded).expect("Failed to decode"));
    }
    let decode_time = decode_start.elapsed() / DECODE_ITERS;
    let decoded = decoded.expect("at least one decode iteration");
    assert_eq!(decoded, snapshot);
    println!(
        "\nDecode (uncompressed): {:?} (avg of {} iterations)",
        decode_time, DECODE_ITERS
    );

    let decompress_start = Instant::now();
    let from_compressed = decode_snapshot(&compressed).expect("Failed to decode compressed");
    println!("Decode (compressed): {:?}", decompress_start.elapsed());
    assert_eq!(from_compressed, snapshot);

    // Interpretation
    let interpret_start = Instant::now();
    let interpreted = decoded
        .iter()
        .filter(|(_, record)| record.declaration_container().is_some())
        .count();
    println!(
        "\nInterpreted {} of {} records in {:?}",
        interpreted,
        decoded.len(),
        interpret_start.elapsed()
    );

    // Change detection: rename every tenth class's package
    let mut next = MetadataSnapshot::new();
    for (i, (name, record)) in snapshot.iter().enumerate() {
        let record = if i % 10 == 0 {
            record.to_builder().package_name("com.example.moved").build()
        } else {
            record.clone()
        };
        next.insert(name.clone(), record);
    }

    let diff_start = Instant::now();
    let changes = next.compare(&decoded);
    println!(
        "\nCompared {} classes in {:?}: {} changed",
        next.len(),
        diff_start.elapsed(),
        changes.len()
    );
    for change in changes.iter().take(3) {
        println!("  {:?}", change);
    }
}
