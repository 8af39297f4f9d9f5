//! Fixtures shared by the unit tests: class-file headers, jars, nested jars.

use anyhow::Result;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use zip::write::FileOptions;

static COUNTER: AtomicU64 = AtomicU64::new(0);

pub fn temp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!(
        "cl4cds_test_{}_{}_{}_{}",
        std::process::id(),
        nanos,
        n,
        name
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Minimal class file: magic, minor 0, the given major.
pub fn class_bytes(major: u16) -> Vec<u8> {
    let mut bytes = vec![0xca, 0xfe, 0xba, 0xbe, 0x00, 0x00];
    bytes.extend_from_slice(&major.to_be_bytes());
    bytes
}

pub fn jar_bytes(entries: &[(&str, &[u8])]) -> Result<Vec<u8>> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, content) in entries {
        zip.start_file(*name, options)?;
        zip.write_all(content)?;
    }
    Ok(zip.finish()?.into_inner())
}

pub fn write_jar(path: &Path, entries: &[(&str, &[u8])]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, jar_bytes(entries)?)?;
    Ok(())
}

pub fn write_class_file(dir: &Path, internal_name: &str, major: u16) -> Result<()> {
    let path = dir.join(format!("{internal_name}.class"));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, class_bytes(major))?;
    Ok(())
}
