//! Resolves the `source:` of a class loaded by a custom loader to the bytes
//! the class was defined from.

use anyhow::{Context, Result};
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

use crate::classfile;
use crate::config::Config;
use crate::fatjar::{FatJarCache, is_nested_jar};
use crate::report::SkipReason;

pub const FILE_PREFIX: &str = "file:";
pub const JAR_PREFIX: &str = "jar:file:";
pub const JAR_SUFFIX: &str = "!/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Directory,
    Jar,
    NestedJar,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedClass {
    pub path: PathBuf,
    pub origin: Origin,
}

impl LocatedClass {
    /// Major version of `<internal_name>.class` inside this container.
    pub fn major_version(&self, internal_name: &str) -> Result<u16> {
        let entry_name = format!("{internal_name}.class");
        match self.origin {
            Origin::Directory => {
                let path = self.path.join(&entry_name);
                let file = File::open(&path)
                    .with_context(|| format!("Failed to open class file: {}", path.display()))?;
                classfile::major_version(BufReader::new(file))
                    .with_context(|| format!("Failed to read class header: {}", path.display()))
            }
            Origin::Jar | Origin::NestedJar => {
                let jar = &self.path;
                let file = File::open(jar)
                    .with_context(|| format!("Failed to open jar: {}", jar.display()))?;
                // SAFETY: The file is opened read-only and outlives the mapping.
                let mmap = unsafe { Mmap::map(&file) }
                    .with_context(|| format!("Failed to mmap jar: {}", jar.display()))?;
                let mut archive = ZipArchive::new(Cursor::new(&mmap[..]))
                    .with_context(|| format!("Failed to read zip structure: {}", jar.display()))?;
                let mut entry = archive.by_name(&entry_name).with_context(|| {
                    format!("No zip entry {entry_name} in jar file {}", jar.display())
                })?;
                classfile::major_version(&mut entry).with_context(|| {
                    format!("Failed to read class header: {entry_name} in {}", jar.display())
                })
            }
        }
    }
}

/// Why a source could not be turned into a [`LocatedClass`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocateError {
    UnknownFormat,
    LooseClassFile(PathBuf),
    UnknownContainer(PathBuf),
}

impl LocateError {
    pub fn reason(&self) -> SkipReason {
        match self {
            LocateError::UnknownFormat | LocateError::UnknownContainer(_) => {
                SkipReason::UnresolvableSource
            }
            LocateError::LooseClassFile(_) => SkipReason::LooseClassFile,
        }
    }

    /// Location to name in diagnostics, if the source got that far.
    pub fn path(&self) -> Option<&Path> {
        match self {
            LocateError::UnknownFormat => None,
            LocateError::LooseClassFile(p) | LocateError::UnknownContainer(p) => Some(p),
        }
    }
}

/// Strips the `file:` or `jar:file:...!/` wrapping off a source descriptor.
pub fn source_path(source: &str) -> Option<&str> {
    if let Some(path) = source.strip_prefix(FILE_PREFIX) {
        return Some(path);
    }
    source
        .strip_prefix(JAR_PREFIX)
        .and_then(|s| s.strip_suffix(JAR_SUFFIX))
}

/// `/C:/Users/..` becomes `C:/Users/..`.
pub fn normalize_drive_path(path: &str) -> &str {
    let bytes = path.as_bytes();
    if bytes.len() >= 3 && bytes[0] == b'/' && bytes[2] == b':' {
        &path[1..]
    } else {
        path
    }
}

#[derive(Debug)]
pub struct ClassLocator {
    dump_from_class_file: bool,
    fat_jars: FatJarCache,
}

impl ClassLocator {
    pub fn new(config: &Config) -> Self {
        Self {
            dump_from_class_file: config.dump_from_class_file,
            fat_jars: FatJarCache::new(config.fat_jar_tmp.clone()),
        }
    }

    pub fn fat_jars(&self) -> &FatJarCache {
        &self.fat_jars
    }

    pub fn locate(&mut self, source: &str) -> Result<LocatedClass, LocateError> {
        let path = source_path(source).ok_or(LocateError::UnknownFormat)?;
        let path = normalize_drive_path(path);

        if !self.dump_from_class_file && Path::new(path).is_dir() {
            return Err(LocateError::LooseClassFile(PathBuf::from(path)));
        }

        let (path, nested) = if is_nested_jar(path) {
            (self.fat_jars.resolve(path), true)
        } else {
            (PathBuf::from(path), false)
        };

        if path.is_dir() {
            return Ok(LocatedClass {
                path,
                origin: Origin::Directory,
            });
        }
        if path.extension().is_some_and(|e| e == "jar") && path.is_file() {
            let origin = if nested { Origin::NestedJar } else { Origin::Jar };
            return Ok(LocatedClass { path, origin });
        }
        Err(LocateError::UnknownContainer(path))
    }
}
