//! Extraction of jars nested inside a "fat" jar (Spring Boot and friends).
//!
//! A class loaded from `jar:file:/app.jar!/BOOT-INF/lib/dep.jar!/` lives in a
//! jar that is itself an entry of `/app.jar`. The nested jar is copied into a
//! scratch directory once, and every later lookup for the same composite
//! path reuses the copy.

use anyhow::{Context, Result, bail};
use memmap2::Mmap;
use std::collections::HashMap;
use std::fs::File;
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

/// `true` for a jar path that points into another jar (`outer.jar!/inner.jar`).
pub fn is_nested_jar(path: &str) -> bool {
    path.ends_with(".jar") && path.contains(".jar!")
}

/// Splits `outer.jar!/inner.jar` at the first `!`.
pub fn split_nested(composite: &str) -> Option<(&str, &str)> {
    let idx = composite.find('!')?;
    let inner = composite[idx..].strip_prefix("!/")?;
    if inner.is_empty() {
        return None;
    }
    Some((&composite[..idx], inner))
}

#[derive(Debug)]
pub struct FatJarCache {
    scratch_dir: PathBuf,
    resolved: HashMap<String, PathBuf>,
    // Outer jar path -> its subdirectory of `scratch_dir`.
    outer_dirs: HashMap<String, PathBuf>,
    extractions: usize,
}

impl FatJarCache {
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            resolved: HashMap::new(),
            outer_dirs: HashMap::new(),
            extractions: 0,
        }
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Number of nested jars actually written to the scratch directory.
    pub fn extractions(&self) -> usize {
        self.extractions
    }

    /// Returns the on-disk path of the nested jar named by `composite`.
    ///
    /// When extraction fails the composite path itself comes back; it is not
    /// a readable jar, so the class using it is skipped further down. Either
    /// answer is remembered, so each composite path is attempted only once.
    pub fn resolve(&mut self, composite: &str) -> PathBuf {
        if let Some(path) = self.resolved.get(composite) {
            return path.clone();
        }

        let path = match self.extract(composite) {
            Ok(path) => {
                self.extractions += 1;
                path
            }
            Err(e) => {
                debug!("can't extract nested jar {composite}: {e:#}");
                PathBuf::from(composite)
            }
        };
        self.resolved.insert(composite.to_string(), path.clone());
        path
    }

    /// Each outer jar extracts into its own subdirectory named after its
    /// file stem, so equal entry names from different fat jars never share a
    /// target. Stems taken by another outer jar get a `-N` suffix.
    fn outer_dir(&mut self, outer: &str) -> PathBuf {
        if let Some(dir) = self.outer_dirs.get(outer) {
            return dir.clone();
        }
        let stem = Path::new(outer)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "jar".to_string());
        let mut dir = self.scratch_dir.join(&stem);
        let mut n = 2;
        while self.outer_dirs.values().any(|d| *d == dir) {
            dir = self.scratch_dir.join(format!("{stem}-{n}"));
            n += 1;
        }
        self.outer_dirs.insert(outer.to_string(), dir.clone());
        dir
    }

    fn extract(&mut self, composite: &str) -> Result<PathBuf> {
        let (outer, inner) = split_nested(composite)
            .with_context(|| format!("Not a nested jar path: {composite}"))?;
        if Path::new(inner)
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            bail!("Nested jar entry escapes the scratch directory: {inner}");
        }

        let file =
            File::open(outer).with_context(|| format!("Failed to open jar: {outer}"))?;
        // SAFETY: The file is opened read-only and outlives the mapping.
        let mmap = unsafe { Mmap::map(&file) }
            .with_context(|| format!("Failed to mmap jar: {outer}"))?;
        let mut archive = ZipArchive::new(Cursor::new(&mmap[..]))
            .with_context(|| format!("Failed to read zip structure: {outer}"))?;
        let mut entry = archive
            .by_name(inner)
            .with_context(|| format!("No entry {inner} in {outer}"))?;

        let target = self.outer_dir(outer).join(inner);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let mut out = File::create(&target)
            .with_context(|| format!("Failed to create file: {}", target.display()))?;
        std::io::copy(&mut entry, &mut out)
            .with_context(|| format!("Failed to extract {inner} from {outer}"))?;

        debug!("extracted {inner} from {outer} into {}", target.display());
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{class_bytes, jar_bytes, temp_dir, write_jar};

    #[test]
    fn nested_jar_detection() {
        assert!(is_nested_jar("/app.jar!/lib/nested.jar"));
        assert!(!is_nested_jar("/app.jar"));
        assert!(!is_nested_jar("/app.jar!/classes"));
        assert_eq!(
            split_nested("/app.jar!/BOOT-INF/lib/dep.jar"),
            Some(("/app.jar", "BOOT-INF/lib/dep.jar"))
        );
        assert_eq!(split_nested("/app.jar!"), None);
    }

    #[test]
    fn extracts_once_and_reuses_path() -> Result<()> {
        let base = temp_dir("fatjar_reuse");
        let inner = jar_bytes(&[("lib/A.class", &class_bytes(52)[..])])?;
        let outer = base.join("app.jar");
        write_jar(&outer, &[("lib/nested.jar", &inner[..])])?;

        let mut cache = FatJarCache::new(base.join("tmp"));
        let composite = format!("{}!/lib/nested.jar", outer.display());

        let first = cache.resolve(&composite);
        assert_eq!(first, base.join("tmp").join("app").join("lib/nested.jar"));
        assert_eq!(std::fs::read(&first)?, inner);

        std::fs::remove_file(&first)?;
        let second = cache.resolve(&composite);
        assert_eq!(second, first);
        assert!(!second.exists(), "second lookup must not extract again");
        assert_eq!(cache.extractions(), 1);

        let _ = std::fs::remove_dir_all(base);
        Ok(())
    }

    #[test]
    fn same_entry_in_different_fat_jars_does_not_collide() -> Result<()> {
        let base = temp_dir("fatjar_collide");
        let first_inner = jar_bytes(&[("lib/A.class", &class_bytes(52)[..])])?;
        let second_inner = jar_bytes(&[("lib/B.class", &class_bytes(61)[..])])?;
        let app = base.join("app.jar");
        let other_app = base.join("other").join("app.jar");
        let service = base.join("service.jar");
        std::fs::create_dir_all(base.join("other"))?;
        write_jar(&app, &[("BOOT-INF/lib/dep.jar", &first_inner[..])])?;
        write_jar(&other_app, &[("BOOT-INF/lib/dep.jar", &second_inner[..])])?;
        write_jar(&service, &[("BOOT-INF/lib/dep.jar", &second_inner[..])])?;

        let tmp = base.join("tmp");
        let mut cache = FatJarCache::new(&tmp);
        let a = cache.resolve(&format!("{}!/BOOT-INF/lib/dep.jar", app.display()));
        let b = cache.resolve(&format!("{}!/BOOT-INF/lib/dep.jar", other_app.display()));
        let c = cache.resolve(&format!("{}!/BOOT-INF/lib/dep.jar", service.display()));

        assert_eq!(a, tmp.join("app").join("BOOT-INF/lib/dep.jar"));
        assert_eq!(b, tmp.join("app-2").join("BOOT-INF/lib/dep.jar"));
        assert_eq!(c, tmp.join("service").join("BOOT-INF/lib/dep.jar"));
        assert_eq!(std::fs::read(&a)?, first_inner);
        assert_eq!(std::fs::read(&b)?, second_inner);
        assert_eq!(cache.extractions(), 3);

        let _ = std::fs::remove_dir_all(base);
        Ok(())
    }

    #[test]
    fn missing_outer_jar_falls_back_to_composite() {
        let base = temp_dir("fatjar_missing");
        let mut cache = FatJarCache::new(base.join("tmp"));
        let composite = format!("{}!/lib/nested.jar", base.join("absent.jar").display());

        assert_eq!(cache.resolve(&composite), PathBuf::from(&composite));
        assert_eq!(cache.resolve(&composite), PathBuf::from(&composite));
        assert_eq!(cache.extractions(), 0);

        let _ = std::fs::remove_dir_all(base);
    }

    #[test]
    fn rejects_entries_escaping_scratch_dir() -> Result<()> {
        let base = temp_dir("fatjar_escape");
        let outer = base.join("app.jar");
        write_jar(&outer, &[("../evil.jar", &b"x"[..])])?;

        let mut cache = FatJarCache::new(base.join("tmp"));
        let composite = format!("{}!/../evil.jar", outer.display());
        assert_eq!(cache.resolve(&composite), PathBuf::from(&composite));
        assert!(!base.join("evil.jar").exists());

        let _ = std::fs::remove_dir_all(base);
        Ok(())
    }
}
