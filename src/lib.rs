//! # cl4cds
//!
//! Turns the output of `-Xlog:class+load=debug` into a class list that can be
//! passed to `-XX:SharedClassListFile` when dumping a CDS archive, including
//! classes defined by custom class loaders.
//!
//! ## Architecture
//!
//! - **trace**: Decoder for the announce/metadata line pair of each loaded class
//! - **identity**: Klass ids, optionally compacted relative to `java.lang.Object`
//! - **loader**: Trusted vs. custom loader classification
//! - **locator**: Resolution of a class source to a jar or directory
//! - **fatjar**: Extraction cache for jars nested inside fat jars
//! - **classfile**: Class-file header (major version) reader
//! - **classlist**: Output line rendering
//! - **emitter**: The single-pass converter deciding what gets written
//! - **report**: Skip reasons and the per-run summary

pub mod classfile;
pub mod classlist;
pub mod cli;
pub mod config;
pub mod emitter;
pub mod error;
pub mod fatjar;
pub mod identity;
pub mod loader;
pub mod locator;
pub mod report;
pub mod trace;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use emitter::{Converter, convert};
pub use error::ConvertError;
pub use report::{ConversionReport, SkipReason};
