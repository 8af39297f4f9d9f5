use std::path::PathBuf;

use crate::cli::Cli;

pub const DEFAULT_FAT_JAR_TMP: &str = "./tmp";

/// Conversion settings, fixed for the whole pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub compact_ids: bool,
    pub debug: bool,
    pub dump_from_class_file: bool,
    pub fat_jar_tmp: PathBuf,
    pub classes_only: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            compact_ids: true,
            debug: false,
            dump_from_class_file: false,
            fat_jar_tmp: PathBuf::from(DEFAULT_FAT_JAR_TMP),
            classes_only: false,
        }
    }
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            compact_ids: cli.compact_ids,
            debug: cli.debug,
            dump_from_class_file: cli.dump_from_class_file,
            fat_jar_tmp: cli.fat_jar_tmp.clone(),
            classes_only: cli.classes_only,
        }
    }

    /// Default `tracing` filter when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }
}
