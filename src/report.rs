use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::loader::LoaderKind;

/// Why a decoded class did not make it into the class list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    DynamicOrigin,
    UnresolvableSource,
    LooseClassFile,
    PreThresholdVersion,
    UnreadableClass,
    DuplicateName,
    UnsatisfiedDependencies,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::DynamicOrigin => "dynamically generated class",
            SkipReason::UnresolvableSource => "unknown source",
            SkipReason::LooseClassFile => {
                "loaded from class file (try '--dump-from-class-file')"
            }
            SkipReason::PreThresholdVersion => "class is pre 1.5",
            SkipReason::UnreadableClass => "can't load (maybe generated?)",
            SkipReason::DuplicateName => "already dumped",
            SkipReason::UnsatisfiedDependencies => "failed dependencies",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Emitted(LoaderKind),
    Skipped(SkipReason),
}

/// Summary of one conversion pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionReport {
    pub lines_read: u64,
    pub records: u64,
    pub emitted: u64,
    pub emitted_custom: u64,
    pub skipped: BTreeMap<SkipReason, u64>,
    pub unpaired_announces: u64,
    pub fat_jars_extracted: usize,
    pub input_truncated: bool,
}

impl ConversionReport {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Emitted(kind) => {
                self.emitted += 1;
                if !kind.is_trusted() {
                    self.emitted_custom += 1;
                }
            }
            Outcome::Skipped(reason) => *self.skipped.entry(reason).or_default() += 1,
        }
    }

    pub fn skipped(&self, reason: SkipReason) -> u64 {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }

    pub fn total_skipped(&self) -> u64 {
        self.skipped.values().sum()
    }
}
