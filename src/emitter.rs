//! The conversion pass: trace lines in, class list out.
//!
//! Lines are consumed strictly in order. An announce line is paired with
//! the line right after it, and each decoded pair is either written to the
//! class list or skipped for good. A class from a custom loader is written
//! only once its super class and all of its interfaces have been written,
//! because the archiver replays the list top to bottom.

use std::collections::HashSet;
use std::io::{BufRead, Write};

use tracing::{debug, error, info, warn};

use crate::classfile;
use crate::classlist::{ClassListEntry, Detail};
use crate::config::Config;
use crate::error::ConvertError;
use crate::fatjar::FatJarCache;
use crate::identity::{ClassId, IdMapper, ROOT_CLASS};
use crate::loader::LoaderKind;
use crate::locator::ClassLocator;
use crate::report::{ConversionReport, Outcome, SkipReason};
use crate::trace::{self, TraceLine, TraceRecord};

/// Source marker of classes defined at runtime via `defineClass`.
pub const DYNAMIC_MARKER: &str = "__JVM_DefineClass__";

/// Ids and names already written to the class list.
#[derive(Debug, Default)]
pub struct EmittedSet {
    ids: HashSet<ClassId>,
    names: HashSet<String>,
}

impl EmittedSet {
    pub fn contains_id(&self, id: &ClassId) -> bool {
        self.ids.contains(id)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn contains_all<'a>(&self, ids: impl IntoIterator<Item = &'a ClassId>) -> bool {
        ids.into_iter().all(|id| self.ids.contains(id))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn insert(&mut self, id: ClassId, name: &str) {
        self.ids.insert(id);
        self.names.insert(name.to_string());
    }
}

/// Runs one pass over `input`, writing the class list to `output`.
pub fn convert<R: BufRead, W: Write>(
    input: R,
    output: W,
    config: &Config,
) -> Result<ConversionReport, ConvertError> {
    Converter::new(config.clone()).run(input, output)
}

#[derive(Debug)]
pub struct Converter {
    config: Config,
    ids: IdMapper,
    locator: ClassLocator,
    emitted: EmittedSet,
    report: ConversionReport,
}

impl Converter {
    pub fn new(config: Config) -> Self {
        Self {
            ids: IdMapper::new(config.compact_ids),
            locator: ClassLocator::new(&config),
            emitted: EmittedSet::default(),
            report: ConversionReport::default(),
            config,
        }
    }

    pub fn emitted(&self) -> &EmittedSet {
        &self.emitted
    }

    pub fn fat_jars(&self) -> &FatJarCache {
        self.locator.fat_jars()
    }

    pub fn run<R: BufRead, W: Write>(
        &mut self,
        mut input: R,
        mut output: W,
    ) -> Result<ConversionReport, ConvertError> {
        if self.config.debug {
            for pattern in trace::grammar() {
                debug!("matching {pattern}");
            }
            debug!(
                "nested jars are extracted to {}",
                self.fat_jars().scratch_dir().display()
            );
        }

        let mut line = String::new();
        let mut pair = String::new();
        while self.next_line(&mut input, &mut line) {
            let TraceLine::Announce(announce) = trace::decode(&line) else {
                continue;
            };

            if announce.source.contains(DYNAMIC_MARKER) {
                let outcome = skip(announce.name, announce.source, SkipReason::DynamicOrigin);
                self.report.record(outcome);
                // The metadata line still belongs to this class.
                self.next_line(&mut input, &mut pair);
                continue;
            }

            if !self.next_line(&mut input, &mut pair) {
                break;
            }
            let TraceLine::Metadata(metadata) = trace::decode(&pair) else {
                debug!("no metadata line after {}, dropping it", announce.name);
                self.report.unpaired_announces += 1;
                continue;
            };

            let record = TraceRecord::new(&announce, metadata);
            self.process(&record, &mut output)?;
        }

        output.flush()?;
        self.report.fat_jars_extracted = self.fat_jars().extractions();

        if self.emitted.is_empty() {
            warn!("no classes written, is the trace from -Xlog:class+load=debug?");
        }
        debug!(
            emitted = self.report.emitted,
            skipped = self.report.total_skipped(),
            anchor = ?self.ids.anchor(),
            "conversion finished"
        );
        Ok(self.report.clone())
    }

    /// Decides a single decoded record and writes it if it is accepted.
    pub fn process<W: Write>(
        &mut self,
        record: &TraceRecord,
        output: &mut W,
    ) -> Result<Outcome, ConvertError> {
        self.report.records += 1;

        if record.name == ROOT_CLASS {
            self.ids.observe_root(&record.identity)?;
        }
        let id = self.ids.map(&record.identity);
        let parent = self.ids.map(&record.parent);
        let interfaces: Vec<ClassId> = record.interfaces.iter().map(|i| self.ids.map(i)).collect();

        debug!("loader = {}", record.loader);
        let kind = LoaderKind::classify(&record.loader);
        let outcome = if kind.is_trusted() {
            let internal_name = record.internal_name();
            let entry = ClassListEntry {
                internal_name: &internal_name,
                detail: (!self.config.classes_only).then_some(Detail::Trusted { id: &id }),
            };
            writeln!(output, "{entry}")?;
            self.emitted.insert(id, &record.name);
            Outcome::Emitted(kind)
        } else {
            self.process_custom(record, id, parent, interfaces, output)?
        };

        self.report.record(outcome);
        Ok(outcome)
    }

    fn process_custom<W: Write>(
        &mut self,
        record: &TraceRecord,
        id: ClassId,
        parent: ClassId,
        interfaces: Vec<ClassId>,
        output: &mut W,
    ) -> Result<Outcome, ConvertError> {
        let located = match self.locator.locate(&record.source) {
            Ok(located) => located,
            Err(e) => {
                let source = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| record.source.clone());
                return Ok(skip(&record.name, &source, e.reason()));
            }
        };
        let source = located.path.display().to_string();
        let internal_name = record.internal_name();

        match located.major_version(&internal_name) {
            Ok(major) if classfile::is_pre_java5(major) => {
                return Ok(skip(&record.name, &source, SkipReason::PreThresholdVersion));
            }
            Ok(_) => {}
            Err(e) => {
                debug!("can't check class {internal_name}: {e:#}");
                return Ok(skip(&record.name, &source, SkipReason::UnreadableClass));
            }
        }

        if self.emitted.contains_name(&record.name) {
            return Ok(skip(&record.name, &source, SkipReason::DuplicateName));
        }
        if !self
            .emitted
            .contains_all(std::iter::once(&parent).chain(&interfaces))
        {
            return Ok(skip(
                &record.name,
                &source,
                SkipReason::UnsatisfiedDependencies,
            ));
        }

        let entry = ClassListEntry {
            internal_name: &internal_name,
            detail: (!self.config.classes_only).then_some(Detail::Custom {
                id: &id,
                parent: &parent,
                interfaces: &interfaces,
                source: &located.path,
            }),
        };
        writeln!(output, "{entry}")?;
        self.emitted.insert(id, &record.name);
        Ok(Outcome::Emitted(LoaderKind::Custom))
    }

    /// Reads the next line into `buf`. A read failure ends the pass as if
    /// the input were exhausted.
    fn next_line<R: BufRead>(&mut self, input: &mut R, buf: &mut String) -> bool {
        buf.clear();
        if self.report.input_truncated {
            return false;
        }

        let mut raw = Vec::new();
        match input.read_until(b'\n', &mut raw) {
            Ok(0) => false,
            Ok(_) => {
                self.report.lines_read += 1;
                buf.push_str(&String::from_utf8_lossy(&raw));
                true
            }
            Err(e) => {
                error!("Error reading input file: {e}");
                self.report.input_truncated = true;
                false
            }
        }
    }
}

fn skip(name: &str, source: &str, reason: SkipReason) -> Outcome {
    info!("Skipping {name} from {source} - reason: {reason}");
    Outcome::Skipped(reason)
}
