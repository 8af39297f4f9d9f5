//! Class identities and their compaction into small relative integers.
//!
//! HotSpot reports `klass` addresses, which are large and do not fit into
//! the 32-bit ids a class list expects. Compaction subtracts the address of
//! `java.lang.Object`, the first class the VM loads, so every later class
//! gets a small positive id.

use std::fmt;

use tracing::{debug, warn};

use crate::error::ConvertError;
use crate::trace::RawId;

/// The class whose identity anchors compaction.
pub const ROOT_CLASS: &str = "java.lang.Object";

/// Identity as it is written to, and tracked for, the class list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClassId {
    /// The hex token exactly as it appeared in the trace.
    Raw(String),
    Compact(i64),
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassId::Raw(token) => f.write_str(token),
            ClassId::Compact(id) => write!(f, "{id}"),
        }
    }
}

/// `0` is the "no super class" sentinel and is never relocated.
pub fn compact(raw: u64, anchor: u64) -> i64 {
    if raw == 0 {
        return 0;
    }
    raw.wrapping_sub(anchor) as i64
}

#[derive(Debug, Default)]
pub struct Compactor {
    anchor: Option<u64>,
}

impl Compactor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn anchor(&self) -> Option<u64> {
        self.anchor
    }

    /// Fixes the anchor from the root class. A second root class means the
    /// trace mixes several VM runs, which makes every id ambiguous.
    pub fn fix_anchor(&mut self, root: &RawId) -> Result<(), ConvertError> {
        if self.anchor.is_some() {
            return Err(ConvertError::DuplicateRoot {
                name: ROOT_CLASS.to_string(),
            });
        }
        debug!(klass = %root.token, anchor = root.value, "{ROOT_CLASS} anchors compacted ids");
        self.anchor = Some(root.value);
        Ok(())
    }

    pub fn compact(&self, raw: &RawId) -> ClassId {
        let id = compact(raw.value, self.anchor.unwrap_or(0));
        if id < 0 {
            warn!(
                klass = %raw.token,
                compacted = id,
                "negative klass id, try --compact-ids=false"
            );
        }
        debug!("compacting {} to {id}", raw.token);
        ClassId::Compact(id)
    }
}

/// Maps raw trace identities to the ids written to the class list.
#[derive(Debug)]
pub enum IdMapper {
    Raw,
    Compact(Compactor),
}

impl IdMapper {
    pub fn new(compact_ids: bool) -> Self {
        if compact_ids {
            IdMapper::Compact(Compactor::new())
        } else {
            IdMapper::Raw
        }
    }

    /// Called for every root class record; a no-op when ids are not compacted.
    pub fn observe_root(&mut self, identity: &RawId) -> Result<(), ConvertError> {
        match self {
            IdMapper::Raw => Ok(()),
            IdMapper::Compact(compactor) => compactor.fix_anchor(identity),
        }
    }

    /// Raw identity ids are relative to; `None` in raw mode or before the root
    /// class was seen.
    pub fn anchor(&self) -> Option<u64> {
        match self {
            IdMapper::Raw => None,
            IdMapper::Compact(compactor) => compactor.anchor(),
        }
    }

    pub fn map(&self, raw: &RawId) -> ClassId {
        match self {
            IdMapper::Raw => ClassId::Raw(raw.token.clone()),
            IdMapper::Compact(compactor) => compactor.compact(raw),
        }
    }
}
