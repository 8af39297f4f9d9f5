use std::io;

use thiserror::Error;

/// Conditions that abort a conversion pass.
///
/// Everything else a trace can throw at the converter is a
/// [`SkipReason`](crate::report::SkipReason) and only costs the class.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("{name} can't be loaded twice (does the trace contain more than one VM run?)")]
    DuplicateRoot { name: String },

    #[error("failed to write class list")]
    Write(#[from] io::Error),
}
