use std::io::{self, Read};

use tracing::debug;

pub const CLASS_MAGIC: u32 = 0xCAFE_BABE;

/// Major version of Java 5 class files. Older classes lack the metadata
/// the CDS archiver relies on.
pub const JAVA_5_MAJOR: u16 = 49;

/// Reads the class-file header and returns its major version.
///
/// A header with the wrong magic is reported as version `0` so that callers
/// treat it like any other too-old class instead of failing the run.
pub fn major_version<R: Read>(mut reader: R) -> io::Result<u16> {
    let mut header = [0u8; 8];
    reader.read_exact(&mut header)?;

    let magic = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
    if magic != CLASS_MAGIC {
        debug!("invalid class file (magic {magic:#010x})");
        return Ok(0);
    }

    // header[4..6] is the minor version.
    Ok(u16::from_be_bytes([header[6], header[7]]))
}

pub fn is_pre_java5(major: u16) -> bool {
    major < JAVA_5_MAJOR
}
