// Error taxonomy for the calling pipeline.
//
// Only unrecoverable per-window conditions are errors. Per-window skip
// decisions (too many unique k-mers, cyclic graph, too many alleles, low GQ,
// empty read set) are reported through log lines and yield zero variants.

use std::fmt;
use std::io;

/// Errors surfaced by the core to the window driver.
#[derive(Debug)]
pub enum CallError {
    /// Malformed caller input: an empty sequence handed to the SW aligner,
    /// an unsupported cigar operation during event extraction, a malformed
    /// FASTA or SAM field, or an unparseable interval string.
    InvalidInput(String),

    /// Interval coordinates out of order (end < begin).
    OutOfRange(String),

    /// I/O failure reading inputs or writing the VCF.
    Io(io::Error),
}

pub type Result<T> = std::result::Result<T, CallError>;

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            CallError::OutOfRange(msg) => write!(f, "Out of range: {}", msg),
            CallError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for CallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CallError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for CallError {
    fn from(err: io::Error) -> Self {
        CallError::Io(err)
    }
}
