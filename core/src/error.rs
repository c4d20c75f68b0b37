use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while writing or opening an index file.
///
/// A lookup miss is never an error: readers return `Ok(None)` for an absent
/// word or document id.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not an index file: bad magic number {found:#010x}")]
    BadMagic { found: u32 },

    #[error("index file is {actual} bytes but header declares {expected}")]
    LengthMismatch { expected: u64, actual: u64 },

    #[error("checksum mismatch: header has {stored:#010x}, body hashes to {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    #[error("corrupt index at offset {offset}: {reason}")]
    Corrupt { offset: u64, reason: String },

    #[error("{field} value {value} does not fit its on-disk field")]
    FieldOverflow { field: &'static str, value: u64 },

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
}

pub type Result<T> = std::result::Result<T, IndexError>;

impl IndexError {
    pub(crate) fn corrupt(offset: u64, reason: impl Into<String>) -> Self {
        IndexError::Corrupt { offset, reason: reason.into() }
    }

    /// True for failures that mean the file itself cannot be trusted, as
    /// opposed to an environmental I/O problem.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            IndexError::BadMagic { .. }
                | IndexError::LengthMismatch { .. }
                | IndexError::ChecksumMismatch { .. }
                | IndexError::Corrupt { .. }
        )
    }
}
