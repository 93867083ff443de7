use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{} file not found", path.display())]
    SourceNotFound { path: PathBuf },
    #[error("{} could not be read: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("line {line}: {literal} does not fit in a byte")]
    LiteralTooWide { line: usize, literal: String },
    #[error("program of {len} bytes does not fit in {capacity} bytes of memory")]
    ProgramTooLarge { len: usize, capacity: usize },
}

impl LoadError {
    /// Whether the program source itself could not be obtained, as opposed to
    /// being read and found unusable.
    pub fn is_missing_source(&self) -> bool {
        matches!(
            self,
            LoadError::SourceNotFound { .. } | LoadError::Unreadable { .. }
        )
    }
}
