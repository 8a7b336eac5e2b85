use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The step an I/O failure happened in, so errors read as
/// "write failed for dist/app-min.js" instead of a bare OS message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoPhase {
    Scan,
    Read,
    Write,
    Rename,
    Delete,
    CreateDir,
    Gzip,
}

impl fmt::Display for IoPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IoPhase::Scan => "scan",
            IoPhase::Read => "read",
            IoPhase::Write => "write",
            IoPhase::Rename => "rename",
            IoPhase::Delete => "delete",
            IoPhase::CreateDir => "create directory",
            IoPhase::Gzip => "gzip",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum MinpackError {
    #[error("{phase} failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        phase: IoPhase,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("{warnings} warning(s) reported while fail-on-warning is active")]
    WarningsAsErrors { warnings: usize },

    #[error("{errors} error(s) reported while fail-on-error is active")]
    ErrorsAsFailure { errors: usize },
}

impl MinpackError {
    /// Wrap an I/O error with the file and the phase it belongs to
    pub fn io(path: impl Into<PathBuf>, phase: IoPhase, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            phase,
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

pub type Result<T> = std::result::Result<T, MinpackError>;

/// Attach path and phase to a raw `std::io::Result`
pub trait IoResultExt<T> {
    fn with_path(self, path: &Path, phase: IoPhase) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: &Path, phase: IoPhase) -> Result<T> {
        self.map_err(|e| MinpackError::io(path, phase, e))
    }
}

impl From<serde_json::Error> for MinpackError {
    fn from(err: serde_json::Error) -> Self {
        MinpackError::config(format!("JSON error: {}", err))
    }
}
