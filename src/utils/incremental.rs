// Change tracking for minpack
// Decides per file whether work is needed (full vs incremental builds) and
// remembers which outputs were rewritten during the current run.

use std::path::{Path, PathBuf};
use std::time::SystemTime;
use serde::{Serialize, Deserialize};

use crate::core::interfaces::BuildContext;
use crate::core::models::ChangeSet;

/// Outcome of the precondition checks run before a file is transformed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Output missing, older than its source, or forced
    Stale,
    /// Output is newer than its source
    NotStale,
    /// Incremental build and the host reports no change
    NoDelta,
    /// Input name already carries the minified suffix
    AlreadyMinified,
    /// A file with the output's name sits next to the input in the source tree
    UserProvidedOverride,
}

impl Decision {
    pub fn should_process(self) -> bool {
        self == Decision::Stale
    }

    pub fn reason(self) -> &'static str {
        match self {
            Decision::Stale => "stale",
            Decision::NotStale => "output is younger than original, use 'force' option or clean your target",
            Decision::NoDelta => "no delta since last build",
            Decision::AlreadyMinified => "already minified",
            Decision::UserProvidedOverride => "minified file already exists in the source directory",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChangeTracker {
    force: bool,
    incremental: bool,
    changes: ChangeSet,
}

impl ChangeTracker {
    pub fn new(force: bool, incremental: bool) -> Self {
        Self {
            force,
            incremental,
            changes: ChangeSet::new(),
        }
    }

    pub fn is_incremental(&self) -> bool {
        self.incremental
    }

    /// Full-build rule: the target needs regeneration when forced, missing,
    /// or not strictly newer than the source.
    pub fn is_stale(&self, source: &Path, target: &Path) -> bool {
        if self.force {
            return true;
        }
        match (modified(source), modified(target)) {
            (Some(source_time), Some(target_time)) => target_time <= source_time,
            _ => true,
        }
    }

    /// Incremental rule: ask the host. Full builds treat every file as changed.
    pub fn has_delta(&self, host: &mut dyn BuildContext, source: &Path) -> bool {
        // The host is queried even on full builds so it sees every input
        let delta = host.has_delta(source);
        delta || !self.incremental
    }

    /// Remember a rewritten output. Only tracked for incremental builds.
    pub fn record_change(&mut self, path: &Path) {
        if self.incremental {
            self.changes.insert(path);
        }
    }

    /// Whether any of `inputs` was rewritten in this run or reported
    /// changed by the host
    pub fn any_changed(&self, host: &mut dyn BuildContext, inputs: &[PathBuf]) -> bool {
        inputs
            .iter()
            .any(|input| self.changes.contains(input) || self.has_delta(host, input))
    }
}

/// Modification time of a file, `None` when missing or unreadable
pub fn modified(path: &Path) -> Option<SystemTime> {
    path.metadata().and_then(|m| m.modified()).ok()
}

/// File metadata for change detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub path: PathBuf,
    pub content_hash: String,
    pub modified_time: SystemTime,
    pub size: u64,
}

impl FileMetadata {
    /// Create metadata from a file path
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let content = std::fs::read(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            content_hash: blake3::hash(&content).to_hex().to_string(),
            modified_time: metadata.modified()?,
            size: metadata.len(),
        })
    }

    /// Check if file has changed compared to this metadata
    pub fn has_changed(&self) -> bool {
        match Self::from_file(&self.path) {
            Ok(current) => {
                // Size and hash decide; a touched but identical file is unchanged
                current.size != self.size || current.content_hash != self.content_hash
            }
            Err(_) => true, // File doesn't exist or can't be read = changed
        }
    }
}
