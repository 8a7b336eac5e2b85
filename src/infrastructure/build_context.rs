use crate::core::interfaces::BuildContext;
use crate::core::models::Diagnostic;
use crate::infrastructure::file_system::write_atomic;
use crate::utils::incremental::FileMetadata;
use crate::utils::paths::canonical_path;
use crate::utils::{Logger, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_STATE_FILE: &str = ".minpack-state.json";

/// Host for one-shot builds: everything counts as changed
#[derive(Debug, Default)]
pub struct FullBuildContext;

impl FullBuildContext {
    pub fn new() -> Self {
        Self
    }
}

impl BuildContext for FullBuildContext {
    fn is_incremental(&self) -> bool {
        false
    }

    fn has_delta(&mut self, _path: &Path) -> bool {
        true
    }

    fn refresh(&mut self, _path: &Path) {}

    fn add_message(&mut self, _file: &Path, _diagnostic: &Diagnostic) {}
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    files: HashMap<PathBuf, FileMetadata>,
}

const SNAPSHOT_VERSION: u32 = 1;

/// Incremental host backed by a JSON snapshot of file metadata.
///
/// Without a usable snapshot the first build is a full one. Every path
/// queried or refreshed during the run is re-hashed by [`save`] so the
/// next run compares against the state this run left behind.
///
/// [`save`]: ManifestBuildContext::save
#[derive(Debug)]
pub struct ManifestBuildContext {
    state_file: PathBuf,
    incremental: bool,
    snapshot: Snapshot,
    touched: Vec<PathBuf>,
}

impl ManifestBuildContext {
    pub fn load(state_file: impl Into<PathBuf>) -> Self {
        let state_file = state_file.into();
        let snapshot = fs::read_to_string(&state_file)
            .ok()
            .and_then(|text| serde_json::from_str::<Snapshot>(&text).ok())
            .filter(|snapshot| snapshot.version == SNAPSHOT_VERSION);

        match snapshot {
            Some(snapshot) => {
                Logger::debug(&format!(
                    "loaded build state with {} entries from {}",
                    snapshot.files.len(),
                    state_file.display()
                ));
                Self::with_snapshot(state_file, snapshot, true)
            }
            None => {
                Logger::debug("no previous build state, running a full build");
                Self::with_snapshot(state_file, Snapshot::default(), false)
            }
        }
    }

    fn with_snapshot(state_file: PathBuf, snapshot: Snapshot, incremental: bool) -> Self {
        Self {
            state_file,
            incremental,
            snapshot,
            touched: Vec::new(),
        }
    }

    fn touch(&mut self, path: &Path) -> PathBuf {
        let key = canonical_path(path);
        if !self.touched.contains(&key) {
            self.touched.push(key.clone());
        }
        key
    }

    /// Record the current state of every touched file and write the snapshot
    pub fn save(&mut self) -> Result<()> {
        for path in std::mem::take(&mut self.touched) {
            match FileMetadata::from_file(&path) {
                Ok(meta) => {
                    self.snapshot.files.insert(path, meta);
                }
                Err(_) => {
                    self.snapshot.files.remove(&path);
                }
            }
        }
        self.snapshot.version = SNAPSHOT_VERSION;

        let json = serde_json::to_string_pretty(&self.snapshot)?;
        write_atomic(&self.state_file, json.as_bytes())?;
        Logger::debug(&format!("saved build state to {}", self.state_file.display()));
        Ok(())
    }
}

impl BuildContext for ManifestBuildContext {
    fn is_incremental(&self) -> bool {
        self.incremental
    }

    fn has_delta(&mut self, path: &Path) -> bool {
        let key = self.touch(path);
        match self.snapshot.files.get(&key) {
            Some(meta) => meta.has_changed(),
            None => true,
        }
    }

    fn refresh(&mut self, path: &Path) {
        self.touch(path);
    }

    // Diagnostics are already logged by the collector
    fn add_message(&mut self, _file: &Path, _diagnostic: &Diagnostic) {}

    fn finish(&mut self) -> Result<()> {
        self.save()
    }
}
