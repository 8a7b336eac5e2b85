use crate::core::models::GzipReport;
use crate::infrastructure::file_system::{file_size, AtomicFile};
use crate::utils::{IoPhase, IoResultExt, Logger, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

pub const GZIP_EXTENSION: &str = "gz";

/// Writes `<file>.gz` next to produced artifacts
#[derive(Debug, Clone)]
pub struct GzipPostProcessor {
    enabled: bool,
    level: u32,
}

impl GzipPostProcessor {
    pub fn new(enabled: bool, level: u32) -> Self {
        Self {
            enabled,
            level: level.min(9),
        }
    }

    /// Sibling name: the full file name plus `.gz`
    pub fn sibling(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(".");
        name.push(GZIP_EXTENSION);
        PathBuf::from(name)
    }

    /// Compress `path` into its `.gz` sibling.
    ///
    /// Returns `None` when disabled, when `path` does not exist, or when it
    /// already is a gzip file.
    pub fn gzip(&self, path: &Path) -> Result<Option<GzipReport>> {
        if !self.enabled || !path.is_file() {
            return Ok(None);
        }
        let already_gzipped = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(GZIP_EXTENSION));
        if already_gzipped {
            return Ok(None);
        }

        let target = Self::sibling(path);
        let mut input = File::open(path).with_path(path, IoPhase::Read)?;

        let out = AtomicFile::create(&target)?;
        let mut encoder = GzEncoder::new(out, Compression::new(self.level));
        io::copy(&mut input, &mut encoder).with_path(&target, IoPhase::Gzip)?;
        let out = encoder.finish().with_path(&target, IoPhase::Gzip)?;
        let written = out.commit()?;

        Logger::gzip_created(&written.file_name());
        Ok(Some(GzipReport {
            size: file_size(&written.path),
            path: written.path,
        }))
    }
}
