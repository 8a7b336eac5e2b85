use crate::core::models::OutputTarget;
use crate::utils::{IoPhase, IoResultExt, Result};
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

/// Output file written through a `.tmp` sibling.
///
/// Nothing appears at the final path until [`AtomicFile::commit`] renames
/// the finished temp file over it. Dropping an uncommitted file removes the
/// temp file, so an error on any path leaves the target untouched.
pub struct AtomicFile {
    target: OutputTarget,
    temp: OutputTarget,
    writer: Option<BufWriter<File>>,
}

impl AtomicFile {
    pub fn create(target: &Path) -> Result<Self> {
        ensure_parent(target)?;
        let target = OutputTarget::new(target);
        let temp = target.temp_sibling();
        remove_if_exists(&temp.path)?;
        let file = File::create(&temp.path).with_path(&temp.path, IoPhase::Write)?;
        Ok(Self {
            target,
            temp,
            writer: Some(BufWriter::new(file)),
        })
    }

    pub fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let path = self.temp.path.clone();
        self.writer_mut()
            .and_then(|w| w.write_all(bytes))
            .with_path(&path, IoPhase::Write)
    }

    /// Stream a whole file into the output
    pub fn append_file(&mut self, source: &Path) -> Result<u64> {
        let mut input = File::open(source).with_path(source, IoPhase::Read)?;
        let path = self.temp.path.clone();
        self.writer_mut()
            .and_then(|w| io::copy(&mut input, w))
            .with_path(&path, IoPhase::Write)
    }

    /// Flush, close and move the temp file over the target
    pub fn commit(mut self) -> Result<OutputTarget> {
        if let Some(writer) = self.writer.take() {
            let file = writer
                .into_inner()
                .map_err(|e| e.into_error())
                .with_path(&self.temp.path, IoPhase::Write)?;
            file.sync_all().with_path(&self.temp.path, IoPhase::Write)?;
        }
        replace(&self.temp.path, &self.target.path)?;
        self.temp.temporary = false;
        Ok(self.target.clone())
    }

    fn writer_mut(&mut self) -> io::Result<&mut BufWriter<File>> {
        self.writer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "output already closed"))
    }
}

impl Write for AtomicFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer_mut()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer_mut()?.flush()
    }
}

impl Drop for AtomicFile {
    fn drop(&mut self) {
        if self.temp.temporary {
            // Close the handle before unlinking so Windows lets go of it
            self.writer.take();
            let _ = fs::remove_file(&self.temp.path);
        }
    }
}

/// Write `bytes` to `target` atomically
pub fn write_atomic(target: &Path, bytes: &[u8]) -> Result<OutputTarget> {
    let mut out = AtomicFile::create(target)?;
    out.write_all(bytes)?;
    out.commit()
}

/// Copy `source` to `target` atomically, byte for byte
pub fn copy_atomic(source: &Path, target: &Path) -> Result<OutputTarget> {
    let mut out = AtomicFile::create(target)?;
    out.append_file(source)?;
    out.commit()
}

pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    File::open(path)
        .and_then(|mut f| f.read_to_end(&mut buf))
        .with_path(path, IoPhase::Read)?;
    Ok(buf)
}

pub fn file_size(path: &Path) -> u64 {
    path.metadata().map(|m| m.len()).unwrap_or(0)
}

pub fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).with_path(parent, IoPhase::CreateDir)
        }
        _ => Ok(()),
    }
}

pub fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(crate::utils::MinpackError::io(path, IoPhase::Delete, e)),
    }
}

/// Move `from` over `to`, replacing any existing file
fn replace(from: &Path, to: &Path) -> Result<()> {
    // rename() does not overwrite on Windows
    #[cfg(windows)]
    remove_if_exists(to)?;

    fs::rename(from, to).with_path(to, IoPhase::Rename)
}
