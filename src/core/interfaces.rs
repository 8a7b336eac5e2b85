use crate::core::models::*;
use crate::utils::Result;
use std::path::Path;

/// Minification capability consumed by the file processor
pub trait Transformer: Send + Sync {
    /// Transform the full content of one file. Problems in the input are
    /// reported as diagnostics; `Err` is reserved for failures that must
    /// abort the run.
    fn transform(&self, source: &str, kind: FileKind, options: &TransformOptions) -> Result<TransformOutput>;

    fn name(&self) -> &str;
}

/// Hooks into the build system hosting the pipeline
pub trait BuildContext {
    /// Only files with a delta are processed when this is true
    fn is_incremental(&self) -> bool;

    /// Whether `path` changed since the last successful build
    fn has_delta(&mut self, path: &Path) -> bool;

    /// Called after a file has been (re)written so host caches can drop it
    fn refresh(&mut self, path: &Path);

    /// Positional message sink
    fn add_message(&mut self, file: &Path, diagnostic: &Diagnostic);

    /// Called once after a successful run
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Narrow reporting capability handed to code that emits diagnostics
pub trait DiagnosticSink {
    fn error(&mut self, diagnostic: Diagnostic) -> bool;
    fn warning(&mut self, diagnostic: Diagnostic) -> bool;
}
