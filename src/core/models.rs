use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use serde::{Serialize, Deserialize};

use crate::utils::paths::canonical_path;

/// Kind of a candidate file, inferred from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Script,
    Stylesheet,
    Other,
}

impl FileKind {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "js" | "mjs" | "cjs" => FileKind::Script,
            "css" => FileKind::Stylesheet,
            _ => FileKind::Other,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(FileKind::Other)
    }
}

/// One candidate file found by the path matcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Directory the entry was resolved against
    pub root: PathBuf,
    /// Path relative to `root`, `/`-separated, extension included
    pub relative: String,
    /// Absolute (canonical when the file exists) path
    pub path: PathBuf,
    pub kind: FileKind,
}

impl SourceEntry {
    pub fn new(root: &Path, relative: &str, path: PathBuf) -> Self {
        let kind = FileKind::from_path(&path);
        Self {
            root: root.to_path_buf(),
            relative: relative.replace('\\', "/"),
            path,
            kind,
        }
    }

    /// Split the relative path into stem and extension (dot included).
    /// A leading dot in the file name does not start an extension.
    pub fn split_extension(&self) -> (&str, &str) {
        let name_start = self.relative.rfind('/').map(|i| i + 1).unwrap_or(0);
        match self.relative[name_start..].rfind('.') {
            Some(sep) if sep > 0 => self.relative.split_at(name_start + sep),
            _ => (self.relative.as_str(), ""),
        }
    }

    /// Destination path of the processed file: `<dest_root>/<stem><suffix><ext>`
    pub fn destination(&self, dest_root: &Path, suffix: &str) -> PathBuf {
        let (stem, ext) = self.split_extension();
        dest_root.join(format!("{}{}{}", stem, suffix, ext))
    }

    pub fn file_name(&self) -> String {
        display_name(&self.path)
    }
}

/// A produced artifact. `temporary` is set while the content is being
/// written to the `.tmp` sibling and cleared once it has been renamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub path: PathBuf,
    pub temporary: bool,
}

impl OutputTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            temporary: false,
        }
    }

    /// The `.tmp` sibling used while writing
    pub fn temp_sibling(&self) -> OutputTarget {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        OutputTarget {
            path: PathBuf::from(name),
            temporary: true,
        }
    }

    pub fn file_name(&self) -> String {
        display_name(&self.path)
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// One concatenation pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AggregationSpec {
    pub output: PathBuf,
    /// Base directory for relative includes and globs. Defaults to the
    /// output's parent directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_dir: Option<PathBuf>,
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
    #[serde(alias = "removeIncludedAfterUse")]
    pub remove_included: bool,
    #[serde(alias = "insertSeparatorBetweenFiles")]
    pub insert_new_line: bool,
    #[serde(alias = "insertPerFileHeader")]
    pub insert_file_header: bool,
    /// Append `;` after every file
    pub fix_last_semicolon: bool,
    #[serde(alias = "skipDuplicateAcrossAggregations")]
    pub auto_exclude_wildcards: bool,
    #[serde(alias = "onlyRunIfAnyInputChanged")]
    pub only_if_changed: bool,
}

impl AggregationSpec {
    pub fn new(output: impl Into<PathBuf>, includes: &[&str]) -> Self {
        Self {
            output: output.into(),
            includes: includes.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn input_dir(&self) -> PathBuf {
        match &self.input_dir {
            Some(dir) => dir.clone(),
            None => match self.output.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            },
        }
    }
}

/// Outputs (re)written during the current run, keyed by canonical path
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    paths: HashSet<PathBuf>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &Path) -> bool {
        self.paths.insert(canonical_path(path))
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(&canonical_path(path))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// Positional message reported while transforming a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub source_name: Option<String>,
    pub line: usize,
    pub column: usize,
    pub message: String,
    /// Text of the offending source line, when known
    pub line_source: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            source_name: None,
            line: 0,
            column: 0,
            message: message.into(),
            line_source: None,
        }
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = line;
        self.column = column;
        self
    }

    pub fn in_source(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    pub fn with_line_source(mut self, text: impl Into<String>) -> Self {
        self.line_source = Some(text.into());
        self
    }
}

/// Knobs handed to the transformer with every file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformOptions {
    /// Insert line breaks after this column; `<= 0` means unbounded
    pub line_break: i32,
    /// Shorten local identifiers (scripts only)
    pub munge: bool,
    pub preserve_all_semicolons: bool,
    pub disable_optimizations: bool,
    /// Copy input through untouched
    pub no_compress: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            line_break: -1,
            munge: true,
            preserve_all_semicolons: false,
            disable_optimizations: false,
            no_compress: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransformOutput {
    pub code: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl TransformOutput {
    pub fn unchanged(source: &str) -> Self {
        Self {
            code: source.to_string(),
            diagnostics: Vec::new(),
        }
    }
}

/// A directory scanned for files to process and where its outputs go
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceRoot {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
    /// Prefer an already present `destination/<relative>` file as input
    pub dest_as_source: bool,
}

impl SourceRoot {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            ..Default::default()
        }
    }
}

pub const DEFAULT_INCLUDES: &[&str] = &["**/*.css", "**/*.js"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// Project root; diagnostics name files relative to it
    pub root: PathBuf,
    pub source_roots: Vec<SourceRoot>,
    /// Extra excludes applied to every source root
    pub excludes: Vec<String>,
    pub default_excludes: bool,
    pub suffix: String,
    pub nosuffix: bool,
    #[serde(flatten)]
    pub transform: TransformOptions,
    pub force: bool,
    pub gzip: bool,
    pub gzip_level: u32,
    pub statistics: bool,
    pub use_smallest_file: bool,
    pub pre_process_aggregates: bool,
    pub aggregations: Vec<AggregationSpec>,
    /// Record transformer warnings
    pub js_warn: bool,
    pub fail_on_warning: bool,
    pub fail_on_error: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            source_roots: Vec::new(),
            excludes: Vec::new(),
            default_excludes: true,
            suffix: "-min".to_string(),
            nosuffix: false,
            transform: TransformOptions::default(),
            force: false,
            gzip: false,
            gzip_level: 9,
            statistics: true,
            use_smallest_file: true,
            pre_process_aggregates: false,
            aggregations: Vec::new(),
            js_warn: true,
            fail_on_warning: false,
            fail_on_error: false,
        }
    }
}

impl PipelineConfig {
    /// Suffix actually appended to output names
    pub fn effective_suffix(&self) -> &str {
        if self.nosuffix {
            ""
        } else {
            &self.suffix
        }
    }

    /// Warnings are always recorded when they can fail the build
    pub fn accept_warnings(&self) -> bool {
        self.js_warn || self.fail_on_warning
    }
}

/// What happened to a single processed file
#[derive(Debug, Clone)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: OutputTarget,
    pub input_size: u64,
    pub output_size: u64,
    /// Transformed output was not smaller, so the original was copied
    pub original_kept: bool,
    pub gzipped: Option<GzipReport>,
}

#[derive(Debug, Clone)]
pub struct GzipReport {
    pub path: PathBuf,
    pub size: u64,
}

/// Run-scoped accumulator returned by each phase and merged by the driver
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub files_processed: usize,
    pub files_skipped: usize,
    pub aggregations_written: usize,
    pub input_bytes: u64,
    pub output_bytes: u64,
}

impl RunStats {
    pub fn merge(&mut self, other: &RunStats) {
        self.files_processed += other.files_processed;
        self.files_skipped += other.files_skipped;
        self.aggregations_written += other.aggregations_written;
        self.input_bytes += other.input_bytes;
        self.output_bytes += other.output_bytes;
    }
}

#[derive(Debug, Default)]
pub struct BuildReport {
    pub stats: RunStats,
    pub warnings: usize,
    pub errors: usize,
    pub diagnostics: Vec<Diagnostic>,
    /// Non-counted notices such as missing source directories
    pub notices: Vec<Diagnostic>,
    pub files: Vec<FileReport>,
    /// Aggregation outputs written during the run
    pub aggregated: Vec<PathBuf>,
}

/// `fileX` size as an integer percentage of `file100`, both floored at one byte
pub fn ratio_of_size(size100: u64, size_x: u64) -> u64 {
    let v100 = size100.max(1);
    let vx = size_x.max(1);
    (vx * 100) / v100
}
