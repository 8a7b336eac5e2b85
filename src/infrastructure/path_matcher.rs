//! Include/exclude resolution over a directory tree.
//!
//! Include entries are either literal paths or glob patterns (`*`, `?`,
//! `**`). Globs are matched against `/`-separated paths relative to the
//! base directory, with `*` never crossing a directory separator.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};

use crate::core::models::{Diagnostic, SourceEntry};
use crate::utils::paths::canonical_path;
use crate::utils::{IoPhase, IoResultExt, MinpackError, Result};

/// Version-control and OS metadata files skipped by every glob scan
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "**/*~",
    "**/#*#",
    "**/.#*",
    "**/%*%",
    "**/._*",
    "**/CVS",
    "**/CVS/**",
    "**/.cvsignore",
    "**/RCS",
    "**/RCS/**",
    "**/SCCS",
    "**/SCCS/**",
    "**/vssver.scc",
    "**/.svn",
    "**/.svn/**",
    "**/.git",
    "**/.git/**",
    "**/.gitattributes",
    "**/.gitignore",
    "**/.gitmodules",
    "**/.hg",
    "**/.hg/**",
    "**/.hgignore",
    "**/.hgsub",
    "**/.hgsubstate",
    "**/.hgtags",
    "**/.bzr",
    "**/.bzr/**",
    "**/.bzrignore",
    "**/_darcs",
    "**/_darcs/**",
    "**/.DS_Store",
    "**/Thumbs.db",
];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Entries found for one `resolve` call plus any notices raised on the way
#[derive(Debug, Default)]
pub struct Resolution {
    pub entries: Vec<SourceEntry>,
    pub notices: Vec<Diagnostic>,
}

impl Resolution {
    pub fn paths(&self) -> Vec<PathBuf> {
        self.entries.iter().map(|e| e.path.clone()).collect()
    }
}

/// Does this include entry need expanding against the filesystem?
pub fn is_glob(entry: &str) -> bool {
    entry.contains('*') || entry.contains('?')
}

/// Compile patterns up front so a malformed one fails before any I/O
pub fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| compile(p))
        .collect()
}

fn compile(pattern: &str) -> Result<Pattern> {
    let mut normalized = pattern.replace('\\', "/");
    // A trailing slash means "everything below"
    if normalized.ends_with('/') {
        normalized.push_str("**");
    }
    Pattern::new(&normalized).map_err(|source| MinpackError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

#[derive(Debug, Clone, Default)]
pub struct PathMatcher {
    use_default_excludes: bool,
}

impl PathMatcher {
    pub fn new(use_default_excludes: bool) -> Self {
        Self { use_default_excludes }
    }

    /// Resolve `includes` under `base_dir` into an ordered, deduplicated
    /// list.
    ///
    /// Literal entries are kept in the order given and are never filtered
    /// by `excludes`. Each glob entry contributes its matches sorted by
    /// relative path. A path already in the result is skipped.
    pub fn resolve(
        &self,
        base_dir: &Path,
        includes: &[String],
        excludes: &[String],
    ) -> Result<Resolution> {
        let mut resolution = Resolution::default();

        let mut exclude_patterns = compile_patterns(excludes)?;
        if self.use_default_excludes {
            for pattern in DEFAULT_EXCLUDES {
                exclude_patterns.push(compile(pattern)?);
            }
        }
        let include_patterns: Vec<Option<Pattern>> = includes
            .iter()
            .map(|entry| if is_glob(entry) { compile(entry).map(Some) } else { Ok(None) })
            .collect::<Result<_>>()?;

        if !base_dir.is_dir() {
            resolution.notices.push(Diagnostic::warning(format!(
                "base directory {} does not exist",
                base_dir.display()
            )));
            return Ok(resolution);
        }
        let base = canonical_path(base_dir);

        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut tree: Option<Vec<String>> = None;

        for (entry, pattern) in includes.iter().zip(include_patterns.iter()) {
            match pattern {
                Some(pattern) => {
                    if tree.is_none() {
                        tree = Some(walk(&base)?);
                    }
                    let files = tree.as_deref().unwrap_or_default();
                    // walk() returns files sorted by relative path
                    for relative in files {
                        if !pattern.matches_with(relative, MATCH_OPTIONS) {
                            continue;
                        }
                        if exclude_patterns
                            .iter()
                            .any(|ex| ex.matches_with(relative, MATCH_OPTIONS))
                        {
                            continue;
                        }
                        let path = canonical_path(&base.join(relative));
                        if seen.insert(path.clone()) {
                            resolution.entries.push(SourceEntry::new(&base, relative, path));
                        }
                    }
                }
                None => {
                    let literal = Path::new(entry);
                    let joined = if literal.is_absolute() {
                        literal.to_path_buf()
                    } else {
                        base.join(literal)
                    };
                    let path = canonical_path(&joined);
                    let relative = path
                        .strip_prefix(&base)
                        .map(|rel| rel.to_string_lossy().into_owned())
                        .unwrap_or_else(|_| entry.clone());
                    if seen.insert(path.clone()) {
                        resolution.entries.push(SourceEntry::new(&base, &relative, path));
                    }
                }
            }
        }

        Ok(resolution)
    }
}

/// All files below `base`, as sorted `/`-separated relative paths
fn walk(base: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    walk_recursive(base, base, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk_recursive(dir: &Path, base: &Path, files: &mut Vec<String>) -> Result<()> {
    let entries = fs::read_dir(dir).with_path(dir, IoPhase::Scan)?;
    for entry in entries {
        let entry = entry.with_path(dir, IoPhase::Scan)?;
        let path = entry.path();
        let file_type = entry.file_type().with_path(&path, IoPhase::Scan)?;

        // Do not follow directory symlinks, they can loop
        if file_type.is_dir() {
            walk_recursive(&path, base, files)?;
        } else if path.is_file() {
            if let Ok(rel) = path.strip_prefix(base) {
                files.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
    }
    Ok(())
}
