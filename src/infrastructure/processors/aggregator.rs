use crate::core::{models::*, services::BuildSession};
use crate::infrastructure::file_system::{file_size, remove_if_exists, AtomicFile};
use crate::infrastructure::path_matcher::PathMatcher;
use crate::utils::paths::canonical_path;
use crate::utils::{Logger, Result, Timer};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Concatenates the files named by an [`AggregationSpec`] into its output
#[derive(Debug, Clone)]
pub struct Aggregator {
    matcher: PathMatcher,
}

impl Aggregator {
    pub fn new(matcher: PathMatcher) -> Self {
        Self { matcher }
    }

    /// Inputs of `spec` in write order, without the output itself and,
    /// when `auto_exclude_wildcards` is set, without anything consumed by
    /// an earlier aggregation of this run.
    pub fn resolve_inputs(
        &self,
        spec: &AggregationSpec,
        previously: &HashSet<PathBuf>,
        session: &mut BuildSession<'_>,
    ) -> Result<Vec<PathBuf>> {
        let resolution = self
            .matcher
            .resolve(&spec.input_dir(), &spec.includes, &spec.excludes)?;
        for notice in resolution.notices.iter().cloned() {
            session.notice(notice);
        }

        let output = canonical_path(&spec.output);
        Ok(resolution
            .paths()
            .into_iter()
            .filter(|path| *path != output)
            .filter(|path| !(spec.auto_exclude_wildcards && previously.contains(path)))
            .collect())
    }

    /// Run one aggregation. Returns the files actually consumed; an empty
    /// list means the output was not touched.
    pub fn aggregate(
        &self,
        spec: &AggregationSpec,
        previously: &HashSet<PathBuf>,
        session: &mut BuildSession<'_>,
    ) -> Result<Vec<PathBuf>> {
        let _timer = Timer::start("aggregation");
        let inputs = self.resolve_inputs(spec, previously, session)?;

        if spec.only_if_changed
            && session.tracker.is_incremental()
            && !session.tracker.any_changed(&mut *session.host, &inputs)
        {
            Logger::aggregation_skipped(&display_name(&spec.output));
            return Ok(Vec::new());
        }
        if inputs.is_empty() {
            Logger::debug(&format!("no input for {}", spec.output.display()));
            return Ok(Vec::new());
        }

        let mut out = AtomicFile::create(&spec.output)?;
        for input in &inputs {
            if spec.insert_file_header {
                out.write_all(file_header(input, spec.insert_new_line).as_bytes())?;
            }
            out.append_file(input)?;
            if spec.fix_last_semicolon {
                out.write_all(b";")?;
            }
            if spec.insert_new_line {
                out.write_all(b"\n")?;
            }
        }
        let written = out.commit()?;

        if spec.remove_included {
            for input in &inputs {
                remove_if_exists(input)?;
            }
        }

        session.host.refresh(&written.path);
        session.tracker.record_change(&written.path);
        Ok(inputs)
    }
}

/// `out (Nb) -> out.gz (Mb)[R%]` or `out (Nb)`; `None` when the output
/// does not exist
pub fn stats_line(output: &Path, gzipped: Option<&GzipReport>) -> Option<String> {
    if !output.exists() {
        return None;
    }
    let size = file_size(output);
    Some(match gzipped {
        Some(gz) => format!(
            "{} ({}b) -> {} ({}b)[{}%]",
            display_name(output),
            size,
            display_name(&gz.path),
            gz.size,
            ratio_of_size(size, gz.size)
        ),
        None => format!("{} ({}b)", display_name(output), size),
    })
}

/// `/*<file name>*/`, followed by a newline when separators are on
fn file_header(path: &Path, new_line: bool) -> String {
    let mut header = format!("/*{}*/", display_name(path));
    if new_line {
        header.push('\n');
    }
    header
}
