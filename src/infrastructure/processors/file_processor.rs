use crate::core::{
    interfaces::{DiagnosticSink, Transformer},
    models::*,
    services::BuildSession,
};
use crate::infrastructure::file_system::{copy_atomic, file_size, read_bytes, AtomicFile};
use crate::infrastructure::processors::GzipPostProcessor;
use crate::utils::incremental::Decision;
use crate::utils::paths::relative_to;
use crate::utils::{Logger, Result, Timer};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ProcessOutcome {
    Skipped(Decision),
    Processed(FileReport),
}

/// Minifies one source file into its destination
pub struct FileProcessor<'a> {
    transformer: &'a dyn Transformer,
    gzip: &'a GzipPostProcessor,
    options: &'a TransformOptions,
    suffix: &'a str,
    project_root: &'a Path,
    use_smallest_file: bool,
    statistics: bool,
}

impl<'a> FileProcessor<'a> {
    pub fn new(config: &'a PipelineConfig, transformer: &'a dyn Transformer, gzip: &'a GzipPostProcessor) -> Self {
        Self {
            transformer,
            gzip,
            options: &config.transform,
            suffix: config.effective_suffix(),
            project_root: &config.root,
            use_smallest_file: config.use_smallest_file,
            statistics: config.statistics,
        }
    }

    /// File actually read for `entry`. With `dest_as_source` a readable copy
    /// already sitting at `dest_root/<relative>` wins over the source tree.
    pub fn input_for(entry: &SourceEntry, dest_root: &Path, dest_as_source: bool) -> PathBuf {
        if dest_as_source {
            let candidate = dest_root.join(&entry.relative);
            if candidate.is_file() && std::fs::File::open(&candidate).is_ok() {
                return candidate;
            }
        }
        entry.path.clone()
    }

    /// Precondition checks, in order: delta, suffix marker, user supplied
    /// minified sibling, timestamps.
    pub fn decide(&self, input: &Path, output: &Path, session: &mut BuildSession<'_>) -> Decision {
        if !session.tracker.has_delta(&mut *session.host, input) {
            return Decision::NoDelta;
        }
        if self.is_minified_name(input) {
            return Decision::AlreadyMinified;
        }
        if let (Some(parent), Some(name)) = (input.parent(), output.file_name()) {
            let sibling = parent.join(name);
            if sibling != input && sibling.exists() {
                return Decision::UserProvidedOverride;
            }
        }
        if !session.tracker.is_stale(input, output) {
            return Decision::NotStale;
        }
        Decision::Stale
    }

    fn is_minified_name(&self, path: &Path) -> bool {
        if self.suffix.is_empty() {
            return false;
        }
        let name = match path.file_name() {
            Some(name) => name.to_string_lossy().to_lowercase(),
            None => return false,
        };
        let suffix = self.suffix.to_lowercase();
        [".js", ".css"]
            .iter()
            .any(|ext| name.ends_with(&format!("{}{}", suffix, ext)))
    }

    pub fn process(
        &self,
        entry: &SourceEntry,
        dest_root: &Path,
        dest_as_source: bool,
        session: &mut BuildSession<'_>,
    ) -> Result<ProcessOutcome> {
        let input = Self::input_for(entry, dest_root, dest_as_source);
        let output = entry.destination(dest_root, self.suffix);
        Logger::compressing(&input.display().to_string(), &output.display().to_string());

        let decision = self.decide(&input, &output, session);
        if !decision.should_process() {
            let subject = match decision {
                Decision::NotStale | Decision::UserProvidedOverride => output.display().to_string(),
                _ => input.display().to_string(),
            };
            Logger::skip(decision.reason(), &subject);
            return Ok(ProcessOutcome::Skipped(decision));
        }

        let _timer = Timer::start(&entry.relative);
        let raw = read_bytes(&input)?;
        let input_size = raw.len() as u64;

        let default_name = format!("...{}", display_relative(&input, self.project_root));
        session.diagnostics.set_default_file_name(&default_name);

        let transformed = match String::from_utf8(raw) {
            Ok(text) => {
                let result = self.transformer.transform(&text, entry.kind, self.options)?;
                for diagnostic in result.diagnostics {
                    report_diagnostic(session, &input, diagnostic);
                }
                Some(result.code)
            }
            Err(_) => {
                report_diagnostic(
                    session,
                    &input,
                    Diagnostic::error("input is not valid UTF-8, copied unchanged"),
                );
                None
            }
        };
        session.diagnostics.set_default_file_name("");

        let original_kept = match transformed {
            Some(code) => {
                // Stage the transformed output next to the target before deciding
                let mut staged = AtomicFile::create(&output)?;
                staged.write_all(code.as_bytes())?;
                if self.use_smallest_file && code.len() as u64 >= input_size {
                    drop(staged);
                    true
                } else {
                    staged.commit()?;
                    false
                }
            }
            None => true,
        };
        if original_kept {
            copy_atomic(&input, &output)?;
            Logger::original_kept(&display_name(&input));
        }
        session.host.refresh(&output);
        session.tracker.record_change(&output);

        let gzipped = self.gzip.gzip(&output)?;
        let report = FileReport {
            input: input.clone(),
            output: OutputTarget::new(&output),
            input_size,
            output_size: file_size(&output),
            original_kept,
            gzipped,
        };
        if self.statistics {
            Logger::file_stats(&stats_line(&report));
        }
        Ok(ProcessOutcome::Processed(report))
    }
}

/// Record through the collector; the host only sees what was kept
fn report_diagnostic(session: &mut BuildSession<'_>, input: &Path, diagnostic: Diagnostic) {
    let forwarded = diagnostic.clone();
    let kept = match diagnostic.severity {
        Severity::Error => session.diagnostics.error(diagnostic),
        Severity::Warning => session.diagnostics.warning(diagnostic),
    };
    if kept {
        session.host.add_message(input, &forwarded);
    }
}

fn display_relative(path: &Path, root: &Path) -> String {
    let text = relative_to(path, root);
    if text.starts_with('/') {
        text
    } else {
        format!("/{}", text)
    }
}

/// `in (Nb) -> out (Mb)[R%]`, plus the gzip sibling when there is one
pub fn stats_line(report: &FileReport) -> String {
    let mut line = if report.original_kept {
        format!(
            "{} ({}b) -> {} ({}b)[compressed output discarded (exceeded input size)]",
            display_name(&report.input),
            report.input_size,
            report.output.file_name(),
            report.output_size
        )
    } else {
        format!(
            "{} ({}b) -> {} ({}b)[{}%]",
            display_name(&report.input),
            report.input_size,
            report.output.file_name(),
            report.output_size,
            ratio_of_size(report.input_size, report.output_size)
        )
    };
    if let Some(gz) = &report.gzipped {
        line.push_str(&format!(
            " -> {} ({}b)[{}%]",
            display_name(&gz.path),
            gz.size,
            ratio_of_size(report.input_size, gz.size)
        ));
    }
    line
}
