use crate::core::{interfaces::*, models::*};
use crate::infrastructure::path_matcher::PathMatcher;
use crate::infrastructure::processors::{
    aggregator, Aggregator, FileProcessor, GzipPostProcessor, MinifyTransformer, ProcessOutcome,
};
use crate::utils::diagnostics::{format_message, DiagnosticsCollector};
use crate::utils::incremental::ChangeTracker;
use crate::utils::{Logger, MinpackError, Result, Timer};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// State shared by every phase of one run
pub struct BuildSession<'h> {
    pub host: &'h mut dyn BuildContext,
    pub tracker: ChangeTracker,
    pub diagnostics: DiagnosticsCollector,
    pub notices: Vec<Diagnostic>,
}

impl<'h> BuildSession<'h> {
    pub fn new(host: &'h mut dyn BuildContext, config: &PipelineConfig) -> Self {
        let incremental = host.is_incremental();
        Self {
            host,
            tracker: ChangeTracker::new(config.force, incremental),
            diagnostics: DiagnosticsCollector::new(config.accept_warnings()),
            notices: Vec::new(),
        }
    }

    /// Log a warning that does not count toward the failure policy
    pub fn notice(&mut self, notice: Diagnostic) {
        Logger::warn(&format_message(&notice));
        self.notices.push(notice);
    }
}

/// Sequences matching, minification, aggregation and compression for a
/// whole configuration
pub struct PipelineDriver {
    config: PipelineConfig,
    transformer: Arc<dyn Transformer>,
}

impl PipelineDriver {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            transformer: Arc::new(MinifyTransformer::new()),
        }
    }

    pub fn with_transformer(mut self, transformer: Arc<dyn Transformer>) -> Self {
        self.transformer = transformer;
        self
    }

    pub fn run(&self, host: &mut dyn BuildContext) -> Result<BuildReport> {
        let _timer = Timer::start("pipeline");
        let config = &self.config;
        config.validate()?;

        Logger::run_start(
            &config.root.display().to_string(),
            config.source_roots.len(),
            config.aggregations.len(),
        );

        let gzip = GzipPostProcessor::new(config.gzip, config.gzip_level);
        let matcher = PathMatcher::new(config.default_excludes);
        let mut report = BuildReport::default();

        let stats = {
            let mut session = BuildSession::new(&mut *host, config);
            let mut stats = RunStats::default();

            if config.pre_process_aggregates {
                stats.merge(&self.aggregate(&matcher, &gzip, &mut session, &mut report)?);
            }

            let files = self.process_roots(&matcher, &gzip, &mut session, &mut report)?;
            if config.statistics && files.input_bytes > 0 {
                Logger::totals(
                    files.input_bytes,
                    files.output_bytes,
                    (files.output_bytes * 100) / files.input_bytes,
                );
            }
            stats.merge(&files);

            if !config.pre_process_aggregates {
                stats.merge(&self.aggregate(&matcher, &gzip, &mut session, &mut report)?);
            }

            report.warnings = session.diagnostics.warning_count();
            report.errors = session.diagnostics.error_count();
            report.notices = std::mem::take(&mut session.notices);
            report.diagnostics = session.diagnostics.into_diagnostics();
            stats
        };
        report.stats = stats;

        Logger::summary(report.warnings, report.errors);

        if config.fail_on_warning && report.warnings > 0 {
            return Err(MinpackError::WarningsAsErrors {
                warnings: report.warnings,
            });
        }
        if config.fail_on_error && report.errors > 0 {
            return Err(MinpackError::ErrorsAsFailure { errors: report.errors });
        }

        host.finish()?;
        Ok(report)
    }

    fn process_roots(
        &self,
        matcher: &PathMatcher,
        gzip: &GzipPostProcessor,
        session: &mut BuildSession<'_>,
        report: &mut BuildReport,
    ) -> Result<RunStats> {
        let config = &self.config;
        let processor = FileProcessor::new(config, self.transformer.as_ref(), gzip);
        let mut stats = RunStats::default();

        for root in &config.source_roots {
            if !root.source.is_dir() {
                Logger::missing_root(&root.source.display().to_string());
            }
            Logger::scanning_root(
                &root.source.display().to_string(),
                &root.destination.display().to_string(),
            );

            let includes: Vec<String> = if root.includes.is_empty() {
                DEFAULT_INCLUDES.iter().map(|s| s.to_string()).collect()
            } else {
                root.includes.clone()
            };
            let excludes: Vec<String> = root
                .excludes
                .iter()
                .chain(config.excludes.iter())
                .cloned()
                .collect();

            let resolution = matcher.resolve(&root.source, &includes, &excludes)?;
            for notice in resolution.notices {
                session.notice(notice);
            }

            for entry in &resolution.entries {
                match processor.process(entry, &root.destination, root.dest_as_source, session)? {
                    ProcessOutcome::Skipped(_) => stats.files_skipped += 1,
                    ProcessOutcome::Processed(file) => {
                        stats.files_processed += 1;
                        stats.input_bytes += file.input_size;
                        stats.output_bytes += file.output_size;
                        report.files.push(file);
                    }
                }
            }
        }
        Ok(stats)
    }

    fn aggregate(
        &self,
        matcher: &PathMatcher,
        gzip: &GzipPostProcessor,
        session: &mut BuildSession<'_>,
        report: &mut BuildReport,
    ) -> Result<RunStats> {
        let aggregator = Aggregator::new(matcher.clone());
        let mut previously: HashSet<PathBuf> = HashSet::new();
        let mut stats = RunStats::default();

        for spec in &self.config.aggregations {
            Logger::aggregation_start(&spec.output.display().to_string());
            let consumed = aggregator.aggregate(spec, &previously, session)?;
            // An untouched output keeps its sibling as well
            let gzipped = if consumed.is_empty() {
                None
            } else {
                stats.aggregations_written += 1;
                report.aggregated.push(spec.output.clone());
                gzip.gzip(&spec.output)?
            };
            previously.extend(consumed);

            if self.config.statistics {
                match aggregator::stats_line(&spec.output, gzipped.as_ref()) {
                    Some(line) => Logger::aggregation_stats(&line),
                    None => Logger::aggregation_missing(&display_name(&spec.output)),
                }
            }
        }
        Ok(stats)
    }
}
