use tracing::{debug, error, info, warn};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

pub struct Logger;

impl Logger {
    /// Install the global subscriber. `RUST_LOG` wins over the verbose flag.
    pub fn init(verbose: bool) {
        let default = if verbose { "minpack=debug" } else { "minpack=info" };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

        // A second init (tests, embedding hosts) keeps the first subscriber
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init();
    }

    pub fn run_start(root: &str, roots: usize, aggregations: usize) {
        info!("minpack - resource pipeline");
        info!("  project: {}", root);
        info!("  source roots: {}, aggregations: {}", roots, aggregations);
    }

    pub fn scanning_root(source: &str, destination: &str) {
        debug!("scanning {} -> {}", source, destination);
    }

    pub fn missing_root(source: &str) {
        warn!("source directory {} does not exist, skipping", source);
    }

    pub fn compressing(input: &str, output: &str) {
        debug!("compress file: {} to {}", input, output);
    }

    pub fn skip(reason: &str, path: &str) {
        info!("nothing to do, {}: {}", path, reason);
    }

    pub fn original_kept(name: &str) {
        debug!("output of {} greater than input, using original instead", name);
    }

    pub fn gzip_created(name: &str) {
        debug!("create gzip version: {}", name);
    }

    pub fn file_stats(line: &str) {
        info!("{}", line);
    }

    pub fn aggregation_start(output: &str) {
        info!("generate aggregation: {}", output);
    }

    pub fn aggregation_skipped(output: &str) {
        info!("aggregation {} skipped, none of its inputs changed", output);
    }

    pub fn aggregation_stats(line: &str) {
        info!("{}", line);
    }

    pub fn aggregation_missing(output: &str) {
        warn!("{} not created", output);
    }

    pub fn totals(input: u64, output: u64, ratio: u64) {
        info!("total input ({}b) -> output ({}b)[{}%]", input, output, ratio);
    }

    pub fn summary(warnings: usize, errors: usize) {
        info!("nb warnings: {}, nb errors: {}", warnings, errors);
    }

    pub fn diagnostic_error(msg: &str) {
        error!("{}", msg);
    }

    pub fn diagnostic_warning(msg: &str) {
        warn!("{}", msg);
    }

    pub fn info(msg: &str) {
        info!("{}", msg);
    }

    pub fn debug(msg: &str) {
        debug!("{}", msg);
    }

    pub fn warn(msg: &str) {
        warn!("{}", msg);
    }
}

pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn start(name: &str) -> Self {
        debug!("starting: {}", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        debug!("completed: {} in {:.2?}", self.name, self.elapsed());
    }
}
