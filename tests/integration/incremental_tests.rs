use crate::{mtime, set_mtime, write};
use minpack::core::interfaces::BuildContext;
use minpack::core::models::*;
use minpack::core::services::PipelineDriver;
use minpack::infrastructure::{ManifestBuildContext, DEFAULT_STATE_FILE};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

/// Incremental host that never reports a change
#[derive(Default)]
struct Unchanged {
    queried: Vec<PathBuf>,
    refreshed: Vec<PathBuf>,
}

impl BuildContext for Unchanged {
    fn is_incremental(&self) -> bool {
        true
    }

    fn has_delta(&mut self, path: &Path) -> bool {
        self.queried.push(path.to_path_buf());
        false
    }

    fn refresh(&mut self, path: &Path) {
        self.refreshed.push(path.to_path_buf());
    }

    fn add_message(&mut self, _file: &Path, _diagnostic: &Diagnostic) {}
}

fn project(root: &Path) -> PipelineConfig {
    PipelineConfig {
        root: root.to_path_buf(),
        source_roots: vec![SourceRoot::new(root.join("src"), root.join("dist"))],
        ..Default::default()
    }
}

#[test]
fn test_no_delta_means_no_work() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("src/a.js"), "var first = 1;\n");
    write(&dir.path().join("src/b.css"), "b { color: red; }\n");
    write(&dir.path().join("parts/x.js"), "x();\n");

    let config = PipelineConfig {
        aggregations: vec![AggregationSpec {
            input_dir: Some(dir.path().join("parts")),
            only_if_changed: true,
            ..AggregationSpec::new(dir.path().join("all.js"), &["*.js"])
        }],
        ..project(dir.path())
    };

    let mut host = Unchanged::default();
    let report = PipelineDriver::new(config).run(&mut host).unwrap();

    assert_eq!(report.stats.files_processed, 0);
    assert_eq!(report.stats.files_skipped, 2);
    assert_eq!(report.stats.aggregations_written, 0);
    assert!(host.refreshed.is_empty());
    assert_eq!(host.queried.len(), 3);
    assert!(!dir.path().join("dist").exists());
    assert!(!dir.path().join("all.js").exists());
}

#[test]
fn test_skipped_aggregation_writes_no_gzip_sibling() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("parts/x.js"), "x();");
    let output = dir.path().join("all.js");
    write(&output, "x();");

    let config = PipelineConfig {
        root: dir.path().to_path_buf(),
        gzip: true,
        aggregations: vec![AggregationSpec {
            input_dir: Some(dir.path().join("parts")),
            only_if_changed: true,
            ..AggregationSpec::new(&output, &["*.js"])
        }],
        ..Default::default()
    };

    let mut host = Unchanged::default();
    let report = PipelineDriver::new(config).run(&mut host).unwrap();

    assert_eq!(report.stats.aggregations_written, 0);
    assert!(host.refreshed.is_empty());
    assert!(!dir.path().join("all.js.gz").exists());
}

#[test]
fn test_aggregation_without_only_if_changed_still_runs() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("parts/x.js"), "x();");

    let output = dir.path().join("all.js");
    let config = PipelineConfig {
        root: dir.path().to_path_buf(),
        aggregations: vec![AggregationSpec {
            input_dir: Some(dir.path().join("parts")),
            ..AggregationSpec::new(&output, &["*.js"])
        }],
        ..Default::default()
    };

    let mut host = Unchanged::default();
    let report = PipelineDriver::new(config).run(&mut host).unwrap();

    assert_eq!(report.stats.aggregations_written, 1);
    assert_eq!(fs::read_to_string(&output).unwrap(), "x();");
    assert_eq!(host.refreshed.len(), 1);
}

#[test]
fn test_manifest_skips_unchanged_files() {
    let dir = tempdir().unwrap();
    let state = dir.path().join(DEFAULT_STATE_FILE);
    let input = dir.path().join("src/app.js");
    write(&input, "var answer = 40 + 2;\nconsole.log(answer);\n");

    let driver = PipelineDriver::new(project(dir.path()));

    let mut first = ManifestBuildContext::load(&state);
    assert!(!first.is_incremental());
    assert_eq!(driver.run(&mut first).unwrap().stats.files_processed, 1);
    assert!(state.exists());

    // Even a stale output is left alone when the host reports no delta
    let output = dir.path().join("dist/app-min.js");
    set_mtime(&output, SystemTime::now() - Duration::from_secs(7200));
    let before = mtime(&output);

    let mut second = ManifestBuildContext::load(&state);
    assert!(second.is_incremental());
    let report = driver.run(&mut second).unwrap();
    assert_eq!(report.stats.files_processed, 0);
    assert_eq!(report.stats.files_skipped, 1);
    assert_eq!(mtime(&output), before);

    write(&input, "var answer = 6 * 7;\nconsole.log(answer);\n");
    let mut third = ManifestBuildContext::load(&state);
    let report = driver.run(&mut third).unwrap();
    assert_eq!(report.stats.files_processed, 1);
    assert!(mtime(&output) > before);
}

#[test]
fn test_rewritten_output_triggers_dependent_aggregation() {
    let dir = tempdir().unwrap();
    let state = dir.path().join(DEFAULT_STATE_FILE);
    let input = dir.path().join("src/app.js");
    write(&input, "var answer = 40 + 2;\nconsole.log(answer);\n");

    let bundle = dir.path().join("dist/bundle.js");
    let config = PipelineConfig {
        aggregations: vec![AggregationSpec {
            only_if_changed: true,
            ..AggregationSpec::new(&bundle, &["*-min.js"])
        }],
        ..project(dir.path())
    };
    let driver = PipelineDriver::new(config);

    driver.run(&mut ManifestBuildContext::load(&state)).unwrap();
    let first_bundle = fs::read_to_string(&bundle).unwrap();

    let report = driver.run(&mut ManifestBuildContext::load(&state)).unwrap();
    assert_eq!(report.stats.aggregations_written, 0);

    write(&input, "var total = 1 + 2 + 3;\nconsole.log(total);\n");
    let report = driver.run(&mut ManifestBuildContext::load(&state)).unwrap();
    assert_eq!(report.stats.files_processed, 1);
    assert_eq!(report.stats.aggregations_written, 1);
    assert_ne!(fs::read_to_string(&bundle).unwrap(), first_bundle);
}

#[test]
fn test_failed_policy_does_not_save_state() {
    let dir = tempdir().unwrap();
    let state = dir.path().join(DEFAULT_STATE_FILE);
    write(&dir.path().join("src/broken.js"), "var = ;\n");

    let config = PipelineConfig {
        fail_on_error: true,
        ..project(dir.path())
    };
    assert!(PipelineDriver::new(config)
        .run(&mut ManifestBuildContext::load(&state))
        .is_err());
    assert!(!state.exists());
}
