use crate::{mtime, set_mtime, write};
use flate2::read::GzDecoder;
use minpack::core::interfaces::Transformer;
use minpack::core::models::*;
use minpack::core::services::PipelineDriver;
use minpack::infrastructure::FullBuildContext;
use minpack::utils::{MinpackError, Result};
use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

fn hour_ago() -> SystemTime {
    SystemTime::now() - Duration::from_secs(3600)
}

fn config_for(root: &Path) -> PipelineConfig {
    PipelineConfig {
        root: root.to_path_buf(),
        source_roots: vec![SourceRoot::new(root.join("src"), root.join("dist"))],
        ..Default::default()
    }
}

/// Emits one warning per file and otherwise keeps the input
struct Grumpy;

impl Transformer for Grumpy {
    fn transform(&self, source: &str, _kind: FileKind, _options: &TransformOptions) -> Result<TransformOutput> {
        Ok(TransformOutput {
            code: source.to_string(),
            diagnostics: vec![Diagnostic::warning("suspicious construct").at(1, 1)],
        })
    }

    fn name(&self) -> &str {
        "grumpy"
    }
}

#[test]
fn test_minifies_scripts_and_stylesheets() {
    let dir = tempdir().unwrap();
    write(
        &dir.path().join("src/app.js"),
        "function greet(name) {\n    var message = 'hello ' + name;\n    return message;\n}\ngreet('world');\n",
    );
    write(
        &dir.path().join("src/css/site.css"),
        "body {\n    margin: 0px;\n    color: #ffffff;\n}\n",
    );

    let report = PipelineDriver::new(config_for(dir.path()))
        .run(&mut FullBuildContext::new())
        .expect("build should succeed");

    assert_eq!(report.stats.files_processed, 2);
    assert_eq!(report.errors, 0);

    let js = fs::read_to_string(dir.path().join("dist/app-min.js")).unwrap();
    assert!(js.len() < fs::metadata(dir.path().join("src/app.js")).unwrap().len() as usize);
    assert!(js.contains("hello"));

    let css = fs::read_to_string(dir.path().join("dist/css/site-min.css")).unwrap();
    assert!(!css.contains('\n'));
    assert!(css.contains("body"));
}

#[test]
fn test_second_run_writes_nothing() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("src/app.js");
    write(&input, "var answer = 40 + 2;\nconsole.log(answer);\n");
    set_mtime(&input, hour_ago());

    let driver = PipelineDriver::new(config_for(dir.path()));
    let first = driver.run(&mut FullBuildContext::new()).unwrap();
    assert_eq!(first.stats.files_processed, 1);

    let output = dir.path().join("dist/app-min.js");
    let written_at = mtime(&output);

    let second = driver.run(&mut FullBuildContext::new()).unwrap();
    assert_eq!(second.stats.files_processed, 0);
    assert_eq!(second.stats.files_skipped, 1);
    assert!(second.files.is_empty());
    assert_eq!(mtime(&output), written_at);
}

#[test]
fn test_force_rewrites_fresh_outputs() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("src/app.js");
    write(&input, "var answer = 40 + 2;\nconsole.log(answer);\n");
    set_mtime(&input, hour_ago());

    PipelineDriver::new(config_for(dir.path()))
        .run(&mut FullBuildContext::new())
        .unwrap();

    let forced = PipelineConfig {
        force: true,
        ..config_for(dir.path())
    };
    let report = PipelineDriver::new(forced)
        .run(&mut FullBuildContext::new())
        .unwrap();
    assert_eq!(report.stats.files_processed, 1);
}

#[test]
fn test_pass_through_keeps_original_bytes() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("src/tiny.js");
    write(&input, "var a = 1;");

    let mut config = config_for(dir.path());
    config.transform.no_compress = true;
    let report = PipelineDriver::new(config)
        .run(&mut FullBuildContext::new())
        .unwrap();

    let output = dir.path().join("dist/tiny-min.js");
    assert_eq!(fs::read(&output).unwrap(), b"var a = 1;");
    assert_eq!(report.files.len(), 1);
    assert!(report.files[0].original_kept);
    assert_eq!(report.files[0].input_size, 10);
    assert_eq!(report.files[0].output_size, 10);
}

#[test]
fn test_gzip_sibling_matches_output() {
    let dir = tempdir().unwrap();
    write(
        &dir.path().join("src/lib.js"),
        &"function add(first, second) { return first + second; }\n".repeat(20),
    );

    let config = PipelineConfig {
        gzip: true,
        ..config_for(dir.path())
    };
    let report = PipelineDriver::new(config)
        .run(&mut FullBuildContext::new())
        .unwrap();

    let output = dir.path().join("dist/lib-min.js");
    let gz = dir.path().join("dist/lib-min.js.gz");
    assert!(gz.exists());
    assert_eq!(
        report.files[0].gzipped.as_ref().map(|g| g.path.clone()),
        Some(gz.clone())
    );

    let mut decoded = Vec::new();
    GzDecoder::new(fs::File::open(&gz).unwrap())
        .read_to_end(&mut decoded)
        .unwrap();
    assert_eq!(decoded, fs::read(&output).unwrap());
}

#[test]
fn test_fail_on_warning_aborts_run() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("src/app.js"), "var a = 1;\n");

    let config = PipelineConfig {
        fail_on_warning: true,
        ..config_for(dir.path())
    };
    let err = PipelineDriver::new(config)
        .with_transformer(Arc::new(Grumpy))
        .run(&mut FullBuildContext::new())
        .unwrap_err();

    assert!(matches!(err, MinpackError::WarningsAsErrors { warnings: 1 }));
}

#[test]
fn test_warnings_are_reported_without_policy() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("src/app.js"), "var a = 1;\n");

    let report = PipelineDriver::new(config_for(dir.path()))
        .with_transformer(Arc::new(Grumpy))
        .run(&mut FullBuildContext::new())
        .unwrap();

    assert_eq!(report.warnings, 1);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].source_name.as_deref(), Some(".../src/app.js"));
}

#[test]
fn test_in_place_run_skips_minified_outputs() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    let input = src.join("app.js");
    write(&input, "var answer = 40 + 2;\nconsole.log(answer);\n");
    set_mtime(&input, hour_ago());

    let config = PipelineConfig {
        root: dir.path().to_path_buf(),
        source_roots: vec![SourceRoot::new(&src, &src)],
        ..Default::default()
    };
    let driver = PipelineDriver::new(config);

    let first = driver.run(&mut FullBuildContext::new()).unwrap();
    assert_eq!(first.stats.files_processed, 1);
    assert!(src.join("app-min.js").exists());

    // app-min.js carries the suffix and now shadows app.js
    let second = driver.run(&mut FullBuildContext::new()).unwrap();
    assert_eq!(second.stats.files_processed, 0);
    assert_eq!(second.stats.files_skipped, 2);
    assert!(!src.join("app-min-min.js").exists());
}

#[test]
fn test_user_provided_minified_sibling_wins() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("src/vendor.js"), "var vendor = { name: 'lib' };\n");
    write(&dir.path().join("src/vendor-min.js"), "/* hand tuned */");

    let config = PipelineConfig {
        source_roots: vec![SourceRoot {
            includes: vec!["vendor.js".to_string()],
            ..SourceRoot::new(dir.path().join("src"), dir.path().join("dist"))
        }],
        ..config_for(dir.path())
    };
    let report = PipelineDriver::new(config)
        .run(&mut FullBuildContext::new())
        .unwrap();

    assert_eq!(report.stats.files_processed, 0);
    assert!(!dir.path().join("dist/vendor-min.js").exists());
}

#[test]
fn test_excludes_and_default_excludes() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("src/keep.js"), "var keep = true;\n");
    write(&dir.path().join("src/legacy/old.js"), "var old = true;\n");
    write(&dir.path().join("src/.git/hooks.js"), "var hook = true;\n");

    let config = PipelineConfig {
        excludes: vec!["legacy/**".to_string()],
        ..config_for(dir.path())
    };
    let report = PipelineDriver::new(config)
        .run(&mut FullBuildContext::new())
        .unwrap();

    assert_eq!(report.stats.files_processed, 1);
    assert!(dir.path().join("dist/keep-min.js").exists());
    assert!(!dir.path().join("dist/legacy").exists());
    assert!(!dir.path().join("dist/.git").exists());
}

#[test]
fn test_syntax_error_keeps_source_and_counts_error() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("src/broken.js"), "var = ;\n");

    let config = PipelineConfig {
        use_smallest_file: false,
        ..config_for(dir.path())
    };
    let report = PipelineDriver::new(config.clone())
        .run(&mut FullBuildContext::new())
        .unwrap();
    assert!(report.errors >= 1);
    assert_eq!(
        fs::read_to_string(dir.path().join("dist/broken-min.js")).unwrap(),
        "var = ;\n"
    );

    let strict = PipelineConfig {
        fail_on_error: true,
        force: true,
        ..config
    };
    let err = PipelineDriver::new(strict)
        .run(&mut FullBuildContext::new())
        .unwrap_err();
    assert!(matches!(err, MinpackError::ErrorsAsFailure { .. }));
}
