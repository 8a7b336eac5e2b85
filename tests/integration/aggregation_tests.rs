use crate::write;
use minpack::core::models::{AggregationSpec, BuildReport, PipelineConfig};
use minpack::core::services::PipelineDriver;
use minpack::infrastructure::FullBuildContext;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn aggregate(root: &Path, specs: Vec<AggregationSpec>) -> BuildReport {
    let config = PipelineConfig {
        root: root.to_path_buf(),
        aggregations: specs,
        ..Default::default()
    };
    PipelineDriver::new(config)
        .run(&mut FullBuildContext::new())
        .expect("aggregation run should succeed")
}

#[test]
fn test_concatenates_in_listed_order() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("01.js"), "1");
    write(&dir.path().join("02.js"), "22\n22");

    let output = dir.path().join("output.js");
    aggregate(dir.path(), vec![AggregationSpec::new(&output, &["02.js", "01.js"])]);

    assert_eq!(fs::read_to_string(&output).unwrap(), "22\n221");
}

#[test]
fn test_plain_concatenation_is_exact() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.js"), "var a = 1;");
    write(&dir.path().join("b.js"), "var b = 2;\n");

    let output = dir.path().join("all.js");
    let report = aggregate(dir.path(), vec![AggregationSpec::new(&output, &["a.js", "b.js"])]);

    assert_eq!(fs::read_to_string(&output).unwrap(), "var a = 1;var b = 2;\n");
    assert_eq!(report.stats.aggregations_written, 1);
    assert_eq!(report.aggregated, vec![output]);
}

#[test]
fn test_insert_new_line_after_every_file() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.js"), "A");
    write(&dir.path().join("b.js"), "B");

    let output = dir.path().join("all.js");
    let spec = AggregationSpec {
        insert_new_line: true,
        ..AggregationSpec::new(&output, &["a.js", "b.js"])
    };
    aggregate(dir.path(), vec![spec]);

    assert_eq!(fs::read_to_string(&output).unwrap(), "A\nB\n");
}

#[test]
fn test_duplicate_includes_are_written_once() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.js"), "A");
    write(&dir.path().join("b.js"), "B");

    let with_dupes = dir.path().join("dupes.out");
    let without = dir.path().join("plain.out");
    aggregate(
        dir.path(),
        vec![
            AggregationSpec::new(&with_dupes, &["a.js", "a.js", "b.js", "*.js"]),
            AggregationSpec::new(&without, &["a.js", "b.js"]),
        ],
    );

    assert_eq!(fs::read_to_string(&with_dupes).unwrap(), "AB");
    assert_eq!(
        fs::read(&with_dupes).unwrap(),
        fs::read(&without).unwrap()
    );
}

#[test]
fn test_output_never_includes_itself() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.js"), "A");
    write(&dir.path().join("b.js"), "B");
    let output = dir.path().join("out.js");
    write(&output, "stale aggregate");

    aggregate(dir.path(), vec![AggregationSpec::new(&output, &["*.js"])]);

    assert_eq!(fs::read_to_string(&output).unwrap(), "AB");
}

#[test]
fn test_no_inputs_leaves_existing_output_untouched() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("all.js");
    write(&output, "keep me");
    let before = fs::metadata(&output).unwrap().modified().unwrap();

    let report = aggregate(dir.path(), vec![AggregationSpec::new(&output, &["*.css"])]);

    assert_eq!(fs::read_to_string(&output).unwrap(), "keep me");
    assert_eq!(fs::metadata(&output).unwrap().modified().unwrap(), before);
    assert_eq!(report.stats.aggregations_written, 0);
    assert!(report.aggregated.is_empty());
}

#[test]
fn test_no_inputs_does_not_create_output() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("sub/all.js");
    aggregate(dir.path(), vec![AggregationSpec::new(&output, &["*.js"])]);
    assert!(!output.exists());
}

#[test]
fn test_glob_matches_sorted_and_excludes_applied() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("c.js"), "C");
    write(&dir.path().join("a.js"), "A");
    write(&dir.path().join("b.js"), "B");
    write(&dir.path().join("skip.js"), "S");

    let output = dir.path().join("all.js");
    let spec = AggregationSpec {
        excludes: vec!["skip.js".to_string()],
        ..AggregationSpec::new(&output, &["*.js"])
    };
    aggregate(dir.path(), vec![spec]);

    assert_eq!(fs::read_to_string(&output).unwrap(), "ABC");
}

#[test]
fn test_aggregation_gzip_sibling() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.js"), &"var a = 1;\n".repeat(50));

    let output = dir.path().join("all.js");
    let config = PipelineConfig {
        root: dir.path().to_path_buf(),
        gzip: true,
        aggregations: vec![AggregationSpec::new(&output, &["a.js"])],
        ..Default::default()
    };
    PipelineDriver::new(config)
        .run(&mut FullBuildContext::new())
        .unwrap();

    let gz = dir.path().join("all.js.gz");
    assert!(gz.exists());
    assert!(fs::metadata(&gz).unwrap().len() < fs::metadata(&output).unwrap().len());
}

#[test]
fn test_no_inputs_writes_no_gzip_sibling() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("all.js");
    write(&output, "keep me");

    let config = PipelineConfig {
        root: dir.path().to_path_buf(),
        gzip: true,
        aggregations: vec![AggregationSpec::new(&output, &["*.css"])],
        ..Default::default()
    };
    PipelineDriver::new(config)
        .run(&mut FullBuildContext::new())
        .unwrap();

    assert_eq!(fs::read_to_string(&output).unwrap(), "keep me");
    assert!(!dir.path().join("all.js.gz").exists());
}
