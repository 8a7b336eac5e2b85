use crate::core::models::{AggregationSpec, PipelineConfig, SourceRoot};
use crate::infrastructure::path_matcher::{compile_patterns, is_glob};
use crate::utils::{IoPhase, IoResultExt, Logger, MinpackError, Result};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "minpack.config.json";

/// Values given on the command line. `None` leaves the file or default
/// value in place.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub source: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub force: Option<bool>,
    pub gzip: Option<bool>,
    pub gzip_level: Option<u32>,
    pub suffix: Option<String>,
    pub nosuffix: Option<bool>,
    pub no_compress: Option<bool>,
    pub munge: Option<bool>,
    pub line_break: Option<i32>,
    pub fail_on_warning: Option<bool>,
    pub fail_on_error: Option<bool>,
}

/// Config loader that supports config files with CLI override
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load `minpack.config.json` from the project root if it exists
    pub fn load_from_file(root: &Path) -> Result<Option<PipelineConfig>> {
        let config_path = root.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            Logger::debug(&format!("No {} found, using defaults", CONFIG_FILE_NAME));
            return Ok(None);
        }
        Self::load_from_path(&config_path).map(Some)
    }

    pub fn load_from_path(config_path: &Path) -> Result<PipelineConfig> {
        Logger::debug(&format!("Loading config from {}", config_path.display()));

        let content = std::fs::read_to_string(config_path).with_path(config_path, IoPhase::Read)?;

        let config: PipelineConfig = serde_json::from_str(&content).map_err(|e| {
            MinpackError::config(format!("Failed to parse {}: {}", config_path.display(), e))
        })?;

        Logger::info(&format!("using configuration {}", config_path.display()));
        Ok(config)
    }

    /// Merge file config with CLI arguments (CLI > file > defaults) and
    /// resolve every relative path against `root`
    pub fn merge_with_cli(file_config: Option<PipelineConfig>, root: PathBuf, cli: &CliOverrides) -> PipelineConfig {
        let mut config = file_config.unwrap_or_default();
        config.root = root;

        if let Some(source) = &cli.source {
            let destination = cli.output.clone().unwrap_or_else(|| source.clone());
            config.source_roots.push(SourceRoot::new(source.clone(), destination));
        }
        if let Some(force) = cli.force {
            config.force = force;
        }
        if let Some(gzip) = cli.gzip {
            config.gzip = gzip;
        }
        if let Some(level) = cli.gzip_level {
            config.gzip_level = level;
        }
        if let Some(suffix) = &cli.suffix {
            config.suffix = suffix.clone();
        }
        if let Some(nosuffix) = cli.nosuffix {
            config.nosuffix = nosuffix;
        }
        if let Some(no_compress) = cli.no_compress {
            config.transform.no_compress = no_compress;
        }
        if let Some(munge) = cli.munge {
            config.transform.munge = munge;
        }
        if let Some(line_break) = cli.line_break {
            config.transform.line_break = line_break;
        }
        if let Some(fail) = cli.fail_on_warning {
            config.fail_on_warning = fail;
        }
        if let Some(fail) = cli.fail_on_error {
            config.fail_on_error = fail;
        }

        Self::resolve_paths(&mut config);
        config
    }

    fn resolve_paths(config: &mut PipelineConfig) {
        let root = config.root.clone();
        for source_root in &mut config.source_roots {
            source_root.source = resolve(&root, &source_root.source);
            source_root.destination = resolve(&root, &source_root.destination);
        }
        for aggregation in &mut config.aggregations {
            aggregation.output = resolve(&root, &aggregation.output);
            if let Some(dir) = &aggregation.input_dir {
                aggregation.input_dir = Some(resolve(&root, dir));
            }
        }
    }

    /// Generate example config file
    pub fn generate_example() -> String {
        let example = PipelineConfig {
            source_roots: vec![SourceRoot {
                includes: vec!["**/*.js".to_string(), "**/*.css".to_string()],
                excludes: vec!["**/vendor/**".to_string()],
                ..SourceRoot::new("src", "dist")
            }],
            aggregations: vec![AggregationSpec {
                insert_new_line: true,
                ..AggregationSpec::new("dist/all.js", &["lib/first.js", "**/*-min.js"])
            }],
            ..PipelineConfig::default()
        };
        serde_json::to_string_pretty(&example).unwrap_or_else(|_| {
            r#"{
  "sourceRoots": [{ "source": "src", "destination": "dist" }],
  "suffix": "-min",
  "gzip": false
}"#
            .to_string()
        })
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Literal includes name files and are never compiled as patterns
fn glob_includes(includes: &[String]) -> Vec<String> {
    includes.iter().filter(|entry| is_glob(entry)).cloned().collect()
}

impl PipelineConfig {
    /// Reject configurations that cannot run, before any file is touched
    pub fn validate(&self) -> Result<()> {
        if self.gzip_level > 9 {
            return Err(MinpackError::config(format!(
                "gzipLevel must be between 0 and 9, got {}",
                self.gzip_level
            )));
        }
        compile_patterns(&self.excludes)?;

        for (i, root) in self.source_roots.iter().enumerate() {
            if root.source.as_os_str().is_empty() {
                return Err(MinpackError::config(format!("sourceRoots[{}] has no source directory", i)));
            }
            if root.destination.as_os_str().is_empty() {
                return Err(MinpackError::config(format!(
                    "sourceRoots[{}] ({}) has no destination directory",
                    i,
                    root.source.display()
                )));
            }
            compile_patterns(&glob_includes(&root.includes))?;
            compile_patterns(&root.excludes)?;
        }

        for (i, aggregation) in self.aggregations.iter().enumerate() {
            if aggregation.output.as_os_str().is_empty() {
                return Err(MinpackError::config(format!("aggregations[{}] has no output", i)));
            }
            compile_patterns(&glob_includes(&aggregation.includes))?;
            compile_patterns(&aggregation.excludes)?;
        }
        Ok(())
    }
}
