use crate::core::{interfaces::BuildContext, services::PipelineDriver};
use crate::infrastructure::{FullBuildContext, ManifestBuildContext, DEFAULT_STATE_FILE};
use crate::utils::{CliOverrides, ConfigLoader, ConsoleUI, Logger, CONFIG_FILE_NAME};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "minpack")]
#[command(version)]
#[command(about = "Minify, aggregate and gzip scripts and stylesheets")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Minify source roots and build aggregations
    Compress(CompressArgs),
    /// Print an example minpack.config.json
    Init,
}

#[derive(Args, Debug, Default)]
pub struct CompressArgs {
    /// Project root; relative paths in the configuration resolve against it
    #[arg(short, long, default_value = ".")]
    pub root: PathBuf,
    /// Configuration file (default: <root>/minpack.config.json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Extra source directory to minify
    #[arg(short, long)]
    pub source: Option<PathBuf>,
    /// Destination for --source (default: the source directory itself)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Regenerate outputs even when they are newer than their sources
    #[arg(short, long)]
    pub force: bool,
    /// Write a .gz sibling next to every output
    #[arg(long)]
    pub gzip: bool,
    /// Gzip compression level (0-9)
    #[arg(long)]
    pub level: Option<u32>,
    /// Suffix inserted before the extension of minified files
    #[arg(long, conflicts_with = "nosuffix")]
    pub suffix: Option<String>,
    /// Keep output names identical to the input names
    #[arg(long)]
    pub nosuffix: bool,
    /// Copy files through without minifying
    #[arg(long)]
    pub no_compress: bool,
    /// Keep local identifier names in scripts
    #[arg(long)]
    pub no_munge: bool,
    /// Insert a line break after this column
    #[arg(long, allow_negative_numbers = true)]
    pub line_break: Option<i32>,
    /// Fail when any warning is reported
    #[arg(long)]
    pub fail_on_warning: bool,
    /// Fail when any error is reported
    #[arg(long)]
    pub fail_on_error: bool,
    /// Only process files changed since the last successful run
    #[arg(short, long)]
    pub incremental: bool,
    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl CompressArgs {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            source: self.source.clone(),
            output: self.output.clone(),
            force: self.force.then_some(true),
            gzip: self.gzip.then_some(true),
            gzip_level: self.level,
            suffix: self.suffix.clone(),
            nosuffix: self.nosuffix.then_some(true),
            no_compress: self.no_compress.then_some(true),
            munge: self.no_munge.then_some(false),
            line_break: self.line_break,
            fail_on_warning: self.fail_on_warning.then_some(true),
            fail_on_error: self.fail_on_error.then_some(true),
        }
    }
}

pub struct CliHandler;

impl CliHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self) -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            Commands::Compress(args) => self.handle_compress_command(&args),
            Commands::Init => {
                println!("{}", ConfigLoader::generate_example());
                Ok(())
            }
        }
    }

    fn handle_compress_command(&self, args: &CompressArgs) -> Result<()> {
        Logger::init(args.verbose);
        let ui = ConsoleUI::new();
        ui.show_banner();

        let file_config = match &args.config {
            Some(path) => Some(
                ConfigLoader::load_from_path(path)
                    .with_context(|| format!("loading {}", path.display()))?,
            ),
            None => ConfigLoader::load_from_file(&args.root)
                .with_context(|| format!("loading {}", args.root.join(CONFIG_FILE_NAME).display()))?,
        };
        let config = ConfigLoader::merge_with_cli(file_config, args.root.clone(), &args.overrides());

        if config.source_roots.is_empty() && config.aggregations.is_empty() {
            Logger::warn(&format!(
                "nothing configured: add sourceRoots or aggregations to {} or pass --source",
                CONFIG_FILE_NAME
            ));
        }

        let mut host: Box<dyn BuildContext> = if args.incremental {
            Box::new(ManifestBuildContext::load(args.root.join(DEFAULT_STATE_FILE)))
        } else {
            Box::new(FullBuildContext::new())
        };

        let driver = PipelineDriver::new(config);
        let report = driver.run(host.as_mut()).context("compression failed")?;

        ui.show_completion(&report);
        Ok(())
    }
}

impl Default for CliHandler {
    fn default() -> Self {
        Self::new()
    }
}
