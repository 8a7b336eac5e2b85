//! minpack: a build-time resource pipeline.
//!
//! Resolves script and stylesheet trees with include/exclude globs, minifies
//! each stale file through a pluggable [`Transformer`](core::interfaces::Transformer),
//! concatenates groups of files into aggregates and writes gzip siblings.
//! [`PipelineDriver`](core::services::PipelineDriver) runs the whole thing.

pub mod cli;
pub mod core;
pub mod infrastructure;
pub mod utils;

pub use crate::core::models::{BuildReport, PipelineConfig};
pub use crate::core::services::PipelineDriver;
pub use crate::utils::{MinpackError, Result};
