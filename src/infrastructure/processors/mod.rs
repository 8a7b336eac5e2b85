// Processors module
pub mod aggregator;
pub mod common;
pub mod css_processor;
pub mod file_processor;
pub mod gzip;
pub mod js_processor;
pub mod passthrough;

pub use aggregator::Aggregator;
pub use css_processor::LightningCssTransformer;
pub use file_processor::{FileProcessor, ProcessOutcome};
pub use gzip::GzipPostProcessor;
pub use js_processor::OxcScriptTransformer;
pub use passthrough::{MinifyTransformer, PassThroughTransformer};
