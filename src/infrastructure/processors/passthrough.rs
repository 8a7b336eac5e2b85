use crate::core::{interfaces::Transformer, models::*};
use crate::infrastructure::processors::{LightningCssTransformer, OxcScriptTransformer};
use crate::utils::Result;

/// Returns its input verbatim
#[derive(Debug, Clone, Default)]
pub struct PassThroughTransformer;

impl Transformer for PassThroughTransformer {
    fn transform(&self, source: &str, _kind: FileKind, _options: &TransformOptions) -> Result<TransformOutput> {
        Ok(TransformOutput::unchanged(source))
    }

    fn name(&self) -> &str {
        "passthrough"
    }
}

/// Default transformer: scripts go to oxc, stylesheets to lightningcss,
/// anything else (or `noCompress`) is copied through.
#[derive(Debug, Clone, Default)]
pub struct MinifyTransformer {
    scripts: OxcScriptTransformer,
    stylesheets: LightningCssTransformer,
    passthrough: PassThroughTransformer,
}

impl MinifyTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    fn select(&self, kind: FileKind, options: &TransformOptions) -> &dyn Transformer {
        if options.no_compress {
            return &self.passthrough;
        }
        match kind {
            FileKind::Script => &self.scripts,
            FileKind::Stylesheet => &self.stylesheets,
            FileKind::Other => &self.passthrough,
        }
    }
}

impl Transformer for MinifyTransformer {
    fn transform(&self, source: &str, kind: FileKind, options: &TransformOptions) -> Result<TransformOutput> {
        self.select(kind, options).transform(source, kind, options)
    }

    fn name(&self) -> &str {
        "minify"
    }
}
