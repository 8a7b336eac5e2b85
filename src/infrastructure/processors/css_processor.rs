use crate::core::{interfaces::Transformer, models::*};
use crate::infrastructure::processors::common::{line_text, wrap_lines};
use crate::utils::{Logger, Result};
use lightningcss::{
    error::{Error as CssError, ErrorLocation},
    printer::PrinterOptions,
    stylesheet::{MinifyOptions, ParserOptions as CssParserOptions, StyleSheet},
};
use std::fmt::Display;
use std::sync::{Arc, RwLock};

/// Stylesheet minifier backed by lightningcss
#[derive(Debug, Clone, Default)]
pub struct LightningCssTransformer;

impl LightningCssTransformer {
    pub fn new() -> Self {
        Self
    }

    fn minify(&self, source: &str, options: &TransformOptions) -> TransformOutput {
        let _timer = crate::utils::Timer::start("lightningcss minify");
        let warnings = Arc::new(RwLock::new(Vec::new()));
        let parser_options = CssParserOptions {
            error_recovery: true,
            warnings: Some(warnings.clone()),
            ..CssParserOptions::default()
        };

        let mut stylesheet = match StyleSheet::parse(source, parser_options) {
            Ok(stylesheet) => stylesheet,
            Err(e) => {
                return TransformOutput {
                    code: source.to_string(),
                    diagnostics: vec![to_diagnostic(source, &e, Severity::Error)],
                };
            }
        };

        let mut diagnostics: Vec<Diagnostic> = match warnings.read() {
            Ok(recovered) => recovered
                .iter()
                .map(|w| to_diagnostic(source, w, Severity::Warning))
                .collect(),
            Err(_) => Vec::new(),
        };

        if !options.disable_optimizations {
            if let Err(e) = stylesheet.minify(MinifyOptions::default()) {
                diagnostics.push(to_diagnostic(source, &e, Severity::Error));
                return TransformOutput {
                    code: source.to_string(),
                    diagnostics,
                };
            }
        }

        match stylesheet.to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        }) {
            Ok(result) => TransformOutput {
                code: wrap_lines(&result.code, options.line_break),
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(to_diagnostic(source, &e, Severity::Error));
                TransformOutput {
                    code: source.to_string(),
                    diagnostics,
                }
            }
        }
    }
}

impl Transformer for LightningCssTransformer {
    fn transform(&self, source: &str, kind: FileKind, options: &TransformOptions) -> Result<TransformOutput> {
        if kind != FileKind::Stylesheet {
            Logger::debug(&format!("{} ignores {:?} input", self.name(), kind));
            return Ok(TransformOutput::unchanged(source));
        }
        Ok(self.minify(source, options))
    }

    fn name(&self) -> &str {
        "lightningcss"
    }
}

fn to_diagnostic<T: Display>(source: &str, error: &CssError<T>, severity: Severity) -> Diagnostic {
    let message = error.kind.to_string();
    let diagnostic = match severity {
        Severity::Error => Diagnostic::error(message),
        Severity::Warning => Diagnostic::warning(message),
    };
    match &error.loc {
        Some(loc) => locate(source, diagnostic, loc),
        None => diagnostic,
    }
}

// lightningcss lines are 0-based, columns 1-based
fn locate(source: &str, diagnostic: Diagnostic, loc: &ErrorLocation) -> Diagnostic {
    let line = loc.line as usize + 1;
    let diagnostic = diagnostic.at(line, loc.column as usize);
    match line_text(source, line) {
        Some(text) => diagnostic.with_line_source(text.trim()),
        None => diagnostic,
    }
}
