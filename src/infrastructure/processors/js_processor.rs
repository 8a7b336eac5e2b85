use crate::core::{interfaces::Transformer, models::*};
use crate::infrastructure::processors::common::{line_col, line_text, wrap_lines};
use crate::utils::{Logger, Result};
use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_diagnostics::OxcDiagnostic;
use oxc_minifier::{CompressOptions, MangleOptions, Minifier, MinifierOptions};
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;

/// Script minifier backed by oxc.
///
/// Parse errors are reported as error diagnostics and leave the script
/// untouched. Semantic problems (redeclarations, invalid targets...) are
/// reported as warnings and do not prevent minification.
#[derive(Debug, Clone, Default)]
pub struct OxcScriptTransformer;

impl OxcScriptTransformer {
    pub fn new() -> Self {
        Self
    }

    fn minify(&self, source: &str, options: &TransformOptions) -> TransformOutput {
        let _timer = crate::utils::Timer::start("oxc minify");
        let allocator = Allocator::default();
        // Plain browser scripts, not modules: top-level names stay global
        let source_type = SourceType::cjs();

        let parsed = Parser::new(&allocator, source, source_type).parse();
        if parsed.panicked || !parsed.errors.is_empty() {
            let diagnostics = parsed
                .errors
                .iter()
                .map(|e| to_diagnostic(source, e, Severity::Error))
                .collect::<Vec<_>>();
            let diagnostics = if diagnostics.is_empty() {
                vec![Diagnostic::error("unrecoverable syntax error")]
            } else {
                diagnostics
            };
            return TransformOutput {
                code: source.to_string(),
                diagnostics,
            };
        }

        let mut program = parsed.program;

        let diagnostics: Vec<Diagnostic> = {
            let semantic = SemanticBuilder::new()
                .with_check_syntax_error(true)
                .build(&program);
            semantic
                .errors
                .iter()
                .map(|e| to_diagnostic(source, e, Severity::Warning))
                .collect()
        };

        let minifier_options = MinifierOptions {
            mangle: options.munge.then(MangleOptions::default),
            compress: (!options.disable_optimizations).then(CompressOptions::default),
        };
        let minified = Minifier::new(minifier_options).minify(&allocator, &mut program);

        let mut code = Codegen::new()
            .with_options(CodegenOptions {
                minify: true,
                ..CodegenOptions::default()
            })
            .with_scoping(minified.scoping)
            .build(&program)
            .code;

        if options.preserve_all_semicolons && !code.is_empty() && !code.trim_end().ends_with(';') {
            code.push(';');
        }

        TransformOutput {
            code: wrap_lines(&code, options.line_break),
            diagnostics,
        }
    }
}

impl Transformer for OxcScriptTransformer {
    fn transform(&self, source: &str, kind: FileKind, options: &TransformOptions) -> Result<TransformOutput> {
        if kind != FileKind::Script {
            Logger::debug(&format!("{} ignores {:?} input", self.name(), kind));
            return Ok(TransformOutput::unchanged(source));
        }
        Ok(self.minify(source, options))
    }

    fn name(&self) -> &str {
        "oxc"
    }
}

fn to_diagnostic(source: &str, error: &OxcDiagnostic, severity: Severity) -> Diagnostic {
    let message = error.to_string();
    let diagnostic = match severity {
        Severity::Error => Diagnostic::error(message),
        Severity::Warning => Diagnostic::warning(message),
    };

    let offset = error
        .labels
        .as_ref()
        .and_then(|labels| labels.first())
        .map(|label| label.offset());

    match offset {
        Some(offset) => {
            let (line, column) = line_col(source, offset);
            let diagnostic = diagnostic.at(line, column);
            match line_text(source, line) {
                Some(text) => diagnostic.with_line_source(text.trim()),
                None => diagnostic,
            }
        }
        None => diagnostic,
    }
}
