// Diagnostics collector
// Counts transformer errors and warnings for one run and renders them as
// `<name>:line <L>:column <C>:<message>` lines.

use crate::core::interfaces::DiagnosticSink;
use crate::core::models::{Diagnostic, Severity};
use crate::utils::Logger;

#[derive(Debug, Default)]
pub struct DiagnosticsCollector {
    accept_warnings: bool,
    default_file_name: Option<String>,
    recorded: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
}

impl DiagnosticsCollector {
    pub fn new(accept_warnings: bool) -> Self {
        Self {
            accept_warnings,
            ..Default::default()
        }
    }

    /// Name used for diagnostics that arrive without a source name.
    /// An empty name clears it.
    pub fn set_default_file_name(&mut self, name: &str) {
        self.default_file_name = if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        };
    }

    /// Record one diagnostic. Returns false when it was dropped because
    /// warning reporting is off.
    pub fn record(&mut self, mut diagnostic: Diagnostic) -> bool {
        if diagnostic.severity == Severity::Warning && !self.accept_warnings {
            return false;
        }

        let has_name = diagnostic
            .source_name
            .as_deref()
            .is_some_and(|name| !name.is_empty());
        if !has_name {
            diagnostic.source_name = self.default_file_name.clone();
        }

        let message = format_message(&diagnostic);
        match diagnostic.severity {
            Severity::Error => {
                Logger::diagnostic_error(&message);
                self.error_count += 1;
            }
            Severity::Warning => {
                Logger::diagnostic_warning(&message);
                self.warning_count += 1;
            }
        }
        self.recorded.push(diagnostic);
        true
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.recorded
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.recorded
    }
}

impl DiagnosticSink for DiagnosticsCollector {
    fn error(&mut self, mut diagnostic: Diagnostic) -> bool {
        diagnostic.severity = Severity::Error;
        self.record(diagnostic)
    }

    fn warning(&mut self, mut diagnostic: Diagnostic) -> bool {
        diagnostic.severity = Severity::Warning;
        self.record(diagnostic)
    }
}

/// Human readable form of a diagnostic
pub fn format_message(diagnostic: &Diagnostic) -> String {
    let mut out = String::new();
    if let Some(name) = diagnostic.source_name.as_deref().filter(|n| !n.is_empty()) {
        out.push_str(&format!(
            "{}:line {}:column {}:",
            name, diagnostic.line, diagnostic.column
        ));
    }
    if diagnostic.message.is_empty() {
        out.push_str("unknown error");
    } else {
        out.push_str(&diagnostic.message);
    }
    if let Some(line) = diagnostic.line_source.as_deref().filter(|l| !l.is_empty()) {
        out.push_str("\n\t");
        out.push_str(line);
    }
    out
}
