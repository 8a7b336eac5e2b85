use crate::core::models::{display_name, BuildReport};
use colored::*;
use std::time::Instant;

/// Terminal summary printed by the CLI after a run
pub struct ConsoleUI {
    start_time: Instant,
}

impl ConsoleUI {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    pub fn show_banner(&self) {
        println!(
            "\n  {} {}",
            "MINPACK".bright_cyan().bold(),
            concat!("v", env!("CARGO_PKG_VERSION")).bright_white()
        );
        println!();
    }

    pub fn show_completion(&self, report: &BuildReport) {
        println!();
        for file in &report.files {
            let marker = if file.original_kept {
                " (original kept)".yellow()
            } else {
                "".normal()
            };
            println!(
                "  {} {}{}",
                file.output.file_name().bright_cyan(),
                format!("({})", format_size(file.output_size)).bright_black(),
                marker
            );
            if let Some(gz) = &file.gzipped {
                println!(
                    "  {} {}",
                    display_name(&gz.path).cyan(),
                    format!("({})", format_size(gz.size)).bright_black()
                );
            }
        }
        for output in &report.aggregated {
            println!("  {} {}", display_name(output).bright_magenta(), "(aggregated)".bright_black());
        }

        let stats = &report.stats;
        println!();
        println!(
            "  {} processed, {} skipped, {} aggregation(s) written",
            stats.files_processed.to_string().bright_white().bold(),
            stats.files_skipped.to_string().bright_black(),
            stats.aggregations_written.to_string().bright_white()
        );
        if report.warnings > 0 || report.errors > 0 {
            println!(
                "  {} warning(s), {} error(s)",
                report.warnings.to_string().yellow().bold(),
                report.errors.to_string().red().bold()
            );
        }
        println!(
            "  {} done in {}",
            "✓".bright_green(),
            format!("{:.0}ms", self.start_time.elapsed().as_secs_f64() * 1000.0)
                .bright_white()
                .bold()
        );
    }
}

impl Default for ConsoleUI {
    fn default() -> Self {
        Self::new()
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else {
        format!("{:.2} kB", bytes as f64 / 1024.0)
    }
}
