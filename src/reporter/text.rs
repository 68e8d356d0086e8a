//! Plain text report generator.

use crate::config::Config;
use crate::error::Result;
use crate::reporter::ReportGenerator;
use crate::types::{Analysis, ModificationRun};
use colored::Colorize;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use std::collections::HashSet;

/// Text report generator for CLI output.
pub struct TextReporter {
    /// Whether to use colors
    use_colors: bool,
}

impl TextReporter {
    /// Create a new text reporter.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            use_colors: config.output.colored,
        }
    }
}

impl ReportGenerator for TextReporter {
    fn analysis(&self, analysis: &Analysis, highlight: Option<&str>) -> Result<String> {
        let highlighted: HashSet<String> = highlight
            .map(|needle| analysis.matching_files(needle).into_iter().collect())
            .unwrap_or_default();

        let mut output = String::new();
        output.push_str(&self.format_header("tfscope Analysis"));
        output.push('\n');
        output.push_str(&self.format_analysis_summary(analysis, highlight, highlighted.len()));
        output.push('\n');

        if !analysis.graph.is_empty() {
            output.push_str(&self.format_files(analysis, &highlighted));
            output.push('\n');
        }
        if analysis.graph.edge_count() > 0 {
            output.push_str(&self.format_dependencies(analysis, &highlighted));
            output.push('\n');
        }
        if !analysis.external_modules.is_empty() {
            output.push_str(&self.format_external_modules(analysis));
            output.push('\n');
        }
        if !analysis.parse_failures.is_empty() {
            output.push_str(&self.format_parse_failures(analysis));
            output.push('\n');
        }

        Ok(output)
    }

    fn modification(&self, run: &ModificationRun) -> Result<String> {
        let mut output = String::new();
        output.push_str(&self.format_header("tfscope Modification"));
        output.push('\n');

        output.push_str(&self.section_title("Request"));
        output.push_str(&format!("  {}\n", run.request));

        output.push_str(&self.section_title("Selected Files"));
        if run.selected_files.is_empty() {
            output.push_str("  (none)\n");
        }
        for file in &run.selected_files {
            output.push_str(&format!("  - {file}\n"));
        }

        if !run.modifications.is_empty() {
            output.push_str(&self.format_changes(run));
        }

        if run.dry_run {
            for modification in &run.modifications {
                let banner = format!("--- {} (preview) ---", modification.path);
                if self.use_colors {
                    output.push_str(&format!("\n{}\n", banner.bright_yellow()));
                } else {
                    output.push_str(&format!("\n{banner}\n"));
                }
                output.push_str(&modification.modified);
                output.push('\n');
            }
        }

        output.push_str(&self.format_run_footer(run));
        Ok(output)
    }
}

impl TextReporter {
    /// Format the report header.
    fn format_header(&self, title: &str) -> String {
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");

        if self.use_colors {
            format!(
                "\n{} {} {}\n{}\n",
                title.bright_white().bold(),
                version.dimmed(),
                format!("({timestamp})").dimmed(),
                "=".repeat(80).bright_blue(),
            )
        } else {
            format!("\n{title} {version} ({timestamp})\n{}\n", "=".repeat(80))
        }
    }

    fn section_title(&self, title: &str) -> String {
        let title = if self.use_colors {
            title.bright_cyan().bold().to_string()
        } else {
            title.to_string()
        };
        format!("\n{title}\n{}\n", "-".repeat(80))
    }

    fn new_table(headers: Vec<&str>) -> Table {
        let mut table = Table::new();
        table
            .load_preset(comfy_table::presets::UTF8_BORDERS_ONLY)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(headers);
        table
    }

    fn format_analysis_summary(&self, analysis: &Analysis, highlight: Option<&str>, highlighted: usize) -> String {
        let mut output = self.section_title("Summary");

        output.push_str(&format!("  Root: {}\n", analysis.root.display()));
        if let Some(sha) = &analysis.head_sha {
            output.push_str(&format!("  Commit: {}\n", &sha[..sha.len().min(12)]));
        }

        let failures = analysis.parse_failures.len();
        let counts = format!(
            "  {} files | {} module dependencies | {} external modules | {} parse failures\n",
            analysis.graph.node_count(),
            analysis.graph.edge_count(),
            analysis.external_modules.len(),
            failures,
        );
        if self.use_colors && failures > 0 {
            output.push_str(&counts.yellow().to_string());
        } else {
            output.push_str(&counts);
        }

        if let Some(needle) = highlight {
            output.push_str(&format!("  {highlighted} files match '{needle}'\n"));
        }

        output
    }

    fn format_files(&self, analysis: &Analysis, highlighted: &HashSet<String>) -> String {
        let mut output = self.section_title("Files");
        let mut table = Self::new_table(vec!["File", "Description", "Depends On"]);

        for node in analysis.graph.nodes() {
            let file_cell = if highlighted.contains(&node.id) && self.use_colors {
                Cell::new(format!("* {}", node.id)).fg(Color::Yellow)
            } else if highlighted.contains(&node.id) {
                Cell::new(format!("* {}", node.id))
            } else {
                Cell::new(&node.id)
            };

            let description = node.description.as_deref().unwrap_or("-");
            let depends_on = analysis.graph.dependencies_of(&node.id).len();

            table.add_row(vec![
                file_cell,
                Cell::new(truncate(description, 60)),
                Cell::new(depends_on),
            ]);
        }

        output.push_str(&table.to_string());
        output.push('\n');
        output
    }

    fn format_dependencies(&self, analysis: &Analysis, highlighted: &HashSet<String>) -> String {
        let mut output = self.section_title("Module Dependencies");
        let mut table = Self::new_table(vec!["Source", "Target", "Module"]);

        for edge in analysis.graph.edges() {
            let touches_highlight = highlighted.contains(edge.source) || highlighted.contains(edge.target);
            let module_cell = if touches_highlight && self.use_colors {
                Cell::new(&edge.edge.module_name).fg(Color::Yellow)
            } else {
                Cell::new(&edge.edge.module_name)
            };
            table.add_row(vec![Cell::new(edge.source), Cell::new(edge.target), module_cell]);
        }

        output.push_str(&table.to_string());
        output.push('\n');
        output
    }

    fn format_external_modules(&self, analysis: &Analysis) -> String {
        let mut output = self.section_title("External Modules");
        let mut table = Self::new_table(vec!["Module", "Source", "Kind", "File"]);

        for module in &analysis.external_modules {
            table.add_row(vec![
                Cell::new(&module.module_name),
                Cell::new(truncate(&module.source.raw, 50)),
                Cell::new(module.source.kind),
                Cell::new(&module.file),
            ]);
        }

        output.push_str(&table.to_string());
        output.push('\n');
        output
    }

    fn format_parse_failures(&self, analysis: &Analysis) -> String {
        let mut output = self.section_title("Parse Failures");
        for failure in &analysis.parse_failures {
            let file = if self.use_colors {
                failure.file.red().to_string()
            } else {
                failure.file.clone()
            };
            output.push_str(&format!("  {file}\n"));
            let message = format!("    {}", failure.message.lines().next().unwrap_or_default());
            if self.use_colors {
                output.push_str(&message.dimmed().to_string());
            } else {
                output.push_str(&message);
            }
            output.push('\n');
        }
        output
    }

    fn format_changes(&self, run: &ModificationRun) -> String {
        let mut output = self.section_title("Changes");
        let mut table = Self::new_table(vec!["File", "Status", "Lines"]);

        let failed: Vec<&str> = run.outcome.failed.iter().map(|(path, _)| path.as_str()).collect();
        for modification in &run.modifications {
            let (status, color) = if failed.contains(&modification.path.as_str()) {
                ("failed", Color::Red)
            } else if modification.is_noop() {
                ("unchanged", Color::DarkGrey)
            } else if run.outcome.written.contains(&modification.path) {
                ("written", Color::Green)
            } else {
                ("previewed", Color::Yellow)
            };
            let status_cell = if self.use_colors {
                Cell::new(status).fg(color)
            } else {
                Cell::new(status)
            };
            let lines = format!(
                "{} -> {}",
                modification.original.lines().count(),
                modification.modified.lines().count()
            );
            table.add_row(vec![Cell::new(&modification.path), status_cell, Cell::new(lines)]);
        }

        output.push_str(&table.to_string());
        output.push('\n');

        for (path, reason) in &run.outcome.failed {
            output.push_str(&format!("  {path}: {reason}\n"));
        }
        output
    }

    fn format_run_footer(&self, run: &ModificationRun) -> String {
        let status = if !run.outcome.failed.is_empty() {
            let text = format!("{} files failed to write", run.outcome.failed.len());
            if self.use_colors {
                text.red().bold().to_string()
            } else {
                text
            }
        } else if run.dry_run {
            let text = format!("Dry run: {} files previewed, nothing written", run.outcome.previewed.len());
            if self.use_colors {
                text.yellow().to_string()
            } else {
                text
            }
        } else if run.modifications.is_empty() {
            "No modifications generated".to_string()
        } else {
            let text = format!("{} files written", run.outcome.written.len());
            if self.use_colors {
                text.green().bold().to_string()
            } else {
                text
            }
        };

        format!("\n{status}\n\n")
    }
}

/// Truncate a string to at most `max_chars` characters.
fn truncate(s: &str, max_chars: usize) -> String {
    let first_line = s.lines().next().unwrap_or_default();
    if first_line.chars().count() <= max_chars && first_line.len() == s.trim_end().len() {
        first_line.to_string()
    } else {
        let kept: String = first_line.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
