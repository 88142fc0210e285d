//! Report formatting and printing utilities.
//!
//! Displays issues in cargo-style format and the manifest as an aligned
//! key table. Separate from the engine so varia can be used as a library.

use std::io::{self, Write};

use anyhow::Result;
use colored::Colorize;
use unicode_width::UnicodeWidthStr;

use crate::core::{AnalysisOutcome, Manifest};
use crate::issues::{Issue, IssueExt, Severity};

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Failure mark for consistent output formatting.
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

/// Serialize the manifest for downstream emitters.
pub fn render_json(manifest: &Manifest) -> Result<String> {
    Ok(serde_json::to_string_pretty(manifest)?)
}

/// Print the analysis outcome to stdout.
pub fn report(outcome: &AnalysisOutcome, files_analyzed: usize) {
    report_to(outcome, files_analyzed, &mut io::stdout().lock());
}

/// Print the analysis outcome to a custom writer.
///
/// Useful for testing or redirecting output.
pub fn report_to<W: Write>(outcome: &AnalysisOutcome, files_analyzed: usize, writer: &mut W) {
    let mut sorted = outcome.issues.clone();
    sorted.sort_by(|a, b| {
        let ka = (&a.context().file_path, a.context().line, a.context().col);
        let kb = (&b.context().file_path, b.context().line, b.context().col);
        ka.cmp(&kb).then_with(|| a.message().cmp(&b.message()))
    });

    let max_line_width = sorted
        .iter()
        .map(|issue| issue.context().line.to_string().len())
        .max()
        .unwrap_or(1);
    for issue in &sorted {
        print_issue(issue, writer, max_line_width);
    }

    print_manifest(&outcome.manifest, writer);
    print_summary(outcome, files_analyzed, writer);
}

fn print_issue<W: Write>(issue: &Issue, writer: &mut W, max_line_width: usize) {
    let severity_str = match issue.severity() {
        Severity::Error => "error".bold().red(),
        Severity::Warning => "warning".bold().yellow(),
    };
    let _ = writeln!(
        writer,
        "{}: {}  {}",
        severity_str,
        issue.message(),
        issue.rule().to_string().dimmed().cyan()
    );

    let context = issue.context();
    if context.line > 0 {
        let _ = writeln!(
            writer,
            "  {} {}:{}:{}",
            "-->".blue(),
            context.file_path,
            context.line,
            context.col
        );
    } else if !context.file_path.is_empty() {
        let _ = writeln!(writer, "  {} {}", "-->".blue(), context.file_path);
    }

    if context.line > 0 && !context.source_line.is_empty() {
        let caret = match issue.severity() {
            Severity::Error => "^".red(),
            Severity::Warning => "^".yellow(),
        };
        let _ = writeln!(writer, "{:>width$} {}", "", "|".blue(), width = max_line_width);
        let _ = writeln!(
            writer,
            "{:>width$} {} {}",
            context.line.to_string().blue(),
            "|".blue(),
            context.source_line,
            width = max_line_width
        );
        // Caret under the offending column (1-based).
        let prefix: String = context
            .source_line
            .chars()
            .take(context.col.saturating_sub(1))
            .collect();
        let _ = writeln!(
            writer,
            "{:>width$} {} {:>padding$}{}",
            "",
            "|".blue(),
            "",
            caret,
            width = max_line_width,
            padding = UnicodeWidthStr::width(prefix.as_str())
        );
    }

    if let Some(details) = issue.details() {
        let _ = writeln!(
            writer,
            "{:>width$} {} {} {}",
            "",
            "=".blue(),
            "note:".bold(),
            details,
            width = max_line_width
        );
    }
    let _ = writeln!(writer);
}

fn print_manifest<W: Write>(manifest: &Manifest, writer: &mut W) {
    if manifest.records.is_empty() {
        return;
    }

    let key_width = manifest
        .records
        .iter()
        .map(|r| UnicodeWidthStr::width(r.key.as_str()))
        .max()
        .unwrap_or(0);

    for record in &manifest.records {
        let padding = key_width - UnicodeWidthStr::width(record.key.as_str());
        let initial = record
            .initial_value
            .as_deref()
            .unwrap_or("(scan only)")
            .to_string();
        let values = if record.values.is_empty() {
            "-".to_string()
        } else {
            record.values.join(", ")
        };
        let _ = writeln!(
            writer,
            "  {}{:>pad$}  {} {}  {} {}",
            record.key.bold(),
            "",
            "initial:".dimmed(),
            initial,
            "values:".dimmed(),
            values,
            pad = padding
        );
    }
    let _ = writeln!(writer);
}

fn print_summary<W: Write>(outcome: &AnalysisOutcome, files_analyzed: usize, writer: &mut W) {
    let errors = outcome.error_count();
    let warnings = outcome.warning_count();
    let keys = outcome.manifest.records.len();

    if errors > 0 {
        let _ = writeln!(
            writer,
            "{} {}",
            FAILURE_MARK.red(),
            format!(
                "Analyzed {} source {} - {} error(s), {} warning(s)",
                files_analyzed,
                plural_files(files_analyzed),
                errors,
                warnings
            )
            .red()
        );
    } else {
        let _ = writeln!(
            writer,
            "{} {}",
            SUCCESS_MARK.green(),
            format!(
                "Analyzed {} source {} - {} state {}, {} warning(s)",
                files_analyzed,
                plural_files(files_analyzed),
                keys,
                if keys == 1 { "key" } else { "keys" },
                warnings
            )
            .green()
        );
    }
}

fn plural_files(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AnalysisOutcome, Manifest, VariantRecord};
    use crate::issues::{DynamicValueIssue, SourceContext};

    fn render(outcome: &AnalysisOutcome) -> String {
        colored::control::set_override(false);
        let mut buffer = Vec::new();
        report_to(outcome, 2, &mut buffer);
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_report_lists_records_and_summary() {
        let outcome = AnalysisOutcome {
            manifest: Manifest {
                records: vec![VariantRecord {
                    key: "theme".to_string(),
                    values: vec!["dark".to_string(), "light".to_string()],
                    initial_value: Some("dark".to_string()),
                }],
                files: vec!["app.tsx".to_string()],
            },
            issues: vec![],
        };

        let rendered = render(&outcome);
        assert!(rendered.contains("theme"));
        assert!(rendered.contains("dark, light"));
        assert!(rendered.contains("1 state key"));
    }

    #[test]
    fn test_report_prints_issue_location_and_note() {
        let outcome = AnalysisOutcome {
            manifest: Manifest::default(),
            issues: vec![Issue::from(DynamicValueIssue {
                context: SourceContext::new("app.tsx", 4, 14, "    setTheme(next);"),
                key: "theme".to_string(),
                detail: "identifier `next` is not a module-level const".to_string(),
            })],
        };

        let rendered = render(&outcome);
        assert!(rendered.contains("--> app.tsx:4:14"));
        assert!(rendered.contains("note: identifier `next`"));
        assert!(rendered.contains("dynamic-value"));
    }

    #[test]
    fn test_render_json_shape() {
        let manifest = Manifest {
            records: vec![VariantRecord {
                key: "theme".to_string(),
                values: vec!["dark".to_string()],
                initial_value: Some("dark".to_string()),
            }],
            files: vec!["app.tsx".to_string()],
        };

        let json: serde_json::Value =
            serde_json::from_str(&render_json(&manifest).unwrap()).unwrap();
        assert_eq!(json["records"][0]["key"], "theme");
        assert_eq!(json["records"][0]["initialValue"], "dark");
        assert_eq!(json["files"][0], "app.tsx");
    }
}
