//! Report rendering: human, structured and markdown

use clap::ValueEnum;
use colored::Colorize;
use layerguard_core::{AnalysisStatus, Report, Severity, Subject, Violation};
use layerguard_graph::Graph;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Output style for reports and listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputStyle {
    /// Colored, grouped by file, then by edge
    #[default]
    Human,

    /// Versioned JSON report
    Structured,

    /// Markdown, for CI summaries
    Markdown,
}

/// `format(report, style) -> output`
pub fn format(report: &Report, style: OutputStyle) -> Result<String, serde_json::Error> {
    match style {
        OutputStyle::Human => Ok(render_human(report)),
        OutputStyle::Structured => report.to_json().map(|json| json + "\n"),
        OutputStyle::Markdown => Ok(generate_markdown_report(report)),
    }
}

fn severity_label(severity: Severity) -> colored::ColoredString {
    match severity {
        Severity::Error => "ERROR".red().bold(),
        Severity::Warn => "WARN".yellow().bold(),
        Severity::Info => "INFO".cyan(),
    }
}

/// One group of violations under a file: either all on one edge, or a
/// single non-edge violation
enum Group<'a> {
    Edge { subject: &'a Subject, violations: Vec<&'a Violation> },
    Single(&'a Violation),
}

/// Group violations by file (sorted), then by edge in report order
fn group_by_file(report: &Report) -> BTreeMap<&str, Vec<Group<'_>>> {
    let mut files: BTreeMap<&str, Vec<Group<'_>>> = BTreeMap::new();

    for violation in &report.violations {
        let groups = files.entry(violation.file()).or_default();

        if matches!(violation.subject, Subject::Edge { .. }) {
            let existing = groups.iter_mut().find_map(|g| match g {
                Group::Edge { subject, violations } if **subject == violation.subject => Some(violations),
                _ => None,
            });
            match existing {
                Some(violations) => violations.push(violation),
                None => groups.push(Group::Edge {
                    subject: &violation.subject,
                    violations: vec![violation],
                }),
            }
        } else {
            groups.push(Group::Single(violation));
        }
    }

    files
}

fn write_violation(out: &mut String, indent: &str, violation: &Violation, with_line: bool) {
    let _ = write!(
        out,
        "{}[{}] {} ({}): {}",
        indent,
        severity_label(violation.severity),
        violation.code,
        violation.rule,
        violation.message
    );
    if with_line {
        if let Some(line) = violation.location.as_ref().and_then(|l| l.line) {
            let _ = write!(out, " {}", format!("(line {})", line).dimmed());
        }
    }
    out.push('\n');

    if let Some(expected) = &violation.expected {
        let _ = writeln!(out, "{}    Expected: {}", indent, expected);
    }
    if let Some(actual) = &violation.actual {
        let _ = writeln!(out, "{}    Actual:   {}", indent, actual);
    }
}

fn render_human(report: &Report) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", "=".repeat(60).bright_blue());
    let _ = writeln!(out, "{}", "Layer Conformance Report".bold().bright_blue());
    let _ = writeln!(out, "{}", "=".repeat(60).bright_blue());
    let _ = writeln!(out);
    let _ = writeln!(out, "Root:    {}", report.root);
    let _ = writeln!(out, "Version: {}", report.version);
    let _ = writeln!(
        out,
        "Graph:   {} packages, {} edges, {} rules",
        report.summary.packages_analyzed, report.summary.edges_analyzed, report.summary.rules_evaluated
    );
    let _ = writeln!(out);

    if let AnalysisStatus::Incomplete { reason } = &report.status {
        let _ = writeln!(out, "{} {}", "✗ Analysis incomplete:".red().bold(), reason);
        let _ = writeln!(out, "  No violations are reported for an incomplete run.");
        let _ = writeln!(out);
    } else if report.violations.is_empty() {
        let _ = writeln!(out, "{}", "✓ No violations found!".green().bold());
        let _ = writeln!(out);
    } else {
        for (file, groups) in group_by_file(report) {
            let _ = writeln!(out, "{}", file.bold().underline());
            for group in groups {
                match group {
                    Group::Edge { subject, violations } => {
                        let line = violations[0].location.as_ref().and_then(|l| l.line);
                        let _ = write!(out, "  {}", subject.to_string().cyan());
                        if let Some(line) = line {
                            let _ = write!(out, " {}", format!("(line {})", line).dimmed());
                        }
                        out.push('\n');
                        for violation in violations {
                            write_violation(&mut out, "    ", violation, false);
                        }
                    }
                    Group::Single(violation) => write_violation(&mut out, "  ", violation, true),
                }
            }
            let _ = writeln!(out);
        }
    }

    let _ = writeln!(out, "{}", "Summary:".bold());
    let _ = writeln!(out, "  Total violations: {}", report.summary.total);
    if report.summary.errors > 0 {
        let _ = writeln!(out, "  Errors:   {}", report.summary.errors.to_string().red().bold());
    } else {
        let _ = writeln!(out, "  Errors:   {}", report.summary.errors.to_string().green());
    }
    if report.summary.warnings > 0 {
        let _ = writeln!(out, "  Warnings: {}", report.summary.warnings.to_string().yellow());
    } else {
        let _ = writeln!(out, "  Warnings: {}", report.summary.warnings.to_string().green());
    }
    let _ = writeln!(out, "  Info:     {}", report.summary.info);

    out
}

/// Generate markdown report
fn generate_markdown_report(report: &Report) -> String {
    let mut md = String::new();

    md.push_str("# Layer Conformance Report\n\n");
    md.push_str(&format!("**Root:** `{}`\n\n", report.root));
    md.push_str(&format!("**Version:** {}\n\n", report.version));

    if let AnalysisStatus::Incomplete { reason } = &report.status {
        md.push_str(&format!("❌ **Analysis incomplete:** {}\n", reason));
        return md;
    }

    md.push_str("## Summary\n\n");
    md.push_str(&format!("- Packages: {}\n", report.summary.packages_analyzed));
    md.push_str(&format!("- Total violations: {}\n", report.summary.total));
    md.push_str(&format!("- Errors: {}\n", report.summary.errors));
    md.push_str(&format!("- Warnings: {}\n", report.summary.warnings));
    md.push_str(&format!("- Info: {}\n", report.summary.info));
    md.push('\n');

    if report.violations.is_empty() {
        md.push_str("✅ **No violations found!**\n");
        return md;
    }

    md.push_str("## Violations\n\n");
    md.push_str("| Severity | Code | Subject | Location | Message |\n");
    md.push_str("|---|---|---|---|---|\n");

    for violation in &report.violations {
        let severity = match violation.severity {
            Severity::Error => "❌ error",
            Severity::Warn => "⚠️ warn",
            Severity::Info => "ℹ️ info",
        };
        let location = violation
            .location
            .as_ref()
            .map(|l| format!("`{}`", l))
            .unwrap_or_default();

        md.push_str(&format!(
            "| {} | `{}` | `{}` | {} | {} |\n",
            severity,
            violation.code,
            violation.subject,
            location,
            violation.message.replace('|', "\\|")
        ));
    }

    md
}

/// Package listing for the `layers` command
pub fn format_layers(graph: &Graph, style: OutputStyle) -> Result<String, serde_json::Error> {
    match style {
        OutputStyle::Structured => {
            let rows: Vec<serde_json::Value> = graph
                .packages()
                .map(|p| {
                    serde_json::json!({
                        "package": p.id,
                        "layer": p.layer,
                        "classification": p.classification,
                    })
                })
                .collect();
            serde_json::to_string_pretty(&rows).map(|json| json + "\n")
        }
        OutputStyle::Markdown => {
            let mut md = String::from("| Package | Layer | Classified by |\n|---|---|---|\n");
            for package in graph.packages() {
                md.push_str(&format!("| `{}` | {} | {} |\n", package.id, package.layer, package.classification));
            }
            Ok(md)
        }
        OutputStyle::Human => {
            let width = graph.packages().map(|p| p.id.len()).max().unwrap_or(0);
            let mut out = String::new();
            for package in graph.packages() {
                let layer = format!("{:14}", package.layer.as_str());
                let layer = if package.layer.is_known() { layer.green() } else { layer.yellow() };
                let _ = writeln!(
                    out,
                    "{:width$}  {}  {}",
                    package.id,
                    layer,
                    package.classification.to_string().dimmed(),
                    width = width
                );
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layerguard_core::{Location, ViolationCode};

    fn report() -> Report {
        Report::from_violations(
            "shop",
            vec![
                Violation::new(
                    "dependency-direction",
                    ViolationCode::LayerDependencyDirection,
                    Severity::Error,
                    Subject::edge("domain/order", "usecase/dto"),
                    "domain package 'domain/order' depends on outer usecase package 'usecase/dto'",
                )
                .with_location(Location::with_line("domain/order/order.go", 6)),
                Violation::new(
                    "domain-purity",
                    ViolationCode::DomainExternalDependency,
                    Severity::Error,
                    Subject::edge("domain/order", "usecase/dto"),
                    "Domain package 'domain/order' depends on usecase package 'usecase/dto'",
                )
                .with_location(Location::with_line("domain/order/order.go", 6)),
                Violation::new(
                    "layer-coverage",
                    ViolationCode::PackageLayerUnknown,
                    Severity::Warn,
                    Subject::package("tools/seed"),
                    "Package 'tools/seed' matches no layer pattern or annotation",
                ),
            ],
        )
    }

    #[test]
    fn human_groups_edge_violations() {
        colored::control::set_override(false);
        let text = format(&report(), OutputStyle::Human).unwrap();

        assert_eq!(text.matches("domain/order -> usecase/dto (line 6)").count(), 1);
        assert!(text.contains("[ERROR] LAYER_DEPENDENCY_DIRECTION (dependency-direction)"));
        assert!(text.contains("[ERROR] DOMAIN_EXTERNAL_DEPENDENCY (domain-purity)"));
        assert!(text.contains("tools/seed\n  [WARN] PACKAGE_LAYER_UNKNOWN"));
        assert!(text.contains("Errors:   2"));
        assert!(text.contains("Warnings: 1"));

        let order = text.find("domain/order/order.go").unwrap();
        let seed = text.find("tools/seed\n").unwrap();
        assert!(order < seed);
    }

    #[test]
    fn structured_is_the_report_json() {
        let json = format(&report(), OutputStyle::Structured).unwrap();
        let parsed: Report = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, report());
    }

    #[test]
    fn markdown_table() {
        let md = format(&report(), OutputStyle::Markdown).unwrap();

        assert!(md.contains("- Errors: 2"));
        assert!(md.contains("| ❌ error | `LAYER_DEPENDENCY_DIRECTION` | `domain/order -> usecase/dto` | `domain/order/order.go:6` |"));
    }

    #[test]
    fn incomplete_report_has_no_violation_section() {
        colored::control::set_override(false);
        let report = Report::incomplete("shop", "analysis exceeded the 5s time limit");

        let text = format(&report, OutputStyle::Human).unwrap();
        assert!(text.contains("Analysis incomplete: analysis exceeded the 5s time limit"));

        let md = format(&report, OutputStyle::Markdown).unwrap();
        assert!(!md.contains("## Violations"));
    }
}
