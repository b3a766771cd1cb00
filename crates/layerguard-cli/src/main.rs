use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use layerguard_core::{Config, ExitStatus, Report};
use layerguard_engine::{AnalysisError, Analyzer};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod format;

use format::OutputStyle;

/// Name of the configuration file looked up in the analyzed root
const CONFIG_FILE: &str = "layerguard.toml";

#[derive(Parser)]
#[command(name = "layerguard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (defaults to <root>/layerguard.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a codebase for layer violations
    Check {
        /// Source root, or a `.json` codebase description
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Output style
        #[arg(short, long, value_enum, default_value_t = OutputStyle::Human)]
        format: OutputStyle,

        /// Exit non-zero when only warnings are found
        #[arg(long)]
        fail_on_warning: bool,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Abort the analysis after this many seconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        timeout: Option<u64>,
    },

    /// Show the layer each package was classified into
    Layers {
        /// Source root, or a `.json` codebase description
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Output style
        #[arg(short, long, value_enum, default_value_t = OutputStyle::Human)]
        format: OutputStyle,
    },

    /// List the built-in rules in evaluation order
    Rules,

    /// Write a configuration file with the default settings
    InitConfig {
        /// Output path
        #[arg(short, long, default_value = CONFIG_FILE)]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(status) => ExitCode::from(status.code()),
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            let status = err
                .downcast_ref::<AnalysisError>()
                .map(AnalysisError::exit_status)
                .unwrap_or(ExitStatus::InvalidInput);
            ExitCode::from(status.code())
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<ExitStatus> {
    match cli.command {
        Commands::Check {
            root,
            format,
            fail_on_warning,
            output,
            timeout,
        } => {
            check_command(
                &root,
                cli.config.as_deref(),
                format,
                fail_on_warning,
                output.as_deref(),
                timeout,
                cli.verbose,
            )
            .await
        }
        Commands::Layers { root, format } => layers_command(&root, cli.config.as_deref(), format).await,
        Commands::Rules => rules_command(cli.config.as_deref()),
        Commands::InitConfig { output, force } => init_config_command(&output, force),
    }
}

/// Load the configuration: explicit path, then `<root>/layerguard.toml`, then defaults
fn load_config(explicit: Option<&Path>, root: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return Config::from_file(path).with_context(|| format!("Failed to load config from {}", path.display()));
    }

    if let Some(candidate) = root.filter(|r| r.is_dir()).map(|r| r.join(CONFIG_FILE)) {
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "Using config from root");
            return Config::from_file(&candidate)
                .with_context(|| format!("Failed to load config from {}", candidate.display()));
        }
    }

    Ok(Config::default())
}

async fn check_command(
    root: &Path,
    config_path: Option<&Path>,
    style: OutputStyle,
    fail_on_warning: bool,
    output: Option<&Path>,
    timeout: Option<u64>,
    verbose: bool,
) -> Result<ExitStatus> {
    let config = load_config(config_path, Some(root))?;
    let fail_on_warning = fail_on_warning || config.fail_on_warning;

    let analyzer = Analyzer::new(config)
        .context("Invalid configuration")?
        .with_timeout(timeout.map(Duration::from_secs));

    if verbose {
        eprintln!("{}", format!("Checking {}", root.display()).cyan());
        eprintln!("  Rules enabled: {}", analyzer.engine().rule_count());
        if let Some(limit) = analyzer.timeout() {
            eprintln!("  Time limit: {}s", limit.as_secs());
        }
    }

    let report = match analyzer.analyze(root).await {
        Ok(report) => report,
        Err(AnalysisError::Timeout { limit }) => Report::incomplete(
            root.display().to_string(),
            format!("analysis exceeded the {}s time limit", limit.as_secs_f64()),
        ),
        Err(err) => return Err(err).with_context(|| format!("Failed to analyze {}", root.display())),
    };

    match output {
        Some(path) => {
            colored::control::set_override(false);
            let rendered = format::format(&report, style).context("Failed to render report")?;
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;

            eprintln!(
                "{} Report written to {} ({} errors, {} warnings)",
                "✓".green(),
                path.display(),
                report.summary.errors,
                report.summary.warnings
            );
        }
        None => {
            let rendered = format::format(&report, style).context("Failed to render report")?;
            print!("{}", rendered);
        }
    }

    Ok(report.exit_status(fail_on_warning))
}

async fn layers_command(root: &Path, config_path: Option<&Path>, style: OutputStyle) -> Result<ExitStatus> {
    let config = load_config(config_path, Some(root))?;
    let analyzer = Analyzer::new(config).context("Invalid configuration")?;

    let graph = analyzer
        .build_graph(root)
        .await
        .with_context(|| format!("Failed to read {}", root.display()))?;

    print!("{}", format::format_layers(&graph, style).context("Failed to render layers")?);

    Ok(ExitStatus::Success)
}

fn rules_command(config_path: Option<&Path>) -> Result<ExitStatus> {
    let config = load_config(config_path, None)?;
    config.validate().context("Invalid configuration")?;
    let rules = layerguard_engine::rules::builtin(&config).context("Invalid configuration")?;

    for (priority, registered) in rules.iter().enumerate() {
        let rule = &registered.rule;
        let state = if registered.enabled {
            "enabled".green()
        } else {
            "disabled".dimmed()
        };

        println!("{}. {} [{}]", priority + 1, rule.id().bold(), state);
        println!("   {}", rule.description());
        println!("   Scope: {}", rule.scope());
        let codes: Vec<&str> = rule.codes().iter().map(|c| c.as_str()).collect();
        println!("   Codes: {}", codes.join(", "));
    }

    Ok(ExitStatus::Success)
}

fn init_config_command(output: &Path, force: bool) -> Result<ExitStatus> {
    if output.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", output.display());
    }

    Config::default()
        .save_to_file(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("{} Wrote default configuration to {}", "✓".green(), output.display());

    Ok(ExitStatus::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn check_arguments() {
        let cli = Cli::try_parse_from([
            "layerguard",
            "-c",
            "custom.toml",
            "check",
            "src",
            "--format",
            "structured",
            "--fail-on-warning",
            "--timeout",
            "30",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        match cli.command {
            Commands::Check {
                root,
                format,
                fail_on_warning,
                timeout,
                output,
            } => {
                assert_eq!(root, PathBuf::from("src"));
                assert_eq!(format, OutputStyle::Structured);
                assert!(fail_on_warning);
                assert_eq!(timeout, Some(30));
                assert_eq!(output, None);
            }
            _ => panic!("expected check"),
        }

        assert!(Cli::try_parse_from(["layerguard", "check", "--timeout", "0"]).is_err());
    }

    #[test]
    fn config_lookup_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "fail_on_warning = true\n").unwrap();

        let from_root = load_config(None, Some(dir.path())).unwrap();
        assert!(from_root.fail_on_warning);

        let explicit = dir.path().join("other.toml");
        std::fs::write(&explicit, "fail_closed = true\n").unwrap();
        let from_flag = load_config(Some(&explicit), Some(dir.path())).unwrap();
        assert!(from_flag.fail_closed);
        assert!(!from_flag.fail_on_warning);

        let missing = load_config(Some(&dir.path().join("nope.toml")), None);
        assert!(missing.is_err());

        assert!(!load_config(None, None).unwrap().fail_on_warning);
    }

    #[tokio::test]
    async fn check_writes_report_and_maps_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("src");
        std::fs::create_dir_all(root.join("domain/catalog")).unwrap();
        std::fs::write(root.join("go.mod"), "module example.com/shop\n").unwrap();
        std::fs::write(
            root.join("domain/catalog/product.go"),
            "package catalog\n\nimport \"example.com/shop/infrastructure/db\"\n\nvar _ = db.Open\n",
        )
        .unwrap();
        std::fs::create_dir_all(root.join("infrastructure/db")).unwrap();
        std::fs::write(root.join("infrastructure/db/db.go"), "package db\n\nfunc Open() {}\n").unwrap();

        let out = dir.path().join("report.json");
        let status = check_command(&root, None, OutputStyle::Structured, false, Some(&out), None, false)
            .await
            .unwrap();
        assert_eq!(status, ExitStatus::Violations);

        let report: Report = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert!(report.has_errors());

        let missing = check_command(&dir.path().join("absent"), None, OutputStyle::Human, false, None, None, false)
            .await
            .unwrap_err();
        let status = missing
            .downcast_ref::<AnalysisError>()
            .map(AnalysisError::exit_status);
        assert_eq!(status, Some(ExitStatus::InvalidInput));
    }

    #[test]
    fn init_config_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        init_config_command(&path, false).unwrap();
        let written = Config::from_file(&path).unwrap();
        assert!(!written.rules.context_propagation.enabled);

        assert!(init_config_command(&path, false).is_err());
        assert!(init_config_command(&path, true).is_ok());
    }
}
