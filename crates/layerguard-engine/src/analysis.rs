//! End-to-end analysis: build the graph, evaluate the rules, produce a report

use layerguard_core::{Config, ConfigError, ExitStatus, Report};
use layerguard_graph::{Graph, GraphBuilder, InputError};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::RuleEngine;

/// Errors that stop an analysis run. Rule violations are never errors.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Analysis incomplete: exceeded the {}s time limit", .limit.as_secs_f64())]
    Timeout { limit: Duration },

    #[error("Rule evaluation failed: {0}")]
    TaskFailed(String),

    #[error("Failed to digest graph: {0}")]
    Digest(String),
}

impl AnalysisError {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            Self::Timeout { .. } => ExitStatus::Incomplete,
            _ => ExitStatus::InvalidInput,
        }
    }
}

/// Configured analysis pipeline
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: Config,
    builder: GraphBuilder,
    engine: RuleEngine,
    timeout: Option<Duration>,
}

impl Analyzer {
    /// Validate `config` and compile everything it names
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            builder: GraphBuilder::from_config(&config)?,
            engine: RuleEngine::from_config(&config)?,
            timeout: config.timeout(),
            config,
        })
    }

    /// Override the configured time limit
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        if timeout.is_some() {
            self.timeout = timeout;
        }
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Build and freeze the graph for `input` (a directory or a `.json` description)
    pub async fn build_graph(&self, input: &Path) -> Result<Arc<Graph>, AnalysisError> {
        run_with_timeout(self.timeout, async { Ok(Arc::new(self.builder.build(input).await?)) }).await
    }

    /// Run the whole pipeline under the configured time limit
    pub async fn analyze(&self, input: &Path) -> Result<Report, AnalysisError> {
        run_with_timeout(self.timeout, self.run(input)).await
    }

    async fn run(&self, input: &Path) -> Result<Report, AnalysisError> {
        tracing::info!(input = %input.display(), "Analyzing");

        let graph = Arc::new(self.builder.build(input).await?);
        let violations = self
            .engine
            .evaluate_parallel(Arc::clone(&graph))
            .await
            .map_err(|e| AnalysisError::TaskFailed(e.to_string()))?;

        let digest = graph.digest().map_err(|e| AnalysisError::Digest(e.to_string()))?;
        let report = Report::from_violations(input.display().to_string(), violations).with_graph_stats(
            graph.package_count(),
            graph.edges().len(),
            self.engine.rule_count(),
            digest,
        );

        tracing::info!(
            errors = report.summary.errors,
            warnings = report.summary.warnings,
            "Analysis complete"
        );

        Ok(report)
    }
}

/// Await `fut`, giving up after `limit`
pub(crate) async fn run_with_timeout<T, F>(limit: Option<Duration>, fut: F) -> Result<T, AnalysisError>
where
    F: Future<Output = Result<T, AnalysisError>>,
{
    match limit {
        None => fut.await,
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(limit_secs = limit.as_secs_f64(), "Analysis timed out");
                Err(AnalysisError::Timeout { limit })
            }
        },
    }
}
