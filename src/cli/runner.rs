//! CLI runner - executes commands

use crate::auth::{provider_from_config, CredentialProvider};
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::ExtractConfig;
use crate::engine::{Orchestrator, RunSummary};
use crate::error::Result;
use crate::http::{ReqwestTransport, TransportConfig};
use crate::output::ObjectStoreBlobStore;
use crate::resolve::{dependency_levels, resolve_order};
use crate::state::{BlobWatermarkStore, WatermarkStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
    cancel: CancellationToken,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self {
            cli,
            cancel: CancellationToken::new(),
        }
    }

    /// Cancel extraction when `cancel` fires
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run the CLI command
    ///
    /// Returns `Err` only when the run could not proceed at all. Endpoint
    /// failures are reported in the summary and still return `Ok`.
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Run {
                bucket,
                run_id,
                concurrency,
            } => {
                let mut config = self.load_config()?;
                if let Some(bucket) = bucket {
                    config.bucket.clone_from(bucket);
                }
                if let Some(run_id) = run_id {
                    config.run_id = Some(run_id.clone());
                }
                if let Some(concurrency) = concurrency {
                    config.concurrency = *concurrency;
                }
                config.validate()?;
                self.extract(config).await
            }
            Commands::Plan => self.plan(),
            Commands::State { bucket } => {
                let mut config = self.load_config()?;
                if let Some(bucket) = bucket {
                    config.bucket.clone_from(bucket);
                }
                config.validate()?;
                self.state(&config).await
            }
            Commands::Validate => self.validate(),
        }
    }

    /// Load the config file (or the built-in table), then environment overrides
    fn load_config(&self) -> Result<ExtractConfig> {
        let mut config = match &self.cli.config {
            Some(path) => ExtractConfig::from_file(path)?,
            None => ExtractConfig::builtin(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Full extraction
    async fn extract(&self, config: ExtractConfig) -> Result<()> {
        let transport = ReqwestTransport::new(&TransportConfig::from(&config.http))?;
        let credentials = provider_from_config(&config.credentials);
        let store = ObjectStoreBlobStore::parse(&config.bucket)?;
        info!(
            bucket = %config.bucket,
            endpoints = config.endpoints.len(),
            credentials = %credentials.describe(),
            "Starting extraction run"
        );

        let orchestrator = Orchestrator::new(
            config,
            Arc::new(transport),
            Arc::new(credentials),
            Arc::new(store),
        )
        .with_cancellation(self.cancel.clone());

        let summary = orchestrator.run().await?;
        self.output_summary(&summary);
        Ok(())
    }

    /// Show execution order without any I/O
    fn plan(&self) -> Result<()> {
        let config = self.load_config()?;
        config.validate()?;
        let order = resolve_order(&config.endpoints)?;
        let levels = dependency_levels(&config.endpoints)?;

        match self.cli.format {
            OutputFormat::Json => self.output_message(&json!({
                "order": order,
                "levels": levels,
            })),
            OutputFormat::Text => {
                println!("Execution order: {}", order.join(" → "));
                for (i, level) in levels.iter().enumerate() {
                    println!("  Level {i}: {}", level.join(", "));
                }
            }
        }
        Ok(())
    }

    /// Show stored watermarks
    async fn state(&self, config: &ExtractConfig) -> Result<()> {
        let store = Arc::new(ObjectStoreBlobStore::parse(&config.bucket)?);
        let watermarks = BlobWatermarkStore::new(store, config.source.clone());

        let mut entries = Vec::with_capacity(config.endpoints.len());
        for (name, spec) in &config.endpoints {
            let key = spec.state_key();
            let cursor = watermarks.read(&key, "").await?;
            entries.push((name.clone(), key, cursor));
        }

        match self.cli.format {
            OutputFormat::Json => {
                let value: Vec<Value> = entries
                    .iter()
                    .map(|(name, key, cursor)| {
                        json!({
                            "endpoint": name,
                            "state_key": key,
                            "updated_after": (!cursor.is_empty()).then_some(cursor),
                        })
                    })
                    .collect();
                self.output_message(&Value::Array(value));
            }
            OutputFormat::Text => {
                for (name, key, cursor) in &entries {
                    let cursor = if cursor.is_empty() { "(not set)" } else { cursor.as_str() };
                    println!("{name} [{key}]: {cursor}");
                }
            }
        }
        Ok(())
    }

    /// Validate the run configuration
    fn validate(&self) -> Result<()> {
        let config = self.load_config()?;
        config.validate()?;
        resolve_order(&config.endpoints)?;

        let message = format!(
            "Config for '{}' is valid with {} endpoints",
            config.source,
            config.endpoints.len()
        );
        match self.cli.format {
            OutputFormat::Json => self.output_message(&json!({
                "valid": true,
                "message": message,
            })),
            OutputFormat::Text => println!("{message}"),
        }
        Ok(())
    }

    /// Print the run summary
    fn output_summary(&self, summary: &RunSummary) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(summary).unwrap_or_default());
            }
            OutputFormat::Text => println!("{summary}"),
        }
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        println!("{}", serde_json::to_string(msg).unwrap_or_default());
    }
}
