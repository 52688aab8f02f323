//! Config command - View and validate CyberVision configuration
//!
//! Provides the `cybervision config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON)
//! 2. Validates the configuration file and reports errors

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use cybervision_core::config::Config;

use crate::output::{OutputFormat, OutputFormatter};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Validate configuration file
    Validate,
}

impl ConfigCommand {
    pub async fn execute(
        &self,
        config_path: &Path,
        format: OutputFormat,
        formatter: &dyn OutputFormatter,
    ) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(config_path, format, formatter),
            ConfigCommand::Validate => self.execute_validate(config_path, format, formatter),
        }
    }

    fn execute_show(
        &self,
        config_path: &Path,
        format: OutputFormat,
        formatter: &dyn OutputFormatter,
    ) -> Result<()> {
        let config = Config::load_or_default(config_path);

        info!(config_path = %config_path.display(), "Showing configuration");

        if format == OutputFormat::Json {
            let json = serde_json::to_value(&config)
                .context("Failed to serialize configuration to JSON")?;
            formatter.print_json(&json);
        } else {
            formatter.success(&format!("Configuration ({})", config_path.display()));
            formatter.info("");

            let yaml = serde_yaml::to_string(&config)
                .context("Failed to serialize configuration to YAML")?;
            for line in yaml.lines() {
                formatter.info(line);
            }
        }
        Ok(())
    }

    fn execute_validate(
        &self,
        config_path: &Path,
        format: OutputFormat,
        formatter: &dyn OutputFormatter,
    ) -> Result<()> {
        // Load explicitly so a missing or unparsable file is reported
        let config = match Config::load(config_path) {
            Ok(config) => config,
            Err(e) => {
                if format == OutputFormat::Json {
                    formatter.print_json(&serde_json::json!({
                        "valid": false,
                        "config_path": config_path.display().to_string(),
                        "errors": [format!("{:#}", e)],
                    }));
                } else {
                    formatter.error(&format!(
                        "Cannot load {}: {:#}",
                        config_path.display(),
                        e
                    ));
                }
                return Ok(());
            }
        };

        let errors = config.validate();
        if format == OutputFormat::Json {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            formatter.print_json(&serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": config_path.display().to_string(),
                "errors": messages,
            }));
        } else if errors.is_empty() {
            formatter.success(&format!("{} is valid", config_path.display()));
        } else {
            formatter.error(&format!(
                "{} has {} problem{}",
                config_path.display(),
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            ));
            for error in &errors {
                formatter.info(&error.to_string());
            }
        }
        Ok(())
    }
}
