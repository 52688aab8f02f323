//! Status command - Backend mode and cached record counts

use anyhow::{Context, Result};
use clap::Args;

use cybervision_core::config::Config;

use crate::context::AppContext;
use crate::output::{print_table, OutputFormat};

#[derive(Debug, Args)]
pub struct StatusCommand {}

impl StatusCommand {
    pub async fn execute(&self, ctx: &AppContext, config: &Config, format: OutputFormat) -> Result<()> {
        let counts = ctx
            .cache
            .counts()
            .await
            .context("Failed to read cached collections")?;

        if format == OutputFormat::Json {
            let collections: serde_json::Map<String, serde_json::Value> = counts
                .iter()
                .map(|(kind, n)| (kind.collection().to_string(), serde_json::json!(n)))
                .collect();
            ctx.formatter.print_json(&serde_json::json!({
                "online": ctx.online,
                "base_url": config.remote.base_url,
                "cache_path": config.cache.path.display().to_string(),
                "collections": collections,
            }));
            return Ok(());
        }

        if ctx.online {
            ctx.formatter
                .success(&format!("Backend: {}", config.remote.base_url));
        } else {
            ctx.formatter
                .warn("Backend disabled, changes stay in the local cache");
        }
        ctx.formatter
            .info(&format!("Cache: {}", config.cache.path.display()));
        ctx.formatter.info("");

        let rows: Vec<Vec<String>> = counts
            .iter()
            .map(|(kind, n)| vec![kind.title().to_string(), kind.collection().to_string(), n.to_string()])
            .collect();
        print_table(&["Collection", "Stored as", "Records"], &rows);
        Ok(())
    }
}
