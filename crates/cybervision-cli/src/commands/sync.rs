//! Sync command - Reload every collection from the backend into the cache

use anyhow::Result;
use clap::Args;

use cybervision_core::usecases::FetchSource;

use crate::context::AppContext;
use crate::output::{print_table, OutputFormat};

#[derive(Debug, Args)]
pub struct SyncCommand {}

impl SyncCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let summary = ctx.reconciler.refresh_all().await?;

        if format == OutputFormat::Json {
            ctx.formatter.print_json(&serde_json::to_value(&summary)?);
            return Ok(());
        }

        let rows: Vec<Vec<String>> = summary
            .iter()
            .map(|s| {
                let source = match s.source {
                    FetchSource::Remote => "backend",
                    FetchSource::Cache => "cache",
                };
                vec![s.kind.title().to_string(), s.count.to_string(), source.to_string()]
            })
            .collect();
        print_table(&["Collection", "Records", "Source"], &rows);
        Ok(())
    }
}
