//! Market area command

use anyhow::Result;
use clap::Subcommand;

use cybervision_core::domain::MarketArea;

use super::{print_list, print_saved};
use crate::context::AppContext;
use crate::output::{or_dash, print_table, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum MarketAreaCommand {
    /// List cached market areas
    List,
    /// Register a market area
    Add {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
}

impl MarketAreaCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        match self {
            MarketAreaCommand::List => {
                let areas: Vec<MarketArea> = ctx.reconciler.list().await?;
                if format == OutputFormat::Json {
                    return print_list(ctx, &areas);
                }
                if areas.is_empty() {
                    ctx.formatter.success("No market areas cached");
                    return Ok(());
                }
                let rows: Vec<Vec<String>> = areas
                    .iter()
                    .map(|a| vec![or_dash(a.id), a.name.clone(), a.description.clone()])
                    .collect();
                print_table(&["ID", "Name", "Description"], &rows);
                Ok(())
            }
            MarketAreaCommand::Add { name, description } => {
                let area = MarketArea::new(name.as_str(), description.as_str());
                let saved = ctx.reconciler.save(None, area).await?;
                print_saved(ctx, format, &saved)
            }
        }
    }
}
