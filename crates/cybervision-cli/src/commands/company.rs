//! Company command - Manage holding companies

use anyhow::Result;
use clap::Subcommand;

use cybervision_core::domain::{Company, CompanyId, CountryId, MarketAreaId};
use cybervision_core::SyncError;

use super::country::delete_policy;
use super::{explain_refusal, print_deletion, print_list, print_saved};
use crate::context::AppContext;
use crate::output::{or_dash, print_table, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum CompanyCommand {
    /// List cached companies
    List {
        /// Only companies in this country
        #[arg(long)]
        country: Option<CountryId>,
    },
    /// Register a company
    Add {
        name: String,
        #[arg(long)]
        country: CountryId,
        #[arg(long, default_value = "")]
        city: String,
        #[arg(long)]
        market_area: Option<MarketAreaId>,
        #[arg(long, default_value_t = 0.0)]
        revenue: f64,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Delete a company
    Delete {
        id: CompanyId,
        /// Deactivate the company's sellers
        #[arg(long, conflicts_with = "reassign")]
        cascade: bool,
        /// Move the company's active sellers to another company
        #[arg(long, value_name = "ID")]
        reassign: Option<CompanyId>,
    },
}

impl CompanyCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        match self {
            CompanyCommand::List { country } => self.execute_list(ctx, *country, format).await,
            CompanyCommand::Add {
                name,
                country,
                city,
                market_area,
                revenue,
                description,
            } => {
                let mut company = Company::new(name.as_str(), *country, city.as_str()).with_revenue(*revenue);
                if let Some(area) = market_area {
                    company = company.with_market_area(*area);
                }
                company.description = description.clone();
                let saved = ctx.reconciler.save(None, company).await?;
                print_saved(ctx, format, &saved)
            }
            CompanyCommand::Delete {
                id,
                cascade,
                reassign,
            } => match ctx
                .integrity
                .delete_company(*id, delete_policy(*cascade, *reassign))
                .await
            {
                Ok(report) => print_deletion(ctx, format, &report),
                Err(err @ SyncError::IntegrityViolation { .. }) => {
                    let plan = ctx.integrity.plan_company_deletion(*id).await?;
                    explain_refusal(ctx, format, &plan)?;
                    Err(err.into())
                }
                Err(err) => Err(err.into()),
            },
        }
    }

    async fn execute_list(
        &self,
        ctx: &AppContext,
        country: Option<CountryId>,
        format: OutputFormat,
    ) -> Result<()> {
        let companies: Vec<Company> = ctx
            .reconciler
            .list::<Company>()
            .await?
            .into_iter()
            .filter(|c| country.is_none() || c.country == country)
            .collect();

        if format == OutputFormat::Json {
            return print_list(ctx, &companies);
        }
        if companies.is_empty() {
            ctx.formatter.success("No companies cached");
            return Ok(());
        }

        let rows: Vec<Vec<String>> = companies
            .iter()
            .map(|c| {
                vec![
                    or_dash(c.id),
                    c.name.clone(),
                    or_dash(c.country),
                    c.city.clone(),
                    c.status.to_string(),
                    format!("{:.2}", c.revenue),
                ]
            })
            .collect();
        print_table(&["ID", "Name", "Country", "City", "Status", "Revenue"], &rows);
        Ok(())
    }
}
