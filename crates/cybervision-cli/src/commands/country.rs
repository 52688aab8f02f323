//! Country command - Manage the countries the holding operates in
//!
//! Deleting a country with companies needs a policy: `--cascade` retires
//! the companies, `--reassign <ID>` moves them to another country. Without
//! a flag the configured preset applies.

use anyhow::Result;
use clap::Subcommand;

use cybervision_core::domain::{Country, CountryId};
use cybervision_core::SyncError;
use cybervision_integrity::DeletePolicy;

use super::{explain_refusal, print_deletion, print_list, print_saved};
use crate::context::AppContext;
use crate::output::{or_dash, print_table, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum CountryCommand {
    /// List cached countries
    List,
    /// Register a country
    Add {
        name: String,
        #[arg(long, default_value = "")]
        capital: String,
        /// Gross domestic product
        #[arg(long, default_value_t = 0.0)]
        gdp: f64,
        #[arg(long, default_value_t = 0)]
        population: u64,
    },
    /// Change an existing country
    Edit {
        id: CountryId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        capital: Option<String>,
        #[arg(long)]
        gdp: Option<f64>,
        #[arg(long)]
        population: Option<u64>,
    },
    /// Delete a country
    Delete {
        id: CountryId,
        /// Retire the country's companies
        #[arg(long, conflicts_with = "reassign")]
        cascade: bool,
        /// Move the country's companies to another country
        #[arg(long, value_name = "ID")]
        reassign: Option<CountryId>,
    },
}

impl CountryCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        match self {
            CountryCommand::List => self.execute_list(ctx, format).await,
            CountryCommand::Add {
                name,
                capital,
                gdp,
                population,
            } => {
                let country = Country::new(name.as_str(), capital.as_str(), *gdp, *population);
                let saved = ctx.reconciler.save(None, country).await?;
                print_saved(ctx, format, &saved)
            }
            CountryCommand::Edit {
                id,
                name,
                capital,
                gdp,
                population,
            } => {
                let mut country: Country = ctx.reconciler.get(id).await?;
                if let Some(name) = name {
                    country.name = name.clone();
                }
                if let Some(capital) = capital {
                    country.capital = capital.clone();
                }
                if let Some(gdp) = gdp {
                    country.gdp = *gdp;
                }
                if let Some(population) = population {
                    country.population = *population;
                }
                let saved = ctx.reconciler.save(Some(*id), country).await?;
                print_saved(ctx, format, &saved)
            }
            CountryCommand::Delete {
                id,
                cascade,
                reassign,
            } => {
                let policy = ctx
                    .country_policy
                    .resolve(delete_policy(*cascade, *reassign));
                match ctx.integrity.delete_country(*id, policy).await {
                    Ok(report) => print_deletion(ctx, format, &report),
                    Err(err @ SyncError::IntegrityViolation { .. }) => {
                        let plan = ctx.integrity.plan_country_deletion(*id).await?;
                        explain_refusal(ctx, format, &plan)?;
                        Err(err.into())
                    }
                    Err(err) => Err(err.into()),
                }
            }
        }
    }

    async fn execute_list(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let countries: Vec<Country> = ctx.reconciler.list().await?;

        if format == OutputFormat::Json {
            return print_list(ctx, &countries);
        }
        if countries.is_empty() {
            ctx.formatter.success("No countries cached");
            return Ok(());
        }

        let rows: Vec<Vec<String>> = countries
            .iter()
            .map(|c| {
                vec![
                    or_dash(c.id),
                    c.name.clone(),
                    c.capital.clone(),
                    format!("{:.2}", c.gdp),
                    c.population.to_string(),
                ]
            })
            .collect();
        print_table(&["ID", "Name", "Capital", "GDP", "Population"], &rows);
        Ok(())
    }
}

/// Builds the explicit policy chosen on the command line, if any
pub(crate) fn delete_policy<K>(cascade: bool, reassign: Option<K>) -> Option<DeletePolicy<K>> {
    match (cascade, reassign) {
        (_, Some(dest)) => Some(DeletePolicy::Reassign(dest)),
        (true, None) => Some(DeletePolicy::Cascade),
        (false, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_policy_from_flags() {
        assert_eq!(delete_policy::<CountryId>(false, None), None);
        assert_eq!(
            delete_policy::<CountryId>(true, None),
            Some(DeletePolicy::Cascade)
        );
        assert_eq!(
            delete_policy(false, Some(CountryId::new(2))),
            Some(DeletePolicy::Reassign(CountryId::new(2)))
        );
    }
}
