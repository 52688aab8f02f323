//! Advisor command - Manage advisors and the companies they serve

use anyhow::Result;
use clap::Subcommand;

use cybervision_core::domain::{Advisor, AdvisorCode, CompanyId};

use super::{print_deletion, print_list, print_saved};
use crate::context::AppContext;
use crate::output::{or_dash, print_table, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum AdvisorCommand {
    /// List cached advisors
    List,
    /// Register an advisor
    Add {
        name: String,
        #[arg(long, default_value = "")]
        degree: String,
        /// Areas of expertise, comma separated (at least one)
        #[arg(long, value_delimiter = ',')]
        areas: Vec<String>,
        /// Companies the advisor works with
        #[arg(long = "company", value_name = "ID")]
        companies: Vec<CompanyId>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Delete an advisor with no advisory in progress
    Delete { code: AdvisorCode },
}

impl AdvisorCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        match self {
            AdvisorCommand::List => self.execute_list(ctx, format).await,
            AdvisorCommand::Add {
                name,
                degree,
                areas,
                companies,
                email,
                phone,
            } => {
                let areas: Vec<&str> = areas.iter().map(String::as_str).collect();
                let mut advisor = Advisor::new(name.as_str(), degree.as_str(), &areas);
                advisor.companies.extend(companies.iter().copied());
                advisor.email = email.clone();
                advisor.phone = phone.clone();
                let saved = ctx.reconciler.save(None, advisor).await?;
                print_saved(ctx, format, &saved)
            }
            AdvisorCommand::Delete { code } => {
                let report = ctx.integrity.delete_advisor(code).await?;
                print_deletion(ctx, format, &report)
            }
        }
    }

    async fn execute_list(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let advisors: Vec<Advisor> = ctx.reconciler.list().await?;

        if format == OutputFormat::Json {
            return print_list(ctx, &advisors);
        }
        if advisors.is_empty() {
            ctx.formatter.success("No advisors cached");
            return Ok(());
        }

        let rows: Vec<Vec<String>> = advisors
            .iter()
            .map(|a| {
                let companies: Vec<String> = a.companies.iter().map(|c| c.to_string()).collect();
                vec![
                    or_dash(a.code.as_ref()),
                    a.name.clone(),
                    a.areas_expertise.join(", "),
                    companies.join(", "),
                    a.status.to_string(),
                ]
            })
            .collect();
        print_table(&["Code", "Name", "Expertise", "Companies", "Status"], &rows);
        Ok(())
    }
}
