//! Seller command - Manage sellers and their recruitment tree

use anyhow::Result;
use chrono::{NaiveDate, TimeZone, Utc};
use clap::Subcommand;

use cybervision_core::domain::{CompanyId, Seller, SellerCode};

use super::{print_list, print_saved};
use crate::context::AppContext;
use crate::output::{or_dash, print_table, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum SellerCommand {
    /// List cached sellers
    List {
        /// Only sellers of this company
        #[arg(long)]
        company: Option<CompanyId>,
    },
    /// Register a seller
    Add {
        name: String,
        #[arg(long)]
        company: CompanyId,
        #[arg(long, default_value = "")]
        address: String,
        /// Seller who brought this one in
        #[arg(long)]
        recruiter: Option<SellerCode>,
    },
    /// Record that one seller recruited another
    Recruit {
        recruiter: SellerCode,
        recruit: SellerCode,
        /// Company the recruitment counts for (defaults to the recruiter's)
        #[arg(long)]
        company: Option<CompanyId>,
        /// Recruitment date, YYYY-MM-DD (defaults to now)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

impl SellerCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        match self {
            SellerCommand::List { company } => self.execute_list(ctx, *company, format).await,
            SellerCommand::Add {
                name,
                company,
                address,
                recruiter,
            } => {
                let mut seller = Seller::new(name.as_str(), *company);
                seller.address = address.clone();
                if let Some(recruiter) = recruiter {
                    seller = seller.recruited_by(recruiter.clone());
                }
                let saved = ctx.reconciler.save(None, seller).await?;
                print_saved(ctx, format, &saved)
            }
            SellerCommand::Recruit {
                recruiter,
                recruit,
                company,
                date,
            } => {
                let date = date
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|dt| Utc.from_utc_datetime(&dt));
                let outcome = ctx
                    .recruitment
                    .record_recruitment(recruiter.clone(), recruit.clone(), *company, date)
                    .await?;

                if format == OutputFormat::Json {
                    ctx.formatter.print_json(&serde_json::json!({
                        "recruitment": outcome.recruitment.key,
                        "recruit": outcome.recruit.key,
                        "level": outcome.recruit.entity.level,
                        "relevelled": outcome.relevelled,
                        "persistence": outcome.persistence,
                    }));
                } else {
                    ctx.formatter.info(&format!(
                        "{} is now level {}",
                        outcome.recruit.key, outcome.recruit.entity.level
                    ));
                    if !outcome.relevelled.is_empty() {
                        let codes: Vec<String> =
                            outcome.relevelled.iter().map(|c| c.to_string()).collect();
                        ctx.formatter
                            .info(&format!("Downline levels updated: {}", codes.join(", ")));
                    }
                }
                Ok(())
            }
        }
    }

    async fn execute_list(
        &self,
        ctx: &AppContext,
        company: Option<CompanyId>,
        format: OutputFormat,
    ) -> Result<()> {
        let mut sellers: Vec<Seller> = ctx
            .reconciler
            .list::<Seller>()
            .await?
            .into_iter()
            .filter(|s| company.map_or(true, |c| s.company == c))
            .collect();
        sellers.sort_by_key(|s| s.level);

        if format == OutputFormat::Json {
            return print_list(ctx, &sellers);
        }
        if sellers.is_empty() {
            ctx.formatter.success("No sellers cached");
            return Ok(());
        }

        let rows: Vec<Vec<String>> = sellers
            .iter()
            .map(|s| {
                vec![
                    or_dash(s.code.as_ref()),
                    s.name.clone(),
                    s.company.to_string(),
                    or_dash(s.recruiter.as_ref()),
                    s.level.to_string(),
                    s.status.to_string(),
                ]
            })
            .collect();
        print_table(&["Code", "Name", "Company", "Recruiter", "Level", "Status"], &rows);
        Ok(())
    }
}
