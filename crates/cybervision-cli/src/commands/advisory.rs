//! Advisory command - Track advisor engagements with companies

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Subcommand, ValueEnum};

use cybervision_core::domain::{
    Advisory, AdvisoryId, AdvisoryStatus, AdvisorCode, CompanyId, EntityKind, MarketAreaId,
};
use cybervision_core::ports::Notification;
use cybervision_core::SyncError;

use super::{print_list, print_saved};
use crate::context::AppContext;
use crate::output::{or_dash, print_table, OutputFormat};

/// Terminal status an advisory can be closed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Closing {
    Completed,
    Cancelled,
}

impl From<Closing> for AdvisoryStatus {
    fn from(closing: Closing) -> Self {
        match closing {
            Closing::Completed => AdvisoryStatus::Completed,
            Closing::Cancelled => AdvisoryStatus::Cancelled,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum AdvisoryCommand {
    /// List cached advisories
    List {
        /// Only advisories still in progress
        #[arg(long)]
        open: bool,
    },
    /// Start an advisory
    Add {
        #[arg(long)]
        advisor: AdvisorCode,
        #[arg(long)]
        company: CompanyId,
        #[arg(long)]
        area: MarketAreaId,
        #[arg(long, default_value = "")]
        description: String,
        /// Start date, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Next meeting, YYYY-MM-DD
        #[arg(long)]
        next_meeting: Option<NaiveDate>,
    },
    /// Close an advisory in progress
    Close {
        id: AdvisoryId,
        #[arg(long, value_enum, default_value_t = Closing::Completed)]
        status: Closing,
        /// Total hours logged on the engagement
        #[arg(long)]
        hours: Option<f64>,
    },
}

impl AdvisoryCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        match self {
            AdvisoryCommand::List { open } => self.execute_list(ctx, *open, format).await,
            AdvisoryCommand::Add {
                advisor,
                company,
                area,
                description,
                start,
                next_meeting,
            } => {
                let mut advisory = Advisory::new(advisor.clone(), *company, *area);
                advisory.description = description.clone();
                if let Some(start) = start {
                    advisory.start_date = *start;
                }
                advisory.next_meeting = *next_meeting;
                let saved = ctx.reconciler.save(None, advisory).await?;
                print_saved(ctx, format, &saved)
            }
            AdvisoryCommand::Close { id, status, hours } => {
                let mut advisory: Advisory = ctx.reconciler.get(id).await?;
                if let Err(err) = advisory.close((*status).into()) {
                    let err = SyncError::from(err);
                    ctx.reconciler
                        .notify(
                            Notification::error("Advisory not closed", err.to_string())
                                .with_kind(EntityKind::Advisory),
                        )
                        .await;
                    return Err(err.into());
                }
                if let Some(hours) = hours {
                    advisory.hours_logged = *hours;
                }
                let saved = ctx.reconciler.save(Some(*id), advisory).await?;
                print_saved(ctx, format, &saved)
            }
        }
    }

    async fn execute_list(&self, ctx: &AppContext, open: bool, format: OutputFormat) -> Result<()> {
        let advisories: Vec<Advisory> = ctx
            .reconciler
            .list::<Advisory>()
            .await?
            .into_iter()
            .filter(|a| !open || a.status.is_in_progress())
            .collect();

        if format == OutputFormat::Json {
            return print_list(ctx, &advisories);
        }
        if advisories.is_empty() {
            ctx.formatter.success("No advisories cached");
            return Ok(());
        }

        let rows: Vec<Vec<String>> = advisories
            .iter()
            .map(|a| {
                vec![
                    or_dash(a.id),
                    a.advisor.to_string(),
                    a.company.to_string(),
                    a.area.to_string(),
                    a.start_date.to_string(),
                    a.status.to_string(),
                    or_dash(a.next_meeting),
                ]
            })
            .collect();
        print_table(
            &["ID", "Advisor", "Company", "Area", "Started", "Status", "Next meeting"],
            &rows,
        );
        Ok(())
    }
}
