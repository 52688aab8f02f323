//! Report command - Holding-wide totals and ratios from the local cache

use anyhow::Result;
use clap::Args;
use tracing::info;

use cybervision_core::usecases::HoldingReport;

use crate::context::AppContext;
use crate::output::{or_dash, print_table, OutputFormat};

#[derive(Debug, Args)]
pub struct ReportCommand {
    /// Also list sellers per company
    #[arg(long)]
    pub sellers: bool,
}

impl ReportCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let report = ctx.report.report().await?;
        info!(
            companies = report.totals.companies,
            sellers = report.totals.sellers,
            "Report computed"
        );

        if format == OutputFormat::Json {
            ctx.formatter.print_json(&report_json(&report)?);
            return Ok(());
        }

        let t = &report.totals;
        ctx.formatter.success("Holding report");
        ctx.formatter.info("");
        ctx.formatter.info(&format!(
            "{:<24} {} ({} active)",
            "Companies:", t.companies, t.active_companies
        ));
        ctx.formatter.info(&format!(
            "{:<24} {} ({} with operations)",
            "Countries:",
            t.countries,
            report.countries_with_operations()
        ));
        ctx.formatter.info(&format!("{:<24} {}", "Sellers:", t.sellers));
        ctx.formatter.info(&format!("{:<24} {}", "Advisors:", t.advisors));
        ctx.formatter.info(&format!("{:<24} {}", "Recruitments:", t.recruitments));
        ctx.formatter.info(&format!("{:<24} {}", "Advisories open:", t.active_advisories));
        ctx.formatter.info(&format!("{:<24} {}", "Market areas:", t.market_areas));
        ctx.formatter.info(&format!("{:<24} {:.2}", "Total revenue:", t.total_revenue));
        ctx.formatter.info(&format!("{:<24} {}", "Deepest seller level:", report.max_seller_level));
        ctx.formatter.info("");
        ctx.formatter.info(&format!(
            "{:<24} {:.2}",
            "Sellers per company:",
            report.avg_sellers_per_company()
        ));
        ctx.formatter.info(&format!(
            "{:<24} {:.2}",
            "Advisors per company:",
            report.avg_advisors_per_company()
        ));
        ctx.formatter.info(&format!(
            "{:<24} {:.2}",
            "Revenue per company:",
            report.avg_revenue_per_company()
        ));

        if !report.companies_by_country.is_empty() {
            println!();
            let rows: Vec<Vec<String>> = report
                .companies_by_country
                .iter()
                .map(|c| vec![or_dash(c.country), c.name.clone(), c.companies.to_string()])
                .collect();
            print_table(&["Country", "Name", "Companies"], &rows);
        }

        if self.sellers && !report.sellers_by_company.is_empty() {
            println!();
            let rows: Vec<Vec<String>> = report
                .sellers_by_company
                .iter()
                .map(|c| vec![c.company.to_string(), c.name.clone(), c.sellers.to_string()])
                .collect();
            print_table(&["Company", "Name", "Sellers"], &rows);
        }
        Ok(())
    }
}

fn report_json(report: &HoldingReport) -> Result<serde_json::Value> {
    let mut json = serde_json::to_value(report)?;
    json["ratios"] = serde_json::json!({
        "sellers_per_company": report.avg_sellers_per_company(),
        "advisors_per_company": report.avg_advisors_per_company(),
        "revenue_per_company": report.avg_revenue_per_company(),
        "countries_with_operations": report.countries_with_operations(),
    });
    Ok(json)
}
