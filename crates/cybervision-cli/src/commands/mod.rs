//! Subcommands of the `cybervision` binary

pub mod advisor;
pub mod advisory;
pub mod company;
pub mod config;
pub mod country;
pub mod market_area;
pub mod report;
pub mod seller;
pub mod status;
pub mod sync;

use anyhow::Result;
use serde::Serialize;

use cybervision_core::domain::{Entity, EntityKey};
use cybervision_core::usecases::Saved;
use cybervision_integrity::{DeletionPlan, DeletionReport};

use crate::context::AppContext;
use crate::output::OutputFormat;

/// Prints a saved entity as JSON; human output relies on the notifier line
pub(crate) fn print_saved<E: Entity>(ctx: &AppContext, format: OutputFormat, saved: &Saved<E>) -> Result<()> {
    if format == OutputFormat::Json {
        ctx.formatter.print_json(&serde_json::json!({
            "key": saved.key.to_record_key(),
            "persistence": saved.persistence,
            "record": saved.entity.to_record()?,
        }));
    }
    Ok(())
}

/// Prints a list of entities as a JSON array
pub(crate) fn print_list<T: Serialize>(ctx: &AppContext, items: &[T]) -> Result<()> {
    ctx.formatter.print_json(&serde_json::to_value(items)?);
    Ok(())
}

pub(crate) fn print_deletion(ctx: &AppContext, format: OutputFormat, report: &DeletionReport) -> Result<()> {
    if format == OutputFormat::Json {
        ctx.formatter.print_json(&serde_json::to_value(report)?);
        return Ok(());
    }
    if !report.affected.is_empty() {
        let keys: Vec<String> = report.affected.iter().map(|k| k.to_string()).collect();
        ctx.formatter.info(&format!(
            "{} affected: {}",
            report.affected.len(),
            keys.join(", ")
        ));
    }
    if report.retired {
        ctx.formatter.info(&format!(
            "{} is still referenced and was kept as inactive",
            report.name
        ));
    }
    Ok(())
}

/// Explains what the user can do about a refused deletion
pub(crate) fn explain_refusal(ctx: &AppContext, format: OutputFormat, plan: &DeletionPlan) -> Result<()> {
    if format == OutputFormat::Json {
        ctx.formatter.print_json(&serde_json::json!({
            "deleted": false,
            "plan": serde_json::to_value(plan)?,
        }));
        return Ok(());
    }
    let dependents: Vec<String> = plan.dependents.iter().map(|k| k.to_string()).collect();
    ctx.formatter.info(&format!(
        "Dependent {} records: {}",
        plan.dependent_kind,
        dependents.join(", ")
    ));
    if plan.can_reassign() {
        let targets: Vec<String> = plan.targets.iter().map(|k| k.to_string()).collect();
        ctx.formatter.info(&format!(
            "Re-run with --cascade, or --reassign <ID> using one of: {}",
            targets.join(", ")
        ));
    } else {
        ctx.formatter
            .info("Re-run with --cascade; there is nowhere to reassign them");
    }
    Ok(())
}
