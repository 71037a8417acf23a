pub mod apply;
pub mod revert;
pub mod sections;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use pdconf_compiler::{run_plan, ExecutionReport, Plan, PlannedAction, SystemExecutor};

#[derive(Serialize)]
struct PlanJson<'a> {
    operation: &'static str,
    actions: &'a [PlannedAction],
    failures: Vec<FailureJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    execution: Option<ExecutionJson>,
}

#[derive(Serialize)]
struct FailureJson {
    section: String,
    error: String,
}

#[derive(Serialize)]
struct ExecutionJson {
    executed: usize,
    failures: Vec<FailureJson>,
}

#[derive(Tabled)]
struct ActionRow {
    #[tabled(rename = "priority")]
    priority: i32,
    #[tabled(rename = "section")]
    section: String,
    #[tabled(rename = "action")]
    action: String,
}

/// Print `plan`, optionally run it, and fail if any section or action failed.
pub(crate) fn finish(operation: &'static str, plan: Plan, execute: bool, json: bool) -> Result<()> {
    finish_with(operation, plan, execute, json, |_, _| Ok(()))
}

/// [`finish`], calling `after_execute` once the plan has been run.
pub(crate) fn finish_with(
    operation: &'static str,
    plan: Plan,
    execute: bool,
    json: bool,
    after_execute: impl FnOnce(&Plan, &ExecutionReport) -> Result<()>,
) -> Result<()> {
    let report = execute.then(|| run_plan(&plan.actions, &mut SystemExecutor));
    if let Some(report) = report.as_ref() {
        after_execute(&plan, report)?;
    }

    if json {
        print_json(operation, &plan, report.as_ref())?;
    } else {
        print_table(operation, &plan, report.as_ref());
    }

    let failed_actions = report.as_ref().map_or(0, |r| r.failures.len());
    if !plan.is_success() || failed_actions > 0 {
        bail!(
            "{operation} finished with {} failed section(s) and {failed_actions} failed action(s)",
            plan.failures.len()
        );
    }
    Ok(())
}

fn print_json(operation: &'static str, plan: &Plan, report: Option<&ExecutionReport>) -> Result<()> {
    let payload = PlanJson {
        operation,
        actions: &plan.actions,
        failures: plan
            .failures
            .iter()
            .map(|(id, e)| FailureJson {
                section: id.to_string(),
                error: e.to_string(),
            })
            .collect(),
        execution: report.map(|r| ExecutionJson {
            executed: r.executed,
            failures: r
                .failures
                .iter()
                .map(|(planned, e)| FailureJson {
                    section: planned.owner.to_string(),
                    error: format!("{}: {e}", planned.action),
                })
                .collect(),
        }),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize plan JSON")?
    );
    Ok(())
}

fn print_table(operation: &str, plan: &Plan, report: Option<&ExecutionReport>) {
    println!(
        "pdconf v{} | {operation} | {} action(s) | {} failed section(s)",
        env!("CARGO_PKG_VERSION"),
        plan.actions.len(),
        plan.failures.len(),
    );

    if plan.actions.is_empty() {
        println!("Nothing to do.");
    } else {
        let rows: Vec<ActionRow> = plan
            .actions
            .iter()
            .map(|a| ActionRow {
                priority: a.priority,
                section: a.owner.to_string(),
                action: a.action.to_string(),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    for (id, e) in &plan.failures {
        println!("{} {id}: {e}", "✗".red().bold());
    }

    if let Some(report) = report {
        println!("{} executed {} action(s)", "✓".green().bold(), report.executed);
        for (planned, e) in &report.failures {
            println!("{} {}: {} failed: {e}", "✗".red().bold(), planned.owner, planned.action);
        }
    } else if !plan.actions.is_empty() {
        println!("Re-run with --execute to carry out these actions.");
    }
}
