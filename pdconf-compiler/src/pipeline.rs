//! Apply/revert entrypoint over a whole load cycle, shared by the CLI and
//! any long-running orchestrator.
//!
//! Each dnsmasq section compiles independently: a failing section is
//! reported in [`Plan::failures`] and contributes no actions, while the
//! others proceed.

use std::collections::HashSet;

use pdconf_core::{SectionId, SectionIndex, SectionKind};

use crate::action::{sort_plan, PlannedAction};
use crate::dnsmasq::DnsmasqCompiler;
use crate::error::CompileError;
use crate::executor::ExecutionReport;

/// Priority-ordered actions for one cycle plus per-section failures.
#[derive(Debug, Default)]
pub struct Plan {
    pub actions: Vec<PlannedAction>,
    pub failures: Vec<(SectionId, CompileError)>,
}

impl Plan {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Apply every dnsmasq instance in `index`, in load order.
pub fn apply_all(compiler: &mut DnsmasqCompiler, index: &SectionIndex) -> Plan {
    let mut plan = Plan::default();
    for section in index.of_kind(SectionKind::Dnsmasq) {
        match compiler.apply(section, index) {
            Ok(actions) => plan.actions.extend(actions),
            Err(e) => {
                tracing::warn!("apply {section} failed: {e}");
                plan.failures.push((section.id.clone(), e));
            }
        }
    }
    sort_plan(&mut plan.actions);
    tracing::info!(
        "apply plan: {} action(s), {} failed section(s)",
        plan.actions.len(),
        plan.failures.len()
    );
    plan
}

/// Plan teardown of every previously applied dnsmasq instance in `index`.
///
/// Sections with no apply record are skipped. Records stay in place until
/// [`commit_revert`] runs after execution.
pub fn revert_all(compiler: &mut DnsmasqCompiler, index: &SectionIndex) -> Plan {
    let mut plan = Plan::default();
    for section in index.of_kind(SectionKind::Dnsmasq) {
        let result = compiler.is_applied(&section.id).and_then(|applied| {
            if applied {
                compiler.revert(section, index)
            } else {
                tracing::debug!("{section} was never applied, skipping");
                Ok(Vec::new())
            }
        });
        match result {
            Ok(actions) => plan.actions.extend(actions),
            Err(e) => {
                tracing::warn!("revert {section} failed: {e}");
                plan.failures.push((section.id.clone(), e));
            }
        }
    }
    sort_plan(&mut plan.actions);
    plan
}

/// Drop the apply record of every section whose teardown actions in `plan`
/// all succeeded according to `report`. Returns the forgotten sections.
///
/// A section with any failed action keeps its record, so the next
/// [`revert_all`] plans its teardown again.
pub fn commit_revert(
    compiler: &mut DnsmasqCompiler,
    plan: &Plan,
    report: &ExecutionReport,
) -> Result<Vec<SectionId>, CompileError> {
    let failed: HashSet<&SectionId> = report.failures.iter().map(|(a, _)| &a.owner).collect();

    let mut forgotten: Vec<SectionId> = Vec::new();
    for action in &plan.actions {
        let owner = &action.owner;
        if failed.contains(owner) || forgotten.contains(owner) {
            continue;
        }
        compiler.forget(owner)?;
        forgotten.push(owner.clone());
    }
    for owner in &failed {
        tracing::warn!("keeping apply record of {owner}: teardown incomplete");
    }
    Ok(forgotten)
}
