//! Lifecycle actions and their priority tags.
//!
//! Compilers never perform side effects on processes; they return
//! [`PlannedAction`]s. The execution engine runs apply plans in ascending
//! priority order. Revert actions carry the negated priority of the resource
//! they tear down, so teardown runs in reverse relative to every other
//! subsystem sharing the same scale.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use pdconf_core::types::SectionId;

/// Priority shared by every compiler that starts a daemon process.
pub const PRIO_START_DAEMON: i32 = 60;

/// A side effect to be carried out by the execution engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Run a command line.
    Start { argv: Vec<String> },
    /// Terminate the process whose id is stored in `pid_file`.
    /// A missing pid file means there is nothing to terminate.
    KillPidFile { pid_file: PathBuf },
    /// Remove a file; an already-absent file counts as success.
    RemoveFile { path: PathBuf },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Start { argv } => write!(f, "start {}", argv.join(" ")),
            Action::KillPidFile { pid_file } => write!(f, "kill pid from {}", pid_file.display()),
            Action::RemoveFile { path } => write!(f, "remove {}", path.display()),
        }
    }
}

/// An [`Action`] tagged with its priority and the section that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedAction {
    pub priority: i32,
    pub owner: SectionId,
    pub action: Action,
}

impl PlannedAction {
    pub fn new(priority: i32, owner: SectionId, action: Action) -> Self {
        Self {
            priority,
            owner,
            action,
        }
    }
}

/// Stable sort by ascending priority; ties keep emission order.
pub fn sort_plan(plan: &mut [PlannedAction]) {
    plan.sort_by_key(|a| a.priority);
}
