//! Reference execution engine for planned actions.
//!
//! [`run_plan`] executes actions in ascending priority order through an
//! [`Executor`]. A failing action is logged and recorded; the remaining
//! actions still run.

use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

use crate::action::{sort_plan, Action, PlannedAction};
use crate::error::ActionError;
use crate::writer::safe_remove;

/// Carries out a single [`Action`].
pub trait Executor {
    fn execute(&mut self, action: &Action) -> Result<(), ActionError>;
}

/// Executes actions against the local system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn execute(&mut self, action: &Action) -> Result<(), ActionError> {
        match action {
            Action::Start { argv } => start(argv),
            Action::KillPidFile { pid_file } => kill_pid_file(pid_file),
            Action::RemoveFile { path } => safe_remove(path).map_err(|source| ActionError::Io {
                path: path.clone(),
                source,
            }),
        }
    }
}

fn start(argv: &[String]) -> Result<(), ActionError> {
    let (program, args) = argv.split_first().ok_or(ActionError::EmptyCommand)?;
    // dnsmasq forks into the background; wait for the foreground parent.
    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|source| ActionError::Spawn {
            program: program.clone(),
            source,
        })?;
    if !status.success() {
        return Err(ActionError::ExitStatus {
            program: program.clone(),
            status,
        });
    }
    Ok(())
}

fn kill_pid_file(pid_file: &Path) -> Result<(), ActionError> {
    let contents = match std::fs::read_to_string(pid_file) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("no pid file at {}, nothing to kill", pid_file.display());
            return Ok(());
        }
        Err(source) => {
            return Err(ActionError::Io {
                path: pid_file.to_path_buf(),
                source,
            })
        }
    };
    let pid = contents
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|pid| *pid > 0)
        .ok_or_else(|| ActionError::InvalidPid {
            path: pid_file.to_path_buf(),
            contents: contents.clone(),
        })?;
    terminate(pid)
}

#[cfg(unix)]
fn terminate(pid: i32) -> Result<(), ActionError> {
    // SAFETY: kill(2) has no memory-safety preconditions.
    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc == 0 {
        return Ok(());
    }
    let source = std::io::Error::last_os_error();
    if source.raw_os_error() == Some(libc::ESRCH) {
        tracing::debug!("process {pid} already exited");
        return Ok(());
    }
    Err(ActionError::Signal { pid, source })
}

#[cfg(not(unix))]
fn terminate(pid: i32) -> Result<(), ActionError> {
    Err(ActionError::Signal {
        pid,
        source: std::io::Error::from(ErrorKind::Unsupported),
    })
}

/// Outcome of [`run_plan`].
#[derive(Debug, Default)]
pub struct ExecutionReport {
    pub executed: usize,
    pub failures: Vec<(PlannedAction, ActionError)>,
}

impl ExecutionReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Execute `plan` in ascending priority order.
pub fn run_plan(plan: &[PlannedAction], executor: &mut dyn Executor) -> ExecutionReport {
    let mut ordered = plan.to_vec();
    sort_plan(&mut ordered);

    let mut report = ExecutionReport::default();
    for planned in ordered {
        match executor.execute(&planned.action) {
            Ok(()) => {
                tracing::debug!("[{}] {}: {}", planned.priority, planned.owner, planned.action);
                report.executed += 1;
            }
            Err(e) => {
                tracing::warn!("[{}] {}: {} failed: {e}", planned.priority, planned.owner, planned.action);
                report.failures.push((planned, e));
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdconf_core::{SectionId, SectionKind};
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<Action>,
    }

    impl Executor for Recorder {
        fn execute(&mut self, action: &Action) -> Result<(), ActionError> {
            self.seen.push(action.clone());
            match action {
                Action::Start { .. } => Err(ActionError::EmptyCommand),
                _ => Ok(()),
            }
        }
    }

    fn owner() -> SectionId {
        SectionId::new(SectionKind::Dnsmasq, "main")
    }

    #[test]
    fn plan_runs_in_priority_order_and_continues_after_failure() {
        let plan = vec![
            PlannedAction::new(60, owner(), Action::Start { argv: vec!["x".into()] }),
            PlannedAction::new(-60, owner(), Action::RemoveFile { path: "a".into() }),
            PlannedAction::new(70, owner(), Action::RemoveFile { path: "b".into() }),
        ];
        let mut recorder = Recorder::default();
        let report = run_plan(&plan, &mut recorder);

        assert_eq!(
            recorder.seen,
            [
                Action::RemoveFile { path: "a".into() },
                Action::Start { argv: vec!["x".into()] },
                Action::RemoveFile { path: "b".into() },
            ]
        );
        assert_eq!(report.executed, 2);
        assert_eq!(report.failures.len(), 1);
        assert!(!report.is_success());
    }

    #[test]
    fn kill_without_pid_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let action = Action::KillPidFile { pid_file: dir.path().join("dnsmasq-main.pid") };
        SystemExecutor.execute(&action).unwrap();
    }

    #[test]
    fn garbage_pid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let pid_file = dir.path().join("dnsmasq-main.pid");
        std::fs::write(&pid_file, "not a pid\n").unwrap();
        let err = SystemExecutor
            .execute(&Action::KillPidFile { pid_file })
            .unwrap_err();
        assert!(matches!(err, ActionError::InvalidPid { .. }));
    }

    #[test]
    fn remove_of_absent_file_succeeds() {
        let dir = TempDir::new().unwrap();
        let action = Action::RemoveFile { path: dir.path().join("gone") };
        SystemExecutor.execute(&action).unwrap();
    }

    #[test]
    fn empty_start_command_is_rejected() {
        let err = SystemExecutor.execute(&Action::Start { argv: vec![] }).unwrap_err();
        assert!(matches!(err, ActionError::EmptyCommand));
    }
}
