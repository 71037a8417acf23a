//! # pdconf-compiler
//!
//! Turns a loaded [`SectionIndex`](pdconf_core::SectionIndex) into rendered
//! daemon configuration files and priority-tagged lifecycle actions.
//!
//! Call [`pipeline::apply_all`] / [`pipeline::revert_all`] for a whole load
//! cycle, or [`DnsmasqCompiler::apply`] / [`DnsmasqCompiler::revert`] for a
//! single section. [`executor::run_plan`] is a reference engine for the
//! resulting actions; [`pipeline::commit_revert`] drops apply records once
//! their teardown has run.

pub mod action;
pub mod addr;
pub mod dnsmasq;
pub mod error;
pub mod executor;
pub mod pipeline;
pub mod settings;
pub mod state;
pub mod writer;

pub use action::{Action, PlannedAction, PRIO_START_DAEMON};
pub use dnsmasq::DnsmasqCompiler;
pub use error::{ActionError, CompileError};
pub use executor::{run_plan, ExecutionReport, Executor, SystemExecutor};
pub use pipeline::{apply_all, commit_revert, revert_all, Plan};
pub use settings::CompilerSettings;
pub use state::{StateRecord, StateStore};
