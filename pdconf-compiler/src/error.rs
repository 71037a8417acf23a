//! Error types for pdconf-compiler.

use std::path::PathBuf;

use thiserror::Error;

use pdconf_core::error::ReferenceError;
use pdconf_renderer::RenderError;

use crate::addr::AddressError;

/// All errors that can abort compiling a single section.
#[derive(Debug, Error)]
pub enum CompileError {
    /// An interface or pool reference did not resolve to exactly one section.
    #[error("reference error: {0}")]
    Reference(#[from] ReferenceError),

    /// An error from the rendering engine.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// Address arithmetic failed for an interface's dhcp-range.
    #[error("interface '{interface}': {source}")]
    Address {
        interface: String,
        #[source]
        source: AddressError,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// State store JSON error.
    #[error("state store JSON error: {0}")]
    State(#[from] serde_json::Error),

    /// Section handed to the wrong compiler.
    #[error("section {section} is not a dnsmasq instance")]
    NotDnsmasq { section: String },

    /// Revert requested for a section with no recorded apply.
    #[error("section {section} has not been applied")]
    NotApplied { section: String },
}

/// Errors raised while executing a planned action.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("start action has an empty command line")]
    EmptyCommand,

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    ExitStatus { program: String, status: std::process::ExitStatus },

    #[error("pid file {path} does not contain a process id: {contents:?}")]
    InvalidPid { path: PathBuf, contents: String },

    #[error("failed to signal process {pid}: {source}")]
    Signal {
        pid: i32,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`CompileError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CompileError {
    CompileError::Io {
        path: path.into(),
        source,
    }
}
