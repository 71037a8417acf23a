//! Error types for pdconf-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while turning raw option values into a typed section.
///
/// These are construction-time failures: a section that fails validation
/// never reaches the compiler.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// No schema is registered for the `(kind, typename)` pair.
    #[error("unknown section type {kind}.{typename}")]
    UnknownSection { kind: String, typename: String },

    /// A required option was not supplied.
    #[error("section {section}: missing required option '{option}'")]
    MissingField { section: String, option: String },

    /// The option name is not part of the section's schema.
    #[error("section {section}: unknown option '{option}'")]
    UnknownOption { section: String, option: String },

    /// The raw value could not be coerced into the declared type.
    #[error("section {section}: option '{option}' expects {expected}, got {found}")]
    InvalidValue {
        section: String,
        option: String,
        expected: &'static str,
        found: String,
    },
}

/// Failures of an "exactly one" lookup in the section index.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("no {kind}.{typename} section named '{name}'")]
    NotFound {
        kind: String,
        typename: String,
        name: String,
    },

    #[error("{count} {kind}.{typename} sections named '{name}', expected exactly one")]
    Ambiguous {
        kind: String,
        typename: String,
        name: String,
        count: usize,
    },
}

/// Errors that can arise while loading sections from configuration files.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Underlying I/O failure, annotated with the offending path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error, with file path and serde_yaml's line context.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A section in the file failed schema validation.
    #[error("invalid section in {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },

    /// The source path does not exist.
    #[error("configuration source not found at {path}")]
    SourceNotFound { path: PathBuf },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> LoadError {
    LoadError::Io {
        path: path.into(),
        source,
    }
}
