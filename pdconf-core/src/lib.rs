//! pdconf core library: section schemas, typed sections, the cross-section
//! index, and YAML loading.
//!
//! - [`schema`] — option declarations and the coercion routine
//! - [`types`] — section kinds and typed records
//! - [`index`] — [`SectionIndex`] resolver
//! - [`loader`] — YAML configuration sources
//! - [`error`] — [`ValidationError`], [`ReferenceError`], [`LoadError`]

pub mod error;
pub mod index;
pub mod loader;
pub mod schema;
pub mod types;

pub use error::{LoadError, ReferenceError, ValidationError};
pub use index::{Lookup, SectionIndex};
pub use schema::{OptionSpec, OptionType, OptionValue, Options};
pub use types::{
    DhcpPool, DnsmasqInstance, DomainOverride, NetworkInterface, RecordedPaths, Section,
    SectionBody, SectionId, SectionKind, StaticHost,
};
