//! # pdconf-renderer
//!
//! Tera-based rendering of dnsmasq configuration files.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pdconf_renderer::{DnsmasqContext, Renderer};
//!
//! fn render(ctx: &DnsmasqContext) {
//!     if let Ok(renderer) = Renderer::new() {
//!         if let Ok(text) = renderer.render(ctx) {
//!             print!("{text}");
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::{DnsmasqContext, DomainCtx, InterfaceCtx, RangeCtx};
pub use engine::{Renderer, DNSMASQ_TEMPLATE};
pub use error::RenderError;
