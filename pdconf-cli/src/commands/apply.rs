//! `pdconf apply` — render configs, persist state and plan daemon starts.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use pdconf_compiler::{
    apply_all,
    settings::{DEFAULT_DNSMASQ_BIN, DEFAULT_WRITE_DIR},
    CompilerSettings, DnsmasqCompiler,
};
use pdconf_core::loader;

/// Arguments for `pdconf apply`.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// YAML file or directory of YAML files.
    pub source: PathBuf,

    /// Root directory for generated configs, leases, pid files and state.
    #[arg(long, env = "PDCONF_WRITE_DIR", default_value = DEFAULT_WRITE_DIR)]
    pub write_dir: PathBuf,

    /// dnsmasq binary used in start actions.
    #[arg(long, default_value = DEFAULT_DNSMASQ_BIN)]
    pub dnsmasq_bin: String,

    /// Directory holding a `dnsmasq.conf.tera` override.
    #[arg(long)]
    pub template_dir: Option<PathBuf>,

    /// Carry out the planned actions after printing them.
    #[arg(long)]
    pub execute: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl ApplyArgs {
    pub fn run(self) -> Result<()> {
        let index = loader::load_index(&self.source)
            .with_context(|| format!("failed to load sections from {}", self.source.display()))?;

        let mut settings =
            CompilerSettings::new(&self.write_dir).with_dnsmasq_bin(self.dnsmasq_bin);
        if let Some(dir) = self.template_dir {
            settings = settings.with_template_dir(dir);
        }
        let mut compiler =
            DnsmasqCompiler::new(settings).context("failed to initialise dnsmasq compiler")?;

        let plan = apply_all(&mut compiler, &index);
        super::finish("apply", plan, self.execute, self.json)
    }
}
