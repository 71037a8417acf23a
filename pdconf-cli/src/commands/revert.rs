//! `pdconf revert` — plan teardown from persisted apply records.
//!
//! Without `--execute` nothing changes on disk. With it, a section's apply
//! record is dropped only when every one of its teardown actions succeeded.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use pdconf_compiler::{
    commit_revert, revert_all, settings::DEFAULT_WRITE_DIR, CompilerSettings, DnsmasqCompiler,
};
use pdconf_core::loader;

/// Arguments for `pdconf revert`.
#[derive(Args, Debug)]
pub struct RevertArgs {
    /// YAML file or directory of YAML files.
    pub source: PathBuf,

    /// Root directory used by the matching `pdconf apply`.
    #[arg(long, env = "PDCONF_WRITE_DIR", default_value = DEFAULT_WRITE_DIR)]
    pub write_dir: PathBuf,

    /// Carry out the planned actions after printing them.
    #[arg(long)]
    pub execute: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl RevertArgs {
    pub fn run(self) -> Result<()> {
        let index = loader::load_index(&self.source)
            .with_context(|| format!("failed to load sections from {}", self.source.display()))?;

        let mut compiler = DnsmasqCompiler::new(CompilerSettings::new(&self.write_dir))
            .context("failed to initialise dnsmasq compiler")?;

        let plan = revert_all(&mut compiler, &index);
        super::finish_with("revert", plan, self.execute, self.json, |plan, report| {
            commit_revert(&mut compiler, plan, report)
                .context("failed to drop apply records after teardown")?;
            Ok(())
        })
    }
}
