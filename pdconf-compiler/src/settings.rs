//! Runtime settings shared by the compilers.

use std::path::{Path, PathBuf};

/// Default root for generated files, state records and pid files.
pub const DEFAULT_WRITE_DIR: &str = "/tmp/paradrop-router";

/// Default daemon binary, resolved through `PATH`.
pub const DEFAULT_DNSMASQ_BIN: &str = "dnsmasq";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerSettings {
    /// Writable root under which every generated path is namespaced.
    pub write_dir: PathBuf,
    pub dnsmasq_bin: String,
    /// Optional directory holding a `dnsmasq.conf.tera` override.
    pub template_dir: Option<PathBuf>,
}

impl CompilerSettings {
    pub fn new(write_dir: impl Into<PathBuf>) -> Self {
        Self {
            write_dir: write_dir.into(),
            dnsmasq_bin: DEFAULT_DNSMASQ_BIN.to_string(),
            template_dir: None,
        }
    }

    pub fn with_dnsmasq_bin(mut self, bin: impl Into<String>) -> Self {
        self.dnsmasq_bin = bin.into();
        self
    }

    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = Some(dir.into());
        self
    }

    /// `<write_dir>/<file_name>`
    pub fn path(&self, file_name: &str) -> PathBuf {
        self.write_dir.join(file_name)
    }

    pub fn state_dir(&self) -> PathBuf {
        self.write_dir.join("state")
    }

    pub fn write_dir(&self) -> &Path {
        &self.write_dir
    }
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self::new(DEFAULT_WRITE_DIR)
    }
}
