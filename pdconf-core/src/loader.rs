//! YAML configuration sources.
//!
//! # File format
//!
//! ```yaml
//! - kind: network
//!   type: interface
//!   name: lan
//!   options:
//!     ifname: eth1
//!     ipaddr: 192.168.1.1
//!     netmask: 255.255.255.0
//! - kind: dhcp
//!   type: dnsmasq
//!   name: main
//! ```
//!
//! A directory source is every `*.yaml` / `*.yml` file directly inside it,
//! loaded in file-name order. Each section's provenance is its file path.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::Mapping;

use crate::error::{io_err, LoadError};
use crate::index::SectionIndex;
use crate::types::Section;

/// One section as written in a YAML file, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSection {
    pub kind: String,
    #[serde(rename = "type")]
    pub typename: String,
    pub name: String,
    #[serde(default)]
    pub options: Mapping,
}

/// Parse and validate every section in one YAML document.
pub fn parse_sections(contents: &str, source: &Path) -> Result<Vec<Section>, LoadError> {
    let raw: Vec<RawSection> = serde_yaml::from_str(contents).map_err(|e| LoadError::Parse {
        path: source.to_path_buf(),
        source: e,
    })?;
    let source_label = source.display().to_string();
    raw.into_iter()
        .map(|r| {
            Section::new(&r.kind, &r.typename, r.name, source_label.clone(), &r.options).map_err(
                |e| LoadError::Invalid {
                    path: source.to_path_buf(),
                    source: e,
                },
            )
        })
        .collect()
}

/// Load the sections declared in a single file.
pub fn load_file(path: &Path) -> Result<Vec<Section>, LoadError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let sections = parse_sections(&contents, path)?;
    tracing::debug!("loaded {} section(s) from {}", sections.len(), path.display());
    Ok(sections)
}

/// Load every YAML file in `dir`, sorted by file name.
pub fn load_dir(dir: &Path) -> Result<Vec<Section>, LoadError> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| io_err(dir, e))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            matches!(
                p.extension().and_then(|s| s.to_str()),
                Some("yaml") | Some("yml")
            )
        })
        .collect();
    files.sort();

    let mut sections = Vec::new();
    for file in files {
        sections.extend(load_file(&file)?);
    }
    Ok(sections)
}

/// Load a file or directory source.
pub fn load_path(path: &Path) -> Result<Vec<Section>, LoadError> {
    if !path.exists() {
        return Err(LoadError::SourceNotFound {
            path: path.to_path_buf(),
        });
    }
    if path.is_dir() {
        load_dir(path)
    } else {
        load_file(path)
    }
}

/// Load a source and build its [`SectionIndex`].
pub fn load_index(path: &Path) -> Result<SectionIndex, LoadError> {
    let sections = load_path(path)?;
    tracing::info!("indexed {} section(s) from {}", sections.len(), path.display());
    Ok(SectionIndex::new(sections))
}
