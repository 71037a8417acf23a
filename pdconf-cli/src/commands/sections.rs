//! `pdconf sections` — load, validate and list configuration sections.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use pdconf_core::{loader, OptionValue, Section, SectionIndex};

/// Arguments for `pdconf sections`.
#[derive(Args, Debug)]
pub struct SectionsArgs {
    /// YAML file or directory of YAML files.
    pub source: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl SectionsArgs {
    pub fn run(self) -> Result<()> {
        let index = loader::load_index(&self.source)
            .with_context(|| format!("failed to load sections from {}", self.source.display()))?;

        if self.json {
            print_json(&index)
        } else {
            print_table(&index);
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct SectionJson<'a> {
    kind: &'static str,
    #[serde(rename = "type")]
    typename: &'static str,
    name: &'a str,
    source: &'a str,
    options: BTreeMap<&'a str, &'a OptionValue>,
}

#[derive(Tabled)]
struct SectionRow {
    #[tabled(rename = "section")]
    section: String,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "options")]
    options: String,
    #[tabled(rename = "source")]
    source: String,
}

fn print_json(index: &SectionIndex) -> Result<()> {
    let payload: Vec<SectionJson<'_>> = index
        .sections()
        .iter()
        .map(|s| SectionJson {
            kind: s.kind().kind(),
            typename: s.kind().typename(),
            name: s.name(),
            source: &s.source,
            options: s
                .options
                .iter()
                .filter_map(|(name, value)| value.map(|v| (name, v)))
                .collect(),
        })
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize sections JSON")?
    );
    Ok(())
}

fn print_table(index: &SectionIndex) {
    println!("pdconf v{} | {} sections", env!("CARGO_PKG_VERSION"), index.len());
    if index.is_empty() {
        println!("No sections declared.");
        return;
    }

    let rows: Vec<SectionRow> = index
        .sections()
        .iter()
        .map(|s| SectionRow {
            section: s.kind().to_string().bold().to_string(),
            name: s.name().to_string(),
            options: summarize_options(s),
            source: s.source.clone(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn summarize_options(section: &Section) -> String {
    section
        .options
        .iter()
        .filter_map(|(name, value)| value.map(|v| format!("{name}={v}")))
        .collect::<Vec<_>>()
        .join(" ")
}
