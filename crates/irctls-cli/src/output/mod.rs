//! Terminal rendering of certificate chains.

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

use irctls_core::{Problem, Verdict};
use irctls_trust::{ChainEntry, DisplayModel, InfoGroup};

/// Available output formats.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable, colored
    #[default]
    Pretty,
    /// JSON document on stdout
    Json,
}

/// Everything known about a chain, in serializable form.
#[derive(Debug, Serialize)]
pub struct ChainReport {
    pub server: String,
    pub chain: Vec<ChainEntry>,
    pub problems: Vec<Problem>,
    pub summary: Vec<Verdict>,
    pub details: Vec<Vec<InfoGroup>>,
}

impl ChainReport {
    pub fn from_model(model: &DisplayModel<'_>) -> Self {
        let chain = model.chain_entries();
        let details = (0..chain.len())
            .filter_map(|i| model.certificate_info(i))
            .collect();

        Self {
            server: model.server_name().to_string(),
            chain,
            problems: model.problems().to_vec(),
            summary: model.summary(),
            details,
        }
    }
}

pub fn print_chain(entries: &[ChainEntry]) {
    println!("{}", "Certificate chain:".bold());
    for (index, entry) in entries.iter().enumerate() {
        let trust = if entry.trusted {
            format!("{}", entry.trust).green()
        } else {
            format!("{}", entry.trust).yellow()
        };
        let name = if entry.invalid {
            entry.name.red().bold()
        } else {
            entry.name.normal()
        };
        println!("  [{index}] {name}  ({trust})");
    }
}

pub fn print_summary(summary: &[Verdict]) {
    println!("{}", "Summary:".bold());
    for verdict in summary {
        if verdict.good {
            println!("  {} {}", "ok".green().bold(), verdict.label);
        } else {
            println!("  {} {}", "!!".red().bold(), verdict.label);
        }
    }
}

pub fn print_details(index: usize, groups: &[InfoGroup]) {
    println!("{}", format!("Certificate [{index}]").bold());
    for group in groups {
        println!("  {}", group.title.cyan());
        for item in &group.items {
            let value = if item.missing {
                item.value.dimmed()
            } else if item.invalid {
                item.value.red()
            } else {
                item.value.normal()
            };
            println!("    {:<22} {value}", format!("{}:", item.title));
        }
    }
}

pub fn print_report(report: &ChainReport, all_details: bool) {
    println!("{} {}", "Server:".bold(), report.server);
    println!();
    print_chain(&report.chain);
    println!();
    if !report.problems.is_empty() {
        print_summary(&report.summary);
        println!();
    }

    let shown = if all_details { report.details.len() } else { 1 };
    for (index, groups) in report.details.iter().enumerate().take(shown) {
        print_details(index, groups);
        println!();
    }
}
