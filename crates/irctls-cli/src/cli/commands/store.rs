//! `irctls store` - show the trust anchors.

use anyhow::Result;
use colored::Colorize;

use irctls_trust::TrustStore;

use super::Context;
use crate::cli::args::StoreArgs;
use crate::output::OutputFormat;

pub fn execute(ctx: &Context, args: &StoreArgs) -> Result<()> {
    let source = match &args.anchors.ca_file {
        Some(path) => Some(path.clone()),
        None => TrustStore::locate_bundle(),
    };
    let store = args.anchors.trust_store()?;

    match ctx.output_format {
        OutputFormat::Json => {
            let certificates: Vec<_> = store
                .iter()
                .map(|c| {
                    serde_json::json!({
                        "name": c.display_name(),
                        "fingerprint": c.fingerprint(),
                        "not_after": c.not_after(),
                    })
                })
                .collect();
            let document = serde_json::json!({
                "bundle": source,
                "count": store.len(),
                "certificates": if args.list { certificates } else { Vec::new() },
            });
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
        OutputFormat::Pretty => {
            let bundle = source.map_or_else(
                || "(none found)".dimmed().to_string(),
                |p| p.display().to_string(),
            );
            println!("{} {bundle}", "Bundle:".bold());
            println!("{} {}", "Certificates:".bold(), store.len());

            if args.list {
                println!();
                for cert in store.iter() {
                    println!("  {}", cert.display_name());
                    if ctx.verbose {
                        println!("    {}", cert.fingerprint().dimmed());
                    }
                }
            }
        }
    }
    Ok(())
}
