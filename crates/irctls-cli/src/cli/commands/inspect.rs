//! `irctls inspect` - print a chain without deciding anything.

use anyhow::Result;
use std::sync::Arc;

use irctls_core::SslSettings;
use irctls_trust::CertificateManager;

use super::{load_chain, Context};
use crate::cli::args::InspectArgs;
use crate::output::{self, ChainReport, OutputFormat};

pub fn execute(ctx: &Context, args: InspectArgs) -> Result<()> {
    let chain = load_chain(&args.chain)?;
    let host = args
        .host
        .unwrap_or_else(|| chain[0].display_name().to_string());

    // With every check disabled the chain is recorded without blocking.
    let manager = CertificateManager::new(
        host,
        ctx.config_store()?,
        Arc::new(args.anchors.trust_store()?),
    )
    .with_settings(SslSettings::permissive());
    manager
        .check_server_trusted(chain)
        .map_err(|rejected| anyhow::anyhow!("unexpected rejection: {}", rejected.reason))?;

    let report = ChainReport::from_model(&manager.display_model());
    match ctx.output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Pretty => output::print_report(&report, true),
    }
    Ok(())
}
