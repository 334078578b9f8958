//! `irctls config` - SSL settings management.

use anyhow::Result;
use colored::Colorize;

use irctls_core::{ClientCertSettings, ConfigStore, SslSettings};

use super::Context;
use crate::cli::args::{ConfigArgs, ConfigCommands};
use crate::output::OutputFormat;

pub fn execute(ctx: &Context, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(ctx),
        ConfigCommands::Set { key, value } => set_config(ctx, &key, &value),
        ConfigCommands::Trusted => show_trusted(ctx),
        ConfigCommands::Path => {
            println!("{}", ctx.config_file()?.display());
            Ok(())
        }
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    let settings = ctx.config_store()?.ssl_settings();

    if ctx.output_format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    println!("{}", "SSL settings:".bold());
    println!();
    println!("  {} {}", "checkdate:".bold(), settings.check_date);
    println!("  {} {}", "checkissuer:".bold(), settings.check_issuer);
    println!("  {} {}", "checkhost:".bold(), settings.check_host);
    println!("  {} {}", "trusted:".bold(), settings.trusted.len());
    match &settings.client_cert {
        Some(cert) => {
            println!("  {} {}", "clientcert.file:".bold(), cert.file.display());
            let pass = if cert.pass.is_empty() { "(empty)" } else { "****" };
            println!("  {} {pass}", "clientcert.pass:".bold());
        }
        None => println!("  {} {}", "clientcert:".bold(), "(not set)".dimmed()),
    }
    Ok(())
}

fn set_config(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let store = ctx.config_store()?;
    let mut settings = store.ssl_settings();

    apply_setting(&mut settings, key, value)?;
    store.save_ssl_settings(&settings)?;

    println!("{} {} set to {}.", "Success:".green().bold(), key, value.cyan());
    Ok(())
}

fn apply_setting(settings: &mut SslSettings, key: &str, value: &str) -> Result<()> {
    match key {
        "checkdate" => settings.check_date = value.parse()?,
        "checkissuer" => settings.check_issuer = value.parse()?,
        "checkhost" => settings.check_host = value.parse()?,
        "clientcert.file" => {
            let cert = settings
                .client_cert
                .get_or_insert_with(|| ClientCertSettings {
                    file: value.into(),
                    pass: String::new(),
                });
            cert.file = value.into();
        }
        "clientcert.pass" => match &mut settings.client_cert {
            Some(cert) => cert.pass = value.to_string(),
            None => anyhow::bail!("set clientcert.file before clientcert.pass"),
        },
        _ => {
            anyhow::bail!(
                "Unknown config key: {key}\n\n\
                 Available keys:\n  \
                 checkdate        - Check certificate validity dates (true/false)\n  \
                 checkissuer      - Require a trusted issuer (true/false)\n  \
                 checkhost        - Require the leaf to name the server (true/false)\n  \
                 clientcert.file  - PKCS#12 client certificate\n  \
                 clientcert.pass  - Password of the client certificate"
            );
        }
    }
    Ok(())
}

fn show_trusted(ctx: &Context) -> Result<()> {
    let trusted = ctx.config_store()?.trusted_signatures();

    if ctx.output_format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&trusted)?);
    } else if trusted.is_empty() {
        println!("{}", "No manually trusted certificates.".dimmed());
    } else {
        for signature in &trusted {
            println!("{signature}");
        }
    }
    Ok(())
}
