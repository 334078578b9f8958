//! `irctls check` - run a chain through the interactive decision flow.

use anyhow::Result;
use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use std::io::IsTerminal;
use std::sync::{mpsc, Arc};
use tracing::{debug, warn};

use irctls_core::{CertificateRejected, TrustAction};
use irctls_trust::{CertificateEvent, CertificateManager, FnSink, ProblemEncountered};

use super::{load_chain, Context};
use crate::cli::args::CheckArgs;
use crate::output::{self, ChainReport, OutputFormat};

enum Step {
    Event(CertificateEvent),
    Finished(Result<(), CertificateRejected>),
}

const CHOICES: [TrustAction; 3] = [
    TrustAction::Disconnect,
    TrustAction::IgnoreTemporarily,
    TrustAction::IgnorePermanently,
];

pub fn execute(ctx: &Context, args: CheckArgs) -> Result<()> {
    let chain = load_chain(&args.chain)?;
    let trust_store = args.anchors.trust_store()?;
    let config = ctx.config_store()?;

    let (tx, rx) = mpsc::channel();
    let events_tx = tx.clone();
    let sink = FnSink(move |event| {
        let _ = events_tx.send(Step::Event(event));
    });

    let manager = Arc::new(
        CertificateManager::new(&args.host, config, Arc::new(trust_store))
            .with_event_sink(Arc::new(sink)),
    );

    // The handshake side blocks, so it gets its own thread.
    let handshake = {
        let manager = Arc::clone(&manager);
        std::thread::spawn(move || {
            let result = manager.check_server_trusted(chain);
            let _ = tx.send(Step::Finished(result));
        })
    };

    let mut report = None;
    let result = loop {
        let Ok(step) = rx.recv() else {
            anyhow::bail!("certificate check ended unexpectedly");
        };
        match step {
            Step::Event(CertificateEvent::ProblemEncountered(event)) => {
                let mut model = manager.display_model();
                if let Some(protocol) = &args.protocol {
                    model = model.with_protocol(protocol.clone());
                }
                let current = ChainReport::from_model(&model);
                drop(model);

                if ctx.output_format == OutputFormat::Pretty {
                    println!("{}", "The server's certificate has problems.".yellow().bold());
                    output::print_report(&current, args.all);
                }
                report = Some(current);
                decide(&args, &event);
            }
            Step::Event(CertificateEvent::ProblemResolved { manager_id }) => {
                debug!(manager = %manager_id, "decision applied");
            }
            Step::Finished(result) => break result,
        }
    };

    if handshake.join().is_err() {
        anyhow::bail!("certificate check thread panicked");
    }

    match ctx.output_format {
        OutputFormat::Json => {
            let report = report.unwrap_or_else(|| ChainReport::from_model(&manager.display_model()));
            let document = serde_json::json!({
                "accepted": result.is_ok(),
                "reason": result.as_ref().err().map(|r| r.reason.clone()),
                "report": report,
            });
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
        OutputFormat::Pretty => {
            if result.is_ok() {
                println!("{} certificate accepted for {}", "OK:".green().bold(), args.host);
            }
        }
    }

    result.map_err(|rejected| anyhow::anyhow!("certificate rejected: {}", rejected.reason))
}

fn decide(args: &CheckArgs, event: &ProblemEncountered) {
    let action = match args.action {
        Some(action) => Ok(action.into()),
        None if std::io::stdin().is_terminal() => prompt(event),
        None => {
            warn!("no --action given and stdin is not a terminal, disconnecting");
            Ok(TrustAction::Disconnect)
        }
    };

    match action {
        Ok(action) => {
            if let Err(e) = event.handle.submit(action) {
                warn!(error = %e, "decision not delivered");
            }
        }
        Err(e) => {
            warn!(error = %e, "prompt failed, aborting");
            event.handle.cancel();
        }
    }
}

fn prompt(event: &ProblemEncountered) -> Result<TrustAction, dialoguer::Error> {
    let labels: Vec<String> = CHOICES.iter().map(ToString::to_string).collect();
    let index = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Connect to {} anyway?", event.server_name))
        .items(&labels)
        .default(0)
        .interact()?;
    Ok(CHOICES[index])
}
