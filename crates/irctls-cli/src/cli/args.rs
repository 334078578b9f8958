//! Command-line argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use irctls_core::TrustAction;

use crate::output::OutputFormat;

/// Inspect IRC server certificate chains and manage trusted overrides.
///
/// Runs chains through the same checks an IRC client performs during the
/// TLS handshake: validity dates, issuer trust and hostname match.
#[derive(Parser, Debug)]
#[command(name = "irctls")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (defaults to the per-user config directory)
    #[arg(short, long, env = "IRCTLS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a certificate chain and decide what to do about problems
    Check(CheckArgs),

    /// Show the details of every certificate in a chain
    Inspect(InspectArgs),

    /// Show the CA bundle used as trust anchors
    Store(StoreArgs),

    /// Manage SSL settings
    Config(ConfigArgs),
}

/// Where trust anchors come from.
#[derive(Args, Debug, Clone)]
pub struct AnchorArgs {
    /// PEM bundle to use instead of the platform CA bundle
    #[arg(long, value_name = "PEM")]
    pub ca_file: Option<PathBuf>,
}

// ============================================================================
// Check command
// ============================================================================

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// PEM file holding the server chain, leaf first
    pub chain: PathBuf,

    /// Server name the client connected to
    #[arg(long = "host", short = 'H')]
    pub host: String,

    #[command(flatten)]
    pub anchors: AnchorArgs,

    /// Answer problems without prompting
    #[arg(short, long, value_enum)]
    pub action: Option<ActionArg>,

    /// Negotiated protocol version to show in the details
    #[arg(long, value_name = "VERSION")]
    pub protocol: Option<String>,

    /// Show details for every certificate, not just the leaf
    #[arg(long)]
    pub all: bool,
}

/// Decision given on the command line.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ActionArg {
    /// Refuse the certificate
    Disconnect,
    /// Accept for this connection only
    Once,
    /// Accept and remember the certificate
    Always,
}

impl From<ActionArg> for TrustAction {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Disconnect => Self::Disconnect,
            ActionArg::Once => Self::IgnoreTemporarily,
            ActionArg::Always => Self::IgnorePermanently,
        }
    }
}

// ============================================================================
// Inspect command
// ============================================================================

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// PEM file holding the chain, leaf first
    pub chain: PathBuf,

    /// Server name to match the leaf against (defaults to the leaf's name)
    #[arg(long = "host", short = 'H')]
    pub host: Option<String>,

    #[command(flatten)]
    pub anchors: AnchorArgs,
}

// ============================================================================
// Store command
// ============================================================================

#[derive(Args, Debug)]
pub struct StoreArgs {
    #[command(flatten)]
    pub anchors: AnchorArgs,

    /// List every certificate
    #[arg(short, long)]
    pub list: bool,
}

// ============================================================================
// Config command
// ============================================================================

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the current SSL settings
    Show,

    /// Set an SSL setting
    Set {
        /// checkdate, checkissuer, checkhost, clientcert.file or clientcert.pass
        key: String,
        /// New value
        value: String,
    },

    /// List manually trusted certificate signatures
    Trusted,

    /// Show the configuration file path
    Path,
}
