//! # irctls-cli
//!
//! Command-line front end for the irctls trust engine.
//!
//! - `check` runs a PEM chain through the same decision flow a client uses
//!   during a handshake, prompting when the chain has problems
//! - `inspect` prints the details of every certificate in a chain
//! - `store` shows the platform CA bundle in use
//! - `config` shows and edits the `[ssl]` settings

pub mod cli;
pub mod output;

pub use cli::run;
