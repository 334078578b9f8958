//! # irctls-core
//!
//! Core types, errors and configuration for the irctls certificate trust
//! engine.
//!
//! This crate has no cryptography in it. It defines the vocabulary shared by
//! the engine (`irctls-trust`), the connection layer that calls it, and the
//! user interface that answers its questions:
//!
//! - [`TrustResult`] -- how a single certificate is trusted, if at all
//! - [`Problem`] -- why a chain failed validation
//! - [`TrustAction`] -- what the user decided to do about it
//! - [`SslSettings`] / [`ConfigStore`] -- policy flags and the persisted
//!   override list

pub mod config;
pub mod error;
pub mod types;

pub use config::{ClientCertSettings, ConfigStore, FileConfigStore, MemoryConfigStore, SslSettings};
pub use error::{CertificateRejected, DecisionError, Result, TrustError};
pub use types::*;
