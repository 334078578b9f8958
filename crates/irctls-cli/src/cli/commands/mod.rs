//! Command implementations.

pub mod check;
pub mod config;
pub mod inspect;
pub mod store;

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use std::sync::Arc;

use irctls_core::FileConfigStore;
use irctls_trust::{Certificate, TrustStore};

use super::args::AnchorArgs;
use crate::output::OutputFormat;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Explicit configuration file, if given
    pub config_path: Option<PathBuf>,

    pub output_format: OutputFormat,

    /// Verbose output
    pub verbose: bool,
}

impl Context {
    pub fn config_file(&self) -> Result<PathBuf> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => Ok(FileConfigStore::default_path()?),
        }
    }

    pub fn config_store(&self) -> Result<Arc<FileConfigStore>> {
        let path = self.config_file()?;
        let store = FileConfigStore::open(&path)
            .with_context(|| format!("failed to open configuration {}", path.display()))?;
        Ok(Arc::new(store))
    }
}

impl AnchorArgs {
    pub fn trust_store(&self) -> Result<TrustStore> {
        match &self.ca_file {
            Some(path) => TrustStore::from_pem_file(path)
                .with_context(|| format!("failed to load CA bundle {}", path.display())),
            None => Ok(TrustStore::load()),
        }
    }
}

pub fn load_chain(path: &std::path::Path) -> Result<Vec<Certificate>> {
    let chain = Certificate::chain_from_pem_file(path)
        .with_context(|| format!("failed to read certificate chain {}", path.display()))?;
    if chain.is_empty() {
        anyhow::bail!("no certificates found in {}", path.display());
    }
    Ok(chain)
}
