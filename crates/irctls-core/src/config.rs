//! SSL configuration and the persisted override list.
//!
//! Settings live in the `[ssl]` table of a TOML file:
//!
//! ```toml
//! [ssl]
//! checkdate = true
//! checkissuer = true
//! checkhost = true
//! trusted = ["MEUCIQ..."]
//!
//! [ssl.clientcert]
//! file = "/home/me/.irc/client.p12"
//! pass = "hunter2"
//! ```
//!
//! Other tables in the file belong to the rest of the client and are
//! preserved untouched when the override list is rewritten.

use directories::ProjectDirs;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Result, TrustError};

/// Name of the TOML table holding SSL options.
const SSL_TABLE: &str = "ssl";

/// Key of the manually trusted signature list inside [`SSL_TABLE`].
const TRUSTED_KEY: &str = "trusted";

/// Snapshot of the SSL policy a connection is validated against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SslSettings {
    /// `ssl.checkdate`: reject certificates outside their validity period
    #[serde(rename = "checkdate")]
    pub check_date: bool,

    /// `ssl.checkissuer`: require a trusted certificate somewhere in the chain
    #[serde(rename = "checkissuer")]
    pub check_issuer: bool,

    /// `ssl.checkhost`: require the leaf to name the server
    #[serde(rename = "checkhost")]
    pub check_host: bool,

    /// `ssl.trusted`: base64 signatures of user-approved certificates
    pub trusted: Vec<String>,

    /// `ssl.clientcert`: optional PKCS#12 client identity
    #[serde(rename = "clientcert", skip_serializing_if = "Option::is_none")]
    pub client_cert: Option<ClientCertSettings>,
}

/// Location and passphrase of a PKCS#12 client certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCertSettings {
    /// `ssl.clientcert.file`
    pub file: PathBuf,
    /// `ssl.clientcert.pass`
    #[serde(default)]
    pub pass: String,
}

impl Default for SslSettings {
    fn default() -> Self {
        Self {
            check_date: true,
            check_issuer: true,
            check_host: true,
            trusted: Vec::new(),
            client_cert: None,
        }
    }
}

impl SslSettings {
    /// Settings that accept anything without asking.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            check_date: false,
            check_issuer: false,
            check_host: false,
            ..Self::default()
        }
    }
}

/// Key/value configuration the trust engine reads and appends to.
///
/// Implementations must tolerate concurrent appends from several
/// connections.
pub trait ConfigStore: Send + Sync {
    /// Current SSL settings.
    fn ssl_settings(&self) -> SslSettings;

    /// Current list of manually trusted signatures.
    fn trusted_signatures(&self) -> Vec<String> {
        self.ssl_settings().trusted
    }

    /// Append a signature to the manually trusted list and persist it.
    ///
    /// Returns `false` when the signature was already present.
    fn append_trusted(&self, signature: &str) -> Result<bool>;
}

/// Configuration held only in memory.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    settings: RwLock<SslSettings>,
}

impl MemoryConfigStore {
    pub fn new(settings: SslSettings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }
}

impl ConfigStore for MemoryConfigStore {
    fn ssl_settings(&self) -> SslSettings {
        self.settings.read().clone()
    }

    fn trusted_signatures(&self) -> Vec<String> {
        self.settings.read().trusted.clone()
    }

    fn append_trusted(&self, signature: &str) -> Result<bool> {
        let mut settings = self.settings.write();
        if settings.trusted.iter().any(|s| s == signature) {
            return Ok(false);
        }
        settings.trusted.push(signature.to_string());
        Ok(true)
    }
}

/// Configuration backed by a TOML file.
///
/// Appends are serialized by an internal lock and re-read the file before
/// writing, so several managers can persist overrides at the same time.
#[derive(Debug)]
pub struct FileConfigStore {
    path: PathBuf,
    document: Mutex<toml::Table>,
}

impl FileConfigStore {
    /// Default configuration path for the current user.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("net", "irctls", "irctls")
            .ok_or_else(|| TrustError::Config("could not determine config directory".into()))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Open the store at the default path.
    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    /// Open a store; a missing file yields default settings.
    ///
    /// An `[ssl]` table that does not deserialize is an error rather than a
    /// silent reset to defaults.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let document = read_document(&path)?;
        settings_from(&document, &path)?;
        debug!(path = %path.display(), "loaded configuration");

        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the `[ssl]` table and persist.
    pub fn save_ssl_settings(&self, settings: &SslSettings) -> Result<()> {
        let mut document = self.document.lock();
        let table = toml::Table::try_from(settings)?;
        document.insert(SSL_TABLE.to_string(), toml::Value::Table(table));
        write_document(&self.path, &document)
    }
}

impl ConfigStore for FileConfigStore {
    fn ssl_settings(&self) -> SslSettings {
        settings_from(&self.document.lock(), &self.path).unwrap_or_else(|e| {
            warn!(error = %e, "using default SSL settings");
            SslSettings::default()
        })
    }

    fn append_trusted(&self, signature: &str) -> Result<bool> {
        let mut document = self.document.lock();

        // Another process may have written since we loaded.
        let fresh = read_document(&self.path)?;
        settings_from(&fresh, &self.path)?;
        *document = fresh;

        let ssl = document
            .entry(SSL_TABLE)
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        let toml::Value::Table(ssl) = ssl else {
            return Err(TrustError::Config(format!(
                "'{SSL_TABLE}' in {} is not a table",
                self.path.display()
            )));
        };

        let trusted = ssl
            .entry(TRUSTED_KEY)
            .or_insert_with(|| toml::Value::Array(Vec::new()));
        let toml::Value::Array(trusted) = trusted else {
            return Err(TrustError::Config(format!(
                "'{SSL_TABLE}.{TRUSTED_KEY}' in {} is not a list",
                self.path.display()
            )));
        };

        if trusted.iter().any(|v| v.as_str() == Some(signature)) {
            return Ok(false);
        }
        trusted.push(toml::Value::String(signature.to_string()));

        write_document(&self.path, &document)?;
        info!(path = %self.path.display(), "persisted manually trusted certificate");
        Ok(true)
    }
}

fn settings_from(document: &toml::Table, path: &Path) -> Result<SslSettings> {
    let Some(ssl) = document.get(SSL_TABLE) else {
        return Ok(SslSettings::default());
    };

    ssl.clone().try_into().map_err(|e: toml::de::Error| {
        TrustError::Config(format!(
            "invalid [{SSL_TABLE}] table in {}: {e}",
            path.display()
        ))
    })
}

fn read_document(path: &Path) -> Result<toml::Table> {
    if !path.exists() {
        return Ok(toml::Table::new());
    }

    let content = std::fs::read_to_string(path).map_err(|e| TrustError::io(path, e))?;
    content.parse::<toml::Table>().map_err(|source| TrustError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

fn write_document(path: &Path, document: &toml::Table) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| TrustError::io(parent, e))?;
    }

    let content = toml::to_string_pretty(document)?;
    std::fs::write(path, content).map_err(|e| TrustError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    #[test]
    fn defaults_check_everything() {
        let s = SslSettings::default();
        assert!(s.check_date && s.check_issuer && s.check_host);
        assert!(s.trusted.is_empty());
        assert!(s.client_cert.is_none());
    }

    #[test]
    fn mistyped_ssl_value_is_an_error() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(
            tmp,
            "[ssl]\ncheckhost = \"no\"\ntrusted = [\"AAAA\"]\ncheckdate = false\n"
        )
        .unwrap();

        let err = FileConfigStore::open(tmp.path()).unwrap_err();
        assert!(matches!(&err, TrustError::Config(msg) if msg.contains("[ssl]")));
    }

    #[test]
    fn append_refuses_file_broken_after_open() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "[ssl]\ncheckdate = false\ntrusted = [\"AAAA\"]\n").unwrap();
        let store = FileConfigStore::open(tmp.path()).unwrap();

        std::fs::write(tmp.path(), "[ssl]\ncheckdate = \"no\"\n").unwrap();
        assert!(matches!(
            store.append_trusted("BBBB"),
            Err(TrustError::Config(_))
        ));

        // Cached settings survive and the broken file is left alone.
        let settings = store.ssl_settings();
        assert!(!settings.check_date);
        assert_eq!(settings.trusted, vec!["AAAA".to_string()]);
        let content = std::fs::read_to_string(tmp.path()).unwrap();
        assert!(!content.contains("BBBB"));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::open(dir.path().join("config.toml")).unwrap();
        assert_eq!(store.ssl_settings(), SslSettings::default());
    }

    #[test]
    fn reads_ssl_keys() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"
[ui]
theme = "dark"

[ssl]
checkdate = false
checkhost = true
trusted = ["AAAA"]

[ssl.clientcert]
file = "/tmp/client.p12"
pass = "secret"
"#
        )
        .unwrap();

        let store = FileConfigStore::open(tmp.path()).unwrap();
        let s = store.ssl_settings();
        assert!(!s.check_date);
        assert!(s.check_issuer);
        assert!(s.check_host);
        assert_eq!(s.trusted, vec!["AAAA".to_string()]);
        let cc = s.client_cert.unwrap();
        assert_eq!(cc.file, PathBuf::from("/tmp/client.p12"));
        assert_eq!(cc.pass, "secret");
    }

    #[test]
    fn append_preserves_other_tables() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "[ui]\ntheme = \"dark\"\n").unwrap();

        let store = FileConfigStore::open(tmp.path()).unwrap();
        assert!(store.append_trusted("c2lnbmF0dXJl").unwrap());
        assert!(!store.append_trusted("c2lnbmF0dXJl").unwrap());

        let content = std::fs::read_to_string(tmp.path()).unwrap();
        assert!(content.contains("theme"));

        let reopened = FileConfigStore::open(tmp.path()).unwrap();
        assert_eq!(reopened.trusted_signatures(), vec!["c2lnbmF0dXJl".to_string()]);
    }

    #[test]
    fn concurrent_appends_are_all_kept() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileConfigStore::open(dir.path().join("config.toml")).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.append_trusted(&format!("sig{i}")).unwrap())
            })
            .collect();
        for h in handles {
            assert!(h.join().unwrap());
        }

        let reopened = FileConfigStore::open(store.path()).unwrap();
        assert_eq!(reopened.trusted_signatures().len(), 8);
    }

    #[test]
    fn memory_store_skips_duplicates() {
        let store = MemoryConfigStore::default();
        assert!(store.append_trusted("x").unwrap());
        assert!(!store.append_trusted("x").unwrap());
        assert_eq!(store.trusted_signatures(), vec!["x".to_string()]);
    }

    #[test]
    fn save_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::open(dir.path().join("nested/config.toml")).unwrap();
        let settings = SslSettings {
            check_host: false,
            ..SslSettings::default()
        };
        store.save_ssl_settings(&settings).unwrap();

        let reopened = FileConfigStore::open(store.path()).unwrap();
        assert_eq!(reopened.ssl_settings(), settings);
    }
}
