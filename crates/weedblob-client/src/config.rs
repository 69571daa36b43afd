use std::path::{Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// Settings needed to open a [`Client`](crate::Client) over a live store.
///
/// Read from TOML:
///
/// ```toml
/// master_url = "localhost:9333"
/// db_dir = "/var/lib/weedblob"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Address of the SeaweedFS master; the scheme defaults to `http`.
    pub master_url: Option<String>,
    /// Directory holding the local index file.
    pub db_dir: Option<PathBuf>,
}

impl StorageConfig {
    pub fn new(master_url: impl Into<String>, db_dir: impl Into<PathBuf>) -> Self {
        Self {
            master_url: Some(master_url.into()),
            db_dir: Some(db_dir.into()),
        }
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> ClientResult<Self> {
        toml::from_str(text).map_err(|e| ClientError::Config(e.to_string()))
    }

    /// Read and parse a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// The master URL, or a configuration error if it is missing or blank.
    pub fn master_url(&self) -> ClientResult<&str> {
        match self.master_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err(ClientError::Config("missing master_url".into())),
        }
    }

    /// The index directory, or a configuration error if it is missing or blank.
    pub fn db_dir(&self) -> ClientResult<&Path> {
        match self.db_dir.as_deref() {
            Some(dir) if !dir.as_os_str().is_empty() => Ok(dir),
            _ => Err(ClientError::Config("missing db_dir".into())),
        }
    }

    /// Check that both required settings are present.
    pub fn validate(&self) -> ClientResult<()> {
        self.master_url()?;
        self.db_dir()?;
        Ok(())
    }

    /// Path of the index file for this master.
    ///
    /// The file name embeds the URL-safe base64 of the master URL, so each
    /// master gets its own index under a shared `db_dir`.
    pub fn index_path(&self) -> ClientResult<PathBuf> {
        let encoded = URL_SAFE.encode(self.master_url()?.as_bytes());
        Ok(self.db_dir()?.join(format!("weedblob-{encoded}.redb")))
    }
}
