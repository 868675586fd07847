use crate::error::{Result, StorageError};
use crate::types::ProviderType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Top-level Nimbus configuration stored as TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NimbusConfig {
    pub storage: StorageConfig,
}

/// Options for the single storage backend a process talks to.
///
/// Only `provider` and `bucket_name` are shared by every backend; the rest
/// are read by the adapters that need them and ignored by the others.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend name: `oci`, `s3`, `s3compatible`, `azure`, `gcs`, `local`.
    pub provider: String,
    /// Bucket (OCI, S3, GCS) or container (Azure) holding the objects.
    #[serde(default)]
    pub bucket_name: String,
    #[serde(default)]
    pub region: Option<String>,
    /// Custom endpoint URL. Overrides the one derived from `region`.
    #[serde(default)]
    pub endpoint: Option<String>,

    // OCI
    #[serde(default)]
    pub user_ocid: Option<String>,
    #[serde(default)]
    pub tenancy_ocid: Option<String>,
    #[serde(default)]
    pub fingerprint: Option<String>,
    /// PEM private key used to sign OCI requests. `~/` is expanded.
    #[serde(default)]
    pub key_file: Option<String>,

    // S3 / S3-compatible / Azure
    /// S3 access key id, or the Azure storage account key.
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    /// Use path-style addressing. Default: true for s3compatible, false for s3.
    #[serde(default)]
    pub path_style: Option<bool>,
    /// Azure storage account name.
    #[serde(default)]
    pub account: Option<String>,

    // Local
    /// Root directory for the local backend. Falls back to `bucket_name`.
    #[serde(default)]
    pub root: Option<String>,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("StorageConfig")
            .field("provider", &self.provider)
            .field("bucket_name", &self.bucket_name)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("user_ocid", &self.user_ocid)
            .field("tenancy_ocid", &self.tenancy_ocid)
            .field("fingerprint", &self.fingerprint)
            .field("key_file", &self.key_file)
            .field("access_key", &redact(&self.access_key))
            .field("secret_key", &redact(&self.secret_key))
            .field("path_style", &self.path_style)
            .field("account", &self.account)
            .field("root", &self.root)
            .finish()
    }
}

/// Prefix of the environment variables that override file values.
pub const ENV_PREFIX: &str = "NIMBUS_STORAGE_";

impl StorageConfig {
    pub fn provider_type(&self) -> Result<ProviderType> {
        self.provider.parse()
    }

    /// Return a required option or a configuration error naming it.
    pub fn require<'a>(&self, field: &str, value: Option<&'a str>) -> Result<&'a str> {
        match value {
            Some(v) if !v.trim().is_empty() => Ok(v),
            _ => Err(StorageError::Configuration(format!(
                "provider '{}' requires option '{field}'",
                self.provider
            ))),
        }
    }

    pub fn require_bucket(&self) -> Result<&str> {
        self.require("bucket_name", Some(self.bucket_name.as_str()))
    }

    /// Override values from `NIMBUS_STORAGE_<FIELD>` process environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Same as [`apply_env`](Self::apply_env) with an injectable lookup.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |field: &str| lookup(&format!("{ENV_PREFIX}{}", field.to_uppercase()));

        if let Some(v) = var("provider") {
            self.provider = v;
        }
        if let Some(v) = var("bucket_name") {
            self.bucket_name = v;
        }
        let optional = [
            ("region", &mut self.region),
            ("endpoint", &mut self.endpoint),
            ("user_ocid", &mut self.user_ocid),
            ("tenancy_ocid", &mut self.tenancy_ocid),
            ("fingerprint", &mut self.fingerprint),
            ("key_file", &mut self.key_file),
            ("access_key", &mut self.access_key),
            ("secret_key", &mut self.secret_key),
            ("account", &mut self.account),
            ("root", &mut self.root),
        ];
        for (field, slot) in optional {
            if let Some(v) = var(field) {
                *slot = Some(v);
            }
        }
        if let Some(v) = var("path_style") {
            let parsed = v.parse::<bool>().map_err(|_| {
                StorageError::Configuration(format!(
                    "{ENV_PREFIX}PATH_STYLE must be true or false, got '{v}'"
                ))
            })?;
            self.path_style = Some(parsed);
        }
        Ok(())
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

impl NimbusConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(StorageError::Configuration(format!(
                "config file not found at {} (run `nimbus init` first)",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            StorageError::Configuration(format!("cannot read config {}: {e}", path.display()))
        })?;
        toml::from_str(&content).map_err(|e| {
            StorageError::Configuration(format!("invalid config {}: {e}", path.display()))
        })
    }

    /// Save config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| StorageError::Configuration(format!("cannot serialize config: {e}")))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Default config for `nimbus init`: a local backend under `<base_dir>/objects`.
    pub fn default_config(base_dir: &Path) -> Self {
        Self {
            storage: StorageConfig {
                provider: ProviderType::Local.to_string(),
                bucket_name: "default".to_string(),
                root: Some(base_dir.join("objects").display().to_string()),
                ..Default::default()
            },
        }
    }

    /// Resolve the config file path: `<base_dir>/nimbus.toml`
    pub fn default_path(base_dir: &Path) -> PathBuf {
        base_dir.join("nimbus.toml")
    }

    /// Resolve the default nimbus home directory: `~/.nimbus`
    pub fn default_base_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|h| h.join(".nimbus"))
            .ok_or_else(|| StorageError::Configuration("cannot determine home directory".into()))
    }
}
