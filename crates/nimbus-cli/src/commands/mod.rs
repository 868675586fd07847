pub mod config;
pub mod download;
pub mod exists;
pub mod get;
pub mod init;
pub mod put;
pub mod rm;

use anyhow::{Context, Result};
use std::path::Path;

use nimbus_core::config::NimbusConfig;
use nimbus_storage::{ObjectStorage, create_storage};

/// Load `<base_dir>/nimbus.toml`, apply `NIMBUS_STORAGE_*` overrides, and build the backend.
pub async fn open_storage(base_dir: &Path) -> Result<Box<dyn ObjectStorage>> {
    let config_path = NimbusConfig::default_path(base_dir);
    let mut config = NimbusConfig::load(&config_path)?;
    config.storage.apply_env()?;

    create_storage(&config.storage)
        .await
        .with_context(|| format!("cannot open '{}' storage", config.storage.provider))
}
