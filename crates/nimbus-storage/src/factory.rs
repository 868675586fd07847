//! Factory for creating the configured ObjectStorage backend.

use nimbus_core::config::{StorageConfig, expand_home};
use nimbus_core::types::ProviderType;
use nimbus_core::{Result, StorageError};

use crate::local::LocalStorage;
use crate::provider::ObjectStorage;

/// Build the backend named by `config.provider`, fully initialized.
///
/// Supported types:
/// - `"oci"` — OCI Object Storage (compile with `oci` feature)
/// - `"s3"` / `"s3compatible"` — AWS S3, MinIO, Garage, ... (compile with `s3` feature)
/// - `"azure"` — Azure Blob Storage (compile with `azure` feature)
/// - `"gcs"` — Google Cloud Storage (compile with `gcs` feature)
/// - `"local"` — directory on the local filesystem
///
/// Credentials and session state (such as the OCI namespace) are checked
/// here, so a misconfigured backend fails before the first operation.
pub async fn create_storage(config: &StorageConfig) -> Result<Box<dyn ObjectStorage>> {
    let provider = config.provider_type()?;
    tracing::debug!(%provider, bucket = %config.bucket_name, "creating storage backend");

    match provider {
        ProviderType::Local => {
            let root = match config.root.as_deref() {
                Some(root) => root,
                None => config.require_bucket()?,
            };
            Ok(Box::new(LocalStorage::new(&expand_home(root))?))
        }

        #[cfg(feature = "oci")]
        ProviderType::Oci => Ok(Box::new(crate::oci::OciStorage::from_config(config).await?)),

        #[cfg(feature = "s3")]
        ProviderType::S3 | ProviderType::S3Compatible => {
            Ok(Box::new(crate::s3::S3Storage::from_config(config).await?))
        }

        #[cfg(feature = "azure")]
        ProviderType::Azure => Ok(Box::new(crate::azure::AzureStorage::from_config(config).await?)),

        #[cfg(feature = "gcs")]
        ProviderType::Gcs => Ok(Box::new(crate::gcs::GcsStorage::from_config(config).await?)),

        #[allow(unreachable_patterns)]
        other => Err(feature_disabled(other)),
    }
}

#[allow(dead_code)]
fn feature_disabled(provider: ProviderType) -> StorageError {
    StorageError::Configuration(format!(
        "{provider} provider not enabled. Recompile with --features {}",
        provider.feature().unwrap_or("default")
    ))
}
