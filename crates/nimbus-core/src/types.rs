use std::fmt;

use crate::error::StorageError;

/// Object storage backends a `[storage]` section can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    /// Oracle Cloud Infrastructure Object Storage.
    Oci,
    S3,
    /// S3-compatible: MinIO, RustFS, Garage, Ceph RGW, SeaweedFS, etc.
    S3Compatible,
    Azure,
    Gcs,
    Local,
}

impl ProviderType {
    /// Cargo feature that compiles the adapter in, if it has one.
    pub fn feature(&self) -> Option<&'static str> {
        match self {
            ProviderType::Oci => Some("oci"),
            ProviderType::S3 | ProviderType::S3Compatible => Some("s3"),
            ProviderType::Azure => Some("azure"),
            ProviderType::Gcs => Some("gcs"),
            ProviderType::Local => None,
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderType::Oci => write!(f, "oci"),
            ProviderType::S3 => write!(f, "s3"),
            ProviderType::S3Compatible => write!(f, "s3compatible"),
            ProviderType::Azure => write!(f, "azure"),
            ProviderType::Gcs => write!(f, "gcs"),
            ProviderType::Local => write!(f, "local"),
        }
    }
}

impl std::str::FromStr for ProviderType {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "oci" | "oracle" => Ok(ProviderType::Oci),
            "s3" => Ok(ProviderType::S3),
            "s3compatible" | "s3-compatible" | "minio" | "rustfs" | "garage" => {
                Ok(ProviderType::S3Compatible)
            }
            "azure" | "azure-blob" => Ok(ProviderType::Azure),
            "gcs" | "google" => Ok(ProviderType::Gcs),
            "local" | "fs" => Ok(ProviderType::Local),
            other => Err(StorageError::Configuration(format!(
                "unknown storage provider '{other}'"
            ))),
        }
    }
}
