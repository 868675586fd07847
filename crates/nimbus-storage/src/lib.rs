//! Uniform object storage over OCI, S3, Azure Blob, GCS and the local filesystem.
//!
//! Build a backend with [`factory::create_storage`] and talk to it only through
//! [`provider::ObjectStorage`].

pub mod azure;
pub mod chunk;
pub mod factory;
pub mod gcs;
pub mod local;
pub mod oci;
pub mod provider;
pub mod s3;

pub use chunk::CHUNK_SIZE;
pub use factory::create_storage;
pub use provider::{ObjectStorage, ObjectStream};
