#[cfg(feature = "azure")]
mod inner {
    use async_trait::async_trait;
    use azure_core::{RetryOptions, StatusCode};
    use azure_storage::StorageCredentials;
    use azure_storage_blobs::prelude::*;
    use bytes::Bytes;
    use futures::{StreamExt, TryStreamExt, stream};

    use nimbus_core::config::StorageConfig;
    use nimbus_core::{Result, StorageError};

    use crate::chunk::lazy_chunks;
    use crate::provider::{ObjectStorage, ObjectStream};

    const PROVIDER: &str = "azure";

    /// Size of each ranged GET issued while streaming a blob.
    const RANGE_SIZE: u64 = 1024 * 1024;

    /// Azure Blob Storage provider.
    ///
    /// Deleting a missing blob succeeds: the 404 is logged and dropped.
    pub struct AzureStorage {
        container_client: ContainerClient,
        container: String,
    }

    /// Builders never retry: a failed request surfaces on the first attempt.
    fn without_retry(builder: ClientBuilder) -> ClientBuilder {
        builder.retry(RetryOptions::none())
    }

    fn is_not_found(err: &azure_core::Error) -> bool {
        err.as_http_error()
            .is_some_and(|e| e.status() == StatusCode::NotFound)
    }

    fn normalize(err: azure_core::Error, key: &str) -> StorageError {
        if is_not_found(&err) {
            StorageError::not_found(key)
        } else {
            StorageError::backend(PROVIDER, err)
        }
    }

    impl AzureStorage {
        /// Create from a `[storage]` section with `provider = "azure"`.
        ///
        /// `endpoint = "emulator"` targets a local Azurite instance.
        pub async fn from_config(config: &StorageConfig) -> Result<Self> {
            let container = config.require_bucket()?;
            if config.endpoint.as_deref() == Some("emulator") {
                return Self::emulator(container).await;
            }
            let account = config.require("account", config.account.as_deref())?;
            let access_key = config.require("access_key", config.access_key.as_deref())?;
            Self::new(account, access_key, container).await
        }

        /// Create from storage account name + access key.
        pub async fn new(account: &str, access_key: &str, container: &str) -> Result<Self> {
            let credentials = StorageCredentials::access_key(account, access_key.to_string());
            let container_client =
                without_retry(ClientBuilder::new(account, credentials)).container_client(container);
            Self::connect(container_client, container).await
        }

        /// Create using the emulator (Azurite).
        pub async fn emulator(container: &str) -> Result<Self> {
            let container_client = without_retry(ClientBuilder::emulator()).container_client(container);
            Self::connect(container_client, container).await
        }

        async fn connect(container_client: ContainerClient, container: &str) -> Result<Self> {
            container_client.get_properties().await.map_err(|e| {
                StorageError::Configuration(format!("container '{container}' not accessible: {e}"))
            })?;
            tracing::info!(container, "Azure blob storage ready");
            Ok(Self {
                container_client,
                container: container.to_string(),
            })
        }
    }

    #[async_trait]
    impl ObjectStorage for AzureStorage {
        async fn save(&self, key: &str, data: &[u8]) -> Result<()> {
            tracing::debug!(container = %self.container, key, bytes = data.len(), "azure put_block_blob");
            self.container_client
                .blob_client(key)
                .put_block_blob(data.to_vec())
                .await
                .map_err(|e| normalize(e, key))?;
            Ok(())
        }

        async fn load_once(&self, key: &str) -> Result<Bytes> {
            tracing::debug!(container = %self.container, key, "azure get_blob");
            let data = self
                .container_client
                .blob_client(key)
                .get_content()
                .await
                .map_err(|e| normalize(e, key))?;
            Ok(Bytes::from(data))
        }

        fn load_stream(&self, key: &str) -> ObjectStream {
            let blob = self.container_client.blob_client(key);
            let container = self.container.clone();
            let key = key.to_string();
            lazy_chunks(async move {
                tracing::debug!(container = %container, key = %key, "azure get_blob (ranged)");
                let mut pages = blob.get().chunk_size(RANGE_SIZE).into_stream();

                // Pull the first range here so a missing blob fails the open.
                let first = match pages.next().await {
                    Some(page) => Some(page.map_err(|e| normalize(e, &key))?),
                    None => None,
                };
                let rest = pages.map_err(move |e| normalize(e, &key));

                Ok(stream::iter(first.map(Ok::<_, StorageError>))
                    .chain(rest)
                    .map_ok(|page| {
                        page.data
                            .map_err(|e| StorageError::backend(PROVIDER, e))
                    })
                    .try_flatten())
            })
        }

        async fn exists(&self, key: &str) -> Result<bool> {
            tracing::debug!(container = %self.container, key, "azure get_blob_properties");
            match self
                .container_client
                .blob_client(key)
                .get_properties()
                .await
            {
                Ok(_) => Ok(true),
                Err(e) if is_not_found(&e) => Ok(false),
                Err(e) => Err(StorageError::backend(PROVIDER, e)),
            }
        }

        async fn delete(&self, key: &str) -> Result<()> {
            tracing::debug!(container = %self.container, key, "azure delete_blob");
            match self.container_client.blob_client(key).delete().await {
                Ok(_) => Ok(()),
                Err(e) if is_not_found(&e) => {
                    tracing::warn!(container = %self.container, key, "delete of missing blob ignored");
                    Ok(())
                }
                Err(e) => Err(StorageError::backend(PROVIDER, e)),
            }
        }
    }

}

#[cfg(feature = "azure")]
pub use inner::AzureStorage;
