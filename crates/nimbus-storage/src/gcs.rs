#[cfg(feature = "gcs")]
mod inner {
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::{Stream, stream};
    use google_cloud_storage::client::{Client, ClientConfig};
    use google_cloud_storage::http::Error;
    use google_cloud_storage::http::objects::delete::DeleteObjectRequest;
    use google_cloud_storage::http::objects::download::Range;
    use google_cloud_storage::http::objects::get::GetObjectRequest;
    use google_cloud_storage::http::objects::list::ListObjectsRequest;
    use google_cloud_storage::http::objects::upload::{Media, UploadObjectRequest, UploadType};

    use nimbus_core::config::StorageConfig;
    use nimbus_core::{Result, StorageError};

    use crate::chunk::lazy_chunks;
    use crate::provider::{ObjectStorage, ObjectStream};

    const PROVIDER: &str = "gcs";

    /// Bytes requested per ranged read while streaming.
    const RANGE_SIZE: u64 = 1024 * 1024;

    /// Google Cloud Storage provider.
    ///
    /// Deleting a missing object surfaces `NotFound`, as GCS answers 404.
    pub struct GcsStorage {
        client: Client,
        bucket: String,
    }

    fn status_of(err: &Error) -> Option<u16> {
        match err {
            Error::Response(resp) => u16::try_from(resp.code).ok(),
            Error::HttpClient(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    fn normalize(err: Error, key: &str) -> StorageError {
        if status_of(&err) == Some(404) {
            StorageError::not_found(key)
        } else {
            StorageError::backend(PROVIDER, err)
        }
    }

    /// Fetch `[0, size)` as consecutive `RANGE_SIZE` reads.
    fn ranges(
        client: Client,
        request: GetObjectRequest,
        size: u64,
    ) -> impl Stream<Item = Result<Bytes>> + Send + 'static {
        stream::try_unfold(0u64, move |offset| {
            let client = client.clone();
            let request = request.clone();
            async move {
                if offset >= size {
                    return Ok(None);
                }
                let end = (offset + RANGE_SIZE).min(size);
                let data = client
                    .download_object(&request, &Range(Some(offset), Some(end - 1)))
                    .await
                    .map_err(|e| normalize(e, &request.object))?;
                if data.is_empty() {
                    return Err(StorageError::backend_msg(
                        PROVIDER,
                        format!("empty range {offset}-{end} for '{}'", request.object),
                    ));
                }
                let next = offset + data.len() as u64;
                Ok(Some((Bytes::from(data), next)))
            }
        })
    }

    impl GcsStorage {
        /// Create from a `[storage]` section with `provider = "gcs"`.
        pub async fn from_config(config: &StorageConfig) -> Result<Self> {
            Self::new(config.require_bucket()?).await
        }

        /// Create using application default credentials.
        pub async fn new(bucket: &str) -> Result<Self> {
            let config = ClientConfig::default().with_auth().await.map_err(|e| {
                StorageError::Configuration(format!("GCS authentication failed: {e}"))
            })?;
            let client = Client::new(config);

            // List at most one object to prove the bucket and credentials work.
            client
                .list_objects(&ListObjectsRequest {
                    bucket: bucket.to_string(),
                    max_results: Some(1),
                    ..Default::default()
                })
                .await
                .map_err(|e| {
                    StorageError::Configuration(format!("bucket '{bucket}' not accessible: {e}"))
                })?;
            tracing::info!(bucket, "GCS storage ready");

            Ok(Self {
                client,
                bucket: bucket.to_string(),
            })
        }

        fn object_request(&self, key: &str) -> GetObjectRequest {
            GetObjectRequest {
                bucket: self.bucket.clone(),
                object: key.to_string(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl ObjectStorage for GcsStorage {
        async fn save(&self, key: &str, data: &[u8]) -> Result<()> {
            tracing::debug!(bucket = %self.bucket, key, bytes = data.len(), "gcs upload_object");
            let upload_type = UploadType::Simple(Media::new(key.to_string()));
            self.client
                .upload_object(
                    &UploadObjectRequest {
                        bucket: self.bucket.clone(),
                        ..Default::default()
                    },
                    data.to_vec(),
                    &upload_type,
                )
                .await
                .map_err(|e| normalize(e, key))?;
            Ok(())
        }

        async fn load_once(&self, key: &str) -> Result<Bytes> {
            tracing::debug!(bucket = %self.bucket, key, "gcs download_object");
            let data = self
                .client
                .download_object(&self.object_request(key), &Range::default())
                .await
                .map_err(|e| normalize(e, key))?;
            Ok(Bytes::from(data))
        }

        fn load_stream(&self, key: &str) -> ObjectStream {
            let client = self.client.clone();
            let request = self.object_request(key);
            lazy_chunks(async move {
                tracing::debug!(bucket = %request.bucket, key = %request.object, "gcs ranged download");
                let object = client
                    .get_object(&request)
                    .await
                    .map_err(|e| normalize(e, &request.object))?;
                let size = u64::try_from(object.size).unwrap_or(0);

                // Pin every range to the generation we just saw.
                let request = GetObjectRequest {
                    generation: Some(object.generation),
                    ..request
                };
                Ok(ranges(client, request, size))
            })
        }

        async fn exists(&self, key: &str) -> Result<bool> {
            tracing::debug!(bucket = %self.bucket, key, "gcs get_object");
            match self.client.get_object(&self.object_request(key)).await {
                Ok(_) => Ok(true),
                Err(e) if status_of(&e) == Some(404) => Ok(false),
                Err(e) => Err(StorageError::backend(PROVIDER, e)),
            }
        }

        async fn delete(&self, key: &str) -> Result<()> {
            tracing::debug!(bucket = %self.bucket, key, "gcs delete_object");
            self.client
                .delete_object(&DeleteObjectRequest {
                    bucket: self.bucket.clone(),
                    object: key.to_string(),
                    ..Default::default()
                })
                .await
                .map_err(|e| normalize(e, key))?;
            Ok(())
        }
    }

}

#[cfg(feature = "gcs")]
pub use inner::GcsStorage;
