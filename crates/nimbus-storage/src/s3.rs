#[cfg(feature = "s3")]
mod inner {
    use async_trait::async_trait;
    use aws_sdk_s3::Client;
    use aws_sdk_s3::config::http::HttpResponse;
    use aws_sdk_s3::config::retry::RetryConfig;
    use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
    use aws_sdk_s3::primitives::ByteStream;
    use bytes::Bytes;
    use futures::stream;

    use nimbus_core::config::StorageConfig;
    use nimbus_core::types::ProviderType;
    use nimbus_core::{Result, StorageError};

    use crate::chunk::lazy_chunks;
    use crate::provider::{ObjectStorage, ObjectStream};

    const PROVIDER: &str = "s3";

    /// AWS S3 and S3-compatible storage provider.
    ///
    /// Works with AWS S3, MinIO, RustFS, Garage, Ceph RGW, SeaweedFS,
    /// and any other service implementing the S3 API. Deleting a missing key
    /// succeeds, as S3 itself answers 204.
    pub struct S3Storage {
        client: Client,
        bucket: String,
    }

    /// Options for creating an S3 provider.
    pub struct S3Options<'a> {
        pub bucket: &'a str,
        pub region: Option<&'a str>,
        /// Custom endpoint URL (e.g. `http://localhost:9000` for MinIO).
        pub endpoint_url: Option<&'a str>,
        /// Force path-style addressing (`http://host/bucket/key` instead of `http://bucket.host/key`).
        /// Most S3-compatible servers require this.
        pub path_style: bool,
        /// Explicit access key. If None, uses env/profile credentials.
        pub access_key: Option<&'a str>,
        /// Explicit secret key. If None, uses env/profile credentials.
        pub secret_key: Option<&'a str>,
    }

    /// Map an SDK failure: HTTP 404 is `NotFound`, anything else is `Backend`.
    fn normalize<E>(err: SdkError<E, HttpResponse>, key: &str) -> StorageError
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let status = err.raw_response().map(|r| r.status().as_u16());
        if status == Some(404) {
            return StorageError::not_found(key);
        }
        StorageError::Backend {
            provider: PROVIDER.to_string(),
            message: DisplayErrorContext(&err).to_string(),
            source: Some(Box::new(err)),
        }
    }

    impl S3Storage {
        /// Create from a `[storage]` section with `provider = "s3"` or `"s3compatible"`.
        pub async fn from_config(config: &StorageConfig) -> Result<Self> {
            let compatible = config.provider_type()? == ProviderType::S3Compatible;
            let endpoint_url = if compatible {
                Some(config.require("endpoint", config.endpoint.as_deref())?)
            } else {
                config.endpoint.as_deref()
            };
            if config.access_key.is_some() != config.secret_key.is_some() {
                return Err(StorageError::Configuration(
                    "access_key and secret_key must be set together".into(),
                ));
            }
            let region = match (compatible, config.region.as_deref()) {
                (true, None) => Some("us-east-1"),
                (_, region) => region,
            };

            Self::with_options(S3Options {
                bucket: config.require_bucket()?,
                region,
                endpoint_url,
                path_style: config.path_style.unwrap_or(compatible),
                access_key: config.access_key.as_deref(),
                secret_key: config.secret_key.as_deref(),
            })
            .await
        }

        /// Create with full options. Fails unless the bucket is reachable with the credentials.
        pub async fn with_options(opts: S3Options<'_>) -> Result<Self> {
            let mut config_loader = aws_config::from_env();

            if let Some(r) = opts.region {
                config_loader = config_loader.region(aws_config::Region::new(r.to_string()));
            }

            // If explicit credentials are provided, inject them
            if let (Some(ak), Some(sk)) = (opts.access_key, opts.secret_key) {
                let creds =
                    aws_sdk_s3::config::Credentials::new(ak, sk, None, None, "nimbus-config");
                config_loader = config_loader.credentials_provider(creds);
            }

            let sdk_config = config_loader.load().await;

            // Failures surface to the caller on the first attempt.
            let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&sdk_config)
                .retry_config(RetryConfig::disabled());

            if let Some(endpoint) = opts.endpoint_url {
                s3_config_builder = s3_config_builder.endpoint_url(endpoint);
            }

            if opts.path_style {
                s3_config_builder = s3_config_builder.force_path_style(true);
            }

            let client = Client::from_conf(s3_config_builder.build());

            client
                .head_bucket()
                .bucket(opts.bucket)
                .send()
                .await
                .map_err(|e| {
                    StorageError::Configuration(format!(
                        "bucket '{}' not accessible: {}",
                        opts.bucket,
                        DisplayErrorContext(&e)
                    ))
                })?;
            tracing::info!(bucket = opts.bucket, endpoint = ?opts.endpoint_url, "S3 storage ready");

            Ok(Self {
                client,
                bucket: opts.bucket.to_string(),
            })
        }
    }

    fn body_stream(body: ByteStream) -> impl futures::Stream<Item = Result<Bytes>> + Send {
        stream::try_unfold(body, |mut body| async move {
            let next = body
                .try_next()
                .await
                .map_err(|e| StorageError::backend(PROVIDER, e))?;
            Ok(next.map(|bytes| (bytes, body)))
        })
    }

    #[async_trait]
    impl ObjectStorage for S3Storage {
        async fn save(&self, key: &str, data: &[u8]) -> Result<()> {
            tracing::debug!(bucket = %self.bucket, key, bytes = data.len(), "s3 put_object");
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(key)
                .body(ByteStream::from(data.to_vec()))
                .send()
                .await
                .map_err(|e| normalize(e, key))?;
            Ok(())
        }

        async fn load_once(&self, key: &str) -> Result<Bytes> {
            tracing::debug!(bucket = %self.bucket, key, "s3 get_object");
            let resp = self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| normalize(e, key))?;
            let data = resp
                .body
                .collect()
                .await
                .map_err(|e| StorageError::backend(PROVIDER, e))?;
            Ok(data.into_bytes())
        }

        fn load_stream(&self, key: &str) -> ObjectStream {
            let client = self.client.clone();
            let bucket = self.bucket.clone();
            let key = key.to_string();
            lazy_chunks(async move {
                tracing::debug!(bucket = %bucket, key = %key, "s3 get_object (streamed)");
                let resp = client
                    .get_object()
                    .bucket(&bucket)
                    .key(&key)
                    .send()
                    .await
                    .map_err(|e| normalize(e, &key))?;
                Ok(body_stream(resp.body))
            })
        }

        async fn exists(&self, key: &str) -> Result<bool> {
            tracing::debug!(bucket = %self.bucket, key, "s3 head_object");
            match self
                .client
                .head_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| normalize(e, key))
            {
                Ok(_) => Ok(true),
                Err(e) if e.is_not_found() => Ok(false),
                Err(e) => Err(e),
            }
        }

        async fn delete(&self, key: &str) -> Result<()> {
            tracing::debug!(bucket = %self.bucket, key, "s3 delete_object");
            self.client
                .delete_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| normalize(e, key))?;
            Ok(())
        }
    }
}

#[cfg(feature = "s3")]
pub use inner::{S3Options, S3Storage};
