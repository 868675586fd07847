#[cfg(feature = "oci")]
pub mod signer;

#[cfg(feature = "oci")]
mod inner {
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::TryStreamExt;
    use reqwest::header::{AUTHORIZATION, DATE, HOST};
    use reqwest::{Method, Response, StatusCode, Url};
    use serde::Deserialize;
    use std::sync::Arc;
    use std::time::SystemTime;

    use nimbus_core::config::{StorageConfig, expand_home};
    use nimbus_core::{Result, StorageError};

    use super::signer::{RequestSigner, host_header};
    use crate::chunk::lazy_chunks;
    use crate::provider::{ObjectStorage, ObjectStream};

    const PROVIDER: &str = "oci";

    /// Oracle Cloud Infrastructure Object Storage, spoken over its native REST API.
    ///
    /// The tenancy namespace is resolved once during construction and reused
    /// for every object URL. Deleting a missing key surfaces `NotFound`, as
    /// the service answers 404.
    pub struct OciStorage {
        client: OciClient,
        namespace: String,
        bucket: String,
    }

    /// Options for creating an OCI provider.
    pub struct OciOptions<'a> {
        pub bucket: &'a str,
        pub user_ocid: &'a str,
        pub tenancy_ocid: &'a str,
        pub fingerprint: &'a str,
        /// PEM contents of the API signing key.
        pub private_key_pem: &'a str,
        /// Region identifier, e.g. `us-ashburn-1`. Ignored when `endpoint` is set.
        pub region: Option<&'a str>,
        /// Custom endpoint URL.
        pub endpoint: Option<&'a str>,
    }

    /// Cheap-to-clone handle used per request; streams own their own copy.
    #[derive(Clone)]
    struct OciClient {
        http: reqwest::Client,
        signer: Arc<RequestSigner>,
        endpoint: Url,
    }

    #[derive(Debug, Deserialize)]
    struct OciErrorBody {
        #[serde(default)]
        code: String,
        #[serde(default)]
        message: String,
    }

    impl OciClient {
        fn url(&self, segments: &[&str]) -> Result<Url> {
            let mut url = self.endpoint.clone();
            url.path_segments_mut()
                .map_err(|_| {
                    StorageError::Configuration(format!(
                        "endpoint {} cannot be a base URL",
                        self.endpoint
                    ))
                })?
                .pop_if_empty()
                .extend(segments);
            Ok(url)
        }

        /// Sign and send. Non-2xx responses are returned, not converted.
        async fn send(&self, method: Method, url: Url, body: Option<Bytes>) -> Result<Response> {
            let date = httpdate::fmt_http_date(SystemTime::now());
            let authorization = self.signer.authorization(&method, &url, &date)?;
            let host = host_header(&url)?;

            let mut request = self
                .http
                .request(method, url)
                .header(DATE, date)
                .header(HOST, host)
                .header(AUTHORIZATION, authorization);
            if let Some(body) = body {
                request = request.body(body);
            }
            request
                .send()
                .await
                .map_err(|e| StorageError::backend(PROVIDER, e))
        }
    }

    /// Normalize a response: 2xx passes, 404 is `NotFound`, everything else is `Backend`.
    async fn check(response: Response, key: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(StorageError::not_found(key));
        }
        Err(StorageError::backend_msg(
            PROVIDER,
            describe_failure(response).await,
        ))
    }

    async fn describe_failure(response: Response) -> String {
        let status = response.status();
        let request_id = response
            .headers()
            .get("opc-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.unwrap_or_default();

        let mut message = match serde_json::from_str::<OciErrorBody>(&body) {
            Ok(err) if !err.code.is_empty() => format!("HTTP {status} {}: {}", err.code, err.message),
            _ => format!("HTTP {status}"),
        };
        if let Some(id) = request_id {
            message.push_str(&format!(" (opc-request-id {id})"));
        }
        message
    }

    impl OciStorage {
        /// Create from a `[storage]` section with `provider = "oci"`.
        pub async fn from_config(config: &StorageConfig) -> Result<Self> {
            let bucket = config.require_bucket()?;
            let user_ocid = config.require("user_ocid", config.user_ocid.as_deref())?;
            let tenancy_ocid = config.require("tenancy_ocid", config.tenancy_ocid.as_deref())?;
            let fingerprint = config.require("fingerprint", config.fingerprint.as_deref())?;
            let key_file = config.require("key_file", config.key_file.as_deref())?;
            if config.endpoint.is_none() {
                config.require("region", config.region.as_deref())?;
            }

            let key_path = expand_home(key_file);
            let private_key_pem = tokio::fs::read_to_string(&key_path).await.map_err(|e| {
                StorageError::Configuration(format!(
                    "cannot read OCI key file {}: {e}",
                    key_path.display()
                ))
            })?;

            Self::with_options(OciOptions {
                bucket,
                user_ocid,
                tenancy_ocid,
                fingerprint,
                private_key_pem: &private_key_pem,
                region: config.region.as_deref(),
                endpoint: config.endpoint.as_deref(),
            })
            .await
        }

        /// Create with full options. Resolves the tenancy namespace before returning.
        pub async fn with_options(opts: OciOptions<'_>) -> Result<Self> {
            let signer = RequestSigner::new(
                opts.tenancy_ocid,
                opts.user_ocid,
                opts.fingerprint,
                opts.private_key_pem,
            )?;

            let endpoint = match (opts.endpoint, opts.region) {
                (Some(endpoint), _) => endpoint.to_string(),
                (None, Some(region)) => format!("https://objectstorage.{region}.oraclecloud.com"),
                (None, None) => {
                    return Err(StorageError::Configuration(
                        "provider 'oci' requires option 'region' or 'endpoint'".into(),
                    ));
                }
            };
            let endpoint = Url::parse(&endpoint).map_err(|e| {
                StorageError::Configuration(format!("invalid OCI endpoint '{endpoint}': {e}"))
            })?;

            let http = reqwest::Client::builder()
                .user_agent(concat!("nimbus/", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|e| StorageError::Configuration(format!("cannot build HTTP client: {e}")))?;

            let client = OciClient {
                http,
                signer: Arc::new(signer),
                endpoint,
            };
            let namespace = resolve_namespace(&client).await?;
            tracing::info!(
                endpoint = %client.endpoint,
                namespace = %namespace,
                bucket = opts.bucket,
                "OCI object storage ready"
            );

            Ok(Self {
                client,
                namespace,
                bucket: opts.bucket.to_string(),
            })
        }

        /// Tenancy namespace resolved at construction.
        pub fn namespace(&self) -> &str {
            &self.namespace
        }

        fn object_url(&self, key: &str) -> Result<Url> {
            self.client.url(&[
                "n",
                self.namespace.as_str(),
                "b",
                self.bucket.as_str(),
                "o",
                key,
            ])
        }
    }

    /// `GET /n/` answers the tenancy namespace as a JSON string.
    async fn resolve_namespace(client: &OciClient) -> Result<String> {
        let url = client.url(&["n", ""])?;
        let response = client
            .send(Method::GET, url, None)
            .await
            .map_err(|e| StorageError::Configuration(format!("namespace lookup failed: {e}")))?;

        if !response.status().is_success() {
            return Err(StorageError::Configuration(format!(
                "namespace lookup rejected: {}",
                describe_failure(response).await
            )));
        }
        let namespace: String = response.json().await.map_err(|e| {
            StorageError::Configuration(format!("namespace lookup returned malformed body: {e}"))
        })?;
        if namespace.is_empty() {
            return Err(StorageError::Configuration(
                "namespace lookup returned an empty namespace".into(),
            ));
        }
        Ok(namespace)
    }

    #[async_trait]
    impl ObjectStorage for OciStorage {
        async fn save(&self, key: &str, data: &[u8]) -> Result<()> {
            tracing::debug!(bucket = %self.bucket, key, bytes = data.len(), "oci put_object");
            let url = self.object_url(key)?;
            let response = self
                .client
                .send(Method::PUT, url, Some(Bytes::copy_from_slice(data)))
                .await?;
            check(response, key).await?;
            Ok(())
        }

        async fn load_once(&self, key: &str) -> Result<Bytes> {
            tracing::debug!(bucket = %self.bucket, key, "oci get_object");
            let url = self.object_url(key)?;
            let response = self.client.send(Method::GET, url, None).await?;
            check(response, key)
                .await?
                .bytes()
                .await
                .map_err(|e| StorageError::backend(PROVIDER, e))
        }

        fn load_stream(&self, key: &str) -> ObjectStream {
            let client = self.client.clone();
            let url = self.object_url(key);
            let key = key.to_string();
            let bucket = self.bucket.clone();
            lazy_chunks(async move {
                tracing::debug!(bucket = %bucket, key = %key, "oci get_object (streamed)");
                let response = client.send(Method::GET, url?, None).await?;
                let response = check(response, &key).await?;
                Ok(response
                    .bytes_stream()
                    .map_err(|e| StorageError::backend(PROVIDER, e)))
            })
        }

        async fn exists(&self, key: &str) -> Result<bool> {
            tracing::debug!(bucket = %self.bucket, key, "oci head_object");
            let url = self.object_url(key)?;
            let response = self.client.send(Method::HEAD, url, None).await?;
            match check(response, key).await {
                Ok(_) => Ok(true),
                Err(e) if e.is_not_found() => Ok(false),
                Err(e) => Err(e),
            }
        }

        async fn delete(&self, key: &str) -> Result<()> {
            tracing::debug!(bucket = %self.bucket, key, "oci delete_object");
            let url = self.object_url(key)?;
            let response = self.client.send(Method::DELETE, url, None).await?;
            check(response, key).await?;
            Ok(())
        }
    }
}

#[cfg(feature = "oci")]
pub use inner::{OciOptions, OciStorage};
