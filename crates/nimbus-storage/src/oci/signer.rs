//! OCI API request signing (draft-cavage HTTP signatures, RSA-SHA256).
//!
//! Object Storage accepts a signature over `date`, `(request-target)` and
//! `host` for every object operation, including PUT, so request bodies are
//! never hashed here.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Method, Url};
use rsa::RsaPrivateKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use sha2::Sha256;
use std::fmt;

use nimbus_core::{Result, StorageError};

pub(crate) const SIGNED_HEADERS: &str = "date (request-target) host";

/// Holds the API signing key and the `keyId` it is registered under.
pub struct RequestSigner {
    key_id: String,
    signing_key: SigningKey<Sha256>,
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("key_id", &self.key_id)
            .field("signing_key", &"[REDACTED]")
            .finish()
    }
}

impl RequestSigner {
    /// Build a signer from a PEM private key (PKCS#8 or PKCS#1).
    pub fn new(tenancy: &str, user: &str, fingerprint: &str, private_key_pem: &str) -> Result<Self> {
        let key = RsaPrivateKey::from_pkcs8_pem(private_key_pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(private_key_pem))
            .map_err(|e| StorageError::Configuration(format!("invalid OCI API key: {e}")))?;

        Ok(Self {
            key_id: format!("{tenancy}/{user}/{fingerprint}"),
            signing_key: SigningKey::<Sha256>::new(key),
        })
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Value of the `Authorization` header for a request to `url` sent with `date`.
    pub fn authorization(&self, method: &Method, url: &Url, date: &str) -> Result<String> {
        let signing_string = signing_string(method, url, date)?;
        let signature = self
            .signing_key
            .try_sign(signing_string.as_bytes())
            .map_err(|e| StorageError::backend("oci", e))?;
        let encoded = STANDARD.encode(signature.to_bytes());

        Ok(format!(
            r#"Signature version="1",keyId="{}",algorithm="rsa-sha256",headers="{SIGNED_HEADERS}",signature="{encoded}""#,
            self.key_id
        ))
    }
}

/// `host[:port]` exactly as the HTTP client will send it.
pub(crate) fn host_header(url: &Url) -> Result<String> {
    let host = url
        .host_str()
        .ok_or_else(|| StorageError::Configuration(format!("endpoint {url} has no host")))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

pub(crate) fn signing_string(method: &Method, url: &Url, date: &str) -> Result<String> {
    let mut target = url.path().to_string();
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }
    Ok(format!(
        "date: {date}\n(request-target): {} {target}\nhost: {}",
        method.as_str().to_lowercase(),
        host_header(url)?
    ))
}
