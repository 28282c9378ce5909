//! Google Cloud Storage client.
//!
//! Uploads go through V4 signed URLs generated from a service account key,
//! so the store needs no SDK and no ambient credentials. Objects are
//! written publicly readable with role-appropriate content type and cache
//! policy headers, all of which are covered by the signature.

use crate::{ArtifactKind, ObjectStore, Result, StorageError};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Client;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Characters that must be percent-encoded in the path component
const PATH_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Signed URL lifetime; uploads start immediately after signing.
const SIGNED_URL_TTL: Duration = Duration::from_secs(300);

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GcsConfig {
    /// Bucket that receives the published artifacts.
    #[serde(default)]
    pub bucket: String,

    /// Storage host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Service account JSON, inline.
    #[serde(default)]
    pub service_account_json: Option<String>,

    /// Path to a service account JSON file.
    #[serde(default)]
    pub service_account_json_path: Option<PathBuf>,
}

fn default_host() -> String {
    "storage.googleapis.com".to_string()
}

impl Default for GcsConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            host: default_host(),
            service_account_json: None,
            service_account_json_path: None,
        }
    }
}

#[derive(Deserialize)]
struct ServiceAccount {
    client_email: String,
    private_key: String,
}

/// Object store backed by Google Cloud Storage.
#[derive(Debug)]
pub struct GcsStore {
    client_email: String,
    private_key: RsaPrivateKey,
    bucket: String,
    host: String,
    http_client: Client,
}

impl GcsStore {
    /// Create a store from configuration.
    pub fn from_config(cfg: &GcsConfig) -> Result<Self> {
        let raw_json = if let Some(ref inline) = cfg.service_account_json {
            inline.clone()
        } else if let Some(ref path) = cfg.service_account_json_path {
            fs::read_to_string(path).map_err(|e| {
                StorageError::Credentials(format!(
                    "failed to read service account JSON at {}: {e}",
                    path.display()
                ))
            })?
        } else {
            return Err(StorageError::Credentials(
                "no service account JSON provided".into(),
            ));
        };

        Self::new(&raw_json, &cfg.bucket, &cfg.host)
    }

    /// Create a store from raw parameters.
    pub fn new(service_account_json: &str, bucket: &str, host: &str) -> Result<Self> {
        let sa: ServiceAccount = serde_json::from_str(service_account_json)
            .map_err(|e| StorageError::Credentials(format!("invalid service account JSON: {e}")))?;

        let private_key = RsaPrivateKey::from_pkcs8_pem(&sa.private_key).map_err(|e| {
            StorageError::Credentials(format!("failed to parse service account private key: {e}"))
        })?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;

        info!(bucket = %bucket, "storage client initialized");

        Ok(Self {
            client_email: sa.client_email,
            private_key,
            bucket: bucket.to_string(),
            host: host.to_string(),
            http_client,
        })
    }

    /// Generate a V4 signed URL for a public-read PUT of one object.
    ///
    /// The content type, cache policy, and ACL travel as signed headers, so
    /// the upload request must send them exactly as given here.
    fn sign_put_url(&self, object_path: &str, kind: ArtifactKind) -> Result<String> {
        let now = Utc::now();
        let datestamp = now.format("%Y%m%d").to_string();
        let timestamp = now.format("%Y%m%dT%H%M%SZ").to_string();

        let credential_scope = format!("{datestamp}/auto/storage/goog4_request");
        let credential = format!("{}/{}", self.client_email, credential_scope);

        let canonical_uri = canonical_uri(&self.bucket, object_path);

        // Headers sorted by name, per the V4 canonical form.
        let canonical_headers = format!(
            "cache-control:{}\ncontent-type:{}\nhost:{}\nx-goog-acl:public-read\n",
            kind.cache_control(),
            kind.content_type(),
            self.host
        );
        let signed_headers = "cache-control;content-type;host;x-goog-acl";

        let expires = SIGNED_URL_TTL.as_secs();
        let mut query_items = vec![
            ("X-Goog-Algorithm", "GOOG4-RSA-SHA256".to_string()),
            (
                "X-Goog-Credential",
                urlencoding::encode(&credential).into_owned(),
            ),
            ("X-Goog-Date", timestamp.clone()),
            ("X-Goog-Expires", expires.to_string()),
            (
                "X-Goog-SignedHeaders",
                urlencoding::encode(signed_headers).into_owned(),
            ),
        ];

        query_items.sort_by(|a, b| a.0.cmp(b.0));
        let canonical_query = query_items
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let canonical_request = format!(
            "PUT\n{canonical_uri}\n{canonical_query}\n{canonical_headers}\n{signed_headers}\nUNSIGNED-PAYLOAD"
        );
        let canonical_hash = hex::encode(Sha256::digest(canonical_request.as_bytes()));

        let string_to_sign =
            format!("GOOG4-RSA-SHA256\n{timestamp}\n{credential_scope}\n{canonical_hash}");

        let signing_key = SigningKey::<Sha256>::new(self.private_key.clone());
        let signature = signing_key.sign(string_to_sign.as_bytes()).to_bytes();
        let signature_hex = hex::encode(signature);

        let query_with_sig = format!("{canonical_query}&X-Goog-Signature={signature_hex}");
        Ok(format!(
            "https://{host}{canonical_uri}?{query_with_sig}",
            host = self.host
        ))
    }
}

#[async_trait]
impl ObjectStore for GcsStore {
    async fn put(&self, object_path: &str, data: Bytes, kind: ArtifactKind) -> Result<()> {
        let signed_url = self.sign_put_url(object_path, kind)?;

        debug!(object_path = %object_path, size = data.len(), "uploading to GCS");

        let response = self
            .http_client
            .put(&signed_url)
            .header("Content-Type", kind.content_type())
            .header("Cache-Control", kind.cache_control())
            .header("x-goog-acl", "public-read")
            .body(data.clone())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(StorageError::Status { status, message });
        }

        info!(object_path = %object_path, size = data.len(), "uploaded to GCS");
        Ok(())
    }

    fn public_url(&self, object_path: &str) -> String {
        format!("https://{}/{}/{}", self.host, self.bucket, object_path)
    }
}

fn canonical_uri(bucket: &str, object_path: &str) -> String {
    let encoded_object = utf8_percent_encode(object_path, PATH_SET).to_string();
    format!(
        "/{}{}",
        bucket,
        if encoded_object.starts_with('/') {
            encoded_object
        } else {
            format!("/{}", encoded_object)
        }
    )
}
