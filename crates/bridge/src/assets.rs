//! Asset upload to an S3-compatible object store (MinIO in the default
//! deployment), signed with SigV4.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use vibeforge_core::error::ToolError;
use vibeforge_core::tool::{AssetUpload, PutAssetOutput, ToolKind};

use crate::sigv4::{self, Credentials};

#[async_trait]
pub trait AssetStore: Send + Sync {
    fn name(&self) -> &str;

    /// Make sure the target bucket exists.
    async fn ensure_bucket(&self) -> Result<(), ToolError> {
        Ok(())
    }

    async fn put(&self, upload: &AssetUpload) -> Result<PutAssetOutput, ToolError>;
}

fn failed(reason: impl Into<String>) -> ToolError {
    ToolError::failed(ToolKind::PutAsset.name(), reason)
}

/// Where assets go and how their public locator is formed.
#[derive(Debug, Clone)]
pub struct BucketLocation {
    pub endpoint: String,
    pub port: u16,
    pub use_ssl: bool,
    pub bucket: String,
    pub region: String,
}

impl BucketLocation {
    pub fn from_config(config: &vibeforge_config::ObjectStoreConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            port: config.port,
            use_ssl: config.use_ssl,
            bucket: config.bucket.clone(),
            region: config.region.clone(),
        }
    }

    fn scheme(&self) -> &'static str {
        if self.use_ssl { "https" } else { "http" }
    }

    fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme(), self.endpoint, self.port)
    }

    /// The `Host` header value; the port is dropped when it is the scheme default.
    fn host(&self) -> String {
        match (self.use_ssl, self.port) {
            (false, 80) | (true, 443) => self.endpoint.clone(),
            _ => format!("{}:{}", self.endpoint, self.port),
        }
    }

    /// Public locator handed back to the model. The whole key is escaped,
    /// slashes included.
    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.base_url(), self.bucket, urlencoding::encode(key))
    }
}

/// SigV4-signing client for an S3-compatible endpoint.
pub struct S3AssetStore {
    client: reqwest::Client,
    location: BucketLocation,
    credentials: Credentials,
}

impl S3AssetStore {
    pub fn new(client: reqwest::Client, location: BucketLocation, credentials: Credentials) -> Self {
        Self {
            client,
            location,
            credentials,
        }
    }

    /// Build from configuration. `None` when no access keys are configured.
    pub fn from_config(
        client: reqwest::Client,
        config: &vibeforge_config::ObjectStoreConfig,
    ) -> Option<Self> {
        let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) else {
            return None;
        };
        Some(Self::new(
            client,
            BucketLocation::from_config(config),
            Credentials {
                access_key: access_key.clone(),
                secret_key: secret_key.clone(),
            },
        ))
    }

    fn signed(
        &self,
        method: reqwest::Method,
        uri: &str,
        content_type: Option<&str>,
        body: Vec<u8>,
    ) -> reqwest::RequestBuilder {
        let now = Utc::now();
        let payload_hash = sigv4::payload_hash(&body);
        let mut headers = vec![
            ("host".to_string(), self.location.host()),
            ("x-amz-content-sha256".to_string(), payload_hash.clone()),
            ("x-amz-date".to_string(), sigv4::amz_date(now)),
        ];
        if let Some(content_type) = content_type {
            headers.push(("content-type".to_string(), content_type.to_string()));
        }

        let authorization = sigv4::authorization(
            &self.credentials,
            &self.location.region,
            "s3",
            &sigv4::CanonicalRequest {
                method: method.as_str(),
                uri,
                query: "",
                headers: &headers,
                payload_hash: &payload_hash,
            },
            now,
        );

        let mut request = self
            .client
            .request(method, format!("{}{uri}", self.location.base_url()))
            .header("authorization", authorization);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        request.body(body)
    }
}

#[async_trait]
impl AssetStore for S3AssetStore {
    fn name(&self) -> &str {
        "s3"
    }

    async fn ensure_bucket(&self) -> Result<(), ToolError> {
        let uri = format!("/{}", self.location.bucket);

        let head = self
            .signed(reqwest::Method::HEAD, &uri, None, Vec::new())
            .send()
            .await
            .map_err(|e| failed(format!("object store unreachable: {e}")))?;

        if head.status().is_success() {
            return Ok(());
        }
        if head.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(failed(format!(
                "bucket check returned {}",
                head.status().as_u16()
            )));
        }

        let created = self
            .signed(reqwest::Method::PUT, &uri, None, Vec::new())
            .send()
            .await
            .map_err(|e| failed(format!("object store unreachable: {e}")))?;

        if !created.status().is_success() {
            let status = created.status().as_u16();
            let text = created.text().await.unwrap_or_default();
            return Err(failed(format!("bucket creation returned {status}: {text}")));
        }

        info!(bucket = %self.location.bucket, "Created asset bucket");
        Ok(())
    }

    async fn put(&self, upload: &AssetUpload) -> Result<PutAssetOutput, ToolError> {
        let uri = format!(
            "/{}/{}",
            self.location.bucket,
            sigv4::encode_key_path(&upload.key)
        );

        let response = self
            .signed(
                reqwest::Method::PUT,
                &uri,
                Some(&upload.content_type),
                upload.bytes.clone(),
            )
            .send()
            .await
            .map_err(|e| failed(format!("object store unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(failed(format!("upload returned {}: {text}", status.as_u16())));
        }

        debug!(key = %upload.key, bytes = upload.bytes.len(), "Asset uploaded");
        Ok(PutAssetOutput {
            key: upload.key.clone(),
            url: self.location.object_url(&upload.key),
        })
    }
}

/// Process-local asset store, for tests and offline runs.
#[derive(Clone)]
pub struct InMemoryAssetStore {
    location: BucketLocation,
    objects: Arc<RwLock<HashMap<String, (String, Vec<u8>)>>>,
}

impl InMemoryAssetStore {
    pub fn new(location: BucketLocation) -> Self {
        Self {
            location,
            objects: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Content type and bytes stored under `key`.
    pub async fn get(&self, key: &str) -> Option<(String, Vec<u8>)> {
        self.objects.read().await.get(key).cloned()
    }
}

#[async_trait]
impl AssetStore for InMemoryAssetStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn put(&self, upload: &AssetUpload) -> Result<PutAssetOutput, ToolError> {
        self.objects.write().await.insert(
            upload.key.clone(),
            (upload.content_type.clone(), upload.bytes.clone()),
        );
        Ok(PutAssetOutput {
            key: upload.key.clone(),
            url: self.location.object_url(&upload.key),
        })
    }
}
