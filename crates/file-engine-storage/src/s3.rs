use crate::keys;
use crate::traits::{ByteReader, ByteStream, ObjectInfo, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use futures::StreamExt;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::buffered::BufWriter;
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, AttributeValue, Attributes, GetOptions, ObjectStoreExt, Result as ObjectResult,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

const DEFAULT_REGION: &str = "us-east-1";
const CONTAINER_PROBE_TTL: Duration = Duration::from_secs(60);

/// S3 storage implementation
///
/// Each container maps to one bucket, and one `AmazonS3` client is built per bucket on
/// first use. Buckets are created on demand.
#[derive(Clone)]
pub struct S3Storage {
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
    stores: Arc<RwLock<HashMap<String, Arc<AmazonS3>>>>,
    ensured: Arc<RwLock<HashSet<String>>>,
    http: reqwest::Client,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub fn new(region: String, endpoint_url: Option<String>) -> StorageResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            region,
            endpoint_url,
            stores: Arc::new(RwLock::new(HashMap::new())),
            ensured: Arc::new(RwLock::new(HashSet::new())),
            http,
        })
    }

    /// Return the client for `container`, building and caching it on first use.
    async fn store_for(&self, container: &str) -> StorageResult<Arc<AmazonS3>> {
        keys::validate_container(container)?;

        if let Some(store) = self.stores.read().await.get(container) {
            return Ok(store.clone());
        }

        let mut builder = AmazonS3Builder::from_env()
            .with_region(self.region.clone())
            .with_bucket_name(container.to_string());

        if let Some(ref endpoint) = self.endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = Arc::new(
            builder
                .build()
                .map_err(|e| StorageError::ConfigError(e.to_string()))?,
        );

        let mut stores = self.stores.write().await;
        Ok(stores
            .entry(container.to_string())
            .or_insert(store)
            .clone())
    }

    async fn ensured_store(&self, container: &str) -> StorageResult<Arc<AmazonS3>> {
        self.ensure_container(container).await?;
        self.store_for(container).await
    }

    async fn bucket_url(&self, store: &AmazonS3, method: Method) -> StorageResult<String> {
        let url_result: ObjectResult<_> = store
            .signed_url(method, &Path::from(""), CONTAINER_PROBE_TTL)
            .await;
        Ok(url_result
            .map_err(|e| StorageError::BackendError(e.to_string()))?
            .to_string())
    }

    async fn create_bucket(&self, store: &AmazonS3, container: &str) -> StorageResult<()> {
        let url = self.bucket_url(store, Method::PUT).await?;
        let mut request = self.http.put(url);
        if let Some(body) = create_bucket_body(&self.region) {
            request = request.body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StorageError::BackendError(format!("Create bucket request failed: {}", e)))?;

        match response.status().as_u16() {
            200..=299 => {
                tracing::info!(bucket = %container, region = %self.region, "S3 bucket created");
                Ok(())
            }
            // Created concurrently, or already owned by us
            409 => Ok(()),
            status => {
                let body = response.text().await.unwrap_or_default();
                tracing::error!(
                    bucket = %container,
                    status = status,
                    body = %body,
                    "S3 bucket creation failed"
                );
                Err(StorageError::BackendError(format!(
                    "Failed to create bucket {}: HTTP {}",
                    container, status
                )))
            }
        }
    }
}

/// `CreateBucketConfiguration` body. us-east-1 rejects an explicit constraint.
fn create_bucket_body(region: &str) -> Option<String> {
    if region.is_empty() || region == DEFAULT_REGION {
        return None;
    }
    Some(format!(
        "<CreateBucketConfiguration xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
         <LocationConstraint>{}</LocationConstraint></CreateBucketConfiguration>",
        region
    ))
}

fn not_found_or(
    e: ObjectStoreError,
    container: &str,
    key: &str,
    wrap: fn(String) -> StorageError,
) -> StorageError {
    match e {
        ObjectStoreError::NotFound { .. } => StorageError::NotFound(format!("{}/{}", container, key)),
        other => wrap(other.to_string()),
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn upload(
        &self,
        container: &str,
        key: &str,
        mut reader: ByteReader,
        size: Option<u64>,
        content_type: &str,
    ) -> StorageResult<u64> {
        keys::validate_key(key)?;
        let s3 = self.ensured_store(container).await?;
        let start = std::time::Instant::now();
        let location = Path::from(key.to_string());

        // Multipart writes cannot carry a create-only condition, so the existence check
        // leaves a window until the final part completes.
        match s3.head(&location).await {
            Ok(_) => {
                return Err(StorageError::AlreadyExists(format!("{}/{}", container, key)));
            }
            Err(ObjectStoreError::NotFound { .. }) => {}
            Err(e) => return Err(StorageError::BackendError(e.to_string())),
        }
        let store: Arc<dyn object_store::ObjectStore> = s3;

        let mut attributes = Attributes::new();
        attributes.insert(
            Attribute::ContentType,
            AttributeValue::from(content_type.to_string()),
        );

        let mut writer =
            BufWriter::new(store, location).with_attributes(attributes);

        let copied = match tokio::io::copy(&mut reader, &mut writer).await {
            Ok(n) => writer.shutdown().await.map(|_| n),
            Err(e) => Err(e),
        };

        match copied {
            Ok(bytes_written) => {
                tracing::info!(
                    bucket = %container,
                    key = %key,
                    size_bytes = bytes_written,
                    declared_size = ?size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 stream upload successful"
                );
                Ok(bytes_written)
            }
            Err(e) => {
                if let Err(abort_err) = writer.abort().await {
                    tracing::warn!(
                        error = %abort_err,
                        bucket = %container,
                        key = %key,
                        "Failed to abort S3 multipart upload"
                    );
                }
                tracing::error!(
                    error = %e,
                    bucket = %container,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 stream upload failed"
                );
                Err(StorageError::UploadFailed(e.to_string()))
            }
        }
    }

    async fn download(&self, container: &str, key: &str) -> StorageResult<ByteStream> {
        keys::validate_key(key)?;
        let store = self.store_for(container).await?;
        let start = std::time::Instant::now();
        let location = Path::from(key.to_string());

        let result: ObjectResult<_> = store.get(&location).await;
        let result = result.map_err(|e| {
            let err = not_found_or(e, container, key, StorageError::DownloadFailed);
            if !err.is_not_found() {
                tracing::error!(
                    error = %err,
                    bucket = %container,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 download failed"
                );
            }
            err
        })?;

        let bucket = container.to_string();
        let key = key.to_string();
        let stream = result.into_stream().map(move |res| {
            res.map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 stream download error"
                );
                StorageError::DownloadFailed(e.to_string())
            })
        });

        Ok(Box::pin(stream))
    }

    async fn delete(&self, container: &str, key: &str) -> StorageResult<()> {
        keys::validate_key(key)?;
        let store = self.store_for(container).await?;
        let start = std::time::Instant::now();
        let location = Path::from(key.to_string());

        let result: ObjectResult<_> = store.delete(&location).await;
        match result {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => {}
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %container,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                return Err(StorageError::DeleteFailed(e.to_string()));
            }
        }

        tracing::info!(
            bucket = %container,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn exists(&self, container: &str, key: &str) -> StorageResult<bool> {
        keys::validate_key(key)?;
        let store = self.store_for(container).await?;
        let location = Path::from(key.to_string());
        match store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn stat(&self, container: &str, key: &str) -> StorageResult<ObjectInfo> {
        keys::validate_key(key)?;
        let store = self.store_for(container).await?;
        let location = Path::from(key.to_string());
        let options = GetOptions {
            head: true,
            ..Default::default()
        };

        let result = object_store::ObjectStore::get_opts(&*store, &location, options)
            .await
            .map_err(|e| not_found_or(e, container, key, StorageError::BackendError))?;

        let content_type = result
            .attributes
            .get(&Attribute::ContentType)
            .map(|value| {
                let value: &str = value.as_ref();
                value.to_string()
            })
            .unwrap_or_else(|| file_engine_core::constants::DEFAULT_CONTENT_TYPE.to_string());

        Ok(ObjectInfo {
            key: key.to_string(),
            size: result.meta.size,
            content_type,
            last_modified: result.meta.last_modified,
            etag: result.meta.e_tag,
        })
    }

    async fn presign_upload(
        &self,
        container: &str,
        key: &str,
        ttl: Duration,
    ) -> StorageResult<String> {
        keys::validate_key(key)?;
        let store = self.ensured_store(container).await?;
        let location = Path::from(key.to_string());

        let url_result: ObjectResult<_> = store.signed_url(Method::PUT, &location, ttl).await;
        let url = url_result
            .map_err(|e| StorageError::BackendError(e.to_string()))?
            .to_string();

        Ok(url)
    }

    async fn presign_download(
        &self,
        container: &str,
        key: &str,
        ttl: Duration,
    ) -> StorageResult<String> {
        keys::validate_key(key)?;
        let store = self.store_for(container).await?;
        let location = Path::from(key.to_string());

        let url_result: ObjectResult<_> = store.signed_url(Method::GET, &location, ttl).await;
        let url = url_result
            .map_err(|e| StorageError::BackendError(e.to_string()))?
            .to_string();

        Ok(url)
    }

    async fn ensure_container(&self, container: &str) -> StorageResult<()> {
        if self.ensured.read().await.contains(container) {
            return Ok(());
        }

        let store = self.store_for(container).await?;
        let url = self.bucket_url(&store, Method::HEAD).await?;
        let response = self
            .http
            .head(url)
            .send()
            .await
            .map_err(|e| StorageError::BackendError(format!("Bucket probe failed: {}", e)))?;

        match response.status().as_u16() {
            200..=299 => {}
            404 => self.create_bucket(&store, container).await?,
            status => {
                return Err(StorageError::BackendError(format!(
                    "Bucket {} is not accessible: HTTP {}",
                    container, status
                )));
            }
        }

        self.ensured.write().await.insert(container.to_string());
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_bucket_body() {
        assert!(create_bucket_body("us-east-1").is_none());
        assert!(create_bucket_body("").is_none());

        let body = create_bucket_body("eu-west-1").unwrap();
        assert!(body.contains("<LocationConstraint>eu-west-1</LocationConstraint>"));
    }

    #[tokio::test]
    async fn test_store_cache_per_container() {
        let storage = S3Storage::new(
            "us-east-1".to_string(),
            Some("http://localhost:9000".to_string()),
        )
        .unwrap();

        let a = storage.store_for("bucket-a").await.unwrap();
        let again = storage.store_for("bucket-a").await.unwrap();
        let b = storage.store_for("bucket-b").await.unwrap();

        assert!(Arc::ptr_eq(&a, &again));
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(matches!(
            storage.store_for("Bad_Bucket").await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
