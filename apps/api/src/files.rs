use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// An uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Empty upload")]
    Empty,
}

/// Opaque blob storage. The returned reference is stored verbatim and never parsed.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        body: Bytes,
    ) -> Result<String, FileStoreError>;
}

const MAX_KEY_NAME_LEN: usize = 100;

/// Builds `{prefix}/{owner_id}/{uuid}_{sanitized file name}`.
pub fn object_key(prefix: &str, owner_id: i64, file_name: &str) -> String {
    let mut sanitized: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    while sanitized.contains("..") {
        sanitized = sanitized.replace("..", "_");
    }
    let sanitized = sanitized.trim_start_matches('.');
    let name = if sanitized.is_empty() { "upload" } else { sanitized };
    // Keep the tail so the extension survives.
    let skip = name.len().saturating_sub(MAX_KEY_NAME_LEN);
    format!("{prefix}/{owner_id}/{}_{}", Uuid::new_v4(), &name[skip..])
}

/// S3 / MinIO backed store.
pub struct S3FileStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3FileStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl FileStore for S3FileStore {
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        body: Bytes,
    ) -> Result<String, FileStoreError> {
        if body.is_empty() {
            return Err(FileStoreError::Empty);
        }
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| FileStoreError::Upload(format!("S3 upload failed: {e}")))?;

        info!("Uploaded s3://{}/{}", self.bucket, key);
        Ok(key.to_string())
    }
}
