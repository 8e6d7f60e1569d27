//! Object Storage Service
//!
//! Uploads profile and listing images to an S3-compatible bucket and issues
//! presigned GET URLs for reads.

use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::utils::error::{AppError, AppResult};

/// S3-backed storage for user and listing images
#[derive(Clone)]
pub struct StorageService {
    client: aws_sdk_s3::Client,
    bucket: String,
    presign_expires: Duration,
}

impl StorageService {
    /// Build the S3 client from environment credentials and configuration
    pub async fn from_config(config: &StorageConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        Self {
            client: aws_sdk_s3::Client::new(&sdk_config),
            bucket: config.bucket.clone(),
            presign_expires: Duration::from_secs(config.presign_expires_seconds),
        }
    }

    /// Build an object key for a profile photo upload
    pub fn profile_key(user_id: Uuid, extension: &str) -> String {
        format!("profile/{}_{}.{}", Uuid::new_v4(), user_id, extension)
    }

    /// Build an object key for a listing image upload
    pub fn listing_key(seller_id: Uuid, extension: &str) -> String {
        format!("photos/{}_{}.{}", Uuid::new_v4(), seller_id, extension)
    }

    /// Upload raw bytes under the given key
    pub async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Object upload failed: {}", e)))?;

        Ok(())
    }

    /// Delete an object; missing keys are not an error
    pub async fn delete(&self, key: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Object delete failed: {}", e)))?;

        Ok(())
    }

    /// Issue a presigned GET URL for the given key
    pub async fn presign_get(&self, key: &str) -> AppResult<String> {
        let presigning = PresigningConfig::expires_in(self.presign_expires)
            .map_err(|e| AppError::Internal(format!("Invalid presign expiry: {}", e)))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| AppError::ExternalService(format!("Presigning failed: {}", e)))?;

        Ok(request.uri().to_string())
    }

    /// Presign an optional key; None passes through
    pub async fn presign_optional(&self, key: Option<&str>) -> AppResult<Option<String>> {
        match key {
            Some(key) => Ok(Some(self.presign_get(key).await?)),
            None => Ok(None),
        }
    }
}

/// Pick a safe file extension from an uploaded file name
pub fn file_extension(filename: &str) -> AppResult<&str> {
    let extension = filename
        .rsplit('.')
        .next()
        .filter(|ext| !ext.is_empty() && ext.len() <= 8)
        .ok_or_else(|| AppError::Validation("File name has no extension".to_string()))?;

    if !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::Validation("Invalid file extension".to_string()));
    }

    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" | "png" | "webp" => Ok(extension),
        _ => Err(AppError::Validation(
            "Only jpg, jpeg, png and webp files are accepted".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension_accepts_images() {
        assert_eq!(file_extension("sunset.jpg").unwrap(), "jpg");
        assert_eq!(file_extension("portrait.final.PNG").unwrap(), "PNG");
    }

    #[test]
    fn test_file_extension_rejects_non_images() {
        assert!(file_extension("script.exe").is_err());
        assert!(file_extension("noextension").is_err());
        assert!(file_extension("weird.j/pg").is_err());
    }

    #[test]
    fn test_key_layout() {
        let user_id = Uuid::new_v4();
        let key = StorageService::profile_key(user_id, "jpg");
        assert!(key.starts_with("profile/"));
        assert!(key.ends_with(&format!("_{}.jpg", user_id)));

        let listing = StorageService::listing_key(user_id, "png");
        assert!(listing.starts_with("photos/"));
    }
}
