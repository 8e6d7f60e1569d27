//! Photo Service Implementation
//!
//! Sell-photo listings: upload, browse, update, and delete. Listings that are
//! waiting for payment or already sold are locked against edits.

use std::str::FromStr;
use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::database::Pagination;
use crate::models::photo::{
    CreatePhotoRequest, ListPhotosQuery, Photo, PhotoPage, PhotoRow, SellStatus,
    UpdatePhotoRequest,
};
use crate::service::storage::{file_extension, StorageService};
use crate::utils::error::{AppError, AppResult};

const PHOTO_COLUMNS: &str =
    "id, seller_id, title, description, price, object_key, status, buyer_id, created_at, updated_at";

/// Listing service backed by the database and object storage
#[derive(Clone)]
pub struct PhotoService {
    pool: PgPool,
    storage: Arc<StorageService>,
}

impl PhotoService {
    pub fn new(pool: PgPool, storage: Arc<StorageService>) -> Self {
        Self { pool, storage }
    }

    /// Create a listing from uploaded image bytes and metadata
    pub async fn create(
        &self,
        seller_id: Uuid,
        request: CreatePhotoRequest,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> AppResult<Photo> {
        request
            .validate()
            .map_err(|e| AppError::Validation(format!("Invalid photo data: {}", e)))?;

        if bytes.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }

        let extension = file_extension(filename)?;
        let key = StorageService::listing_key(seller_id, extension);
        self.storage.upload(&key, bytes, content_type).await?;

        let insert = sqlx::query_as::<_, PhotoRow>(&format!(
            r#"
            INSERT INTO photos (seller_id, title, description, price, object_key)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PHOTO_COLUMNS}
            "#
        ))
        .bind(seller_id)
        .bind(request.title.trim())
        .bind(request.description)
        .bind(request.price)
        .bind(&key)
        .fetch_one(&self.pool)
        .await;

        let row = match insert {
            Ok(row) => row,
            Err(e) => {
                // No listing row references the object; drop it
                if let Err(cleanup) = self.storage.delete(&key).await {
                    log::warn!("Failed to delete orphaned listing image: {}", cleanup);
                }
                return Err(e.into());
            }
        };

        log::info!("Photo {} listed by {}", row.id, seller_id);
        self.present(row).await
    }

    /// Fetch a single listing
    pub async fn get(&self, photo_id: Uuid) -> AppResult<Photo> {
        let row = self.find_row(photo_id).await?;
        self.present(row).await
    }

    /// Browse listings with optional seller and status filters
    pub async fn list(&self, query: ListPhotosQuery) -> AppResult<PhotoPage> {
        let pagination = Pagination::new(
            query.page.unwrap_or(1),
            query.per_page.unwrap_or(20),
        );
        let status = query.status.map(|s| s.as_str().to_string());

        let rows = sqlx::query_as::<_, PhotoRow>(&format!(
            r#"
            SELECT {PHOTO_COLUMNS}
            FROM photos
            WHERE ($1::uuid IS NULL OR seller_id = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(query.seller_id)
        .bind(&status)
        .bind(pagination.limit)
        .bind(pagination.offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM photos
            WHERE ($1::uuid IS NULL OR seller_id = $1)
              AND ($2::text IS NULL OR status = $2)
            "#,
        )
        .bind(query.seller_id)
        .bind(&status)
        .fetch_one(&self.pool)
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(self.present(row).await?);
        }

        Ok(PhotoPage {
            items,
            total,
            page: pagination.page,
            per_page: pagination.per_page,
            total_pages: pagination.total_pages(total),
        })
    }

    /// Update listing metadata; only the seller may edit, and only while the
    /// listing is still available
    pub async fn update(
        &self,
        seller_id: Uuid,
        photo_id: Uuid,
        request: UpdatePhotoRequest,
    ) -> AppResult<Photo> {
        request
            .validate()
            .map_err(|e| AppError::Validation(format!("Invalid photo data: {}", e)))?;

        let current = self.find_row(photo_id).await?;
        check_editable(&current, seller_id)?;

        // The status predicate re-checks under the write: a checkout may have
        // moved the listing to waiting since the read above.
        let row = sqlx::query_as::<_, PhotoRow>(&format!(
            r#"
            UPDATE photos
            SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                price = COALESCE($5, price),
                updated_at = NOW()
            WHERE id = $1 AND seller_id = $2 AND status = 'available'
            RETURNING {PHOTO_COLUMNS}
            "#
        ))
        .bind(photo_id)
        .bind(seller_id)
        .bind(request.title)
        .bind(request.description)
        .bind(request.price)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Conflict("Photo is locked by a transaction".to_string()))?;

        self.present(row).await
    }

    /// Delete a listing and its stored image; only while available
    pub async fn delete(&self, seller_id: Uuid, photo_id: Uuid) -> AppResult<()> {
        let current = self.find_row(photo_id).await?;
        check_editable(&current, seller_id)?;

        let result =
            sqlx::query("DELETE FROM photos WHERE id = $1 AND seller_id = $2 AND status = 'available'")
                .bind(photo_id)
                .bind(seller_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "Photo is locked by a transaction".to_string(),
            ));
        }

        if let Err(e) = self.storage.delete(&current.object_key).await {
            log::warn!("Failed to delete image for photo {}: {}", photo_id, e);
        }

        log::info!("Photo {} deleted by {}", photo_id, seller_id);
        Ok(())
    }

    async fn find_row(&self, photo_id: Uuid) -> AppResult<PhotoRow> {
        sqlx::query_as::<_, PhotoRow>(&format!("SELECT {PHOTO_COLUMNS} FROM photos WHERE id = $1"))
            .bind(photo_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Photo not found".to_string()))
    }

    async fn present(&self, row: PhotoRow) -> AppResult<Photo> {
        let url = self.storage.presign_get(&row.object_key).await.ok();
        Photo::from_row(row, url).map_err(AppError::Internal)
    }
}

/// Only the seller may edit, and only while the listing is still available
fn check_editable(row: &PhotoRow, seller_id: Uuid) -> AppResult<()> {
    if row.seller_id != seller_id {
        return Err(AppError::Forbidden(
            "Only the seller can modify this photo".to_string(),
        ));
    }

    let status = SellStatus::from_str(&row.status).map_err(AppError::Internal)?;
    if status != SellStatus::Available {
        return Err(AppError::Conflict(
            "Photo is locked by a transaction".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(seller_id: Uuid, status: &str) -> PhotoRow {
        PhotoRow {
            id: Uuid::new_v4(),
            seller_id,
            title: "Sunset".to_string(),
            description: None,
            price: 1000,
            object_key: "listings/sunset.jpg".to_string(),
            status: status.to_string(),
            buyer_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_check_editable_accepts_available_listing() {
        let seller = Uuid::new_v4();
        assert!(check_editable(&row(seller, "available"), seller).is_ok());
    }

    #[test]
    fn test_check_editable_rejects_other_sellers() {
        let listing = row(Uuid::new_v4(), "available");
        let result = check_editable(&listing, Uuid::new_v4());
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_check_editable_rejects_locked_listings() {
        let seller = Uuid::new_v4();
        for status in ["waiting", "sold"] {
            let result = check_editable(&row(seller, status), seller);
            assert!(matches!(result, Err(AppError::Conflict(_))));
        }
    }
}
