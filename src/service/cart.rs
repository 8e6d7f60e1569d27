//! Cart Service Implementation
//!
//! Per-user shopping cart. Only available listings can be added; entries for
//! photos bought in a settled transaction are removed during checkout.

use std::str::FromStr;
use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::cart::{Cart, CartItem, CartItemRow};
use crate::models::photo::{Photo, PhotoRow, SellStatus};
use crate::service::storage::StorageService;
use crate::utils::error::{AppError, AppResult};

/// Shopping cart service
#[derive(Clone)]
pub struct CartService {
    pool: PgPool,
    storage: Arc<StorageService>,
}

impl CartService {
    pub fn new(pool: PgPool, storage: Arc<StorageService>) -> Self {
        Self { pool, storage }
    }

    /// Add an available listing to the caller's cart
    pub async fn add(&self, user_id: Uuid, photo_id: Uuid) -> AppResult<Cart> {
        let photo: Option<(Uuid, String)> =
            sqlx::query_as("SELECT seller_id, status FROM photos WHERE id = $1")
                .bind(photo_id)
                .fetch_optional(&self.pool)
                .await?;

        let Some((seller_id, status)) = photo else {
            return Err(AppError::NotFound("Photo not found".to_string()));
        };

        if seller_id == user_id {
            return Err(AppError::BadRequest(
                "Cannot add your own photo to the cart".to_string(),
            ));
        }

        let status = SellStatus::from_str(&status).map_err(AppError::Internal)?;
        if status != SellStatus::Available {
            return Err(AppError::Conflict("Photo is not available".to_string()));
        }

        let result = sqlx::query(
            "INSERT INTO cart_items (user_id, photo_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(photo_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict("Photo is already in the cart".to_string()));
        }

        self.get(user_id).await
    }

    /// Fetch the caller's cart with presigned image URLs
    pub async fn get(&self, user_id: Uuid) -> AppResult<Cart> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            r#"
            SELECT c.user_id, c.photo_id, c.added_at,
                   p.seller_id, p.title, p.description, p.price, p.status, p.object_key,
                   p.created_at AS photo_created_at, p.updated_at AS photo_updated_at
            FROM cart_items c
            JOIN photos p ON p.id = c.photo_id
            WHERE c.user_id = $1
            ORDER BY c.added_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(self.present(row).await?);
        }

        Ok(Cart::new(items))
    }

    /// Remove a listing from the caller's cart
    pub async fn remove(&self, user_id: Uuid, photo_id: Uuid) -> AppResult<Cart> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND photo_id = $2")
            .bind(user_id)
            .bind(photo_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Photo is not in the cart".to_string()));
        }

        self.get(user_id).await
    }

    /// Empty the caller's cart
    pub async fn clear(&self, user_id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn present(&self, row: CartItemRow) -> AppResult<CartItem> {
        let url = self.storage.presign_get(&row.object_key).await.ok();

        let photo_row = PhotoRow {
            id: row.photo_id,
            seller_id: row.seller_id,
            title: row.title,
            description: row.description,
            price: row.price,
            object_key: row.object_key,
            status: row.status,
            buyer_id: None,
            created_at: row.photo_created_at,
            updated_at: row.photo_updated_at,
        };

        let photo = Photo::from_row(photo_row, url).map_err(AppError::Internal)?;
        Ok(CartItem {
            photo,
            added_at: row.added_at,
        })
    }
}
