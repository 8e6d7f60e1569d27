//! Cart Models
//!
//! Per-user shopping cart of sell-photo listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::photo::Photo;

/// Database row for a cart entry joined with listing data
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartItemRow {
    pub user_id: Uuid,
    pub photo_id: Uuid,
    pub added_at: DateTime<Utc>,
    pub seller_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: i64,
    pub status: String,
    pub object_key: String,
    pub photo_created_at: DateTime<Utc>,
    pub photo_updated_at: DateTime<Utc>,
}

/// Cart entry for API responses
#[derive(Debug, Serialize)]
pub struct CartItem {
    pub photo: Photo,
    pub added_at: DateTime<Utc>,
}

/// Full cart for API responses
#[derive(Debug, Serialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
    /// Sum of the item prices in the smallest currency unit
    pub total: i64,
}

impl Cart {
    pub fn new(items: Vec<CartItem>) -> Self {
        let total = items.iter().map(|item| item.photo.price).sum();
        Self { items, total }
    }
}

/// Request payload for adding a listing to the cart
#[derive(Debug, Clone, Deserialize)]
pub struct AddCartItemRequest {
    pub photo_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::photo::SellStatus;

    fn photo(price: i64) -> Photo {
        Photo {
            id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            title: "Sunset".to_string(),
            description: None,
            price,
            url: None,
            status: SellStatus::Available,
            buyer_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_cart_total_sums_item_prices() {
        let items = vec![
            CartItem {
                photo: photo(1000),
                added_at: Utc::now(),
            },
            CartItem {
                photo: photo(2500),
                added_at: Utc::now(),
            },
        ];

        let cart = Cart::new(items);
        assert_eq!(cart.total, 3500);
        assert_eq!(cart.items.len(), 2);
    }

    #[test]
    fn test_empty_cart_total_is_zero() {
        let cart = Cart::new(Vec::new());
        assert_eq!(cart.total, 0);
    }
}
