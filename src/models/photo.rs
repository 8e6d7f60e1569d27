//! Photo Models
//!
//! Sell-photo listings and their lifecycle. A listing starts AVAILABLE, moves
//! to WAITING while a transaction is pending payment, and becomes SOLD when
//! the payment settles (or returns to AVAILABLE when it fails).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Lifecycle status of a sell-photo listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SellStatus {
    Available,
    Waiting,
    Sold,
}

impl SellStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SellStatus::Available => "available",
            SellStatus::Waiting => "waiting",
            SellStatus::Sold => "sold",
        }
    }
}

impl FromStr for SellStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(SellStatus::Available),
            "waiting" => Ok(SellStatus::Waiting),
            "sold" => Ok(SellStatus::Sold),
            other => Err(format!("Unknown sell status: {}", other)),
        }
    }
}

impl fmt::Display for SellStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database row for a listing; `status` is stored as text
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PhotoRow {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: i64,
    pub object_key: String,
    pub status: String,
    pub buyer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sell-photo listing for API responses
#[derive(Debug, Clone, Serialize)]
pub struct Photo {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: i64,
    /// Presigned URL for the image
    pub url: Option<String>,
    pub status: SellStatus,
    pub buyer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Photo {
    pub fn from_row(row: PhotoRow, url: Option<String>) -> Result<Self, String> {
        let status = SellStatus::from_str(&row.status)?;
        Ok(Self {
            id: row.id,
            seller_id: row.seller_id,
            title: row.title,
            description: row.description,
            price: row.price,
            url,
            status,
            buyer_id: row.buyer_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Metadata fields accompanying a photo upload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePhotoRequest {
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,

    #[validate(length(max = 2000, message = "Description is too long"))]
    pub description: Option<String>,

    #[validate(range(min = 1, message = "Price must be greater than zero"))]
    pub price: i64,
}

/// Request payload for updating listing metadata
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdatePhotoRequest {
    #[validate(length(min = 1, max = 255, message = "Title cannot be empty"))]
    pub title: Option<String>,

    #[validate(length(max = 2000, message = "Description is too long"))]
    pub description: Option<String>,

    #[validate(range(min = 1, message = "Price must be greater than zero"))]
    pub price: Option<i64>,
}

/// Query parameters for listing photos
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ListPhotosQuery {
    pub seller_id: Option<Uuid>,
    pub status: Option<SellStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Paginated listing response
#[derive(Debug, Serialize)]
pub struct PhotoPage {
    pub items: Vec<Photo>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sell_status_round_trip() {
        for status in [SellStatus::Available, SellStatus::Waiting, SellStatus::Sold] {
            assert_eq!(SellStatus::from_str(status.as_str()).unwrap(), status);
        }
        assert!(SellStatus::from_str("deleted").is_err());
    }

    #[test]
    fn test_sell_status_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&SellStatus::Waiting).unwrap(),
            "\"waiting\""
        );
        let parsed: SellStatus = serde_json::from_str("\"sold\"").unwrap();
        assert_eq!(parsed, SellStatus::Sold);
    }

    #[test]
    fn test_photo_from_row_rejects_unknown_status() {
        let row = PhotoRow {
            id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            title: "Sunset".to_string(),
            description: None,
            price: 1000,
            object_key: "photos/sunset.jpg".to_string(),
            status: "archived".to_string(),
            buyer_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(Photo::from_row(row, None).is_err());
    }

    #[test]
    fn test_create_photo_request_validation() {
        let valid = CreatePhotoRequest {
            title: "Sunset".to_string(),
            description: Some("Golden hour".to_string()),
            price: 1500,
        };
        assert!(valid.validate().is_ok());

        let free = CreatePhotoRequest { price: 0, ..valid };
        assert!(free.validate().is_err());
    }
}
