//! Transaction Models
//!
//! Purchase transactions, their payment state, and the `/api/transaction`
//! payloads including the gateway notification format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Lifecycle status of a purchase transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Paid,
    Expired,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Paid => "paid",
            TransactionStatus::Expired => "expired",
            TransactionStatus::Cancelled => "cancelled",
        }
    }

    /// Map a gateway transaction status to the local status.
    ///
    /// Unknown gateway statuses are rejected; the webhook turns that into a
    /// client error.
    pub fn from_gateway_status(status: &str) -> Option<Self> {
        match status {
            "settlement" => Some(TransactionStatus::Paid),
            "expire" => Some(TransactionStatus::Expired),
            "cancel" | "deny" => Some(TransactionStatus::Cancelled),
            "pending" => Some(TransactionStatus::Pending),
            _ => None,
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "paid" => Ok(TransactionStatus::Paid),
            "expired" => Ok(TransactionStatus::Expired),
            "cancelled" => Ok(TransactionStatus::Cancelled),
            other => Err(format!("Unknown transaction status: {}", other)),
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database row for a transaction; statuses stored as text
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransactionRow {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub total: i64,
    pub status: String,
    pub payment_id: Option<String>,
    pub payment_status: Option<String>,
    pub payment_url: Option<String>,
    pub payment_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row for one purchased photo within a transaction
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransactionDetailRow {
    pub transaction_id: Uuid,
    pub seller_id: Uuid,
    pub photo_id: Uuid,
    pub price: i64,
}

/// Payment information recorded from the gateway charge
#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    pub id: String,
    pub status: String,
    /// URL the buyer opens to complete the QRIS payment
    pub url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// One seller's portion of a transaction for API responses
#[derive(Debug, Clone, Serialize)]
pub struct TransactionDetail {
    pub seller_id: Uuid,
    pub photo_ids: Vec<Uuid>,
    pub subtotal: i64,
}

/// Purchase transaction for API responses
#[derive(Debug, Serialize)]
pub struct Transaction {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub details: Vec<TransactionDetail>,
    pub total: i64,
    pub status: TransactionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<Payment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Assemble a response from a transaction row and its detail rows,
    /// grouping photos per seller.
    pub fn from_rows(
        row: TransactionRow,
        details: Vec<TransactionDetailRow>,
    ) -> Result<Self, String> {
        let status = TransactionStatus::from_str(&row.status)?;

        let mut grouped: Vec<TransactionDetail> = Vec::new();
        for detail in details {
            match grouped
                .iter()
                .position(|entry| entry.seller_id == detail.seller_id)
            {
                Some(index) => {
                    grouped[index].photo_ids.push(detail.photo_id);
                    grouped[index].subtotal += detail.price;
                }
                None => grouped.push(TransactionDetail {
                    seller_id: detail.seller_id,
                    photo_ids: vec![detail.photo_id],
                    subtotal: detail.price,
                }),
            }
        }

        let payment = row.payment_id.map(|id| Payment {
            id,
            status: row.payment_status.unwrap_or_else(|| "pending".to_string()),
            url: row.payment_url,
            expires_at: row.payment_expires_at,
        });

        Ok(Self {
            id: row.id,
            buyer_id: row.buyer_id,
            details: grouped,
            total: row.total,
            status,
            payment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// One seller's photos in a checkout request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CheckoutDetail {
    pub seller_id: Uuid,

    #[validate(length(min = 1, message = "At least one photo is required"))]
    pub photo_ids: Vec<Uuid>,
}

/// Request payload for creating a transaction
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTransactionRequest {
    #[validate(length(min = 1, message = "Details are required"))]
    pub details: Vec<CheckoutDetail>,

    #[validate(range(min = 1, message = "Total must be greater than zero"))]
    pub total: i64,
}

/// Which side of a transaction the caller wants listed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionRole {
    #[default]
    Buyer,
    Seller,
}

/// Query parameters for listing transactions
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ListTransactionsQuery {
    #[serde(default)]
    pub role: TransactionRole,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Paginated transaction listing
#[derive(Debug, Serialize)]
pub struct TransactionPage {
    pub items: Vec<Transaction>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

/// Payment notification delivered by the gateway webhook
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentNotification {
    pub order_id: String,
    pub status_code: String,
    pub gross_amount: String,
    pub signature_key: String,
    pub transaction_status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_status_round_trip() {
        for status in [
            TransactionStatus::Pending,
            TransactionStatus::Paid,
            TransactionStatus::Expired,
            TransactionStatus::Cancelled,
        ] {
            assert_eq!(TransactionStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn test_gateway_status_mapping() {
        assert_eq!(
            TransactionStatus::from_gateway_status("settlement"),
            Some(TransactionStatus::Paid)
        );
        assert_eq!(
            TransactionStatus::from_gateway_status("expire"),
            Some(TransactionStatus::Expired)
        );
        assert_eq!(
            TransactionStatus::from_gateway_status("cancel"),
            Some(TransactionStatus::Cancelled)
        );
        assert_eq!(
            TransactionStatus::from_gateway_status("deny"),
            Some(TransactionStatus::Cancelled)
        );
        assert_eq!(
            TransactionStatus::from_gateway_status("pending"),
            Some(TransactionStatus::Pending)
        );
        assert_eq!(TransactionStatus::from_gateway_status("refund"), None);
    }

    #[test]
    fn test_from_rows_groups_details_by_seller() {
        let seller_a = Uuid::new_v4();
        let seller_b = Uuid::new_v4();
        let tx_id = Uuid::new_v4();

        let row = TransactionRow {
            id: tx_id,
            buyer_id: Uuid::new_v4(),
            total: 6000,
            status: "pending".to_string(),
            payment_id: Some("pay-1".to_string()),
            payment_status: Some("pending".to_string()),
            payment_url: Some("https://gateway.example.com/qr/pay-1".to_string()),
            payment_expires_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let details = vec![
            TransactionDetailRow {
                transaction_id: tx_id,
                seller_id: seller_a,
                photo_id: Uuid::new_v4(),
                price: 1000,
            },
            TransactionDetailRow {
                transaction_id: tx_id,
                seller_id: seller_b,
                photo_id: Uuid::new_v4(),
                price: 2000,
            },
            TransactionDetailRow {
                transaction_id: tx_id,
                seller_id: seller_a,
                photo_id: Uuid::new_v4(),
                price: 3000,
            },
        ];

        let transaction = Transaction::from_rows(row, details).unwrap();
        assert_eq!(transaction.details.len(), 2);

        let a = transaction
            .details
            .iter()
            .find(|d| d.seller_id == seller_a)
            .unwrap();
        assert_eq!(a.photo_ids.len(), 2);
        assert_eq!(a.subtotal, 4000);

        let payment = transaction.payment.unwrap();
        assert_eq!(payment.id, "pay-1");
    }

    #[test]
    fn test_from_rows_rejects_unknown_status() {
        let row = TransactionRow {
            id: Uuid::new_v4(),
            buyer_id: Uuid::new_v4(),
            total: 100,
            status: "refunded".to_string(),
            payment_id: None,
            payment_status: None,
            payment_url: None,
            payment_expires_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(Transaction::from_rows(row, Vec::new()).is_err());
    }
}
