//! Transaction Service Implementation
//!
//! Checkout flow: lock the requested photos, record the transaction, charge
//! the payment gateway, and settle on webhook notifications. Settled payments
//! mark photos sold and credit each seller's balance.

use std::collections::HashSet;
use std::str::FromStr;

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::database::Pagination;
use crate::models::transaction::{
    CreateTransactionRequest, ListTransactionsQuery, PaymentNotification, Transaction,
    TransactionDetailRow, TransactionPage, TransactionRole, TransactionRow, TransactionStatus,
};
use crate::service::payment::{PaymentGateway, PaymentStatus};
use crate::utils::error::{AppError, AppResult};

const TRANSACTION_COLUMNS: &str = "id, buyer_id, total, status, payment_id, payment_status, \
     payment_url, payment_expires_at, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct LockedPhoto {
    id: Uuid,
    seller_id: Uuid,
    price: i64,
    status: String,
}

/// Checkout and payment settlement service
#[derive(Clone)]
pub struct TransactionService {
    pool: PgPool,
    gateway: PaymentGateway,
}

impl TransactionService {
    pub fn new(pool: PgPool, gateway: PaymentGateway) -> Self {
        Self { pool, gateway }
    }

    /// Create a transaction for the requested photos and charge the gateway.
    ///
    /// All photos are locked row-level for the duration of the checkout; any
    /// photo that is not available fails the whole request. The client-sent
    /// total must equal the sum of the locked prices.
    pub async fn create(
        &self,
        buyer_id: Uuid,
        request: CreateTransactionRequest,
    ) -> AppResult<Transaction> {
        request
            .validate()
            .map_err(|e| AppError::Validation(format!("Invalid transaction data: {}", e)))?;

        let mut requested: Vec<(Uuid, Uuid)> = Vec::new();
        let mut seen = HashSet::new();
        for detail in &request.details {
            if detail.photo_ids.is_empty() {
                return Err(AppError::Validation(
                    "Each detail needs at least one photo".to_string(),
                ));
            }
            for photo_id in &detail.photo_ids {
                if !seen.insert(*photo_id) {
                    return Err(AppError::BadRequest(
                        "Duplicate photo in transaction".to_string(),
                    ));
                }
                requested.push((detail.seller_id, *photo_id));
            }
        }
        let photo_ids: Vec<Uuid> = requested.iter().map(|(_, id)| *id).collect();

        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_as::<_, LockedPhoto>(
            r#"
            SELECT id, seller_id, price, status
            FROM photos
            WHERE id = ANY($1)
            FOR UPDATE
            "#,
        )
        .bind(&photo_ids)
        .fetch_all(&mut *tx)
        .await?;

        if locked.len() != photo_ids.len() {
            return Err(AppError::NotFound("Photo not found".to_string()));
        }

        let total = validate_checkout(&requested, &locked, buyer_id, request.total)?;

        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            INSERT INTO transactions (buyer_id, total, status)
            VALUES ($1, $2, 'pending')
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(buyer_id)
        .bind(total)
        .fetch_one(&mut *tx)
        .await?;

        for photo in &locked {
            sqlx::query(
                r#"
                INSERT INTO transaction_details (transaction_id, seller_id, photo_id, price)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(row.id)
            .bind(photo.seller_id)
            .bind(photo.id)
            .bind(photo.price)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "UPDATE photos SET status = 'waiting', buyer_id = $2, updated_at = NOW() WHERE id = ANY($1)",
        )
        .bind(&photo_ids)
        .bind(buyer_id)
        .execute(&mut *tx)
        .await?;

        // Purchased photos disappear from every cart
        sqlx::query("DELETE FROM cart_items WHERE photo_id = ANY($1)")
            .bind(&photo_ids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        match self.gateway.charge(&row.id.to_string(), total).await {
            Ok(charge) => {
                let updated = sqlx::query_as::<_, TransactionRow>(&format!(
                    r#"
                    UPDATE transactions
                    SET payment_id = $2, payment_status = $3, payment_url = $4,
                        payment_expires_at = $5, updated_at = NOW()
                    WHERE id = $1
                    RETURNING {TRANSACTION_COLUMNS}
                    "#
                ))
                .bind(row.id)
                .bind(&charge.transaction_id)
                .bind(&charge.transaction_status)
                .bind(charge.payment_url())
                .bind(charge.expires_at())
                .fetch_one(&self.pool)
                .await?;

                log::info!("Transaction {} charged for {}", row.id, total);
                self.assemble(updated).await
            }
            Err(e) => {
                // Charge failed after commit: release the photos and void the
                // transaction so the listings are purchasable again.
                log::error!("Charge failed for transaction {}: {}", row.id, e);
                if let Err(rollback_err) = self.void_transaction(row.id).await {
                    log::error!(
                        "Failed to void transaction {}: {}",
                        row.id,
                        rollback_err
                    );
                }
                Err(e)
            }
        }
    }

    /// Fetch a transaction; visible to its buyer and its sellers
    pub async fn get(&self, user_id: Uuid, transaction_id: Uuid) -> AppResult<Transaction> {
        let row = self.find_row(transaction_id).await?;

        if row.buyer_id != user_id {
            let is_seller: bool = sqlx::query_scalar(
                r#"
                SELECT EXISTS(
                    SELECT 1 FROM transaction_details
                    WHERE transaction_id = $1 AND seller_id = $2
                )
                "#,
            )
            .bind(transaction_id)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

            if !is_seller {
                return Err(AppError::Forbidden(
                    "Not a party to this transaction".to_string(),
                ));
            }
        }

        self.assemble(row).await
    }

    /// List transactions where the caller is the buyer or a seller
    pub async fn list(
        &self,
        user_id: Uuid,
        query: ListTransactionsQuery,
    ) -> AppResult<TransactionPage> {
        let pagination = Pagination::new(query.page.unwrap_or(1), query.per_page.unwrap_or(20));

        let (rows, total) = match query.role {
            TransactionRole::Buyer => {
                let rows = sqlx::query_as::<_, TransactionRow>(&format!(
                    r#"
                    SELECT {TRANSACTION_COLUMNS}
                    FROM transactions
                    WHERE buyer_id = $1
                    ORDER BY created_at DESC
                    LIMIT $2 OFFSET $3
                    "#
                ))
                .bind(user_id)
                .bind(pagination.limit)
                .bind(pagination.offset)
                .fetch_all(&self.pool)
                .await?;

                let total: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE buyer_id = $1")
                        .bind(user_id)
                        .fetch_one(&self.pool)
                        .await?;

                (rows, total)
            }
            TransactionRole::Seller => {
                let rows = sqlx::query_as::<_, TransactionRow>(&format!(
                    r#"
                    SELECT DISTINCT t.{0}
                    FROM transactions t
                    JOIN transaction_details d ON d.transaction_id = t.id
                    WHERE d.seller_id = $1
                    ORDER BY t.created_at DESC
                    LIMIT $2 OFFSET $3
                    "#,
                    TRANSACTION_COLUMNS.replace(", ", ", t.")
                ))
                .bind(user_id)
                .bind(pagination.limit)
                .bind(pagination.offset)
                .fetch_all(&self.pool)
                .await?;

                let total: i64 = sqlx::query_scalar(
                    r#"
                    SELECT COUNT(DISTINCT transaction_id)
                    FROM transaction_details
                    WHERE seller_id = $1
                    "#,
                )
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

                (rows, total)
            }
        };

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(self.assemble(row).await?);
        }

        Ok(TransactionPage {
            items,
            total,
            page: pagination.page,
            per_page: pagination.per_page,
            total_pages: pagination.total_pages(total),
        })
    }

    /// Query the gateway for the current payment status and sync the local
    /// transaction when the gateway reports a terminal state.
    pub async fn payment_status(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
    ) -> AppResult<PaymentStatus> {
        let row = self.find_row(transaction_id).await?;
        if row.buyer_id != user_id {
            return Err(AppError::Forbidden(
                "Not a party to this transaction".to_string(),
            ));
        }

        let status = self.gateway.status(&transaction_id.to_string()).await?;

        if let Some(gateway_status) = status.transaction_status.as_deref() {
            if let Some(new_status) = TransactionStatus::from_gateway_status(gateway_status) {
                self.apply_status(transaction_id, new_status, gateway_status)
                    .await?;
            }
        }

        Ok(status)
    }

    /// Handle a gateway webhook notification.
    ///
    /// The signature must verify against the server key; unknown gateway
    /// statuses and unknown orders are rejected as client errors.
    pub async fn handle_notification(
        &self,
        notification: PaymentNotification,
    ) -> AppResult<Transaction> {
        if !self.gateway.verify_signature(
            &notification.order_id,
            &notification.status_code,
            &notification.gross_amount,
            &notification.signature_key,
        ) {
            return Err(AppError::Authentication(
                "Invalid notification signature".to_string(),
            ));
        }

        let transaction_id = Uuid::parse_str(&notification.order_id)
            .map_err(|_| AppError::BadRequest("Invalid order ID".to_string()))?;

        let new_status = TransactionStatus::from_gateway_status(&notification.transaction_status)
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "Unknown transaction status: {}",
                    notification.transaction_status
                ))
            })?;

        self.apply_status(transaction_id, new_status, &notification.transaction_status)
            .await?;

        let row = self.find_row(transaction_id).await?;
        self.assemble(row).await
    }

    /// Transition a pending transaction per the gateway status.
    ///
    /// Settlement marks the photos sold and credits each seller; expiry and
    /// cancellation release the photos; a pending notification only records
    /// the gateway's payment status. Transactions already in a terminal state
    /// are left untouched, which makes notifications idempotent.
    async fn apply_status(
        &self,
        transaction_id: Uuid,
        new_status: TransactionStatus,
        gateway_status: &str,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1 FOR UPDATE"
        ))
        .bind(transaction_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))?;

        let current = TransactionStatus::from_str(&row.status).map_err(AppError::Internal)?;

        let plan = plan_transition(current, new_status);
        match plan {
            Transition::Ignore => return Ok(()),
            Transition::RecordPayment => {
                sqlx::query(
                    "UPDATE transactions SET payment_status = $2, updated_at = NOW() WHERE id = $1",
                )
                .bind(transaction_id)
                .bind(gateway_status)
                .execute(&mut *tx)
                .await?;

                tx.commit().await?;
                return Ok(());
            }
            Transition::Settle | Transition::Release => {}
        }

        let details = sqlx::query_as::<_, TransactionDetailRow>(
            r#"
            SELECT transaction_id, seller_id, photo_id, price
            FROM transaction_details
            WHERE transaction_id = $1
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&mut *tx)
        .await?;
        let photo_ids: Vec<Uuid> = details.iter().map(|d| d.photo_id).collect();

        if plan == Transition::Settle {
            sqlx::query(
                r#"
                UPDATE photos
                SET status = 'sold', buyer_id = $2, updated_at = NOW()
                WHERE id = ANY($1)
                "#,
            )
            .bind(&photo_ids)
            .bind(row.buyer_id)
            .execute(&mut *tx)
            .await?;

            for detail in &details {
                sqlx::query(
                    "UPDATE users SET balance = balance + $2, updated_at = NOW() WHERE id = $1",
                )
                .bind(detail.seller_id)
                .bind(detail.price)
                .execute(&mut *tx)
                .await?;
            }
        } else {
            sqlx::query(
                r#"
                UPDATE photos
                SET status = 'available', buyer_id = NULL, updated_at = NOW()
                WHERE id = ANY($1) AND status = 'waiting'
                "#,
            )
            .bind(&photo_ids)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            UPDATE transactions
            SET status = $2, payment_status = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(transaction_id)
        .bind(new_status.as_str())
        .bind(gateway_status)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        log::info!("Transaction {} moved to {}", transaction_id, new_status);
        Ok(())
    }

    /// Cancel a transaction whose charge never went through and release its
    /// photos back to the market.
    async fn void_transaction(&self, transaction_id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE photos
            SET status = 'available', buyer_id = NULL, updated_at = NOW()
            WHERE status = 'waiting'
              AND id IN (SELECT photo_id FROM transaction_details WHERE transaction_id = $1)
            "#,
        )
        .bind(transaction_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE transactions SET status = 'cancelled', updated_at = NOW() WHERE id = $1",
        )
        .bind(transaction_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_row(&self, transaction_id: Uuid) -> AppResult<TransactionRow> {
        sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1"
        ))
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))
    }

    async fn assemble(&self, row: TransactionRow) -> AppResult<Transaction> {
        let details = sqlx::query_as::<_, TransactionDetailRow>(
            r#"
            SELECT transaction_id, seller_id, photo_id, price
            FROM transaction_details
            WHERE transaction_id = $1
            "#,
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?;

        Transaction::from_rows(row, details).map_err(AppError::Internal)
    }
}

/// What a gateway status means for a transaction in its current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    /// Still pending on both sides; record the gateway's payment status
    RecordPayment,
    /// Pending locally, settled at the gateway: sell photos, credit sellers
    Settle,
    /// Pending locally, expired or cancelled at the gateway: release photos
    Release,
    /// Already settled one way; the notification is a replay
    Ignore,
}

fn plan_transition(current: TransactionStatus, incoming: TransactionStatus) -> Transition {
    if current != TransactionStatus::Pending {
        return Transition::Ignore;
    }

    match incoming {
        TransactionStatus::Pending => Transition::RecordPayment,
        TransactionStatus::Paid => Transition::Settle,
        TransactionStatus::Expired | TransactionStatus::Cancelled => Transition::Release,
    }
}

/// Check the locked photos against the requested details and the client-sent
/// total; returns the authoritative total on success.
fn validate_checkout(
    requested: &[(Uuid, Uuid)],
    locked: &[LockedPhoto],
    buyer_id: Uuid,
    expected_total: i64,
) -> AppResult<i64> {
    let mut total: i64 = 0;
    for (seller_id, photo_id) in requested {
        let photo = locked
            .iter()
            .find(|p| p.id == *photo_id)
            .ok_or_else(|| AppError::NotFound("Photo not found".to_string()))?;

        if photo.seller_id != *seller_id {
            return Err(AppError::BadRequest(
                "Photo does not belong to the given seller".to_string(),
            ));
        }
        if photo.seller_id == buyer_id {
            return Err(AppError::BadRequest(
                "Cannot buy your own photo".to_string(),
            ));
        }
        if photo.status != "available" {
            return Err(AppError::Conflict("Photo is not available".to_string()));
        }
        total += photo.price;
    }

    if total != expected_total {
        return Err(AppError::BadRequest(
            "Total does not match the photo prices".to_string(),
        ));
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(seller_id: Uuid, price: i64, status: &str) -> LockedPhoto {
        LockedPhoto {
            id: Uuid::new_v4(),
            seller_id,
            price,
            status: status.to_string(),
        }
    }

    #[test]
    fn test_validate_checkout_sums_prices() {
        let seller = Uuid::new_v4();
        let photos = vec![
            listing(seller, 1000, "available"),
            listing(seller, 2500, "available"),
        ];
        let requested: Vec<(Uuid, Uuid)> = photos.iter().map(|p| (seller, p.id)).collect();

        let total = validate_checkout(&requested, &photos, Uuid::new_v4(), 3500).unwrap();
        assert_eq!(total, 3500);
    }

    #[test]
    fn test_validate_checkout_rejects_total_mismatch() {
        let seller = Uuid::new_v4();
        let photos = vec![listing(seller, 1000, "available")];
        let requested = vec![(seller, photos[0].id)];

        let result = validate_checkout(&requested, &photos, Uuid::new_v4(), 999);
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_validate_checkout_rejects_unavailable_photo() {
        let seller = Uuid::new_v4();
        let photos = vec![listing(seller, 1000, "waiting")];
        let requested = vec![(seller, photos[0].id)];

        let result = validate_checkout(&requested, &photos, Uuid::new_v4(), 1000);
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_validate_checkout_rejects_wrong_seller() {
        let seller = Uuid::new_v4();
        let photos = vec![listing(seller, 1000, "available")];
        let requested = vec![(Uuid::new_v4(), photos[0].id)];

        let result = validate_checkout(&requested, &photos, Uuid::new_v4(), 1000);
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_validate_checkout_rejects_own_photo() {
        let seller = Uuid::new_v4();
        let photos = vec![listing(seller, 1000, "available")];
        let requested = vec![(seller, photos[0].id)];

        let result = validate_checkout(&requested, &photos, seller, 1000);
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_settlement_applies_only_once() {
        assert_eq!(
            plan_transition(TransactionStatus::Pending, TransactionStatus::Paid),
            Transition::Settle
        );
        // A second settlement notification for the same order is a replay
        assert_eq!(
            plan_transition(TransactionStatus::Paid, TransactionStatus::Paid),
            Transition::Ignore
        );
        assert_eq!(
            plan_transition(TransactionStatus::Cancelled, TransactionStatus::Paid),
            Transition::Ignore
        );
    }

    #[test]
    fn test_pending_notification_records_payment_status() {
        assert_eq!(
            plan_transition(TransactionStatus::Pending, TransactionStatus::Pending),
            Transition::RecordPayment
        );
        assert_eq!(
            plan_transition(TransactionStatus::Paid, TransactionStatus::Pending),
            Transition::Ignore
        );
    }

    #[test]
    fn test_expiry_and_cancellation_release_photos() {
        assert_eq!(
            plan_transition(TransactionStatus::Pending, TransactionStatus::Expired),
            Transition::Release
        );
        assert_eq!(
            plan_transition(TransactionStatus::Pending, TransactionStatus::Cancelled),
            Transition::Release
        );
    }
}
