//! Payment Gateway Client
//!
//! QRIS charge API client and notification signature verification. The
//! gateway authenticates requests with HTTP Basic using the base64-encoded
//! server key, and signs webhook notifications with SHA-512.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::PaymentConfig;
use crate::utils::error::{AppError, AppResult};
use crate::utils::security::{constant_time_compare, payment_signature};

/// Timestamp format used by the gateway, e.g. "2026-08-24 17:30:00"
const GATEWAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Charge request body for a QRIS payment
#[derive(Debug, Serialize)]
struct ChargeRequest<'a> {
    payment_type: &'a str,
    transaction_details: ChargeTransactionDetails<'a>,
    qris: QrisOptions<'a>,
}

#[derive(Debug, Serialize)]
struct ChargeTransactionDetails<'a> {
    order_id: &'a str,
    gross_amount: i64,
}

#[derive(Debug, Serialize)]
struct QrisOptions<'a> {
    acquirer: &'a str,
}

/// Action URL returned by the gateway (QR code image, deeplink)
#[derive(Debug, Clone, Deserialize)]
pub struct ChargeAction {
    pub name: String,
    pub url: String,
}

/// Gateway response to a charge request
#[derive(Debug, Clone, Deserialize)]
pub struct ChargeResponse {
    pub transaction_id: String,
    pub transaction_status: String,
    #[serde(default)]
    pub actions: Vec<ChargeAction>,
    pub expiry_time: Option<String>,
}

impl ChargeResponse {
    /// First action URL, which is the QR the buyer opens
    pub fn payment_url(&self) -> Option<String> {
        self.actions.first().map(|action| action.url.clone())
    }

    /// Parse the gateway's expiry timestamp (interpreted as UTC)
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.expiry_time.as_deref()?;
        NaiveDateTime::parse_from_str(raw, GATEWAY_TIME_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// Gateway response to a status query
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentStatus {
    pub transaction_id: Option<String>,
    pub order_id: Option<String>,
    pub transaction_status: Option<String>,
    pub status_code: Option<String>,
    pub gross_amount: Option<String>,
}

/// HTTP client for the payment gateway's charge API
#[derive(Clone)]
pub struct PaymentGateway {
    http: reqwest::Client,
    base_url: String,
    server_key: String,
}

impl PaymentGateway {
    pub fn new(config: &PaymentConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            server_key: config.server_key.clone(),
        }
    }

    /// Basic credential: base64 of "<server_key>:"
    fn authorization(&self) -> String {
        format!("Basic {}", BASE64.encode(format!("{}:", self.server_key)))
    }

    /// Create a QRIS charge for the given order
    pub async fn charge(&self, order_id: &str, gross_amount: i64) -> AppResult<ChargeResponse> {
        let body = ChargeRequest {
            payment_type: "qris",
            transaction_details: ChargeTransactionDetails {
                order_id,
                gross_amount,
            },
            qris: QrisOptions { acquirer: "gopay" },
        };

        let response = self
            .http
            .post(format!("{}charge", self.base_url))
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Charge request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Charge rejected with {}: {}",
                status, text
            )));
        }

        response
            .json::<ChargeResponse>()
            .await
            .map_err(|e| AppError::ExternalService(format!("Malformed charge response: {}", e)))
    }

    /// Query the payment status for an order
    pub async fn status(&self, order_id: &str) -> AppResult<PaymentStatus> {
        let response = self
            .http
            .get(format!("{}{}/status", self.base_url, order_id))
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Status request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "Status query rejected with {}",
                response.status()
            )));
        }

        response
            .json::<PaymentStatus>()
            .await
            .map_err(|e| AppError::ExternalService(format!("Malformed status response: {}", e)))
    }

    /// Verify a webhook notification signature
    pub fn verify_signature(
        &self,
        order_id: &str,
        status_code: &str,
        gross_amount: &str,
        signature: &str,
    ) -> bool {
        let expected = payment_signature(order_id, status_code, gross_amount, &self.server_key);
        constant_time_compare(&expected, signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> PaymentGateway {
        PaymentGateway::new(&PaymentConfig {
            base_url: "https://api.sandbox.midtrans.com/v2/".to_string(),
            server_key: "SB-Mid-server-test".to_string(),
        })
    }

    #[test]
    fn test_authorization_encodes_server_key() {
        let header = gateway().authorization();
        assert!(header.starts_with("Basic "));

        let decoded = BASE64.decode(header.trim_start_matches("Basic ")).unwrap();
        assert_eq!(decoded, b"SB-Mid-server-test:");
    }

    #[test]
    fn test_verify_signature_matches_gateway_scheme() {
        let gateway = gateway();
        let signature =
            payment_signature("order-1", "200", "150000.00", "SB-Mid-server-test");

        assert!(gateway.verify_signature("order-1", "200", "150000.00", &signature));
        assert!(!gateway.verify_signature("order-1", "200", "150000.01", &signature));
        assert!(!gateway.verify_signature("order-1", "200", "150000.00", "bogus"));
    }

    #[test]
    fn test_charge_response_parsing() {
        let raw = serde_json::json!({
            "transaction_id": "abc-123",
            "transaction_status": "pending",
            "actions": [
                {"name": "generate-qr-code", "url": "https://gateway.example.com/qr/abc-123"}
            ],
            "expiry_time": "2026-08-24 17:30:00"
        });

        let response: ChargeResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(
            response.payment_url().as_deref(),
            Some("https://gateway.example.com/qr/abc-123")
        );

        let expires = response.expires_at().unwrap();
        assert_eq!(
            expires.format(GATEWAY_TIME_FORMAT).to_string(),
            "2026-08-24 17:30:00"
        );
    }

    #[test]
    fn test_charge_response_without_actions() {
        let raw = serde_json::json!({
            "transaction_id": "abc-123",
            "transaction_status": "pending"
        });

        let response: ChargeResponse = serde_json::from_value(raw).unwrap();
        assert!(response.payment_url().is_none());
        assert!(response.expires_at().is_none());
    }
}
