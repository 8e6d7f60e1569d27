//! User Models
//!
//! User profiles, bank accounts, and the request/response payloads of the
//! `/api/user` route group.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::utils::validation::{
    email_validator, name_validator, phone_validator, username_validator,
};

/// Internal user representation including password hash
///
/// Used for database operations that need the credential; never exposed in
/// API responses.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub username: String,
    pub phone: String,
    pub password_hash: String,
    /// Object storage key of the profile photo, if one was uploaded
    pub photo_key: Option<String>,
    /// Balance in the smallest currency unit
    pub balance: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User profile for API responses
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub username: String,
    pub phone: String,
    /// Presigned URL for the profile photo, if one was uploaded
    pub photo_url: Option<String>,
    pub balance: i64,
    pub followers: i64,
    pub following: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Build a profile from a database row plus derived fields
    pub fn from_row(row: UserRow, photo_url: Option<String>, followers: i64, following: i64) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            username: row.username,
            phone: row.phone,
            photo_url,
            balance: row.balance,
            followers,
            following,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Public view of another user's profile (no balance)
#[derive(Debug, Clone, Serialize)]
pub struct PublicProfile {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub photo_url: Option<String>,
    pub followers: i64,
    pub following: i64,
    pub created_at: DateTime<Utc>,
}

impl From<UserProfile> for PublicProfile {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            username: profile.username,
            photo_url: profile.photo_url,
            followers: profile.followers,
            following: profile.following,
            created_at: profile.created_at,
        }
    }
}

/// Bank account attached to a user for withdrawals
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BankAccount {
    pub id: Uuid,
    pub user_id: Uuid,
    pub bank: String,
    pub holder_name: String,
    pub number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for registering a new user
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(custom(function = "name_validator"))]
    pub name: String,

    #[validate(custom(function = "email_validator"))]
    pub email: String,

    #[validate(custom(function = "phone_validator"))]
    pub phone: String,

    #[validate(length(
        min = 8,
        max = 128,
        message = "Password must be between 8 and 128 characters"
    ))]
    pub password: String,
}

/// Request payload for logging in with email or phone
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email or phone is required"))]
    pub email_or_phone: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request payload for refreshing access tokens
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "Refresh token cannot be empty"))]
    pub refresh_token: String,
}

/// Request payload for logout (revokes the refresh token's session)
#[derive(Debug, Deserialize, Validate)]
pub struct LogoutRequest {
    #[validate(length(min = 1, message = "Refresh token cannot be empty"))]
    pub refresh_token: String,
}

/// Request payload for updating the current profile
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(custom(function = "name_validator"))]
    pub name: Option<String>,

    #[validate(custom(function = "email_validator"))]
    pub email: Option<String>,

    #[validate(custom(function = "phone_validator"))]
    pub phone: Option<String>,

    #[validate(custom(function = "username_validator"))]
    pub username: Option<String>,
}

/// Request payload for changing the password
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Old password is required"))]
    pub old_password: String,

    #[validate(length(
        min = 8,
        max = 128,
        message = "Password must be between 8 and 128 characters"
    ))]
    pub new_password: String,

    #[validate(length(min = 1, message = "Password confirmation is required"))]
    pub confirm_password: String,
}

/// Request payload for adding a bank account
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddAccountRequest {
    #[validate(length(min = 1, max = 255, message = "Bank is required"))]
    pub bank: String,

    #[validate(custom(function = "name_validator"))]
    pub holder_name: String,

    #[validate(length(min = 4, max = 64, message = "Account number is required"))]
    pub number: String,
}

/// Request payload for updating a bank account
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateAccountRequest {
    #[validate(length(min = 1, max = 255, message = "Bank cannot be empty"))]
    pub bank: Option<String>,

    #[validate(custom(function = "name_validator"))]
    pub holder_name: Option<String>,

    #[validate(length(min = 4, max = 64, message = "Account number cannot be empty"))]
    pub number: Option<String>,
}

/// Request payload for withdrawing from the balance
#[derive(Debug, Deserialize, Validate)]
pub struct WithdrawalRequest {
    #[validate(range(min = 1, message = "Amount must be greater than zero"))]
    pub amount: i64,

    /// Bank account to pay out to
    pub account_id: Uuid,
}

/// Response for a successful withdrawal
#[derive(Debug, Serialize)]
pub struct WithdrawalResponse {
    pub amount: i64,
    pub remaining_balance: i64,
    pub account_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            username: "test".to_string(),
            phone: "081234567890".to_string(),
            password_hash: "hashed".to_string(),
            photo_key: Some("profile/abc.jpg".to_string()),
            balance: 5000,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_profile_from_row_strips_password_hash() {
        let row = sample_row();
        let profile =
            UserProfile::from_row(row, Some("https://cdn.example.com/p.jpg".to_string()), 3, 7);

        assert_eq!(profile.name, "Test User");
        assert_eq!(profile.followers, 3);
        assert_eq!(profile.following, 7);
        assert_eq!(
            profile.photo_url,
            Some("https://cdn.example.com/p.jpg".to_string())
        );
    }

    #[test]
    fn test_public_profile_hides_balance_and_contact() {
        let profile = UserProfile::from_row(sample_row(), None, 1, 2);
        let public: PublicProfile = profile.into();

        let value = serde_json::to_value(&public).unwrap();
        assert!(value.get("balance").is_none());
        assert!(value.get("email").is_none());
        assert!(value.get("phone").is_none());
    }

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone: "081234567890".to_string(),
            password: "a-strong-password".to_string(),
        };
        assert!(valid.validate().is_ok());

        let short_password = RegisterRequest {
            password: "short".to_string(),
            ..valid.clone()
        };
        assert!(short_password.validate().is_err());

        let bad_email = RegisterRequest {
            email: "not-an-email".to_string(),
            ..valid
        };
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn test_withdrawal_request_validation() {
        let request = WithdrawalRequest {
            amount: 0,
            account_id: Uuid::new_v4(),
        };
        assert!(request.validate().is_err());
    }
}
