//! User Service Implementation
//!
//! Business logic for registration, login, profile management, bank
//! accounts, balance withdrawals, and the follow graph.

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::database::Pagination;
use crate::models::user::{
    AddAccountRequest, BankAccount, ChangePasswordRequest, LoginRequest, PublicProfile,
    RegisterRequest, UpdateAccountRequest, UpdateProfileRequest, UserProfile, UserRow,
    WithdrawalRequest, WithdrawalResponse,
};
use crate::service::storage::{file_extension, StorageService};
use crate::utils::error::{AppError, AppResult};
use crate::utils::security::{
    generate_secure_token, hash_password_with_cost, verify_password, DEFAULT_BCRYPT_COST,
};
use crate::utils::validation::{normalize_email, username_from_email};

const USER_COLUMNS: &str = "id, name, email, username, phone, password_hash, photo_key, balance, created_at, updated_at";

/// Core user service providing account operations and business logic
#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
    storage: Arc<StorageService>,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(pool: PgPool, storage: Arc<StorageService>) -> Self {
        Self {
            pool,
            storage,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }

    /// Register a new account. The username is derived from the email local
    /// part; collisions get a random suffix.
    pub async fn register(&self, request: RegisterRequest) -> AppResult<UserProfile> {
        request
            .validate()
            .map_err(|e| AppError::Validation(format!("Invalid registration data: {}", e)))?;

        let email = normalize_email(&request.email);
        let phone = request.phone.trim().to_string();

        if self.email_exists(&email, None).await? {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }
        if self.phone_exists(&phone, None).await? {
            return Err(AppError::Conflict("Phone already exists".to_string()));
        }

        let mut username = username_from_email(&email);
        if username.len() < 3 || self.username_exists(&username, None).await? {
            username = format!("{}{}", username, generate_secure_token(4).to_lowercase());
        }

        let password_hash = hash_password_with_cost(&request.password, self.bcrypt_cost)?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (name, email, username, phone, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(request.name.trim())
        .bind(&email)
        .bind(&username)
        .bind(&phone)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        log::info!("User registered: {}", row.id);
        self.build_profile(row).await
    }

    /// Verify login credentials by email or phone; returns the matching user
    pub async fn login(&self, request: LoginRequest) -> AppResult<UserRow> {
        request
            .validate()
            .map_err(|e| AppError::Validation(format!("Invalid login data: {}", e)))?;

        let identifier = request.email_or_phone.trim();
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE email = $1 OR phone = $1
            "#
        ))
        .bind(normalize_email(identifier))
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Err(AppError::Authentication(
                "Email, phone or password is incorrect".to_string(),
            ));
        };

        if !verify_password(&request.password, &row.password_hash)? {
            return Err(AppError::Authentication(
                "Email, phone or password is incorrect".to_string(),
            ));
        }

        Ok(row)
    }

    /// Fetch the caller's own profile
    pub async fn get_profile(&self, user_id: Uuid) -> AppResult<UserProfile> {
        let row = self.find_by_id(user_id).await?;
        self.build_profile(row).await
    }

    /// Fetch another user's public profile
    pub async fn get_public_profile(&self, user_id: Uuid) -> AppResult<PublicProfile> {
        let profile = self.get_profile(user_id).await?;
        Ok(profile.into())
    }

    /// Update profile fields, enforcing uniqueness on changed identifiers
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> AppResult<UserProfile> {
        request
            .validate()
            .map_err(|e| AppError::Validation(format!("Invalid update data: {}", e)))?;

        let current = self.find_by_id(user_id).await?;

        let email = request.email.as_deref().map(normalize_email);
        if let Some(email) = &email {
            if *email != current.email && self.email_exists(email, Some(user_id)).await? {
                return Err(AppError::Conflict("Email already exists".to_string()));
            }
        }
        if let Some(phone) = &request.phone {
            if *phone != current.phone && self.phone_exists(phone, Some(user_id)).await? {
                return Err(AppError::Conflict("Phone already exists".to_string()));
            }
        }
        if let Some(username) = &request.username {
            if *username != current.username
                && self.username_exists(username, Some(user_id)).await?
            {
                return Err(AppError::Conflict("Username already exists".to_string()));
            }
        }

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                username = COALESCE($5, username),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(request.name)
        .bind(email)
        .bind(request.phone)
        .bind(request.username)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        self.build_profile(row).await
    }

    /// Change the password after verifying the old one
    pub async fn change_password(
        &self,
        user_id: Uuid,
        request: ChangePasswordRequest,
    ) -> AppResult<()> {
        request
            .validate()
            .map_err(|e| AppError::Validation(format!("Invalid password data: {}", e)))?;

        if request.new_password != request.confirm_password {
            return Err(AppError::Validation(
                "Password and confirmation do not match".to_string(),
            ));
        }

        let row = self.find_by_id(user_id).await?;
        if !verify_password(&request.old_password, &row.password_hash)? {
            return Err(AppError::BadRequest("Old password is incorrect".to_string()));
        }

        let password_hash = hash_password_with_cost(&request.new_password, self.bcrypt_cost)?;
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        log::info!("Password changed for user {}", user_id);
        Ok(())
    }

    /// Upload a new profile photo and record its object key
    pub async fn change_profile_photo(
        &self,
        user_id: Uuid,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> AppResult<UserProfile> {
        if bytes.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }

        let current = self.find_by_id(user_id).await?;
        let extension = file_extension(filename)?;
        let key = StorageService::profile_key(user_id, extension);

        self.storage.upload(&key, bytes, content_type).await?;

        let update = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET photo_key = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&key)
        .fetch_one(&self.pool)
        .await;

        let row = match update {
            Ok(row) => row,
            Err(e) => {
                // The row still points at the old object; drop the new one
                if let Err(cleanup) = self.storage.delete(&key).await {
                    log::warn!("Failed to delete orphaned profile photo: {}", cleanup);
                }
                return Err(e.into());
            }
        };

        // Old object becomes unreachable once the row points elsewhere
        if let Some(old_key) = current.photo_key {
            if let Err(e) = self.storage.delete(&old_key).await {
                log::warn!("Failed to delete replaced profile photo: {}", e);
            }
        }

        self.build_profile(row).await
    }

    /// Add a bank account; (bank, number) must be unique per user
    pub async fn add_account(
        &self,
        user_id: Uuid,
        request: AddAccountRequest,
    ) -> AppResult<BankAccount> {
        request
            .validate()
            .map_err(|e| AppError::Validation(format!("Invalid account data: {}", e)))?;

        if self
            .account_exists(user_id, &request.bank, &request.number)
            .await?
        {
            return Err(AppError::Conflict("Account already exists".to_string()));
        }

        let account = sqlx::query_as::<_, BankAccount>(
            r#"
            INSERT INTO bank_accounts (user_id, bank, holder_name, number)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, bank, holder_name, number, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(request.bank.trim())
        .bind(request.holder_name.trim())
        .bind(request.number.trim())
        .fetch_one(&self.pool)
        .await?;

        Ok(account)
    }

    /// Fetch one of the caller's bank accounts
    pub async fn get_account(&self, user_id: Uuid, account_id: Uuid) -> AppResult<BankAccount> {
        sqlx::query_as::<_, BankAccount>(
            r#"
            SELECT id, user_id, bank, holder_name, number, created_at, updated_at
            FROM bank_accounts
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(account_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Account not found".to_string()))
    }

    /// List the caller's bank accounts with pagination
    pub async fn list_accounts(
        &self,
        user_id: Uuid,
        pagination: &Pagination,
    ) -> AppResult<(Vec<BankAccount>, i64)> {
        let accounts = sqlx::query_as::<_, BankAccount>(
            r#"
            SELECT id, user_id, bank, holder_name, number, created_at, updated_at
            FROM bank_accounts
            WHERE user_id = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(pagination.limit)
        .bind(pagination.offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bank_accounts WHERE user_id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((accounts, total))
    }

    /// Update a bank account; the changed (bank, number) pair must stay unique
    pub async fn update_account(
        &self,
        user_id: Uuid,
        account_id: Uuid,
        request: UpdateAccountRequest,
    ) -> AppResult<BankAccount> {
        request
            .validate()
            .map_err(|e| AppError::Validation(format!("Invalid account data: {}", e)))?;

        let current = self.get_account(user_id, account_id).await?;

        let bank = request.bank.unwrap_or(current.bank);
        let holder_name = request.holder_name.unwrap_or(current.holder_name);
        let number = request.number.unwrap_or(current.number);

        let duplicate: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM bank_accounts
            WHERE user_id = $1 AND bank = $2 AND number = $3 AND id <> $4 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(&bank)
        .bind(&number)
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        if duplicate.is_some() {
            return Err(AppError::Conflict("Account already exists".to_string()));
        }

        let account = sqlx::query_as::<_, BankAccount>(
            r#"
            UPDATE bank_accounts
            SET bank = $3, holder_name = $4, number = $5, updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            RETURNING id, user_id, bank, holder_name, number, created_at, updated_at
            "#,
        )
        .bind(account_id)
        .bind(user_id)
        .bind(&bank)
        .bind(&holder_name)
        .bind(&number)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;

        Ok(account)
    }

    /// Soft-delete a bank account
    pub async fn delete_account(&self, user_id: Uuid, account_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE bank_accounts
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(account_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Account not found".to_string()));
        }

        Ok(())
    }

    /// Withdraw from the balance to one of the caller's bank accounts
    pub async fn withdraw(
        &self,
        user_id: Uuid,
        request: WithdrawalRequest,
    ) -> AppResult<WithdrawalResponse> {
        request
            .validate()
            .map_err(|e| AppError::Validation(format!("Invalid withdrawal data: {}", e)))?;

        // Destination account must exist and belong to the caller
        let account = self.get_account(user_id, request.account_id).await?;

        // Guarded decrement; zero rows affected means insufficient balance
        let remaining: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE users
            SET balance = balance - $2, updated_at = NOW()
            WHERE id = $1 AND balance >= $2
            RETURNING balance
            "#,
        )
        .bind(user_id)
        .bind(request.amount)
        .fetch_optional(&self.pool)
        .await?;

        let Some(remaining) = remaining else {
            return Err(AppError::BadRequest("Balance is not enough".to_string()));
        };

        log::info!(
            "Withdrawal of {} for user {} to account {}",
            request.amount,
            user_id,
            account.id
        );

        Ok(WithdrawalResponse {
            amount: request.amount,
            remaining_balance: remaining,
            account_id: account.id,
        })
    }

    /// Follow or unfollow another user
    pub async fn set_follow(&self, user_id: Uuid, target_id: Uuid, follow: bool) -> AppResult<()> {
        if user_id == target_id {
            return Err(AppError::BadRequest("Cannot follow yourself".to_string()));
        }

        // Ensure the target exists before touching the follow graph
        self.find_by_id(target_id)
            .await
            .map_err(|_| AppError::NotFound("Target user not found".to_string()))?;

        if follow {
            let result = sqlx::query(
                "INSERT INTO follows (follower_id, followee_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(user_id)
            .bind(target_id)
            .execute(&self.pool)
            .await?;

            if result.rows_affected() == 0 {
                return Err(AppError::Conflict("Already following".to_string()));
            }
        } else {
            let result =
                sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2")
                    .bind(user_id)
                    .bind(target_id)
                    .execute(&self.pool)
                    .await?;

            if result.rows_affected() == 0 {
                return Err(AppError::BadRequest("Not following".to_string()));
            }
        }

        Ok(())
    }

    /// Database connectivity probe for the health endpoint
    pub async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_by_id(&self, user_id: Uuid) -> AppResult<UserRow> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    async fn build_profile(&self, row: UserRow) -> AppResult<UserProfile> {
        let followers: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE followee_id = $1")
                .bind(row.id)
                .fetch_one(&self.pool)
                .await?;
        let following: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE follower_id = $1")
                .bind(row.id)
                .fetch_one(&self.pool)
                .await?;

        let photo_url = self.storage.presign_optional(row.photo_key.as_deref()).await?;

        Ok(UserProfile::from_row(row, photo_url, followers, following))
    }

    async fn email_exists(&self, email: &str, exclude: Option<Uuid>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn phone_exists(&self, phone: &str, exclude: Option<Uuid>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE phone = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(phone)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn username_exists(&self, username: &str, exclude: Option<Uuid>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(username)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn account_exists(&self, user_id: Uuid, bank: &str, number: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM bank_accounts
                WHERE user_id = $1 AND bank = $2 AND number = $3 AND deleted_at IS NULL
            )
            "#,
        )
        .bind(user_id)
        .bind(bank)
        .bind(number)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

/// Turn unique-constraint violations into conflict errors
fn map_unique_violation(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        match db_err.constraint() {
            Some("users_email_key") => return AppError::Conflict("Email already exists".into()),
            Some("users_phone_key") => return AppError::Conflict("Phone already exists".into()),
            Some("users_username_key") => {
                return AppError::Conflict("Username already exists".into())
            }
            _ => {}
        }
    }
    AppError::Database(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_unique_violation_passes_through_other_errors() {
        let error = map_unique_violation(sqlx::Error::RowNotFound);
        assert!(matches!(error, AppError::Database(_)));
    }
}
