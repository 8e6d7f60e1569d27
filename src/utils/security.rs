//! Security Utilities
//!
//! Password hashing, token hashing, and the payment gateway signature scheme.

use bcrypt::{hash, verify, DEFAULT_COST};
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256, Sha512};

/// Default bcrypt cost for password hashing
pub const DEFAULT_BCRYPT_COST: u32 = DEFAULT_COST;

/// Hash a password with custom bcrypt cost
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    hash(password, cost)
}

/// Verify a password against its hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password, hash)
}

/// Generate a cryptographically secure random string
pub fn generate_secure_token(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Create a SHA-256 hash of sensitive data (refresh tokens) for storage
pub fn hash_sensitive_data(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Compute the payment notification signature.
///
/// The gateway signs notifications as the SHA-512 hex digest of
/// `order_id + status_code + gross_amount + server_key`.
pub fn payment_signature(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    server_key: &str,
) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Timing-safe string comparison to prevent timing attacks
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (byte_a, byte_b) in a.bytes().zip(b.bytes()) {
        result |= byte_a ^ byte_b;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_secure_token() {
        let token1 = generate_secure_token(32);
        let token2 = generate_secure_token(32);

        assert_eq!(token1.len(), 32);
        assert_eq!(token2.len(), 32);
        assert_ne!(token1, token2); // Should be different
    }

    #[test]
    fn test_password_hashing() {
        let password = "test_password_123";
        let hash = hash_password_with_cost(password, 4).unwrap();

        assert!(verify_password(password, &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_hash_sensitive_data() {
        let data = "sensitive_data";
        let hash1 = hash_sensitive_data(data);
        let hash2 = hash_sensitive_data(data);

        assert_eq!(hash1, hash2); // Same input should produce same hash
        assert_eq!(hash1.len(), 64); // SHA256 produces 64-character hex string
    }

    #[test]
    fn test_payment_signature_is_deterministic() {
        let sig1 = payment_signature("order-1", "200", "150000.00", "server-key");
        let sig2 = payment_signature("order-1", "200", "150000.00", "server-key");

        assert_eq!(sig1, sig2);
        assert_eq!(sig1.len(), 128); // SHA512 produces 128-character hex string
    }

    #[test]
    fn test_payment_signature_changes_with_input() {
        let base = payment_signature("order-1", "200", "150000.00", "server-key");

        assert_ne!(base, payment_signature("order-2", "200", "150000.00", "server-key"));
        assert_ne!(base, payment_signature("order-1", "201", "150000.00", "server-key"));
        assert_ne!(base, payment_signature("order-1", "200", "150000.01", "server-key"));
        assert_ne!(base, payment_signature("order-1", "200", "150000.00", "other-key"));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hello_world"));
    }
}
