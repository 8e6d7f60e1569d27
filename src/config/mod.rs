//! Configuration Module
//!
//! Centralized, environment-driven configuration for the photo platform:
//! server, database, JWT, object storage, and payment gateway settings.

/// Environment variable helpers
pub mod env {
    use std::env;

    /// Get environment variable as string with default
    pub fn get_string(key: &str, default: &str) -> String {
        env::var(key).unwrap_or_else(|_| default.to_string())
    }

    /// Get environment variable as boolean with default
    pub fn get_bool(key: &str, default: bool) -> bool {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u16 with default
    pub fn get_u16(key: &str, default: u16) -> u16 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u32 with default
    pub fn get_u32(key: &str, default: u32) -> u32 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u64 with default
    pub fn get_u64(key: &str, default: u64) -> u64 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as i64 with default
    pub fn get_i64(key: &str, default: i64) -> i64 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get optional environment variable
    pub fn get_optional(key: &str) -> Option<String> {
        env::var(key).ok()
    }

    /// Get required environment variable or panic
    pub fn get_required(key: &str) -> String {
        env::var(key).unwrap_or_else(|_| panic!("Required environment variable {} is not set", key))
    }
}

/// Application configuration combining all service configurations
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Human-readable application title and summary, used in health responses
    pub title: String,
    pub summary: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Object storage configuration
    pub storage: StorageConfig,

    /// Payment gateway configuration
    pub payment: PaymentConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    pub max_lifetime_seconds: u64,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_token_expires_hours: i64,
    pub refresh_token_expires_days: i64,
}

/// Object storage (S3-compatible) configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    /// Custom endpoint for S3-compatible providers; None means AWS defaults
    pub endpoint: Option<String>,
    pub region: String,
    /// Lifetime of presigned GET URLs, in seconds
    pub presign_expires_seconds: u64,
}

/// Payment gateway (QRIS charge API) configuration
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub base_url: String,
    pub server_key: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: env::get_string("SERVER_HOST", "0.0.0.0"),
            port: env::get_u16("SERVER_PORT", 8000),
            log_level: env::get_string("LOG_LEVEL", "info"),
            cors_origins: env::get_string("CORS_ORIGINS", "*")
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: env::get_required("DATABASE_URL"),
            max_connections: env::get_u32("DB_MAX_CONNECTIONS", 10),
            min_connections: env::get_u32("DB_MIN_CONNECTIONS", 1),
            connect_timeout_seconds: env::get_u64("DB_CONNECT_TIMEOUT", 10),
            idle_timeout_seconds: env::get_u64("DB_IDLE_TIMEOUT", 600),
            max_lifetime_seconds: env::get_u64("DB_MAX_LIFETIME", 3600),
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            access_secret: env::get_required("JWT_ACCESS_SECRET"),
            refresh_secret: env::get_required("JWT_REFRESH_SECRET"),
            access_token_expires_hours: env::get_i64("JWT_ACCESS_EXPIRES_HOURS", 1),
            refresh_token_expires_days: env::get_i64("JWT_REFRESH_EXPIRES_DAYS", 30),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: env::get_required("STORAGE_BUCKET"),
            endpoint: env::get_optional("STORAGE_ENDPOINT"),
            region: env::get_string("STORAGE_REGION", "ap-southeast-1"),
            presign_expires_seconds: env::get_u64("STORAGE_PRESIGN_EXPIRES", 900),
        }
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            base_url: env::get_string(
                "PAYMENT_BASE_URL",
                "https://api.sandbox.midtrans.com/v2/",
            ),
            server_key: env::get_required("PAYMENT_SERVER_KEY"),
        }
    }
}

impl AppConfig {
    /// Load complete application configuration from environment
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            title: env::get_string("APP_TITLE", "Photo Platform"),
            summary: env::get_string(
                "APP_SUMMARY",
                "Marketplace for buying and selling event photos",
            ),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            jwt: JwtConfig::default(),
            storage: StorageConfig::default(),
            payment: PaymentConfig::default(),
        })
    }

    /// Validate the complete configuration
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.server.port == 0 {
            return Err("Server port must be greater than 0".into());
        }

        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".into());
        }

        if self.database.min_connections > self.database.max_connections {
            return Err("Database min_connections cannot be greater than max_connections".into());
        }

        if self.jwt.access_secret.is_empty() {
            return Err("JWT access secret cannot be empty".into());
        }

        if self.jwt.refresh_secret.is_empty() {
            return Err("JWT refresh secret cannot be empty".into());
        }

        if self.jwt.access_secret == self.jwt.refresh_secret {
            return Err("JWT access and refresh secrets must be different".into());
        }

        if self.payment.base_url.is_empty() || !self.payment.base_url.ends_with('/') {
            return Err("Payment base URL must be non-empty and end with '/'".into());
        }

        if self.storage.bucket.is_empty() {
            return Err("Storage bucket cannot be empty".into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        AppConfig {
            title: "Photo Platform".to_string(),
            summary: "test".to_string(),
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                log_level: "info".to_string(),
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/photo_platform".to_string(),
                max_connections: 10,
                min_connections: 1,
                connect_timeout_seconds: 10,
                idle_timeout_seconds: 600,
                max_lifetime_seconds: 3600,
            },
            jwt: JwtConfig {
                access_secret: "access".to_string(),
                refresh_secret: "refresh".to_string(),
                access_token_expires_hours: 1,
                refresh_token_expires_days: 30,
            },
            storage: StorageConfig {
                bucket: "photos".to_string(),
                endpoint: None,
                region: "ap-southeast-1".to_string(),
                presign_expires_seconds: 900,
            },
            payment: PaymentConfig {
                base_url: "https://api.sandbox.midtrans.com/v2/".to_string(),
                server_key: "server-key".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_config_passes_validation() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_equal_jwt_secrets_rejected() {
        let mut config = test_config();
        config.jwt.refresh_secret = config.jwt.access_secret.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_payment_base_url_must_end_with_slash() {
        let mut config = test_config();
        config.payment.base_url = "https://api.sandbox.midtrans.com/v2".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_helpers() {
        assert!(env::get_bool("NONEXISTENT_BOOL", true));
        assert!(!env::get_bool("NONEXISTENT_BOOL", false));
        assert_eq!(env::get_u32("NONEXISTENT_U32", 42), 42);
        assert_eq!(env::get_string("NONEXISTENT_STRING", "default"), "default");
        assert!(env::get_optional("NONEXISTENT_OPT").is_none());
    }
}
