//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup and kept in memory; there is no
//! secret rotation in scope.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// SQLite database URL
    pub database_url: String,
    /// Frontend URL for CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// S3 bucket holding document blobs
    pub s3_bucket: String,
    /// AWS region for the bucket
    pub aws_region: String,
    /// Chat model name
    pub gemini_model: String,

    // --- Secrets ---
    /// JWT signing key for both token kinds (raw bytes)
    pub jwt_secret: Vec<u8>,
    /// AWS access key id
    pub aws_access_key: String,
    /// AWS secret access key
    pub aws_secret_key: String,
    /// Gemini API key
    pub gemini_api_key: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:medkin.db".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .unwrap_or(8000),
            s3_bucket: env::var("S3_BUCKET_NAME")
                .map_err(|_| ConfigError::Missing("S3_BUCKET_NAME"))?,
            aws_region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.0-flash".to_string()),

            jwt_secret: env::var("JWT_SECRET_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SECRET_KEY"))?
                .into_bytes(),
            aws_access_key: env::var("AWS_ACCESS_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("AWS_ACCESS_KEY"))?,
            aws_secret_key: env::var("AWS_SECRET_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("AWS_SECRET_KEY"))?,
            gemini_api_key: env::var("GEMINI_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GEMINI_API_KEY"))?,
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8000,
            s3_bucket: "medkin-test".to_string(),
            aws_region: "us-east-1".to_string(),
            gemini_model: "gemini-2.0-flash".to_string(),
            jwt_secret: b"test_jwt_key_32_bytes_minimum!!!".to_vec(),
            aws_access_key: "test_access_key".to_string(),
            aws_secret_key: "test_secret_key".to_string(),
            gemini_api_key: "test_gemini_key".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("S3_BUCKET_NAME", "test-bucket");
        env::set_var("JWT_SECRET_KEY", "test_jwt_key_32_bytes_minimum!!!");
        env::set_var("AWS_ACCESS_KEY", "ak");
        env::set_var("AWS_SECRET_KEY", "sk");
        env::set_var("GEMINI_API_KEY", "gk");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.s3_bucket, "test-bucket");
        assert_eq!(config.aws_access_key, "ak");
        assert_eq!(config.port, 8000);
    }
}
