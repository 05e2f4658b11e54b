//! Process configuration, read from the environment
//!
//! `main` loads `.env` first (via dotenvy), so every variable can also be
//! supplied there.

use std::env;

use crate::uploader::SignatureAlgorithm;

/// Default media host API root
pub const DEFAULT_CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_base: String,
    pub timeout_seconds: u64,
    pub signature_algorithm: SignatureAlgorithm,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Path of the embedded database file
    pub database_path: String,
    /// HMAC secret used to sign and verify access tokens
    pub token_secret: String,
    pub require_auth: bool,
    pub cloudinary: CloudinaryConfig,
}

impl Config {
    /// Reads the configuration from process environment variables
    ///
    /// # Environment Variables
    ///
    /// - `PORT` - Server port number (default: 8000)
    /// - `DATABASE_URL` - Path to database file (default: "portfolio.db")
    /// - `ACCESS_TOKEN_SECRET` - Token signing secret (required)
    /// - `REQUIRE_AUTH` - Guard mutating routes with bearer tokens (default: false)
    /// - `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_API_KEY`, `CLOUDINARY_API_SECRET` (required)
    /// - `CLOUDINARY_API_BASE` - Upload API root (default: Cloudinary's public API)
    /// - `CLOUDINARY_TIMEOUT_SECONDS` - Per-upload timeout (default: 60)
    /// - `CLOUDINARY_SIGNATURE_ALGORITHM` - `sha1` or `sha256` (default: sha1)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            port: parsed("PORT", 8000)?,
            database_path: optional("DATABASE_URL").unwrap_or_else(|| "portfolio.db".to_string()),
            token_secret: required("ACCESS_TOKEN_SECRET")?,
            require_auth: flag("REQUIRE_AUTH")?,
            cloudinary: CloudinaryConfig {
                cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
                api_key: required("CLOUDINARY_API_KEY")?,
                api_secret: required("CLOUDINARY_API_SECRET")?,
                api_base: optional("CLOUDINARY_API_BASE")
                    .unwrap_or_else(|| DEFAULT_CLOUDINARY_API_BASE.to_string()),
                timeout_seconds: parsed("CLOUDINARY_TIMEOUT_SECONDS", 60)?,
                signature_algorithm: signature_algorithm("CLOUDINARY_SIGNATURE_ALGORITHM")?,
            },
        })
    }
}

/// Returns the variable if it is set and not blank
fn optional(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn flag(name: &'static str) -> Result<bool, ConfigError> {
    match optional(name).map(|value| value.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(value) => match value.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { name, value }),
        },
    }
}

fn signature_algorithm(name: &'static str) -> Result<SignatureAlgorithm, ConfigError> {
    match optional(name) {
        None => Ok(SignatureAlgorithm::default()),
        Some(value) => {
            SignatureAlgorithm::parse(&value).ok_or(ConfigError::Invalid { name, value })
        }
    }
}
