//! Application configuration loaded from environment variables.
//!
//! Secrets (the JWT signing key, the Vision API key) are read once at
//! startup and held in memory for the lifetime of the process.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL for CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Directory where uploaded step photos are stored
    pub upload_dir: String,
    /// Whether the Vision OCR integration is enabled
    pub vision_enabled: bool,
    /// Vision API key (required when `vision_enabled`)
    pub vision_api_key: Option<String>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            upload_dir: "uploads".to_string(),
            vision_enabled: false,
            vision_api_key: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In production the secrets are injected as environment variables by
    /// the deployment (e.g. Cloud Run secret bindings).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let vision_enabled = env::var("VISION_ENABLED")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let vision_api_key = env::var("VISION_API_KEY")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        if vision_enabled && vision_api_key.is_none() {
            return Err(ConfigError::Missing("VISION_API_KEY"));
        }

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            vision_enabled,
            vision_api_key,
        })
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

    // Single test because the process environment is shared between
    // test threads.
    #[test]
    fn test_config_from_env() {
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::remove_var("VISION_ENABLED");
        env::remove_var("VISION_API_KEY");

        let config = Config::from_env().expect("Config should load");
        assert_eq!(config.port, 8080);
        assert!(!config.vision_enabled);
        assert_eq!(config.upload_dir, "uploads");

        env::set_var("VISION_ENABLED", "true");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("VISION_API_KEY")));
        env::remove_var("VISION_ENABLED");
    }
}
