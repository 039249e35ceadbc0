use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub gemini_api_key: String,
    pub cors_origins: Vec<String>,
    /// Root of the per-run artifact directories, also served at `/output`.
    pub output_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let mut cors_origins = Vec::new();
        for key in ["FRONTEND_URL_DEV", "FRONTEND_URL_PROD"] {
            if let Ok(origin) = std::env::var(key) {
                if !origin.trim().is_empty() {
                    cors_origins.push(origin);
                }
            }
        }
        if cors_origins.is_empty() {
            bail!(
                "No CORS origins configured. Set FRONTEND_URL_DEV and/or FRONTEND_URL_PROD \
                environment variables."
            );
        }

        Ok(Config {
            openai_api_key: require_env("OPENAI_API_KEY")?,
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            cors_origins,
            output_dir: std::env::var("OUTPUT_DIR")
                .unwrap_or_else(|_| "output".to_string())
                .into(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
