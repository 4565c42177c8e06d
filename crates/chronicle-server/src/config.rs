use std::path::PathBuf;

use anyhow::{Result, bail};

/// Signing keys are derived from the session secret; anything shorter than
/// this is refused at startup.
const MIN_SESSION_SECRET_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub session_secret: String,
    pub public_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("CHRONICLE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("CHRONICLE_PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()?;
        let db_path = std::env::var("CHRONICLE_DB_PATH").unwrap_or_else(|_| "chronicle.db".into());
        let session_secret = std::env::var("CHRONICLE_SESSION_SECRET")
            .unwrap_or_else(|_| "dev-secret-change-me-0123456789abcdef".into());
        let public_dir = std::env::var("CHRONICLE_PUBLIC_DIR").unwrap_or_else(|_| "public".into());

        let config = Self {
            host,
            port,
            db_path: PathBuf::from(db_path),
            session_secret,
            public_dir: PathBuf::from(public_dir),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.session_secret.len() < MIN_SESSION_SECRET_LEN {
            bail!(
                "CHRONICLE_SESSION_SECRET must be at least {} bytes, got {}",
                MIN_SESSION_SECRET_LEN,
                self.session_secret.len()
            );
        }
        Ok(())
    }
}
