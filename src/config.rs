use actix_web::cookie::Key;
use log::warn;
use sha2::{Digest, Sha512};
use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;

static IP: &str = "IP";
static PORT: &str = "PORT";
static SECRET_KEY: &str = "SECRET_KEY";
static DATABASE_URL: &str = "DATABASE_URL";
static TEMPLATE_DIR: &str = "TEMPLATE_DIR";
static STATIC_DIR: &str = "STATIC_DIR";
static SESSION_COOKIE_SECURE: &str = "SESSION_COOKIE_SECURE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a port number, got {value:?}: {source}")]
    InvalidPort {
        value: String,
        #[source]
        source: ParseIntError,
    },
}

#[derive(Clone)]
pub struct Config {
    pub ip: String,
    pub port: u16,
    pub database_url: String,
    pub template_dir: PathBuf,
    pub static_dir: PathBuf,
    pub secure_cookies: bool,
    /// Session cookie key, resolved once so every worker signs with the same key.
    pub session_key: Key,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match lookup(PORT) {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|source| ConfigError::InvalidPort { value, source })?,
            None => 8080,
        };

        let session_key = match lookup(SECRET_KEY).filter(|s| !s.is_empty()) {
            Some(secret) => derive_key(&secret),
            None => {
                warn!("{} is not set; sessions will not survive a restart", SECRET_KEY);
                Key::generate()
            }
        };

        let secure_cookies = lookup(SESSION_COOKIE_SECURE)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Config {
            ip: lookup(IP).unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            database_url: lookup(DATABASE_URL).unwrap_or_else(|| "sqlite:users.db".to_string()),
            template_dir: lookup(TEMPLATE_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./templates")),
            static_dir: lookup(STATIC_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./static")),
            secure_cookies,
            session_key,
        })
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.ip.clone(), self.port)
    }
}

// Key::from needs 64 bytes of material; SHA-512 stretches any secret to that.
fn derive_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}
