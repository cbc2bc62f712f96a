//! Environment-driven configuration.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;

pub const DEFAULT_DB_PATH: &str = "./data/registrar.db";
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token. The Telegram channel is only enabled when set.
    pub telegram_bot_token: Option<SecretString>,
    /// libSQL database file.
    pub db_path: PathBuf,
    /// Users per page in the paginated listing.
    pub page_size: u32,
    /// Telegram id flagged admin at startup, so the first admin exists.
    pub bootstrap_admin: Option<i64>,
}

impl Config {
    /// Read configuration from the environment. Unset variables fall back
    /// to defaults; set-but-malformed values are a startup error rather
    /// than a silently wrong bot.
    pub fn from_env() -> Result<Self, ConfigError> {
        let telegram_bot_token = std::env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|token| !token.is_empty())
            .map(SecretString::from);

        let db_path = std::env::var("REGISTRAR_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DB_PATH));

        let page_size = match std::env::var("REGISTRAR_PAGE_SIZE") {
            Ok(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "REGISTRAR_PAGE_SIZE".to_string(),
                        message: format!("expected a positive integer, got {raw:?}"),
                    });
                }
            },
            Err(_) => DEFAULT_PAGE_SIZE,
        };

        let bootstrap_admin = match std::env::var("REGISTRAR_BOOTSTRAP_ADMIN") {
            Ok(raw) => match raw.parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    return Err(ConfigError::InvalidValue {
                        key: "REGISTRAR_BOOTSTRAP_ADMIN".to_string(),
                        message: format!("expected a Telegram id, got {raw:?}"),
                    });
                }
            },
            Err(_) => None,
        };

        Ok(Self {
            telegram_bot_token,
            db_path,
            page_size,
            bootstrap_admin,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram_bot_token: None,
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            page_size: DEFAULT_PAGE_SIZE,
            bootstrap_admin: None,
        }
    }
}
