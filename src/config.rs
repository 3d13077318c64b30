use anyhow::{anyhow, Result};
use std::env;
use std::fs;
use std::path::Path;

/// File consulted for the bot token when `TELEGRAM_BOT_TOKEN` is not set.
pub const TOKEN_FILE: &str = ".telegram_bot_token";

pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/plans.db";
pub const DEFAULT_IMAGE_URL: &str = "https://picsum.photos/600/400";
/// Every minute at second zero.
pub const DEFAULT_REMINDER_CRON: &str = "0 * * * * *";

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    pub database_url: String,
    pub http_port: u16,
    pub reminder_image_url: String,
    pub reminder_cron: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let token = match env::var("TELEGRAM_BOT_TOKEN") {
            Ok(token) => token,
            Err(_) => read_token_file(Path::new(TOKEN_FILE))?,
        };

        if token.trim().is_empty() {
            return Err(anyhow!("TELEGRAM_BOT_TOKEN must be set"));
        }

        let database_url = Self::database_url_from_env();

        let port_str = env::var("HTTP_PORT")
            .unwrap_or_else(|_| "3000".to_string());
        let http_port = port_str.trim()
            .parse()
            .map_err(|_| anyhow!("Invalid HTTP_PORT"))?;

        let reminder_image_url = non_empty_var("REMINDER_IMAGE_URL", DEFAULT_IMAGE_URL);
        let reminder_cron = non_empty_var("REMINDER_CRON", DEFAULT_REMINDER_CRON);

        Ok(Config {
            telegram_bot_token: token,
            database_url,
            http_port,
            reminder_image_url,
            reminder_cron,
        })
    }
}

impl Config {
    /// `DATABASE_URL` or its default; needs no bot token.
    pub fn database_url_from_env() -> String {
        non_empty_var("DATABASE_URL", DEFAULT_DATABASE_URL)
    }
}

fn non_empty_var(name: &str, default: &str) -> String {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default.to_string(),
    }
}

/// Reads the token from the first line of `path`.
pub fn read_token_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(anyhow!(
            "TELEGRAM_BOT_TOKEN must be set (or provide a {} file)",
            TOKEN_FILE
        ));
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| anyhow!("Failed to read {}: {}", path.display(), e))?;

    Ok(contents.lines().next().unwrap_or("").trim().to_string())
}
