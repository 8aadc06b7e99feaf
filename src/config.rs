use anyhow::{anyhow, Result};
use chrono_tz::Tz;
use std::env;

const DEFAULT_DATABASE_URL: &str = "sqlite:./data/countdown.db";
const DEFAULT_TIMEZONE: &str = "Asia/Tehran";

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    pub database_url: String,
    pub http_port: u16,
    /// Zone reminder times are interpreted in
    pub timezone: Tz,
}

fn var_or_default(name: &str, default: &str) -> String {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default.to_string(),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let token = env::var("TELEGRAM_BOT_TOKEN")
            .map_err(|_| anyhow!("TELEGRAM_BOT_TOKEN must be set"))?;

        if token.trim().is_empty() {
            return Err(anyhow!("TELEGRAM_BOT_TOKEN must be set"));
        }

        let database_url = var_or_default("DATABASE_URL", DEFAULT_DATABASE_URL);

        let http_port = var_or_default("HTTP_PORT", "3000")
            .trim()
            .parse()
            .map_err(|_| anyhow!("Invalid HTTP_PORT"))?;

        let timezone = var_or_default("BOT_TIMEZONE", DEFAULT_TIMEZONE)
            .trim()
            .parse::<Tz>()
            .map_err(|e| anyhow!("Invalid BOT_TIMEZONE: {}", e))?;

        Ok(Config {
            telegram_bot_token: token,
            database_url,
            http_port,
            timezone,
        })
    }
}
