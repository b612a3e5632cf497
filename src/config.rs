use anyhow::{Context, Result, bail};
use chrono::FixedOffset;
use std::env;
use std::str::FromStr;

#[derive(Clone)]
pub struct Config {
    /// `None` keeps everything in process memory.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub log_dir: String,

    /// Offset of the organization's wall clock; WIB (UTC+7) by default.
    pub utc_offset_minutes: i32,

    /// First admin account, created at start-up when no admin exists.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub admin_name: String,
}

fn var_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            database_url: non_empty("DATABASE_URL"),
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            access_token_ttl: var_or("ACCESS_TOKEN_TTL", 900)?, // 15 min
            refresh_token_ttl: var_or("REFRESH_TOKEN_TTL", 604_800)?, // 7 days

            rate_login_per_min: var_or("RATE_LOGIN_PER_MIN", 60)?,
            rate_register_per_min: var_or("RATE_REGISTER_PER_MIN", 30)?,
            rate_refresh_per_min: var_or("RATE_REFRESH_PER_MIN", 30)?,
            rate_protected_per_min: var_or("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            utc_offset_minutes: var_or("UTC_OFFSET_MINUTES", 7 * 60)?,

            admin_email: non_empty("ADMIN_EMAIL"),
            admin_password: non_empty("ADMIN_PASSWORD"),
            admin_name: env::var("ADMIN_NAME").unwrap_or_else(|_| "Admin FOKSI".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.len() < 16 {
            bail!("JWT_SECRET must be at least 16 characters");
        }
        for (key, rate) in [
            ("RATE_LOGIN_PER_MIN", self.rate_login_per_min),
            ("RATE_REGISTER_PER_MIN", self.rate_register_per_min),
            ("RATE_REFRESH_PER_MIN", self.rate_refresh_per_min),
            ("RATE_PROTECTED_PER_MIN", self.rate_protected_per_min),
        ] {
            if rate == 0 {
                bail!("{} must be greater than zero", key);
            }
        }
        if self.utc_offset().is_none() {
            bail!("UTC_OFFSET_MINUTES must be within -1439..=1439");
        }
        Ok(())
    }

    pub fn utc_offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes.checked_mul(60)?)
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            database_url: None,
            jwt_secret: "test-secret-0123456789".to_string(),
            server_addr: "127.0.0.1:0".to_string(),
            access_token_ttl: 900,
            refresh_token_ttl: 3600,
            rate_login_per_min: 10_000,
            rate_register_per_min: 10_000,
            rate_refresh_per_min: 10_000,
            rate_protected_per_min: 10_000,
            api_prefix: "/api".to_string(),
            log_dir: "logs".to_string(),
            utc_offset_minutes: 7 * 60,
            admin_email: None,
            admin_password: None,
            admin_name: "Admin FOKSI".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_is_valid() {
        let config = Config::for_tests();
        assert!(config.validate().is_ok());
        assert_eq!(config.utc_offset().unwrap().local_minus_utc(), 7 * 3600);
    }

    #[test]
    fn rejects_zero_rates_and_bad_offsets() {
        let mut config = Config::for_tests();
        config.rate_login_per_min = 0;
        assert!(config.validate().is_err());

        let mut config = Config::for_tests();
        config.utc_offset_minutes = 24 * 60;
        assert!(config.validate().is_err());

        let mut config = Config::for_tests();
        config.jwt_secret = "short".into();
        assert!(config.validate().is_err());
    }
}
