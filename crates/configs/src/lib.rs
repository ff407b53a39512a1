//! # configs
//!
//! Layered settings for campusnet.
//!
//! # Loading Order
//! 1. Built-in defaults
//! 2. `config/default.toml` (optional)
//! 3. `config/{APP_ENV}.toml` (optional, `APP_ENV` defaults to `development`)
//! 4. Environment variables, e.g. `CAMPUSNET__DATABASE__URL=postgres://...`
//!
//! A `.env` file in the working directory is read first, if present.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub moderation: ModerationSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Unset means the in-memory store.
    pub url: Option<SecretString>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: SecretString,
    pub token_ttl_hours: i64,
    /// Adds `Secure` to the session cookie.
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationMode {
    Wordlist,
    Http,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModerationSettings {
    pub mode: ModerationMode,
    /// Analysis endpoint, required in `http` mode.
    pub url: Option<String>,
    pub timeout_secs: u64,
    /// Inline blocklist for `wordlist` mode.
    #[serde(default)]
    pub words: Vec<String>,
    /// Blocklist file for `wordlist` mode; merged with `words`.
    pub words_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub format: LogFormat,
    /// `EnvFilter` directives; `RUST_LOG` wins when set.
    pub filter: String,
}

impl Settings {
    /// Loads settings from `./config` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        Self::load_from(Path::new("config"), &env)
    }

    pub fn load_from(dir: &Path, env: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5500)?
            .set_default("database.max_connections", 10)?
            .set_default("auth.token_ttl_hours", 72)?
            .set_default("auth.cookie_secure", false)?
            .set_default("moderation.mode", "wordlist")?
            .set_default("moderation.timeout_secs", 5)?
            .set_default("log.format", "pretty")?
            .set_default("log.filter", "info,tower_http=debug")?
            .add_source(File::with_name(&dir.join("default").to_string_lossy()).required(false))
            .add_source(File::with_name(&dir.join(env).to_string_lossy()).required(false))
            .add_source(
                Environment::with_prefix("CAMPUSNET")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("moderation.words")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = settings.try_deserialize()?;
        settings.validate()?;
        tracing::debug!(env, "configuration loaded");
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.expose_secret().trim().is_empty() {
            return Err(ConfigError::Invalid("auth.jwt_secret must not be empty".into()));
        }
        if self.auth.token_ttl_hours <= 0 {
            return Err(ConfigError::Invalid("auth.token_ttl_hours must be positive".into()));
        }
        if self.moderation.mode == ModerationMode::Http && self.moderation.url.is_none() {
            return Err(ConfigError::Invalid(
                "moderation.url is required when moderation.mode = \"http\"".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(files: &[(&str, &str)]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "campusnet-config-{}-{}",
            std::process::id(),
            files.len()
        ));
        fs::create_dir_all(&dir).unwrap();
        for (name, body) in files {
            fs::write(dir.join(name), body).unwrap();
        }
        dir
    }

    #[test]
    fn test_layering_and_validation() {
        let dir = scratch_dir(&[
            (
                "default.toml",
                "[auth]\njwt_secret = \"from-default\"\n[moderation]\nwords = [\"idiot\"]\n",
            ),
            ("staging.toml", "[server]\nport = 8080\n"),
        ]);

        let settings = Settings::load_from(&dir, "development").unwrap();
        assert_eq!(settings.server.port, 5500);
        assert_eq!(settings.server.address(), "0.0.0.0:5500");
        assert_eq!(settings.auth.jwt_secret.expose_secret(), "from-default");
        assert_eq!(settings.moderation.mode, ModerationMode::Wordlist);
        assert_eq!(settings.moderation.words, vec!["idiot".to_string()]);
        assert!(settings.database.url.is_none());
        assert_eq!(settings.log.format, LogFormat::Pretty);

        let staging = Settings::load_from(&dir, "staging").unwrap();
        assert_eq!(staging.server.port, 8080);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_http_mode_requires_url() {
        let dir = scratch_dir(&[(
            "default.toml",
            "[auth]\njwt_secret = \"s\"\n[moderation]\nmode = \"http\"\n",
        )]);

        let err = Settings::load_from(&dir, "development").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        fs::remove_dir_all(&dir).ok();
    }
}
