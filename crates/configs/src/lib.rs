//! crates/configs/src/lib.rs
//!
//! Layered settings for the WebCarros binaries.
//!
//! Sources, later ones winning:
//! 1. built-in defaults (in-memory stores, `info` logging)
//! 2. optional `config/webcarros.{toml,yaml,json}`
//! 3. environment variables such as `WEBCARROS__STORAGE__RECORDS__BACKEND=sqlite`
//!
//! A `.env` file is loaded into the environment first when present.

use std::path::PathBuf;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Source(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaBackend {
    Memory,
    Local,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordSettings {
    pub backend: RecordBackend,
    /// Required when `backend = "sqlite"`, e.g. `sqlite://data/webcarros.db`.
    pub sqlite_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaSettings {
    pub backend: MediaBackend,
    /// Upload root for the `local` backend.
    pub root: PathBuf,
    /// Prefix of every download URL handed out.
    pub public_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    pub records: RecordSettings,
    pub media: MediaSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directive, overridden by `RUST_LOG` when set.
    pub filter: String,
    pub json: bool,
}

/// Demo seller account the seeder registers (or signs in as).
#[derive(Debug, Deserialize)]
pub struct SeedSettings {
    pub email: String,
    #[serde(deserialize_with = "secret")]
    pub password: SecretString,
    pub name: String,
    /// Directory of .jpg/.png files to attach to the demo listings.
    pub images_dir: Option<PathBuf>,
}

fn secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub storage: StorageSettings,
    pub log: LogSettings,
    pub seed: SeedSettings,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), ".env loaded");
        }
        let config = Self::defaults()?
            .add_source(File::with_name("config/webcarros").required(false))
            .add_source(Environment::with_prefix("WEBCARROS").separator("__"))
            .build()?;
        Self::from_config(config)
    }

    /// Defaults overlaid with an inline TOML document. Ignores the
    /// environment, which keeps it deterministic for tests and tools.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config = Self::defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Self::from_config(config)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("storage.records.backend", "memory")?
            .set_default("storage.media.backend", "memory")?
            .set_default("storage.media.root", "./data/uploads")?
            .set_default("storage.media.public_url", "/static/uploads")?
            .set_default("log.filter", "info")?
            .set_default("log.json", false)?
            .set_default("seed.email", "seller@webcarros.test")?
            .set_default("seed.password", "webcarros")?
            .set_default("seed.name", "Demo Seller")?)
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let records = &self.storage.records;
        if records.backend == RecordBackend::Sqlite
            && records.sqlite_url.as_deref().map_or(true, str::is_empty)
        {
            return Err(ConfigError::Invalid(
                "storage.records.sqlite_url is required for the sqlite backend".into(),
            ));
        }
        if self.storage.media.public_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "storage.media.public_url must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn defaults_use_memory_stores() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings.storage.records.backend, RecordBackend::Memory);
        assert_eq!(settings.storage.media.backend, MediaBackend::Memory);
        assert_eq!(settings.log.filter, "info");
        assert!(!settings.log.json);
        assert!(settings.seed.images_dir.is_none());
    }

    #[test]
    fn file_values_override_defaults() {
        let settings = Settings::from_toml(
            r#"
            [storage.records]
            backend = "sqlite"
            sqlite_url = "sqlite::memory:"

            [storage.media]
            backend = "local"
            root = "/tmp/webcarros"
            public_url = "https://cdn.example"

            [seed]
            password = "s3cret!"
            "#,
        )
        .unwrap();
        assert_eq!(settings.storage.records.backend, RecordBackend::Sqlite);
        assert_eq!(settings.storage.media.root, PathBuf::from("/tmp/webcarros"));
        assert_eq!(settings.seed.password.expose_secret(), "s3cret!");
    }

    #[test]
    fn sqlite_without_url_is_rejected() {
        let err = Settings::from_toml("[storage.records]\nbackend = \"sqlite\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let err = Settings::from_toml("[storage.media]\nbackend = \"s3\"").unwrap_err();
        assert!(matches!(err, ConfigError::Source(_)));
    }

    #[test]
    fn password_is_redacted_in_debug_output() {
        let settings = Settings::from_toml("[seed]\npassword = \"hunter22\"").unwrap();
        assert!(!format!("{settings:?}").contains("hunter22"));
    }
}
