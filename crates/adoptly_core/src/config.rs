//! Core configuration loaded from TOML with environment overrides.
//!
//! # Responsibility
//! - Describe remote endpoints, credentials, paging and local storage settings.
//! - Apply `ADOPTLY_*` environment overrides on top of file values.
//!
//! # Invariants
//! - A config returned by `load`/`from_toml_str` has passed `validate()`.

use crate::error::{HasMessage, MessageId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_FIREBASE_API_KEY: &str = "ADOPTLY_FIREBASE_API_KEY";
pub const ENV_FIREBASE_PROJECT_ID: &str = "ADOPTLY_FIREBASE_PROJECT_ID";
pub const ENV_IMGBB_API_KEY: &str = "ADOPTLY_IMGBB_API_KEY";
pub const ENV_DB_PATH: &str = "ADOPTLY_DB_PATH";

const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com";
const DEFAULT_AUTH_URL: &str = "https://identitytoolkit.googleapis.com";
const DEFAULT_IMGBB_URL: &str = "https://api.imgbb.com";
const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;
const DEFAULT_DB_FILE_NAME: &str = "adoptly_chats.sqlite3";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, message: String },
    Parse(String),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, message } => {
                write!(f, "failed to read config `{}`: {message}", path.display())
            }
            Self::Parse(message) => write!(f, "invalid config syntax: {message}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {}

impl HasMessage for ConfigError {
    fn message_id(&self) -> MessageId {
        MessageId::Unknown
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    pub firebase: FirebaseConfig,
    #[serde(default)]
    pub image_host: ImageHostConfig,
    #[serde(default)]
    pub paging: PagingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirebaseConfig {
    pub project_id: String,
    pub api_key: String,
    #[serde(default = "default_firestore_url")]
    pub firestore_base_url: String,
    #[serde(default = "default_auth_url")]
    pub auth_base_url: String,
}

impl FirebaseConfig {
    pub fn new(project_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            api_key: api_key.into(),
            firestore_base_url: default_firestore_url(),
            auth_base_url: default_auth_url(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageHostConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_imgbb_url")]
    pub base_url: String,
}

impl Default for ImageHostConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_imgbb_url(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Items from the end of loaded data at which the next page is requested.
    /// Defaults to `page_size`.
    #[serde(default)]
    pub prefetch_distance: Option<u32>,
}

impl PagingConfig {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size,
            prefetch_distance: None,
        }
    }

    pub fn effective_prefetch_distance(&self) -> u32 {
        self.prefetch_distance.unwrap_or(self.page_size)
    }

    /// First load fetches three pages at once.
    pub fn initial_load_size(&self) -> u32 {
        self.page_size.saturating_mul(3)
    }
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Chat cache file. Defaults to the temp directory when unset.
    #[serde(default)]
    pub chat_db_path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn resolved_chat_db_path(&self) -> PathBuf {
        self.chat_db_path
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub dir: Option<String>,
}

impl CoreConfig {
    /// Reads, overrides from the process environment, and validates a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let mut config: Self =
            toml::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from `lookup`; blank values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };
        if let Some(api_key) = value(ENV_FIREBASE_API_KEY) {
            self.firebase.api_key = api_key;
        }
        if let Some(project_id) = value(ENV_FIREBASE_PROJECT_ID) {
            self.firebase.project_id = project_id;
        }
        if let Some(api_key) = value(ENV_IMGBB_API_KEY) {
            self.image_host.api_key = api_key;
        }
        if let Some(path) = value(ENV_DB_PATH) {
            self.storage.chat_db_path = Some(PathBuf::from(path));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.firebase.project_id.trim().is_empty() {
            return Err(ConfigError::Invalid("firebase.project_id is empty".into()));
        }
        if self.firebase.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid("firebase.api_key is empty".into()));
        }
        for (name, url) in [
            ("firebase.firestore_base_url", &self.firebase.firestore_base_url),
            ("firebase.auth_base_url", &self.firebase.auth_base_url),
            ("image_host.base_url", &self.image_host.base_url),
        ] {
            url::Url::parse(url)
                .map_err(|err| ConfigError::Invalid(format!("{name} `{url}`: {err}")))?;
        }
        if self.paging.page_size == 0 || self.paging.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "paging.page_size must be within 1..={MAX_PAGE_SIZE}, got {}",
                self.paging.page_size
            )));
        }
        Ok(())
    }
}

fn default_firestore_url() -> String {
    DEFAULT_FIRESTORE_URL.to_string()
}

fn default_auth_url() -> String {
    DEFAULT_AUTH_URL.to_string()
}

fn default_imgbb_url() -> String {
    DEFAULT_IMGBB_URL.to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, ENV_DB_PATH, ENV_FIREBASE_API_KEY, ENV_IMGBB_API_KEY};
    use std::path::PathBuf;

    const MINIMAL: &str = r#"
[firebase]
project_id = "adoptly-demo"
api_key = "web-key"
"#;

    #[test]
    fn minimal_config_fills_defaults() {
        let config = CoreConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(
            config.firebase.firestore_base_url,
            "https://firestore.googleapis.com"
        );
        assert_eq!(config.paging.page_size, 10);
        assert_eq!(config.paging.initial_load_size(), 30);
        assert_eq!(config.paging.effective_prefetch_distance(), 10);
    }

    #[test]
    fn overrides_replace_non_blank_values_only() {
        let mut config = CoreConfig::from_toml_str(MINIMAL).unwrap();
        config.apply_overrides(|key| match key {
            ENV_FIREBASE_API_KEY => Some("  ".to_string()),
            ENV_IMGBB_API_KEY => Some("img-key".to_string()),
            ENV_DB_PATH => Some("/data/chats.db".to_string()),
            _ => None,
        });
        assert_eq!(config.image_host.api_key, "img-key");
        assert_eq!(
            config.storage.chat_db_path,
            Some(PathBuf::from("/data/chats.db"))
        );
        assert_ne!(config.firebase.api_key.trim(), "");
    }

    #[test]
    fn validate_rejects_zero_page_size_and_bad_urls() {
        let err = CoreConfig::from_toml_str(&format!("{MINIMAL}\n[paging]\npage_size = 0\n"))
            .unwrap_err();
        assert!(err.to_string().contains("page_size"));

        let err = CoreConfig::from_toml_str(
            r#"
[firebase]
project_id = "p"
api_key = "k"
auth_base_url = "not a url"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("auth_base_url"));
    }

    #[test]
    fn missing_firebase_section_is_a_parse_error() {
        let err = CoreConfig::from_toml_str("[paging]\npage_size = 5\n").unwrap_err();
        assert!(matches!(err, super::ConfigError::Parse(_)));
    }
}
