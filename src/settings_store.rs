//! Credential store for the SharpSpring account id and secret key.
//!
//! Holds the two settings in memory and, when a settings path is configured,
//! mirrors them to a small JSON file so they survive restarts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::errors::{AppError, ResultExt};

/// SharpSpring API credentials, read once per request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub account_id: String,
    pub secret_key: String,
}

impl Credentials {
    pub fn new(account_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            secret_key: secret_key.into(),
        }
    }
}

/// Names of the persisted settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    ApiKey,
    SecretKey,
}

impl SettingKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::ApiKey => "api_key",
            SettingKey::SecretKey => "secret_key",
        }
    }
}

/// On-disk layout of the settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredSettings {
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    secret_key: String,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

pub struct SettingsStore {
    path: Option<PathBuf>,
    values: RwLock<StoredSettings>,
    write_lock: Mutex<()>,
}

impl SettingsStore {
    /// Store without file persistence.
    pub fn in_memory(credentials: Credentials) -> Self {
        Self {
            path: None,
            values: RwLock::new(StoredSettings {
                api_key: credentials.account_id,
                secret_key: credentials.secret_key,
                updated_at: None,
            }),
            write_lock: Mutex::new(()),
        }
    }

    /// Builds the store from configuration.
    ///
    /// Values in the settings file take precedence; seed values from the
    /// environment fill whatever the file leaves empty.
    pub async fn load(config: &Config) -> Result<Self, AppError> {
        let mut stored = match config.settings_path {
            Some(ref path) => read_settings_file(path).await?,
            None => StoredSettings::default(),
        };

        if stored.api_key.is_empty() {
            if let Some(ref seed) = config.seed_account_id {
                stored.api_key = seed.trim().to_string();
            }
        }
        if stored.secret_key.is_empty() {
            if let Some(ref seed) = config.seed_secret_key {
                stored.secret_key = seed.trim().to_string();
            }
        }

        tracing::info!(
            "Settings loaded: api_key {}, secret_key {}",
            if stored.api_key.is_empty() { "unset" } else { "set" },
            fingerprint(&stored.secret_key)
        );

        Ok(Self {
            path: config.settings_path.clone(),
            values: RwLock::new(stored),
            write_lock: Mutex::new(()),
        })
    }

    /// Current value of a setting, empty when unset.
    pub fn get(&self, key: SettingKey) -> String {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        match key {
            SettingKey::ApiKey => values.api_key.clone(),
            SettingKey::SecretKey => values.secret_key.clone(),
        }
    }

    /// Snapshot of both credentials.
    pub fn credentials(&self) -> Credentials {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        Credentials::new(values.api_key.clone(), values.secret_key.clone())
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.values
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .updated_at
    }

    pub async fn set(&self, key: SettingKey, value: &str) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;

        let mut credentials = self.credentials();
        match key {
            SettingKey::ApiKey => credentials.account_id = value.to_string(),
            SettingKey::SecretKey => credentials.secret_key = value.to_string(),
        }
        self.store(credentials).await
    }

    /// Replaces both credentials and persists them when a path is configured.
    pub async fn update(&self, credentials: Credentials) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        self.store(credentials).await
    }

    /// Writes the file first; memory only changes once the write succeeded.
    /// Callers hold `write_lock`.
    async fn store(&self, credentials: Credentials) -> Result<(), AppError> {
        let next = StoredSettings {
            api_key: credentials.account_id.trim().to_string(),
            secret_key: credentials.secret_key.trim().to_string(),
            updated_at: Some(Utc::now()),
        };

        if let Some(ref path) = self.path {
            write_settings_file(path, &next)
                .await
                .context(format!("Failed to persist settings to {}", path.display()))?;
        }

        tracing::info!(
            "Settings updated: api_key {}, secret_key {}",
            if next.api_key.is_empty() { "unset" } else { "set" },
            fingerprint(&next.secret_key)
        );

        *self.values.write().unwrap_or_else(|e| e.into_inner()) = next;
        Ok(())
    }
}

/// Short SHA-256 fingerprint used to identify a secret in logs.
pub fn fingerprint(secret: &str) -> String {
    if secret.is_empty() {
        return "unset".to_string();
    }
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("sha256:{}", &digest[..8])
}

async fn read_settings_file(path: &Path) -> Result<StoredSettings, AppError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) if content.trim().is_empty() => Ok(StoredSettings::default()),
        Ok(content) => serde_json::from_str::<StoredSettings>(&content)
            .context(format!("Invalid settings file {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("Settings file {} not found, starting empty", path.display());
            Ok(StoredSettings::default())
        }
        Err(e) => Err::<StoredSettings, _>(e)
            .context(format!("Failed to read settings file {}", path.display())),
    }
}

async fn write_settings_file(path: &Path, settings: &StoredSettings) -> Result<(), AppError> {
    let content = serde_json::to_string_pretty(settings)?;
    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, content).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}
