use std::{env, fs, path::Path};

use serde::Deserialize;
use thiserror::Error;

const SETTINGS_FILENAME: &str = "settings.json";
const SETTINGS_PATH_VAR: &str = "SETTINGS_PATH";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("cannot parse settings file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub tcp_socket_binding: String,
    pub tcp_socket_port: u16,
    pub database_path: String,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    pub jwt_secret: String,
    pub jwt_refresh_secret: String,
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_in_minutes: u64,
    #[serde(default = "default_jwt_refresh_expiration")]
    pub jwt_refresh_expiration_in_minutes: u64,
    pub default_admin_email: String,
    pub default_admin_password: String,
    #[serde(default)]
    pub stripe_secret_key: Option<String>,
    #[serde(default = "default_premium_price")]
    pub premium_price_cents: u64,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_jwt_expiration() -> u64 {
    24 * 60
}

fn default_jwt_refresh_expiration() -> u64 {
    30 * 24 * 60
}

fn default_premium_price() -> u64 {
    4999
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Settings {
    /// Reads `settings.json`, or the file named by `SETTINGS_PATH`.
    pub fn load() -> Result<Settings, SettingsError> {
        let path = env::var(SETTINGS_PATH_VAR).unwrap_or_else(|_| SETTINGS_FILENAME.to_string());
        Self::load_from(path)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Settings, SettingsError> {
        let display = path.as_ref().display().to_string();
        let content = fs::read_to_string(path.as_ref()).map_err(|source| SettingsError::Read {
            path: display.clone(),
            source,
        })?;
        Self::parse(&content).map_err(|source| SettingsError::Parse { path: display, source })
    }

    pub fn parse(content: &str) -> Result<Settings, serde_json::Error> {
        serde_json::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_fall_back_to_defaults() {
        let settings = Settings::parse(
            r#"{
                "tcp_socket_binding": "127.0.0.1",
                "tcp_socket_port": 8080,
                "database_path": "test.redb",
                "jwt_secret": "a",
                "jwt_refresh_secret": "b",
                "default_admin_email": "admin@example.com",
                "default_admin_password": "secret1"
            }"#,
        )
        .unwrap();

        assert_eq!(settings.upload_dir, "uploads");
        assert_eq!(settings.jwt_expiration_in_minutes, 1440);
        assert_eq!(settings.premium_price_cents, 4999);
        assert!(settings.stripe_secret_key.is_none());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = Settings::load_from("/nonexistent/settings.json").unwrap_err();
        assert!(matches!(err, SettingsError::Read { .. }));
    }
}
