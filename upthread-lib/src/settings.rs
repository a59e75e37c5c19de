use crate::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const SETTINGS_FILE: &str = "settings.json";

/// Client settings, stored as JSON in the per-user data directory.
///
/// The UI keeps a copy of these in GLOBALS and asks the overlord to save
/// them when they change.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    // Network settings
    pub api_url: String,
    pub api_key: Option<String>,
    pub offline: bool,
    pub request_timeout_secs: u64,

    // Session
    pub last_username: Option<String>,

    // UI settings
    pub status_message_secs: u64,
    pub max_fps: u32,
    pub dark_mode: bool,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            api_url: "http://localhost:5001/graphql".to_owned(),
            api_key: None,
            offline: false,
            request_timeout_secs: 30,
            last_username: None,
            status_message_secs: 8,
            max_fps: 30,
            dark_mode: false,
        }
    }
}

impl Settings {
    /// Where settings live, creating the directory if needed
    pub fn data_dir() -> Result<PathBuf, Error> {
        let mut dir = match dirs::data_dir() {
            Some(d) => d,
            None => {
                return Err(ErrorKind::General("Cannot find a directory to store data".to_owned()).into())
            }
        };
        dir.push("upthread");
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Load settings from disk, falling back to defaults when there is no
    /// file yet. Environment variables override the file.
    pub fn load() -> Result<Settings, Error> {
        let path = Self::data_dir()?.join(SETTINGS_FILE);
        let mut settings = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No settings at {}, using defaults", path.display());
                Settings::default()
            }
            Err(e) => return Err(e.into()),
        };
        settings.apply_env(|k| std::env::var(k).ok());
        Ok(settings)
    }

    pub fn save(&self) -> Result<(), Error> {
        let path = Self::data_dir()?.join(SETTINGS_FILE);
        let bytes = serde_json::to_vec_pretty(self)?;
        std::fs::write(&path, bytes)?;
        tracing::debug!("Settings saved to {}", path.display());
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn status_message_lifetime(&self) -> Duration {
        Duration::from_secs(self.status_message_secs)
    }

    fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, var: F) {
        if let Some(url) = var("UPTHREAD_API_URL") {
            self.api_url = url;
        }
        if let Some(key) = var("UPTHREAD_API_KEY") {
            self.api_key = if key.is_empty() { None } else { Some(key) };
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"offline": true}"#).unwrap();
        assert!(settings.offline);
        assert_eq!(settings.api_url, Settings::default().api_url);
        assert_eq!(settings.status_message_secs, 8);
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings {
            api_key: Some("old".to_owned()),
            ..Default::default()
        };
        settings.apply_env(|k| match k {
            "UPTHREAD_API_URL" => Some("https://example.stepzen.net/api/graphql".to_owned()),
            "UPTHREAD_API_KEY" => Some("".to_owned()),
            _ => None,
        });
        assert_eq!(settings.api_url, "https://example.stepzen.net/api/graphql");
        assert_eq!(settings.api_key, None);
    }
}
