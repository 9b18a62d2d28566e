use crate::error::{EditorError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const CONFIG_FILENAME: &str = "config.json";
const DEFAULT_PLACEHOLDER_TITLE: &str = "Untitled";
const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;
const DEFAULT_RECOVERY_WINDOW_HOURS: u64 = 24;
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_EXPORT_VERSION: &str = "1.0";
const MAX_AUTOSAVE_INTERVAL_SECS: u64 = 24 * 60 * 60;
const MAX_RECOVERY_WINDOW_HOURS: u64 = 24 * 366;

/// Workspace configuration, stored in `<workspace>/config.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EditorConfig {
    /// A title equal to this counts as "no title" for save and export.
    #[serde(default = "default_placeholder_title")]
    pub placeholder_title: String,

    #[serde(default = "default_autosave_interval_secs")]
    pub autosave_interval_secs: u64,

    /// Backups older than this are not offered for recovery.
    #[serde(default = "default_recovery_window_hours")]
    pub recovery_window_hours: u64,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,

    #[serde(default = "default_export_version")]
    pub export_version: String,
}

fn default_placeholder_title() -> String {
    DEFAULT_PLACEHOLDER_TITLE.to_string()
}

fn default_autosave_interval_secs() -> u64 {
    DEFAULT_AUTOSAVE_INTERVAL_SECS
}

fn default_recovery_window_hours() -> u64 {
    DEFAULT_RECOVERY_WINDOW_HOURS
}

fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_export_version() -> String {
    DEFAULT_EXPORT_VERSION.to_string()
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            placeholder_title: default_placeholder_title(),
            autosave_interval_secs: DEFAULT_AUTOSAVE_INTERVAL_SECS,
            recovery_window_hours: DEFAULT_RECOVERY_WINDOW_HOURS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            export_version: default_export_version(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    ShowAll,
    ShowKey(String),
    Set(String, String),
}

pub const CONFIG_KEYS: &[&str] = &[
    "placeholder_title",
    "autosave_interval_secs",
    "recovery_window_hours",
    "max_upload_bytes",
    "export_version",
];

fn parse_positive(key: &str, value: &str) -> Result<u64> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(EditorError::Validation(format!(
            "{} must be a positive integer (got '{}')",
            key, value
        ))),
    }
}

fn check_at_most(key: &str, n: u64, max: u64) -> Result<u64> {
    if n == 0 || n > max {
        return Err(EditorError::Validation(format!(
            "{} must be between 1 and {} (got {})",
            key, max, n
        )));
    }
    Ok(n)
}

impl EditorConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: EditorConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();
        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_dir.join(CONFIG_FILENAME), content)?;
        Ok(())
    }

    /// Rejects values a hand-edited file may carry but `set` never accepts.
    pub fn validate(&self) -> Result<()> {
        check_at_most(
            "autosave_interval_secs",
            self.autosave_interval_secs,
            MAX_AUTOSAVE_INTERVAL_SECS,
        )?;
        check_at_most(
            "recovery_window_hours",
            self.recovery_window_hours,
            MAX_RECOVERY_WINDOW_HOURS,
        )?;
        check_at_most("max_upload_bytes", self.max_upload_bytes, u64::MAX)?;
        Ok(())
    }

    pub fn list_all(&self) -> Vec<(&'static str, String)> {
        CONFIG_KEYS
            .iter()
            .filter_map(|key| self.get(key).map(|value| (*key, value)))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "placeholder_title" => Some(self.placeholder_title.clone()),
            "autosave_interval_secs" => Some(self.autosave_interval_secs.to_string()),
            "recovery_window_hours" => Some(self.recovery_window_hours.to_string()),
            "max_upload_bytes" => Some(self.max_upload_bytes.to_string()),
            "export_version" => Some(self.export_version.clone()),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "placeholder_title" => {
                if value.trim().is_empty() {
                    return Err(EditorError::Validation(
                        "placeholder_title cannot be empty".to_string(),
                    ));
                }
                self.placeholder_title = value.trim().to_string();
            }
            "autosave_interval_secs" => {
                let n = parse_positive(key, value)?;
                self.autosave_interval_secs = check_at_most(key, n, MAX_AUTOSAVE_INTERVAL_SECS)?;
            }
            "recovery_window_hours" => {
                let n = parse_positive(key, value)?;
                self.recovery_window_hours = check_at_most(key, n, MAX_RECOVERY_WINDOW_HOURS)?;
            }
            "max_upload_bytes" => {
                self.max_upload_bytes = parse_positive(key, value)?;
            }
            "export_version" => {
                if value.trim().is_empty() {
                    return Err(EditorError::Validation(
                        "export_version cannot be empty".to_string(),
                    ));
                }
                self.export_version = value.trim().to_string();
            }
            other => {
                return Err(EditorError::Validation(format!(
                    "Unknown config key: {}",
                    other
                )))
            }
        }
        Ok(())
    }

    /// Out-of-range values fall back to the default interval.
    pub fn autosave_interval(&self) -> chrono::Duration {
        i64::try_from(self.autosave_interval_secs.min(MAX_AUTOSAVE_INTERVAL_SECS))
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or_else(|| chrono::Duration::seconds(DEFAULT_AUTOSAVE_INTERVAL_SECS as i64))
    }

    pub fn recovery_window(&self) -> chrono::Duration {
        i64::try_from(self.recovery_window_hours.min(MAX_RECOVERY_WINDOW_HOURS))
            .ok()
            .and_then(chrono::Duration::try_hours)
            .unwrap_or_else(|| chrono::Duration::hours(DEFAULT_RECOVERY_WINDOW_HOURS as i64))
    }
}
