//! Application settings: where the data root lives.

use std::fs;
use std::path::{Path, PathBuf};

use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Overrides the configured data root when set.
pub const DATA_ROOT_ENV: &str = "INVOICE_MAKER_DATA";

pub const DEFAULT_DATA_ROOT: &str = "~/Documents/Invoices";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppSettings {
    pub data_root: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            data_root: DEFAULT_DATA_ROOT.to_string(),
        }
    }
}

impl AppSettings {
    /// Data root with `~` expanded, or the environment override.
    pub fn resolved_root(&self) -> PathBuf {
        match std::env::var(DATA_ROOT_ENV) {
            Ok(path) if !path.trim().is_empty() => PathBuf::from(expand_home_dir(&path)),
            _ => PathBuf::from(expand_home_dir(&self.data_root)),
        }
    }

    /// Where exported PDFs go: `<root>/output/<year>/<client-slug>/`.
    pub fn output_dir(&self, year: i32, client_name: &str) -> PathBuf {
        let client = slug::slugify(client_name);
        let client = if client.is_empty() { "unnamed-client".to_string() } else { client };
        self.resolved_root()
            .join("output")
            .join(year.to_string())
            .join(client)
    }
}

pub fn settings_path() -> Result<PathBuf, SettingsError> {
    let dirs = ProjectDirs::from("com", "invoice-maker", "app").ok_or(SettingsError::NoConfigDir)?;
    Ok(dirs.config_dir().join("settings.toml"))
}

pub fn load_from(path: &Path) -> Result<Option<AppSettings>, SettingsError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(Some(toml::from_str(&content)?))
}

pub fn save_to(path: &Path, settings: &AppSettings) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml::to_string_pretty(settings)?)?;
    Ok(())
}

/// Saved settings, if any. An unreadable file is logged and treated as absent.
pub fn load() -> Option<AppSettings> {
    let path = match settings_path() {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!(error = %e, "cannot locate settings");
            return None;
        }
    };
    match load_from(&path) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(error = %e, path = ?path, "ignoring unreadable settings");
            None
        }
    }
}

pub fn save(settings: &AppSettings) -> Result<(), SettingsError> {
    save_to(&settings_path()?, settings)
}

pub fn expand_home_dir(path: &str) -> String {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(base_dirs) = BaseDirs::new() {
            return format!("{}{}", base_dirs.home_dir().to_string_lossy(), rest);
        }
    }
    path.to_string()
}
