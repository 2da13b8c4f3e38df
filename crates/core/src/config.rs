//! Application configuration.
//!
//! Values are layered: built-in defaults, then `config.toml` under the user's
//! config directory, then `MEDIAAMP_*` environment variables (`__` separates
//! nested keys, e.g. `MEDIAAMP_API__KEY`).

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat, Map};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::remote::{DEFAULT_BASE_URL, DEFAULT_REMOTE_PAGE_SIZE};

/// Directory under the platform config dir holding our files.
pub const CONFIG_DIR: &str = "mediaamp";
/// File name of the user configuration.
pub const CONFIG_FILE: &str = "config.toml";

const ENV_PREFIX: &str = "MEDIAAMP";

const DEFAULT_CONFIG: &str = r#"# MediaAMP configuration

start_page = 1

[api]
base_url = "https://api.rawg.io/api"
# Key for the catalog service. Can also be supplied as MEDIAAMP_API__KEY.
key = ""
# Separate key used for library preview screenshots. Previews are skipped when unset.
# preview_key = ""
page_size = 20

[identity]
# Setting a display name starts the session signed in.
# display_name = "Player"
"#;

/// Settings for the remote catalog service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Service root, without trailing slash.
    pub base_url: String,
    /// Key for listing, detail and media requests.
    #[serde(default)]
    pub key: String,
    /// Key for library preview screenshots.
    #[serde(default)]
    pub preview_key: Option<String>,
    /// Records requested per remote page.
    pub page_size: u32,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            key: String::new(),
            preview_key: None,
            page_size: DEFAULT_REMOTE_PAGE_SIZE,
        }
    }
}

/// Identity handed to the frontend at start-up.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentitySettings {
    /// Display name; its presence means the session starts signed in.
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Resolved application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote catalog settings.
    #[serde(default)]
    pub api: ApiSettings,
    /// Identity defaults.
    #[serde(default)]
    pub identity: IdentitySettings,
    /// Remote page requested on first load.
    #[serde(default = "default_start_page")]
    pub start_page: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            identity: IdentitySettings::default(),
            start_page: default_start_page(),
        }
    }
}

fn default_start_page() -> u32 {
    1
}

impl AppConfig {
    /// Load configuration from the default location plus the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load configuration from `path` (optional) plus the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_env(path.as_ref(), None)
    }

    /// Like [`AppConfig::load_from`], reading variables from `env` instead of
    /// the process environment when given.
    pub fn load_with_env(path: &Path, env: Option<Map<String, String>>) -> Result<Self> {
        let settings = Config::builder()
            .set_default("api.base_url", DEFAULT_BASE_URL)?
            .set_default("api.key", "")?
            .set_default("api.page_size", i64::from(DEFAULT_REMOTE_PAGE_SIZE))?
            .set_default("start_page", 1_i64)?
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .source(env),
            )
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;

        let mut config: AppConfig = settings
            .try_deserialize()
            .context("failed to parse configuration")?;
        config.start_page = config.start_page.max(1);
        Ok(config)
    }
}

/// Location of the user configuration file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

/// Write the default configuration file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn load_isolated(path: &Path) -> Result<AppConfig> {
        AppConfig::load_with_env(path, Some(Map::new()))
    }

    #[test]
    fn default_file_round_trips() -> Result<()> {
        let temp = tempdir()?;
        let path = temp.path().join("nested").join(CONFIG_FILE);
        write_default_config(&path)?;
        assert!(path.is_file());

        let config = load_isolated(&path)?;
        assert_eq!(config.api.page_size, 20);
        assert_eq!(config.start_page, 1);
        assert!(config.identity.display_name.is_none());
        Ok(())
    }

    #[test]
    fn existing_file_is_not_overwritten() -> Result<()> {
        let temp = tempdir()?;
        let path = temp.path().join(CONFIG_FILE);
        fs::write(&path, "start_page = 4\n")?;
        write_default_config(&path)?;
        assert_eq!(fs::read_to_string(&path)?, "start_page = 4\n");
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let temp = tempdir()?;
        let path = temp.path().join(CONFIG_FILE);
        fs::write(
            &path,
            r#"
start_page = 0

[api]
base_url = "http://localhost:8080/api"
preview_key = "preview"

[identity]
display_name = "Sam"
"#,
        )?;

        let config = load_isolated(&path)?;
        assert_eq!(config.api.base_url, "http://localhost:8080/api");
        assert_eq!(config.api.preview_key.as_deref(), Some("preview"));
        assert_eq!(config.api.page_size, 20);
        assert_eq!(config.identity.display_name.as_deref(), Some("Sam"));
        assert_eq!(config.start_page, 1);
        Ok(())
    }

    #[test]
    fn missing_file_uses_defaults() -> Result<()> {
        let temp = tempdir()?;
        let config = load_isolated(&temp.path().join("absent.toml"))?;
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        Ok(())
    }

    #[test]
    fn environment_overrides_file_values() -> Result<()> {
        let temp = tempdir()?;
        let path = temp.path().join(CONFIG_FILE);
        fs::write(&path, "start_page = 2\n\n[api]\nkey = \"from-file\"\n")?;

        let env = Map::from([
            ("MEDIAAMP_API__KEY".to_string(), "abc123".to_string()),
            ("MEDIAAMP_START_PAGE".to_string(), "3".to_string()),
            ("OTHER_API__KEY".to_string(), "ignored".to_string()),
        ]);
        let config = AppConfig::load_with_env(&path, Some(env))?;
        assert_eq!(config.api.key, "abc123");
        assert_eq!(config.start_page, 3);
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        Ok(())
    }
}
