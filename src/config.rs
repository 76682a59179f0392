use anyhow::{Context, Result};
use chrono_tz::Tz;
use lushsync_portal::PortalConfig;
use lushsync_provider_google::GoogleConfig;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct Config {
    /// IANA zone used for shift instants and calendar event labels.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default)]
    pub portal: PortalConfig,

    #[serde(default)]
    pub google: GoogleFiles,

    /// Environment variable holding the shared portal password.
    /// When unset (or empty in the environment), the password is prompted.
    #[serde(default)]
    pub password_env: Option<String>,

    /// The (portal user, calendar) pairs to sync.
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
    pub username: String,
    pub calendar_id: String,
}

/// Optional overrides for where the Google credential files live.
#[derive(Debug, Default, Deserialize)]
pub struct GoogleFiles {
    pub credentials: Option<String>,
    pub token: Option<String>,
}

fn default_timezone() -> String {
    "America/New_York".to_string()
}

/// Get the config file path (~/.config/lushsync/config.toml)
pub fn config_path() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Could not determine config directory")?
        .join("lushsync")
        .join("config.toml"))
}

/// Load config from ~/.config/lushsync/config.toml
pub fn load_config() -> Result<Config> {
    let path = config_path()?;

    if !path.exists() {
        anyhow::bail!(
            "Config file not found at {}\n\n\
            Create it with your portal users and their calendars:\n\n\
            timezone = \"America/New_York\"\n\n\
            [portal]\n\
            url = \"https://lush.storeforce.net\"\n\
            webdriver = \"http://localhost:9515\"\n\n\
            password_env = \"LUSHSYNC_PASSWORD\"\n\n\
            [[users]]\n\
            username = \"ari\"\n\
            calendar_id = \"abc123@group.calendar.google.com\"",
            path.display()
        );
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

    Ok(config)
}

impl Config {
    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Unknown timezone {:?} in config: {}", self.timezone, e))
    }

    pub fn google(&self) -> Result<GoogleConfig> {
        let credentials_path = match &self.google.credentials {
            Some(path) => expand_home(path),
            None => GoogleConfig::default_credentials_path()?,
        };

        let token_path = match &self.google.token {
            Some(path) => expand_home(path),
            None => GoogleConfig::default_token_path()?,
        };

        Ok(GoogleConfig {
            credentials_path,
            token_path,
        })
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
