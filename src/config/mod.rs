//! User-level configuration for gitage
//!
//! Supports loading config from:
//! - Environment variables
//! - ~/.config/gitage/config.toml

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UserConfig {
    #[serde(default)]
    pub avatar: AvatarConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AvatarConfig {
    /// Avatar service base URL (default: https://www.gravatar.com)
    pub service_url: Option<String>,

    /// Image size in pixels (default: 80)
    pub size: Option<u32>,

    /// Hours a cached image stays fresh (default: 24)
    pub ttl_hours: Option<u64>,

    /// Fallback image style for unknown emails (default: monsterid)
    pub default_style: Option<String>,
}

impl UserConfig {
    /// Load config from all sources, with priority:
    /// 1. Environment variables (highest)
    /// 2. User config (~/.config/gitage/config.toml)
    pub fn load() -> Result<Self> {
        let mut config = UserConfig::default();

        // Load user config
        if let Some(user_config) = Self::user_config_path()
            .filter(|p| p.exists())
            .and_then(|p| std::fs::read_to_string(&p).ok())
            .and_then(|content| toml::from_str::<UserConfig>(&content).ok())
        {
            config.merge(user_config);
        }

        // Environment variables override everything
        if let Ok(url) = std::env::var("GITAGE_AVATAR_URL") {
            config.avatar.service_url = Some(url);
        }

        Ok(config)
    }

    /// Get the user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gitage").join("config.toml"))
    }

    /// Merge another config into this one (other takes priority)
    fn merge(&mut self, other: UserConfig) {
        if other.avatar.service_url.is_some() {
            self.avatar.service_url = other.avatar.service_url;
        }
        if other.avatar.size.is_some() {
            self.avatar.size = other.avatar.size;
        }
        if other.avatar.ttl_hours.is_some() {
            self.avatar.ttl_hours = other.avatar.ttl_hours;
        }
        if other.avatar.default_style.is_some() {
            self.avatar.default_style = other.avatar.default_style;
        }
    }

    /// Avatar service base URL
    pub fn avatar_service_url(&self) -> &str {
        self.avatar
            .service_url
            .as_deref()
            .unwrap_or("https://www.gravatar.com")
    }

    /// Avatar size in pixels
    pub fn avatar_size(&self) -> u32 {
        self.avatar.size.unwrap_or(80)
    }

    /// Disk cache freshness window in hours
    pub fn avatar_ttl_hours(&self) -> u64 {
        self.avatar.ttl_hours.unwrap_or(24)
    }

    /// Fallback image style for unknown emails
    pub fn avatar_default_style(&self) -> &str {
        self.avatar.default_style.as_deref().unwrap_or("monsterid")
    }

    /// Initialize user config directory and create example config
    pub fn init_user_config() -> Result<PathBuf> {
        let config_path = Self::user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if !config_path.exists() {
            let example = r#"# Gitage User Configuration

[avatar]
# Avatar service base URL
# service_url = "https://www.gravatar.com"

# Image size in pixels
# size = 80

# Hours a cached image stays fresh before it is re-fetched
# ttl_hours = 24

# Fallback style for emails without an avatar: monsterid, identicon, retro, ...
# default_style = "monsterid"
"#;
            std::fs::write(&config_path, example)?;
        }

        Ok(config_path)
    }
}
