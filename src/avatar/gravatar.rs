//! Disk-cached Gravatar client
//!
//! Cache files live under the user cache directory, named by the md5 of
//! the lowercased email plus the requested pixel size, so different sizes
//! of the same avatar coexist. A cached file younger than the TTL is
//! served without touching the network.

use crate::avatar::AvatarSource;
use crate::config::UserConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub struct GravatarClient {
    agent: ureq::Agent,
    cache_dir: PathBuf,
    service_url: String,
    default_style: String,
    size: u32,
    ttl: Duration,
}

fn make_agent() -> ureq::Agent {
    ureq::config::Config::builder()
        .timeout_global(Some(std::time::Duration::from_secs(20)))
        .build()
        .new_agent()
}

/// Cache directory for avatar images:
/// `~/.cache/gitage/avatars/` on Unix, the platform cache dir elsewhere.
fn avatar_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".cache"))
                .unwrap_or_else(|| PathBuf::from("."))
        })
        .join("gitage")
        .join("avatars")
}

/// File modification age, if the file exists.
fn mtime_age(path: &Path) -> Option<Duration> {
    fs::metadata(path)
        .ok()?
        .modified()
        .ok()?
        .elapsed()
        .ok()
}

impl GravatarClient {
    pub fn new(config: &UserConfig) -> Self {
        Self {
            agent: make_agent(),
            cache_dir: avatar_cache_dir(),
            service_url: config.avatar_service_url().to_string(),
            default_style: config.avatar_default_style().to_string(),
            size: config.avatar_size(),
            ttl: Duration::from_secs(config.avatar_ttl_hours() * 3600),
        }
    }

    /// Override the pixel size (e.g. from a CLI flag).
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_cache_dir(mut self, dir: PathBuf) -> Self {
        self.cache_dir = dir;
        self
    }

    /// md5 of the lowercased email, the hash Gravatar addresses by.
    fn email_hash(email: &str) -> String {
        format!("{:x}", md5::compute(email.to_lowercase().as_bytes()))
    }

    fn cache_path(&self, email_hash: &str) -> PathBuf {
        self.cache_dir.join(format!("{}_{}", email_hash, self.size))
    }

    fn avatar_url(&self, email_hash: &str) -> String {
        format!(
            "{}/avatar/{}?d={}&s={}",
            self.service_url, email_hash, self.default_style, self.size
        )
    }

    /// A cached file within the TTL is served as-is.
    fn is_fresh(&self, path: &Path) -> bool {
        mtime_age(path).map(|age| age <= self.ttl).unwrap_or(false)
    }

    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let mut response = self
            .agent
            .get(url)
            .call()
            .with_context(|| format!("GET {url}"))?;
        let bytes = response
            .body_mut()
            .read_to_vec()
            .with_context(|| format!("reading body of {url}"))?;
        fs::create_dir_all(self.cache_dir.as_path())?;
        fs::write(dest, bytes)?;
        Ok(())
    }
}

impl AvatarSource for GravatarClient {
    fn fetch(&self, key: &str) -> Result<PathBuf> {
        let hash = Self::email_hash(key);
        let path = self.cache_path(&hash);
        if self.is_fresh(&path) {
            debug!("avatar cache hit for {key}");
            return Ok(path);
        }
        let url = self.avatar_url(&hash);
        debug!("fetching {url}");
        self.download(&url, &path)?;
        Ok(path)
    }
}
