//! Configuration loaded from `config.json`

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::errors::CaptureError;
use crate::sites::SiteKind;
use crate::types::{BindingSide, ImageFormat, ViewportSize};
use crate::webdriver::BrowserType;

const DEFAULT_CONFIG_FILE: &str = "config.json";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_10_5) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/55.0.2883.95 Safari/537.36";

/// Top-level settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Browser to drive
    pub driver: BrowserType,
    /// WebDriver endpoint; the browser's standard port when unset
    pub webdriver_url: Option<String>,
    pub headless: bool,
    pub user_agent: String,
    pub window_size: ViewportSize,
    /// Where login evidence and captcha images are written
    pub log_directory: PathBuf,
    pub bookstore: SiteConfig,
    pub ebookjapan: SiteConfig,
    pub alphapolis: SiteConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            driver: BrowserType::Firefox,
            webdriver_url: None,
            headless: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            window_size: ViewportSize::default(),
            log_directory: PathBuf::from("/tmp/k_auto_book/"),
            bookstore: SiteConfig::default(),
            ebookjapan: SiteConfig::default(),
            alphapolis: SiteConfig {
                image_format: ImageFormat::Png,
                ..SiteConfig::default()
            },
        }
    }
}

/// Per-site settings
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub needs_login: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub image_format: ImageFormat,
    /// Seconds to wait after each page turn
    pub sleep_time: f64,
    /// Default binding side; per-run options override it
    pub bound_on_side: Option<BindingSide>,
    pub filename_prefix: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            needs_login: false,
            username: None,
            password: None,
            image_format: ImageFormat::Jpeg,
            sleep_time: 0.5,
            bound_on_side: None,
            filename_prefix: String::new(),
        }
    }
}

impl fmt::Debug for SiteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteConfig")
            .field("needs_login", &self.needs_login)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("image_format", &self.image_format)
            .field("sleep_time", &self.sleep_time)
            .field("bound_on_side", &self.bound_on_side)
            .field("filename_prefix", &self.filename_prefix)
            .finish()
    }
}

impl SiteConfig {
    /// Delay between page turns
    pub fn step_delay(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.sleep_time.max(0.0))
    }

    /// Stored credentials, only when both halves are present
    pub fn stored_credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(id), Some(password)) if !id.is_empty() && !password.is_empty() => {
                Some((id, password))
            }
            _ => None,
        }
    }
}

impl Config {
    /// Parse configuration from JSON text
    pub fn from_json(text: &str) -> Result<Self, CaptureError> {
        let config: Config = serde_json::from_str(text)
            .map_err(|e| CaptureError::InvalidConfig(e.to_string()))?;
        if config
            .sites()
            .any(|site| !site.sleep_time.is_finite() || site.sleep_time < 0.0)
        {
            return Err(CaptureError::InvalidConfig(
                "sleep_time must be a non-negative number".to_string(),
            ));
        }
        Ok(config)
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `config.json` in the working
    /// directory and then `~/.autobook/config.json` are tried; if neither
    /// exists the defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self, CaptureError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_locations().into_iter().find(|p| p.is_file()) {
                Some(path) => path,
                None => {
                    info!("No configuration file found, using defaults");
                    return Ok(Config::default());
                }
            },
        };

        debug!("Loading configuration from {}", path.display());
        let text = fs::read_to_string(&path).map_err(|e| {
            CaptureError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    fn default_locations() -> Vec<PathBuf> {
        let mut locations = vec![PathBuf::from(DEFAULT_CONFIG_FILE)];
        if let Some(home) = dirs::home_dir() {
            locations.push(home.join(".autobook").join(DEFAULT_CONFIG_FILE));
        }
        locations
    }

    /// Settings for one site
    pub fn site(&self, kind: SiteKind) -> &SiteConfig {
        match kind {
            SiteKind::Alphapolis => &self.alphapolis,
            SiteKind::Bookstore => &self.bookstore,
            SiteKind::Ebookjapan => &self.ebookjapan,
        }
    }

    fn sites(&self) -> impl Iterator<Item = &SiteConfig> {
        [&self.bookstore, &self.ebookjapan, &self.alphapolis].into_iter()
    }

    /// WebDriver endpoint to connect to
    pub fn webdriver_url(&self) -> String {
        self.webdriver_url
            .clone()
            .unwrap_or_else(|| self.driver.get_webdriver_url())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
