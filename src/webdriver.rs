use anyhow::{Context, Result};
use async_trait::async_trait;
use fantoccini::actions::{InputSource, KeyAction, KeyActions};
use fantoccini::key::Key;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Value, json};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Config;
use crate::driver::{BrowserDriver, FetchResponse, ViewerKey};
use crate::types::ViewportSize;

/// Browser instance for WebDriver automation
pub struct Browser {
    client: Client,
    http: reqwest::Client,
}

/// Supported browser types
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserType {
    /// Mozilla Firefox
    Firefox,
    /// Google Chrome/Chromium
    #[serde(alias = "chromium")]
    Chrome,
}

impl std::str::FromStr for BrowserType {
    type Err = anyhow::Error;

    /// Parse browser type from string (case-insensitive)
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "firefox" => Ok(BrowserType::Firefox),
            "chrome" | "chromium" => Ok(BrowserType::Chrome),
            _ => anyhow::bail!("Unsupported browser: {}", s),
        }
    }
}

impl BrowserType {
    /// Get the WebDriver URL for this browser type
    pub fn get_webdriver_url(&self) -> String {
        match self {
            BrowserType::Firefox => "http://localhost:4444".to_string(),
            BrowserType::Chrome => "http://localhost:9515".to_string(),
        }
    }

    fn driver_name(&self) -> &'static str {
        match self {
            BrowserType::Firefox => "geckodriver",
            BrowserType::Chrome => "chromedriver",
        }
    }
}

/// How to start the browser session
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub browser_type: BrowserType,
    pub webdriver_url: String,
    pub headless: bool,
    pub viewport: ViewportSize,
    pub user_agent: String,
}

impl From<&Config> for BrowserOptions {
    fn from(config: &Config) -> Self {
        Self {
            browser_type: config.driver,
            webdriver_url: config.webdriver_url(),
            headless: config.headless,
            viewport: config.window_size.clone(),
            user_agent: config.user_agent.clone(),
        }
    }
}

impl Browser {
    /// Open a new session against an already running WebDriver
    pub async fn connect(options: &BrowserOptions) -> Result<Self> {
        info!("Connecting to {:?} WebDriver", options.browser_type);

        if !Self::is_webdriver_running(&options.webdriver_url).await {
            let driver_name = options.browser_type.driver_name();
            anyhow::bail!(
                "Cannot connect to {} WebDriver at {}.\n\
                Please ensure {} is running:\n\
                  For Firefox: geckodriver --port 4444\n\
                  For Chrome: chromedriver --port 9515",
                driver_name,
                options.webdriver_url,
                driver_name
            );
        }

        let caps = Self::capabilities(options);
        debug!("Connecting to WebDriver at {}", options.webdriver_url);

        let client = ClientBuilder::rustls()
            .capabilities(caps)
            .connect(&options.webdriver_url)
            .await
            .context("Failed to connect to WebDriver")?;

        let vp = &options.viewport;
        debug!("Setting window size to {}x{}", vp.width, vp.height);
        if let Err(e) = client.set_window_size(vp.width, vp.height).await {
            debug!("Note: Could not set window size: {}", e);
        }

        let http = reqwest::Client::builder()
            .user_agent(options.user_agent.clone())
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Browser { client, http })
    }

    fn capabilities(options: &BrowserOptions) -> serde_json::Map<String, Value> {
        let mut caps = serde_json::Map::new();
        let vp = &options.viewport;

        match options.browser_type {
            BrowserType::Firefox => {
                let mut args = Vec::new();
                if options.headless {
                    args.push("--headless".to_string());
                }
                args.push(format!("--width={}", vp.width));
                args.push(format!("--height={}", vp.height));

                caps.insert(
                    "moz:firefoxOptions".to_string(),
                    json!({
                        "args": args,
                        "prefs": { "general.useragent.override": options.user_agent },
                    }),
                );
            }
            BrowserType::Chrome => {
                let mut args = vec!["--no-sandbox".to_string()];
                if options.headless {
                    args.push("--headless=new".to_string());
                    args.push("--disable-gpu".to_string());
                    args.push("--disable-dev-shm-usage".to_string());
                }
                args.push(format!("--window-size={},{}", vp.width, vp.height));
                args.push(format!("--user-agent={}", options.user_agent));

                caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
            }
        }
        caps
    }

    async fn is_webdriver_running(url: &str) -> bool {
        let status_url = format!("{}/status", url);

        match reqwest::Client::new()
            .get(&status_url)
            .timeout(Duration::from_secs(1))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn key_char(key: ViewerKey) -> char {
        match key {
            ViewerKey::ArrowLeft => Key::Left.into(),
            ViewerKey::ArrowRight => Key::Right.into(),
            ViewerKey::Space => Key::Space.into(),
        }
    }

    async fn perform_keys(&self, actions: KeyActions) -> Result<()> {
        self.client.perform_actions(actions).await?;
        self.client.release_actions().await?;
        Ok(())
    }

    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }
}

#[async_trait]
impl BrowserDriver for Browser {
    async fn visit(&self, url: &str) -> Result<()> {
        info!("Navigating to {}", url);
        self.client.goto(url).await?;

        let wait_script = r#"
            return document.readyState === 'complete';
        "#;

        // Max 2 seconds
        for _ in 0..20 {
            match self.client.execute(wait_script, vec![]).await {
                Ok(val) if val.as_bool().unwrap_or(false) => break,
                _ => tokio::time::sleep(Duration::from_millis(100)).await,
            }
        }

        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.client.current_url().await?.to_string())
    }

    async fn title(&self) -> Result<String> {
        Ok(self.client.title().await?)
    }

    async fn evaluate(&self, script: &str) -> Result<Value> {
        debug!("Evaluating script: {}", script);
        self.client
            .execute(script, vec![])
            .await
            .context("Script evaluation failed")
    }

    async fn execute(&self, script: &str) -> Result<()> {
        debug!("Executing script: {}", script);
        self.client
            .execute(script, vec![])
            .await
            .context("Script execution failed")?;
        Ok(())
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        Ok(self.client.find_all(Locator::Css(selector)).await?.len())
    }

    async fn text(&self, selector: &str) -> Result<Option<String>> {
        match self.client.find_all(Locator::Css(selector)).await?.first() {
            Some(element) => Ok(Some(element.text().await?)),
            None => Ok(None),
        }
    }

    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>> {
        match self.client.find_all(Locator::Css(selector)).await?.first() {
            Some(element) => Ok(element.attr(name).await?),
            None => Ok(None),
        }
    }

    async fn attributes(&self, selector: &str, name: &str) -> Result<Vec<Option<String>>> {
        let mut values = Vec::new();
        for element in self.client.find_all(Locator::Css(selector)).await? {
            values.push(element.attr(name).await?);
        }
        Ok(values)
    }

    async fn click(&self, selector: &str) -> Result<()> {
        debug!("Clicking {}", selector);
        self.client
            .find(Locator::Css(selector))
            .await
            .context(format!("Element not found: {}", selector))?
            .click()
            .await?;
        Ok(())
    }

    async fn click_link(&self, text: &str) -> Result<()> {
        self.client
            .find(Locator::LinkText(text))
            .await
            .context(format!("Link not found: {}", text))?
            .click()
            .await?;
        Ok(())
    }

    async fn fill(&self, name: &str, value: &str) -> Result<()> {
        let selector = format!("[name=\"{}\"]", name);
        let field = self
            .client
            .find(Locator::Css(&selector))
            .await
            .context(format!("Form field not found: {}", name))?;
        field.clear().await?;
        field.send_keys(value).await?;
        Ok(())
    }

    async fn press(&self, key: ViewerKey) -> Result<()> {
        let value = Self::key_char(key);
        let actions = KeyActions::new("keyboard".to_string())
            .then(KeyAction::Down { value })
            .then(KeyAction::Up { value });
        self.perform_keys(actions).await
    }

    async fn press_with_shift(&self, key: ViewerKey) -> Result<()> {
        let shift: char = Key::Shift.into();
        let value = Self::key_char(key);
        let actions = KeyActions::new("keyboard".to_string())
            .then(KeyAction::Down { value: shift })
            .then(KeyAction::Down { value })
            .then(KeyAction::Up { value })
            .then(KeyAction::Up { value: shift });
        self.perform_keys(actions).await
    }

    async fn send_text(&self, text: &str) -> Result<()> {
        let mut actions = KeyActions::new("keyboard".to_string());
        for value in text.chars() {
            actions = actions
                .then(KeyAction::Down { value })
                .then(KeyAction::Up { value });
        }
        self.perform_keys(actions).await
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        let png = self.client.screenshot().await?;
        tokio::fs::write(path, png)
            .await
            .context(format!("Failed to write screenshot to {}", path.display()))?;
        Ok(())
    }

    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        debug!("Fetching {}", url);
        let response = self.http.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(FetchResponse { status, body })
    }
}
