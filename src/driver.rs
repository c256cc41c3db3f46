//! The browser operations the capture and login state machines rely on.
//!
//! `webdriver::Browser` implements this over a real WebDriver session; tests
//! substitute a scripted implementation.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

/// Keys the viewers react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerKey {
    ArrowLeft,
    ArrowRight,
    Space,
}

/// Result of fetching a URL directly
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Navigate and wait for the document to finish loading
    async fn visit(&self, url: &str) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    async fn title(&self) -> Result<String>;

    /// Evaluate a script body and return its `return` value
    async fn evaluate(&self, script: &str) -> Result<Value>;

    /// Run a script for its side effects
    async fn execute(&self, script: &str) -> Result<()>;

    /// Number of elements matching a CSS selector
    async fn count(&self, selector: &str) -> Result<usize>;

    /// Visible text of the first element matching a CSS selector
    async fn text(&self, selector: &str) -> Result<Option<String>>;

    /// Attribute of the first element matching a CSS selector
    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>>;

    /// Attribute of every element matching a CSS selector
    async fn attributes(&self, selector: &str, name: &str) -> Result<Vec<Option<String>>>;

    /// Click the first element matching a CSS selector
    async fn click(&self, selector: &str) -> Result<()>;

    /// Click the first link with exactly this text
    async fn click_link(&self, text: &str) -> Result<()>;

    /// Replace the value of the form field with this `name`
    async fn fill(&self, name: &str, value: &str) -> Result<()>;

    /// Send a key-down event for a single key
    async fn press(&self, key: ViewerKey) -> Result<()>;

    /// Send a key while Shift is held
    async fn press_with_shift(&self, key: ViewerKey) -> Result<()>;

    /// Type plain characters into the focused page
    async fn send_text(&self, text: &str) -> Result<()>;

    /// Save a screenshot of the viewport as PNG
    async fn screenshot(&self, path: &Path) -> Result<()>;

    /// Fetch a URL outside the page context
    async fn fetch(&self, url: &str) -> Result<FetchResponse>;
}
