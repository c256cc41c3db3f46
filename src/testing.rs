//! Scriptable in-memory browser for state machine tests.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use image::{DynamicImage, RgbaImage};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use crate::driver::{BrowserDriver, FetchResponse, ViewerKey};

type ClickHook = Box<dyn FnMut(&mut PageState) + Send>;
type KeyHook = Box<dyn FnMut(&mut PageState, ViewerKey, bool) + Send>;
type VisitHook = Box<dyn FnMut(&mut PageState, &str) + Send>;

/// What the fake page currently shows
#[derive(Default)]
pub struct PageState {
    pub url: String,
    pub title: String,
    pub counts: HashMap<String, usize>,
    pub texts: HashMap<String, String>,
    pub attributes: HashMap<(String, String), Vec<Option<String>>>,
    /// Script fragment ⇒ value returned by `evaluate`
    pub scripts: Vec<(String, Value)>,
    pub fetches: HashMap<String, FetchResponse>,
    pub screen: Option<RgbaImage>,
    pub fills: HashMap<String, String>,
}

impl PageState {
    pub fn set_count(&mut self, selector: &str, count: usize) {
        self.counts.insert(selector.to_string(), count);
    }

    pub fn set_text(&mut self, selector: &str, text: &str) {
        self.texts.insert(selector.to_string(), text.to_string());
        self.counts.entry(selector.to_string()).or_insert(1);
    }

    pub fn set_script(&mut self, fragment: &str, value: Value) {
        self.scripts.retain(|(f, _)| f != fragment);
        self.scripts.push((fragment.to_string(), value));
    }
}

#[derive(Default)]
struct Hooks {
    clicks: Vec<(String, ClickHook)>,
    keys: Option<KeyHook>,
    visits: Option<VisitHook>,
}

#[derive(Default)]
pub struct MockBrowser {
    state: Mutex<PageState>,
    hooks: Mutex<Hooks>,
    log: Mutex<Vec<String>>,
}

impl MockBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Change the fake page directly
    pub fn with_page(&self, f: impl FnOnce(&mut PageState)) {
        f(&mut self.state.lock().unwrap());
    }

    pub fn page<T>(&self, f: impl FnOnce(&PageState) -> T) -> T {
        f(&self.state.lock().unwrap())
    }

    pub fn on_click(&self, selector: &str, hook: impl FnMut(&mut PageState) + Send + 'static) {
        self.hooks
            .lock()
            .unwrap()
            .clicks
            .push((selector.to_string(), Box::new(hook)));
    }

    /// Called with the key and whether Shift was held
    pub fn on_key(&self, hook: impl FnMut(&mut PageState, ViewerKey, bool) + Send + 'static) {
        self.hooks.lock().unwrap().keys = Some(Box::new(hook));
    }

    pub fn on_visit(&self, hook: impl FnMut(&mut PageState, &str) + Send + 'static) {
        self.hooks.lock().unwrap().visits = Some(Box::new(hook));
    }

    /// Everything the code under test did, in order
    pub fn actions(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn count_actions(&self, action: &str) -> usize {
        self.log.lock().unwrap().iter().filter(|a| *a == action).count()
    }

    fn record(&self, action: String) {
        self.log.lock().unwrap().push(action);
    }

    fn key(&self, key: ViewerKey, shift: bool) {
        let prefix = if shift { "shift+" } else { "" };
        self.record(format!("key {}{:?}", prefix, key));
        if let Some(hook) = self.hooks.lock().unwrap().keys.as_mut() {
            hook(&mut self.state.lock().unwrap(), key, shift);
        }
    }
}

#[async_trait]
impl BrowserDriver for MockBrowser {
    async fn visit(&self, url: &str) -> Result<()> {
        self.record(format!("visit {}", url));
        let mut hooks = self.hooks.lock().unwrap();
        let mut state = self.state.lock().unwrap();
        state.url = url.to_string();
        if let Some(hook) = hooks.visits.as_mut() {
            hook(&mut state, url);
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn title(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().title.clone())
    }

    async fn evaluate(&self, script: &str) -> Result<Value> {
        let state = self.state.lock().unwrap();
        state
            .scripts
            .iter()
            .find(|(fragment, _)| script.contains(fragment.as_str()))
            .map(|(_, value)| value.clone())
            .ok_or_else(|| anyhow!("TypeError: unscripted evaluation"))
    }

    async fn execute(&self, script: &str) -> Result<()> {
        self.record(format!("execute {}", script.trim()));
        Ok(())
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .counts
            .get(selector)
            .copied()
            .unwrap_or(0))
    }

    async fn text(&self, selector: &str) -> Result<Option<String>> {
        Ok(self.state.lock().unwrap().texts.get(selector).cloned())
    }

    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>> {
        Ok(self.attributes(selector, name).await?.into_iter().flatten().next())
    }

    async fn attributes(&self, selector: &str, name: &str) -> Result<Vec<Option<String>>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .attributes
            .get(&(selector.to_string(), name.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        if self.count(selector).await? == 0 {
            return Err(anyhow!("Element not found: {}", selector));
        }
        self.record(format!("click {}", selector));
        let mut hooks = self.hooks.lock().unwrap();
        let mut state = self.state.lock().unwrap();
        for (target, hook) in hooks.clicks.iter_mut() {
            if target == selector {
                hook(&mut state);
            }
        }
        Ok(())
    }

    async fn click_link(&self, text: &str) -> Result<()> {
        self.record(format!("link {}", text));
        let mut hooks = self.hooks.lock().unwrap();
        let mut state = self.state.lock().unwrap();
        let target = format!("link:{}", text);
        for (selector, hook) in hooks.clicks.iter_mut() {
            if *selector == target {
                hook(&mut state);
            }
        }
        Ok(())
    }

    async fn fill(&self, name: &str, value: &str) -> Result<()> {
        self.record(format!("fill {}", name));
        self.state
            .lock()
            .unwrap()
            .fills
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn press(&self, key: ViewerKey) -> Result<()> {
        self.key(key, false);
        Ok(())
    }

    async fn press_with_shift(&self, key: ViewerKey) -> Result<()> {
        self.key(key, true);
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<()> {
        self.record(format!("type {}", text));
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.record("screenshot".to_string());
        let screen = self
            .state
            .lock()
            .unwrap()
            .screen
            .clone()
            .unwrap_or_else(|| RgbaImage::new(4, 4));
        DynamicImage::ImageRgba8(screen).save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }

    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        self.record(format!("fetch {}", url));
        self.state
            .lock()
            .unwrap()
            .fetches
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("connection refused: {}", url))
    }
}
