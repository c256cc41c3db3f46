//! ebookjapan: single-page viewer with a footer page counter.

use async_trait::async_trait;
use image::DynamicImage;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

use super::{Runner, RunContext, SiteKind, binding_option};
use crate::driver::{BrowserDriver, ViewerKey};
use crate::errors::CaptureError;
use crate::matcher::PageMatcher;
use crate::navigator::{KeyBinding, SCRATCH_SCREENSHOT, ViewerNavigator, screenshot_frame};
use crate::trimmer::ImageTrimmer;
use crate::types::{BindingSide, PageCount, SessionOutcome};
use crate::wait::{POLL_ATTEMPTS, POLL_INTERVAL, SETTLE_DELAY, WaitPolicy, poll_until};

const DOMAIN: &str = r"ebookjapan\.yahoo\.co\.jp";
const PATTERNS: [&str; 1] = [r"books/\d+"];

lazy_static::lazy_static! {
    pub static ref MATCHER: PageMatcher =
        PageMatcher::new(DOMAIN, &PATTERNS).expect("ebookjapan URL patterns");
}

/// Present on product pages only while signed out
const LOGIN_MARKER: &str = ".login";
const READ_BUTTON: &str = ".btn.btn--primary.btn--read";
const READ_LABEL: &str = "読む";
const DEMO_BUTTON: &str = ".book-main__purchase > a.btn";
const DEMO_LABEL: &str = "試し読み";

const CURRENT_PAGE: &str = ".footer__page-output > output";
const TOTAL_PAGES: &str = ".footer__page-output > .total-pages";

/// Page background forced behind the frames so the trimmer finds clean edges
pub const BACKGROUND_COLOR: &str = "#FEFFFD";

/// Viewer chrome left inside the detected content bounds
pub const CHROME_MARGIN: u32 = 58;

pub(super) async fn run(
    runner: &Runner<'_>,
    url: &str,
    options: &[String],
    context: &mut RunContext,
) -> Result<SessionOutcome, CaptureError> {
    let site = runner.site(SiteKind::Ebookjapan);
    if site.needs_login && !context.is_logged_in(SiteKind::Ebookjapan) {
        runner.driver.visit(url).await?;
        if runner.driver.count(LOGIN_MARKER).await? == 0 {
            debug!("Already signed in");
            context.mark_logged_in(SiteKind::Ebookjapan);
        } else if let Some(failed) = runner.ensure_login(SiteKind::Ebookjapan, context).await {
            return Ok(failed);
        }
    }

    println!("Loading page of input url ({})", url);
    runner.driver.visit(url).await?;

    if open_with(runner.driver, READ_BUTTON, READ_LABEL).await? {
        println!("Open main page");
    } else if open_with(runner.driver, DEMO_BUTTON, DEMO_LABEL).await? {
        println!("Open demo page");
    } else {
        println!("Failed to load the page");
        return Ok(SessionOutcome::Aborted("page unavailable".to_string()));
    }

    let Some(output) = runner.ask_output_path()? else {
        return Ok(SessionOutcome::Aborted("input closed".to_string()));
    };
    let target = runner.target(SiteKind::Ebookjapan, url, options, output);
    let mut viewer = Viewer::new(
        runner.driver,
        runner.wait,
        binding_option(options),
        site.bound_on_side,
        site.step_delay(),
    )
    .with_scratch(runner.scratch.clone());
    runner.capture(SiteKind::Ebookjapan, &target, &mut viewer).await
}

/// Click the button at `selector` when it carries `label`
async fn open_with(
    driver: &dyn BrowserDriver,
    selector: &str,
    label: &str,
) -> Result<bool, CaptureError> {
    if driver.text(selector).await?.as_deref().map(str::trim) != Some(label) {
        return Ok(false);
    }
    driver.click(selector).await?;
    Ok(true)
}

/// Leading page number of a counter such as `12 /`
pub fn parse_page_number(text: &str) -> Option<usize> {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

async fn read_number(driver: &dyn BrowserDriver, selector: &str) -> Option<usize> {
    match driver.text(selector).await {
        Ok(text) => text.as_deref().and_then(parse_page_number),
        Err(e) => {
            warn!("Failed to read {}: {}", selector, e);
            None
        }
    }
}

pub struct Viewer<'a> {
    driver: &'a dyn BrowserDriver,
    wait: &'a dyn WaitPolicy,
    explicit: Option<BindingSide>,
    configured: Option<BindingSide>,
    keys: KeyBinding,
    step_delay: Duration,
    scratch: PathBuf,
    /// Counter value seen before the last advance
    shown: Option<usize>,
    advanced: bool,
    /// The page counter rendered while preparing
    ready: bool,
}

impl<'a> Viewer<'a> {
    pub fn new(
        driver: &'a dyn BrowserDriver,
        wait: &'a dyn WaitPolicy,
        explicit: Option<BindingSide>,
        configured: Option<BindingSide>,
        step_delay: Duration,
    ) -> Self {
        Self {
            driver,
            wait,
            explicit,
            configured,
            keys: KeyBinding::for_side(BindingSide::Unknown),
            step_delay,
            scratch: PathBuf::from(SCRATCH_SCREENSHOT),
            shown: None,
            advanced: false,
            ready: false,
        }
    }

    pub fn with_scratch(mut self, scratch: PathBuf) -> Self {
        self.scratch = scratch;
        self
    }

    async fn current_page(&self) -> Option<usize> {
        read_number(self.driver, CURRENT_PAGE).await
    }

    /// Press the left arrow once and see which way the counter moved
    async fn detect_binding_side(&self) -> Option<BindingSide> {
        let before = self.current_page().await?;
        if let Err(e) = self.driver.press(ViewerKey::ArrowLeft).await {
            warn!("Binding detection failed: {}", e);
            return None;
        }
        self.wait.pause(self.step_delay).await;
        let after = self.current_page().await?;
        Some(if after > before {
            BindingSide::Right
        } else {
            BindingSide::Left
        })
    }
}

#[async_trait]
impl ViewerNavigator for Viewer<'_> {
    async fn prepare(&mut self) -> Result<(), CaptureError> {
        self.wait.pause(SETTLE_DELAY).await;
        self.driver
            .execute(&format!(
                "document.body.style.backgroundColor = '{}';",
                BACKGROUND_COLOR
            ))
            .await?;

        let driver = self.driver;
        let shown = poll_until(self.wait, POLL_ATTEMPTS, POLL_INTERVAL, move || async move {
            read_number(driver, CURRENT_PAGE).await
        })
        .await;
        self.ready = shown.is_some();
        if !self.ready {
            warn!("Page counter never appeared");
        }
        Ok(())
    }

    async fn resolve_binding_side(&mut self) -> Result<BindingSide, CaptureError> {
        let detected = if self.ready && self.explicit.is_none() && self.configured.is_none() {
            self.detect_binding_side().await
        } else {
            None
        };
        let side = BindingSide::resolve(self.explicit, self.configured, detected);
        debug!("Binding side {:?}", side);
        self.keys = KeyBinding::for_side(side);
        Ok(side)
    }

    async fn rewind(&mut self) -> Result<(), CaptureError> {
        let mut current = self.current_page().await;
        while let Some(page) = current.filter(|page| *page > 1) {
            self.driver.press(self.keys.previous).await?;
            self.wait.pause(self.step_delay).await;
            current = self.current_page().await;
            if current == Some(page) {
                debug!("Counter stuck at {} while rewinding", page);
                break;
            }
        }
        Ok(())
    }

    async fn discover_page_count(&mut self) -> Result<Option<PageCount>, CaptureError> {
        if !self.ready {
            println!("Failed to get the current page");
            return Ok(None);
        }
        let driver = self.driver;
        let total = poll_until(self.wait, POLL_ATTEMPTS, POLL_INTERVAL, move || async move {
            read_number(driver, TOTAL_PAGES).await.filter(|total| *total > 0)
        })
        .await;
        self.shown = self.current_page().await;
        Ok(total.and_then(PageCount::single))
    }

    /// Past the end once an advance no longer moves the counter forward
    async fn is_terminal(&mut self) -> Result<bool, CaptureError> {
        if !self.advanced {
            return Ok(false);
        }
        let current = self.current_page().await;
        let stalled = match (self.shown, current) {
            (Some(before), Some(after)) => after <= before,
            _ => false,
        };
        self.shown = current;
        Ok(stalled)
    }

    async fn capture(&mut self, _index: usize) -> Result<DynamicImage, CaptureError> {
        screenshot_frame(self.driver, &self.scratch).await
    }

    async fn advance(&mut self) -> Result<(), CaptureError> {
        self.driver.press(self.keys.next).await?;
        self.advanced = true;
        Ok(())
    }

    fn trimmer(&self) -> Option<ImageTrimmer> {
        Some(ImageTrimmer::with_chrome_margin(CHROME_MARGIN))
    }
}

#[cfg(test)]
#[path = "ebookjapan_test.rs"]
mod ebookjapan_test;
