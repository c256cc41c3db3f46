//! Yahoo! bookstore: a product page that links to a two-page spread viewer
//! hosted in the `binb` iframe.

use async_trait::async_trait;
use image::DynamicImage;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use super::{Runner, RunContext, SiteKind, absolute_url, binding_option};
use crate::driver::{BrowserDriver, ViewerKey};
use crate::errors::CaptureError;
use crate::matcher::PageMatcher;
use crate::navigator::{
    KeyBinding, SCRATCH_SCREENSHOT, ViewerNavigator, probe, screenshot_frame,
};
use crate::trimmer::ImageTrimmer;
use crate::types::{BindingSide, PageCount, SessionOutcome};
use crate::wait::{SETTLE_DELAY, WaitPolicy};

const DOMAIN: &str = r"bookstore\.yahoo\.co\.jp";
const PATTERNS: [&str; 2] = [r"shoshi-\d+/$", r"unlimited/shoshi-\d+/$"];

lazy_static::lazy_static! {
    pub static ref MATCHER: PageMatcher =
        PageMatcher::new(DOMAIN, &PATTERNS).expect("bookstore URL patterns");
}

pub const LAST_PAGE_URL: &str = "https://bookstore.yahoo.co.jp/viewerLastPage";

const FULL_LINK: &str = ".btn-read > a, p.read > a";
const DEMO_LINK: &str = ".btn-demo > a";
const FULL_PAGES_TITLE: &str = "総ページ数";
const DEMO_PAGES_TITLE: &str = "立ち読み\nページ数";

const WARNING_SCRIPT: &str = r#"
    return document.getElementById("binb").contentWindow
        .document.getElementById("warningPageFrame") !== null;
"#;
const AGREE_SCRIPT: &str = r#"
    document.getElementById("binb").contentWindow
        .document.getElementById("warningPageFrame").contentWindow
        .document.getElementsByClassName("btnOK")[0].click();
"#;
const DESCRIPTION_SCRIPT: &str = r#"
    var binb = document.getElementById("binb");
    var tips = binb && binb.contentWindow.document.getElementById("menu_tips_div");
    return !!tips && tips.style.visibility !== "hidden";
"#;

pub(super) async fn run(
    runner: &Runner<'_>,
    url: &str,
    options: &[String],
    context: &mut RunContext,
) -> Result<SessionOutcome, CaptureError> {
    let site = runner.site(SiteKind::Bookstore);
    if site.needs_login {
        if let Some(failed) = runner.ensure_login(SiteKind::Bookstore, context).await {
            return Ok(failed);
        }
    }

    println!("Loading page of input url ({})", url);
    runner.driver.visit(url).await?;

    let (link, title) = if runner.driver.count(FULL_LINK).await? > 0 {
        (FULL_LINK, FULL_PAGES_TITLE)
    } else if runner.driver.count(DEMO_LINK).await? > 0 {
        (DEMO_LINK, DEMO_PAGES_TITLE)
    } else {
        println!("Failed to load the page");
        return Ok(SessionOutcome::Aborted("page unavailable".to_string()));
    };

    let Some(href) = runner.driver.attribute(link, "href").await? else {
        println!("Failed to get the URL of the content");
        return Ok(SessionOutcome::Aborted("content URL unavailable".to_string()));
    };
    let viewer_url = absolute_url(&runner.driver.current_url().await?, &href);

    let total = declared_pages(runner.driver, title).await?;
    if total == 0 {
        println!("Failed to get the page count");
        return Ok(SessionOutcome::Aborted("page count unavailable".to_string()));
    }

    let Some(output) = runner.ask_output_path()? else {
        return Ok(SessionOutcome::Aborted("input closed".to_string()));
    };
    let target = runner.target(SiteKind::Bookstore, url, options, output);
    let mut viewer = Viewer::new(
        runner.driver,
        runner.wait,
        &viewer_url,
        total,
        binding_option(options),
        site.bound_on_side,
        site.step_delay(),
    )
    .with_scratch(runner.scratch.clone());
    runner.capture(SiteKind::Bookstore, &target, &mut viewer).await
}

/// Value cell of the product details row titled `title`
async fn spec_value(driver: &dyn BrowserDriver, title: &str) -> Result<Option<String>, CaptureError> {
    let title = serde_json::to_string(title).map_err(anyhow::Error::from)?;
    let script = format!(
        r#"
        var rows = document.querySelectorAll(".specModule > table.spec tr");
        for (var i = 0; i < rows.length; i++) {{
            var cells = rows[i].querySelectorAll("th, td");
            if (cells.length >= 2 && cells[0].innerText === {}) {{
                return cells[1].innerText;
            }}
        }}
        return null;
        "#,
        title
    );
    let value = driver.evaluate(&script).await?;
    Ok(value.as_str().map(str::to_string))
}

async fn declared_pages(driver: &dyn BrowserDriver, title: &str) -> Result<usize, CaptureError> {
    Ok(spec_value(driver, title)
        .await?
        .map(|value| parse_page_count(&value))
        .unwrap_or(0))
}

/// Page count from a details cell such as `210ページ`; 0 when unreadable
pub fn parse_page_count(value: &str) -> usize {
    let chars: Vec<char> = value.trim().chars().collect();
    if chars.len() <= 3 {
        return 0;
    }
    chars[..chars.len() - 3]
        .iter()
        .collect::<String>()
        .trim()
        .parse()
        .unwrap_or(0)
}

pub struct Viewer<'a> {
    driver: &'a dyn BrowserDriver,
    wait: &'a dyn WaitPolicy,
    url: String,
    total: usize,
    explicit: Option<BindingSide>,
    configured: Option<BindingSide>,
    keys: KeyBinding,
    step_delay: Duration,
    scratch: PathBuf,
}

impl<'a> Viewer<'a> {
    pub fn new(
        driver: &'a dyn BrowserDriver,
        wait: &'a dyn WaitPolicy,
        url: &str,
        total: usize,
        explicit: Option<BindingSide>,
        configured: Option<BindingSide>,
        step_delay: Duration,
    ) -> Self {
        Self {
            driver,
            wait,
            url: url.to_string(),
            total,
            explicit,
            configured,
            keys: KeyBinding::for_side(BindingSide::Unknown),
            step_delay,
            scratch: PathBuf::from(SCRATCH_SCREENSHOT),
        }
    }

    pub fn with_scratch(mut self, scratch: PathBuf) -> Self {
        self.scratch = scratch;
        self
    }

    async fn is_last_page(&self) -> Result<bool, CaptureError> {
        Ok(self.driver.current_url().await?.starts_with(LAST_PAGE_URL))
    }
}

#[async_trait]
impl ViewerNavigator for Viewer<'_> {
    async fn prepare(&mut self) -> Result<(), CaptureError> {
        self.driver.visit(&self.url).await?;
        self.wait.pause(SETTLE_DELAY).await;

        if probe(self.driver, WARNING_SCRIPT).await {
            debug!("Agreeing to the content warning");
            self.driver.execute(AGREE_SCRIPT).await?;
            self.wait.pause(SETTLE_DELAY).await;
        }
        if probe(self.driver, DESCRIPTION_SCRIPT).await {
            debug!("Closing the usage description");
            self.driver.send_text("-").await?;
        }
        Ok(())
    }

    async fn resolve_binding_side(&mut self) -> Result<BindingSide, CaptureError> {
        let side = BindingSide::resolve(self.explicit, self.configured, None);
        self.keys = KeyBinding::for_side(side);
        Ok(side)
    }

    async fn rewind(&mut self) -> Result<(), CaptureError> {
        self.driver.press_with_shift(self.keys.previous).await?;
        self.wait.pause(self.step_delay).await;
        // Shift+previous lands on the last page when the binding guess was wrong
        if self.is_last_page().await? {
            self.driver.press_with_shift(self.keys.next).await?;
            self.wait.pause(self.step_delay).await;
        }
        Ok(())
    }

    async fn discover_page_count(&mut self) -> Result<Option<PageCount>, CaptureError> {
        Ok(PageCount::spread(self.total))
    }

    async fn is_terminal(&mut self) -> Result<bool, CaptureError> {
        self.is_last_page().await
    }

    async fn capture(&mut self, _index: usize) -> Result<DynamicImage, CaptureError> {
        screenshot_frame(self.driver, &self.scratch).await
    }

    async fn advance(&mut self) -> Result<(), CaptureError> {
        // Space turns forward whichever way the book is bound
        self.driver.press(ViewerKey::Space).await?;
        Ok(())
    }

    fn trimmer(&self) -> Option<ImageTrimmer> {
        Some(ImageTrimmer::new())
    }
}

#[cfg(test)]
#[path = "bookstore_test.rs"]
mod bookstore_test;
