//! Alphapolis manga pages list their images in inline script, so frames are
//! fetched directly instead of screenshotted.

use async_trait::async_trait;
use image::DynamicImage;
use regex::Regex;
use tracing::debug;

use super::{Runner, SiteKind};
use crate::driver::BrowserDriver;
use crate::errors::CaptureError;
use crate::matcher::PageMatcher;
use crate::navigator::ViewerNavigator;
use crate::trimmer::ImageTrimmer;
use crate::types::{BindingSide, PageCount, SessionOutcome};

const DOMAIN: &str = r"www\.alphapolis\.co\.jp";
const PATTERNS: [&str; 3] = [
    r"manga/official/\d+",
    r"manga/viewManga/(\?.*no=)?\d+",
    r"manga/official/\d+/\d+",
];

lazy_static::lazy_static! {
    pub static ref MATCHER: PageMatcher =
        PageMatcher::new(DOMAIN, &PATTERNS).expect("alphapolis URL patterns");
    static ref BASE_PATTERN: Regex =
        Regex::new(r#"var\s+_base\s*=\s*"([^"]+)";"#).expect("base URL pattern");
    static ref PAGE_PATTERN: Regex =
        Regex::new(r#"_pages\.push\("(\d+\.jpg)"\);"#).expect("page pattern");
}

pub(super) async fn run(
    runner: &Runner<'_>,
    url: &str,
    options: &[String],
) -> Result<SessionOutcome, CaptureError> {
    let Some(output) = runner.ask_output_path()? else {
        return Ok(SessionOutcome::Aborted("input closed".to_string()));
    };
    let target = runner.target(SiteKind::Alphapolis, url, options, output);
    let mut gallery = Gallery::new(runner.driver, url);
    runner
        .capture(SiteKind::Alphapolis, &target, &mut gallery)
        .await
}

/// Image URLs announced by a manga page
pub fn image_urls(html: &str) -> Result<Vec<String>, CaptureError> {
    let base = BASE_PATTERN
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| CaptureError::PageDiscoveryFailed("image base URL not found".to_string()))?;
    let pages: Vec<String> = PAGE_PATTERN
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| format!("{}{}", base, m.as_str()))
        .collect();
    if pages.is_empty() {
        return Err(CaptureError::PageDiscoveryFailed(
            "page list not found".to_string(),
        ));
    }
    Ok(pages)
}

pub struct Gallery<'a> {
    driver: &'a dyn BrowserDriver,
    page_url: String,
    images: Vec<String>,
}

impl<'a> Gallery<'a> {
    pub fn new(driver: &'a dyn BrowserDriver, page_url: &str) -> Self {
        Self {
            driver,
            page_url: page_url.to_string(),
            images: Vec::new(),
        }
    }
}

#[async_trait]
impl ViewerNavigator for Gallery<'_> {
    async fn prepare(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    /// Pages are fetched by URL, so there is no reading direction to settle
    async fn resolve_binding_side(&mut self) -> Result<BindingSide, CaptureError> {
        Ok(BindingSide::Unknown)
    }

    async fn rewind(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    async fn discover_page_count(&mut self) -> Result<Option<PageCount>, CaptureError> {
        let response = match self.driver.fetch(&self.page_url).await {
            Ok(response) => response,
            Err(e) => {
                println!("Failed to fetch the manga page ({})", e);
                return Ok(None);
            }
        };
        if !response.is_ok() {
            println!("Failed to fetch the manga page (HTTP {})", response.status);
            return Ok(None);
        }
        let html = String::from_utf8_lossy(&response.body);
        match image_urls(&html) {
            Ok(images) => {
                debug!("Found {} images", images.len());
                self.images = images;
                Ok(PageCount::single(self.images.len()))
            }
            Err(e) => {
                println!("{}", e);
                Ok(None)
            }
        }
    }

    async fn is_terminal(&mut self) -> Result<bool, CaptureError> {
        Ok(false)
    }

    async fn capture(&mut self, index: usize) -> Result<DynamicImage, CaptureError> {
        let url = self.images.get(index).cloned().unwrap_or_default();
        let failed = |reason: String| CaptureError::FrameFetchFailed {
            index,
            url: url.clone(),
            reason,
        };

        let response = self
            .driver
            .fetch(&url)
            .await
            .map_err(|e| failed(e.to_string()))?;
        if !response.is_ok() {
            return Err(failed(format!("HTTP {}", response.status)));
        }
        image::load_from_memory(&response.body).map_err(|e| failed(e.to_string()))
    }

    async fn advance(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    fn trimmer(&self) -> Option<ImageTrimmer> {
        None
    }
}
