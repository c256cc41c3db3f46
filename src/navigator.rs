//! Viewer navigation shared by the site variants.
//!
//! A viewer goes through `Loading → Warning? → Description? → Ready →
//! Paging → LastPage? → Done`. [`ViewerNavigator::prepare`] covers everything
//! up to `Ready`; the capture session drives the rest.

use anyhow::Context;
use async_trait::async_trait;
use image::DynamicImage;
use std::path::Path;
use tracing::debug;

use crate::driver::{BrowserDriver, ViewerKey};
use crate::errors::CaptureError;
use crate::output::ensure_directory;
use crate::trimmer::ImageTrimmer;
use crate::types::{BindingSide, PageCount};

#[async_trait]
pub trait ViewerNavigator: Send {
    /// Dismiss warning and instructional overlays
    async fn prepare(&mut self) -> Result<(), CaptureError>;

    /// Settle which key turns the page forward
    async fn resolve_binding_side(&mut self) -> Result<BindingSide, CaptureError>;

    /// Move to the first frame of the book
    async fn rewind(&mut self) -> Result<(), CaptureError>;

    /// Declared and displayed page counts; `None` when the viewer never
    /// reports a usable number
    async fn discover_page_count(&mut self) -> Result<Option<PageCount>, CaptureError>;

    /// Whether the viewer is past its last content frame
    async fn is_terminal(&mut self) -> Result<bool, CaptureError>;

    /// Raw frame currently shown
    async fn capture(&mut self, index: usize) -> Result<DynamicImage, CaptureError>;

    async fn advance(&mut self) -> Result<(), CaptureError>;

    /// How captured frames are cropped; `None` saves them untouched
    fn trimmer(&self) -> Option<ImageTrimmer>;
}

/// Physical keys for the logical page directions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    pub next: ViewerKey,
    pub previous: ViewerKey,
}

impl KeyBinding {
    /// Right-bound books lay pages right to left, so "next" is the left arrow
    pub fn for_side(side: BindingSide) -> Self {
        match side {
            BindingSide::Left => KeyBinding {
                next: ViewerKey::ArrowRight,
                previous: ViewerKey::ArrowLeft,
            },
            BindingSide::Right | BindingSide::Unknown => KeyBinding {
                next: ViewerKey::ArrowLeft,
                previous: ViewerKey::ArrowRight,
            },
        }
    }
}

/// Evaluate an advisory check; a script that fails counts as `false`
pub async fn probe(driver: &dyn BrowserDriver, script: &str) -> bool {
    match driver.evaluate(script).await {
        Ok(value) => value.as_bool().unwrap_or(false),
        Err(e) => {
            let err = CaptureError::ScriptEvaluationFailed(e.to_string());
            debug!("{}; treating as false", err);
            false
        }
    }
}

/// Where screenshot variants keep the last raw frame
pub const SCRATCH_SCREENSHOT: &str = "/tmp/k/K-AutoBook.png";

/// Screenshot the viewport through the scratch file and decode it
pub async fn screenshot_frame(
    driver: &dyn BrowserDriver,
    scratch: &Path,
) -> Result<DynamicImage, CaptureError> {
    if let Some(parent) = scratch.parent() {
        ensure_directory(parent)?;
    }
    driver.screenshot(scratch).await?;
    let frame = image::open(scratch)
        .context(format!("Failed to decode screenshot {}", scratch.display()))?;
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_binding_is_inverted_relative_to_side() {
        let left = KeyBinding::for_side(BindingSide::Left);
        assert_eq!(left.next, ViewerKey::ArrowRight);
        assert_eq!(left.previous, ViewerKey::ArrowLeft);

        let right = KeyBinding::for_side(BindingSide::Right);
        assert_eq!(right.next, ViewerKey::ArrowLeft);
        assert_eq!(right.previous, ViewerKey::ArrowRight);

        assert_eq!(KeyBinding::for_side(BindingSide::Unknown), right);
    }
}
