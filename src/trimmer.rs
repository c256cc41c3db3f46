//! Cropping of captured frames to the page content.
//!
//! Every color found on the left or right edge column counts as background.
//! A single probe row is scanned from both sides for the first pixel outside
//! that palette; the frame is cropped horizontally to those columns.

use image::{DynamicImage, GenericImageView};
use std::collections::HashSet;
use tracing::debug;

use crate::types::ImageFormat;

/// Row scanned for the content edges
pub const PROBE_ROW: u32 = 100;

/// Horizontal crop window of one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimBounds {
    pub start_x: u32,
    /// Exclusive
    pub end_x: u32,
    pub height: u32,
}

impl TrimBounds {
    pub fn width(&self) -> u32 {
        self.end_x - self.start_x
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImageTrimmer {
    /// Width of viewer chrome next to the content on each side
    chrome_margin: Option<u32>,
}

impl ImageTrimmer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also cut a fixed strip of viewer chrome from each detected edge
    pub fn with_chrome_margin(margin: u32) -> Self {
        Self {
            chrome_margin: Some(margin),
        }
    }

    /// Compute the crop window for a frame
    pub fn bounds(&self, frame: &DynamicImage) -> TrimBounds {
        let (width, height) = frame.dimensions();
        let full = TrimBounds {
            start_x: 0,
            end_x: width,
            height,
        };
        if width == 0 || height == 0 {
            return full;
        }

        let palette = Self::background_palette(frame);
        let probe_y = PROBE_ROW.min(height - 1);
        let is_content = |x: u32| !palette.contains(&frame.get_pixel(x, probe_y).0);

        let Some(first) = (0..width).find(|&x| is_content(x)) else {
            debug!("No content on probe row, keeping full frame");
            return full;
        };
        // A content pixel exists, so the reverse scan finds one too.
        let last = (0..width).rev().find(|&x| is_content(x)).unwrap_or(first);

        let mut bounds = TrimBounds {
            start_x: first,
            end_x: last + 1,
            height,
        };

        if let Some(margin) = self.chrome_margin {
            if bounds.start_x != 0 && bounds.start_x + margin < bounds.end_x.saturating_sub(margin)
            {
                bounds.start_x += margin;
                bounds.end_x -= margin;
            }
        }

        debug!(
            "Trim bounds {}..{} of {}x{}",
            bounds.start_x, bounds.end_x, width, height
        );
        bounds
    }

    /// Crop a frame to its content
    pub fn trim(&self, frame: &DynamicImage) -> DynamicImage {
        let bounds = self.bounds(frame);
        frame.crop_imm(bounds.start_x, 0, bounds.width(), bounds.height)
    }

    fn background_palette(frame: &DynamicImage) -> HashSet<[u8; 4]> {
        let (width, height) = frame.dimensions();
        let mut palette = HashSet::new();
        for y in 0..height {
            palette.insert(frame.get_pixel(0, y).0);
            palette.insert(frame.get_pixel(width - 1, y).0);
        }
        palette
    }
}

/// Convert a frame to the color model its output format stores
pub fn normalize_for(frame: DynamicImage, format: ImageFormat) -> DynamicImage {
    match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(frame.to_rgb8()),
        ImageFormat::Png => frame,
    }
}

#[cfg(test)]
#[path = "trimmer_test.rs"]
mod trimmer_test;
