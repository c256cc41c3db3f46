use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Which edge of a two-page spread holds the spine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BindingSide {
    /// Left-bound (pages advance to the right)
    Left,
    /// Right-bound (pages advance to the left)
    Right,
    /// Not known yet; treated as right-bound when keys are needed
    Unknown,
}

impl BindingSide {
    /// Resolve the effective binding side.
    ///
    /// An explicit per-run option wins over the site's configured default,
    /// which wins over a detected side. With none of those, right binding is
    /// assumed.
    pub fn resolve(
        explicit: Option<BindingSide>,
        configured: Option<BindingSide>,
        detected: Option<BindingSide>,
    ) -> BindingSide {
        [explicit, configured, detected]
            .into_iter()
            .flatten()
            .find(|side| *side != BindingSide::Unknown)
            .unwrap_or(BindingSide::Right)
    }

    /// Parse a per-run option token (`L` or `R`)
    pub fn from_option(token: &str) -> Option<BindingSide> {
        match token {
            "L" => Some(BindingSide::Left),
            "R" => Some(BindingSide::Right),
            _ => None,
        }
    }
}

impl std::str::FromStr for BindingSide {
    type Err = anyhow::Error;

    /// Parse from a config value: a name (case-insensitive) or the numeric code
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "RIGHT" | "1" => Ok(BindingSide::Right),
            "LEFT" | "2" => Ok(BindingSide::Left),
            _ => anyhow::bail!("Unsupported binding side: {}", s),
        }
    }
}

/// Output image encoding
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImageFormat {
    #[default]
    Jpeg,
    Png,
}

impl ImageFormat {
    /// File extension including the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => ".jpg",
            ImageFormat::Png => ".png",
        }
    }

    pub fn encoding(&self) -> image::ImageFormat {
        match self {
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Png => image::ImageFormat::Png,
        }
    }
}

impl std::str::FromStr for ImageFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "JPEG" | "JPG" | "1" => Ok(ImageFormat::Jpeg),
            "PNG" | "2" => Ok(ImageFormat::Png),
            _ => anyhow::bail!("Unsupported image format: {}", s),
        }
    }
}

/// Config files carry enums either as names or as their legacy numeric codes
#[derive(Deserialize)]
#[serde(untagged)]
enum NameOrCode {
    Name(String),
    Code(u64),
}

impl NameOrCode {
    fn into_text(self) -> String {
        match self {
            NameOrCode::Name(name) => name,
            NameOrCode::Code(code) => code.to_string(),
        }
    }
}

impl<'de> Deserialize<'de> for BindingSide {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        NameOrCode::deserialize(deserializer)?
            .into_text()
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for ImageFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        NameOrCode::deserialize(deserializer)?
            .into_text()
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

/// Everything needed to write one book to disk
#[derive(Debug, Clone)]
pub struct CaptureTarget {
    /// Page the operator asked for
    pub url: String,
    /// Requested output location (disambiguated by the session)
    pub output_directory: PathBuf,
    /// Prepended to every frame file name
    pub filename_prefix: String,
    /// Binding side forced for this run, if any
    pub binding_side: BindingSide,
    pub image_format: ImageFormat,
}

impl CaptureTarget {
    /// File name of the frame at `index`, e.g. `prefix007.jpg`
    pub fn frame_name(&self, index: usize) -> String {
        format!(
            "{}{:03}{}",
            self.filename_prefix,
            index,
            self.image_format.extension()
        )
    }
}

/// Declared book pages versus frames the viewer will show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCount {
    /// Pages the site declares
    pub total: usize,
    /// Frames to capture
    pub display: usize,
}

impl PageCount {
    /// Two pages per frame; the cover shows alone
    pub fn spread(total: usize) -> Option<Self> {
        (total > 0).then(|| PageCount {
            total,
            display: total / 2 + 1,
        })
    }

    /// One page per frame
    pub fn single(total: usize) -> Option<Self> {
        (total > 0).then_some(PageCount {
            total,
            display: total,
        })
    }
}

/// Loop position of a running capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureState {
    pub current_index: usize,
    pub total_display_pages: usize,
}

impl CaptureState {
    pub fn new(total_display_pages: usize) -> Self {
        Self {
            current_index: 0,
            total_display_pages,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.current_index >= self.total_display_pages
    }
}

/// Terminal result of one URL, reported by the CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Success {
        directory: PathBuf,
        saved: usize,
        /// The viewer hit its last page before the declared count
        stopped_early: bool,
    },
    Aborted(String),
    LoginFailed(String),
}

/// Browser window dimensions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSize {
    /// Viewport width in pixels
    pub width: u32,
    /// Viewport height in pixels
    pub height: u32,
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self {
            width: 2880,
            height: 1800,
        }
    }
}

impl std::str::FromStr for ViewportSize {
    type Err = anyhow::Error;

    /// Parse a `--window-size` value such as `1440x900`
    fn from_str(s: &str) -> Result<Self> {
        let Some((width, height)) = s.trim().split_once('x') else {
            anyhow::bail!("Window size must look like 1440x900: {}", s);
        };
        match (width.parse::<u32>(), height.parse::<u32>()) {
            (Ok(width), Ok(height)) if width > 0 && height > 0 => Ok(Self { width, height }),
            _ => anyhow::bail!("Window size must look like 1440x900: {}", s),
        }
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
