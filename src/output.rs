use anyhow::{Context, Result};
use image::DynamicImage;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::CaptureError;
use crate::trimmer::normalize_for;
use crate::types::ImageFormat;

/// Pick the directory a capture writes to.
///
/// An empty request means the working directory. A path that does not exist
/// yet is used as-is; otherwise the first free `path-1`, `path-2`, ... is
/// chosen so earlier captures are never merged or overwritten. Nothing is
/// created here.
pub fn resolve_output_directory(requested: &str) -> PathBuf {
    if requested.is_empty() {
        println!("Output to current directory");
        return PathBuf::from(".");
    }

    let trimmed = requested.trim_end_matches('/');
    let base = if trimmed.is_empty() { "/" } else { trimmed };
    if !Path::new(base).exists() {
        return PathBuf::from(base);
    }

    let chosen = (1..)
        .map(|i| PathBuf::from(format!("{}-{}", base, i)))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| PathBuf::from(base));
    println!(
        "Change output directory to '{}' because '{}' already exists",
        chosen.display(),
        requested
    );
    chosen
}

/// Create a directory and any missing parents
pub fn ensure_directory(path: &Path) -> Result<(), CaptureError> {
    if path.is_dir() {
        return Ok(());
    }
    debug!("Creating directory {}", path.display());
    std::fs::create_dir_all(path).map_err(|source| {
        println!("Failed to create directory ({})", path.display());
        CaptureError::DirectoryCreateFailed {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Encode a frame in the configured format
pub fn save_frame(frame: DynamicImage, path: &Path, format: ImageFormat) -> Result<()> {
    normalize_for(frame, format)
        .save_with_format(path, format.encoding())
        .context(format!("Failed to save {}", path.display()))
}

/// `current/total` progress line rewritten in place
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    total: usize,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self { total }
    }

    pub fn line(&self, current: usize) -> String {
        format!("{}/{}", current, self.total)
    }

    pub fn update(&self, current: usize) {
        print!("\r{}", self.line(current));
        let _ = std::io::stdout().flush();
    }

    /// Print the completed line
    pub fn finish(&self) {
        println!("\r{}", self.line(self.total));
    }
}
