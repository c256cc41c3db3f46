//! # autobook
#![allow(clippy::uninlined_format_args)]
//!
//! Pages through online manga and book viewers over WebDriver and saves every
//! page as a trimmed, numbered image sequence.
//!
//! ## Supported sites
//!
//! - Alphapolis manga pages (images fetched directly)
//! - Yahoo! bookstore two-page spread viewer (screenshots)
//! - ebookjapan single-page viewer (screenshots)
//!
//! ## CLI Usage
//!
//! Start a WebDriver first (`geckodriver --port 4444` or
//! `chromedriver --port 9515`), then:
//!
//! ```bash
//! autobook
//! Input URL > https://ebookjapan.yahoo.co.jp/books/123456/A000001/ L
//! Output Path > ~/books/volume-1
//! ```
//!
//! A trailing `L` or `R` forces a left- or right-bound book. `exit` or end of
//! input quits.
//!
//! ## Library Usage
//!
//! ```no_run
//! use autobook::{Browser, BrowserOptions, Config, RunContext, Runner, SiteKind};
//! use autobook::prompt::TerminalPrompter;
//! use autobook::wait::SleepWait;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::load(None)?;
//! let browser = Browser::connect(&BrowserOptions::from(&config)).await?;
//! let url = "https://www.alphapolis.co.jp/manga/official/123000";
//!
//! let runner = Runner {
//!     driver: &browser,
//!     prompter: &TerminalPrompter,
//!     wait: &SleepWait,
//!     config: &config,
//!     scratch: autobook::navigator::SCRATCH_SCREENSHOT.into(),
//! };
//! if let Some(kind) = SiteKind::detect(url) {
//!     let outcome = runner.run(kind, url, &[], &mut RunContext::new()).await?;
//!     println!("{:?}", outcome);
//! }
//! # Ok(())
//! # }
//! ```

/// Capture session driving a viewer from first to last frame
pub mod capture;

/// JSON configuration
pub mod config;

/// Browser operations used by the capture and login flows
pub mod driver;

/// Error taxonomy and exit codes
pub mod errors;

/// Yahoo! JAPAN ID login
pub mod login;

/// URL support checks
pub mod matcher;

/// Viewer navigation trait and key bindings
pub mod navigator;

/// Input-line option parsing
pub mod options;

/// Output directories, frame files and progress
pub mod output;

/// Operator prompts
pub mod prompt;

/// Supported stores
pub mod sites;

/// Frame trimming
pub mod trimmer;

/// Shared data types
pub mod types;

/// Delays and bounded polling
pub mod wait;

/// WebDriver browser control
pub mod webdriver;

#[cfg(test)]
mod testing;

pub use config::{Config, SiteConfig};
pub use errors::CaptureError;
pub use sites::{RunContext, Runner, SiteKind};
pub use types::{BindingSide, CaptureTarget, ImageFormat, PageCount, SessionOutcome};
pub use webdriver::{Browser, BrowserOptions, BrowserType};
