//! The supported stores and what they share: URL detection, login state,
//! the output path prompt and handing a navigator to the capture session.

pub mod alphapolis;
pub mod bookstore;
pub mod ebookjapan;

use std::collections::HashSet;
use std::path::PathBuf;
use tracing::info;

use crate::capture::CaptureSession;
use crate::config::{Config, SiteConfig};
use crate::driver::BrowserDriver;
use crate::errors::CaptureError;
use crate::login::{LoginCredentials, LoginFlow, LoginOutcome};
use crate::matcher::PageMatcher;
use crate::navigator::ViewerNavigator;
use crate::prompt::Prompter;
use crate::types::{BindingSide, CaptureTarget, SessionOutcome};
use crate::wait::WaitPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteKind {
    /// Gallery pages with direct image URLs
    Alphapolis,
    /// Screenshot viewer with a last-page URL
    Bookstore,
    /// Screenshot viewer with a footer page counter
    Ebookjapan,
}

impl SiteKind {
    pub const ALL: [SiteKind; 3] = [
        SiteKind::Alphapolis,
        SiteKind::Bookstore,
        SiteKind::Ebookjapan,
    ];

    /// The site that can capture `url`, if any
    pub fn detect(url: &str) -> Option<SiteKind> {
        Self::ALL.into_iter().find(|kind| kind.matcher().supports(url))
    }

    pub fn matcher(&self) -> &'static PageMatcher {
        match self {
            SiteKind::Alphapolis => &*alphapolis::MATCHER,
            SiteKind::Bookstore => &*bookstore::MATCHER,
            SiteKind::Ebookjapan => &*ebookjapan::MATCHER,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SiteKind::Alphapolis => "alphapolis",
            SiteKind::Bookstore => "bookstore",
            SiteKind::Ebookjapan => "ebookjapan",
        }
    }
}

/// State kept between URLs within one process
#[derive(Debug, Default)]
pub struct RunContext {
    logged_in: HashSet<SiteKind>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_logged_in(&self, kind: SiteKind) -> bool {
        self.logged_in.contains(&kind)
    }

    pub fn mark_logged_in(&mut self, kind: SiteKind) {
        self.logged_in.insert(kind);
    }
}

/// Everything a site flow talks to
pub struct Runner<'a> {
    pub driver: &'a dyn BrowserDriver,
    pub prompter: &'a dyn Prompter,
    pub wait: &'a dyn WaitPolicy,
    pub config: &'a Config,
    /// Screenshot file reused for every raw frame
    pub scratch: PathBuf,
}

impl<'a> Runner<'a> {
    /// Capture the book at `url` with the site that supports it
    pub async fn run(
        &self,
        kind: SiteKind,
        url: &str,
        options: &[String],
        context: &mut RunContext,
    ) -> Result<SessionOutcome, CaptureError> {
        info!("Running {} for {}", kind.name(), url);
        match kind {
            SiteKind::Alphapolis => alphapolis::run(self, url, options).await,
            SiteKind::Bookstore => bookstore::run(self, url, options, context).await,
            SiteKind::Ebookjapan => ebookjapan::run(self, url, options, context).await,
        }
    }

    pub fn site(&self, kind: SiteKind) -> &'a SiteConfig {
        self.config.site(kind)
    }

    /// Log in unless this process already did for `kind`.
    ///
    /// Returns the outcome to report when the login failed.
    async fn ensure_login(
        &self,
        kind: SiteKind,
        context: &mut RunContext,
    ) -> Option<SessionOutcome> {
        if context.is_logged_in(kind) {
            return None;
        }
        let credentials = LoginCredentials::from_config(self.site(kind));
        let flow = LoginFlow::new(
            self.driver,
            self.prompter,
            self.wait,
            credentials,
            &self.config.log_directory,
        );
        match flow.login().await {
            LoginOutcome::Authenticated => {
                context.mark_logged_in(kind);
                None
            }
            LoginOutcome::Failed(reason) => Some(SessionOutcome::LoginFailed(reason)),
        }
    }

    /// Ask where to write the book; `None` when input is closed
    fn ask_output_path(&self) -> Result<Option<PathBuf>, CaptureError> {
        Ok(self.prompter.ask("Output Path > ")?.map(PathBuf::from))
    }

    fn target(
        &self,
        kind: SiteKind,
        url: &str,
        options: &[String],
        output_directory: PathBuf,
    ) -> CaptureTarget {
        let site = self.site(kind);
        CaptureTarget {
            url: url.to_string(),
            output_directory,
            filename_prefix: site.filename_prefix.clone(),
            binding_side: binding_option(options).unwrap_or(BindingSide::Unknown),
            image_format: site.image_format,
        }
    }

    async fn capture(
        &self,
        kind: SiteKind,
        target: &CaptureTarget,
        navigator: &mut dyn ViewerNavigator,
    ) -> Result<SessionOutcome, CaptureError> {
        CaptureSession::new(self.wait, self.site(kind).step_delay())
            .run(target, navigator)
            .await
    }
}

/// First `L` or `R` token among the run options
pub fn binding_option(options: &[String]) -> Option<BindingSide> {
    options.iter().find_map(|o| BindingSide::from_option(o))
}

/// Resolve a possibly relative link against the page it was found on
pub(crate) fn absolute_url(base: &str, href: &str) -> String {
    url::Url::parse(base)
        .and_then(|base| base.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}
