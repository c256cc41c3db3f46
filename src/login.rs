//! Yahoo! JAPAN account login shared by the bookstore and ebookjapan sites.
//!
//! `Start → CredentialEntry → {LoginError | ImageCaptcha ×≤3 | OneTimePassword ×≤4}
//! → Authenticated | Failed`

use anyhow::Context;
use image::{DynamicImage, Rgba, RgbaImage};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::SiteConfig;
use crate::driver::BrowserDriver;
use crate::errors::CaptureError;
use crate::prompt::Prompter;
use crate::wait::WaitPolicy;

pub const LOGIN_URL: &str = "https://login.yahoo.co.jp/config/login";
pub const TOP_PAGE_URL: &str = "https://www.yahoo.co.jp/";
pub const ONE_TIME_PASSWORD_URL: &str = "https://protect.login.yahoo.co.jp/otp/auth";

const CAPTCHA_TITLE: &str = "文字認証を行います。 - Yahoo! JAPAN";
const CAPTCHA_FIELDS: [&str; 5] = [
    "captchaCdata",
    "captchaMultiByteCaptchaId",
    "captchaView",
    "captchaClassInfo",
    "captchaAnswer",
];
const LOGIN_ERROR_SELECTOR: &str = "div.yregertxt > h2.yjM";
const ENABLE_PASSWORD_SCRIPT: &str = r#"
    var element = document.getElementById("passwd");
    element.disabled = false;
    element.readOnly = false;
"#;

const MAX_ATTEMPTS: usize = 4;
const MAX_CAPTCHA_ROUNDS: usize = 3;
const MAX_OTP_ROUNDS: usize = 4;

/// A credential either stored in the config or asked for when needed
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Fixed(String),
    Prompt,
}

#[derive(Clone)]
pub struct LoginCredentials {
    pub id: Credential,
    pub password: Credential,
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = match &self.id {
            Credential::Fixed(id) => id.as_str(),
            Credential::Prompt => "<prompt>",
        };
        let password = match &self.password {
            Credential::Fixed(_) => "<redacted>",
            Credential::Prompt => "<prompt>",
        };
        f.debug_struct("LoginCredentials")
            .field("id", &id)
            .field("password", &password)
            .finish()
    }
}

impl LoginCredentials {
    pub fn prompt() -> Self {
        Self {
            id: Credential::Prompt,
            password: Credential::Prompt,
        }
    }

    pub fn fixed(id: &str, password: &str) -> Self {
        Self {
            id: Credential::Fixed(id.to_string()),
            password: Credential::Fixed(password.to_string()),
        }
    }

    /// Stored credentials when the config has both halves, otherwise prompts
    pub fn from_config(site: &SiteConfig) -> Self {
        match site.stored_credentials() {
            Some((id, password)) => Self::fixed(id, password),
            None => Self::prompt(),
        }
    }

    /// Both halves came from the config, so a rejection will not change on retry
    pub fn is_fixed(&self) -> bool {
        matches!(
            (&self.id, &self.password),
            (Credential::Fixed(_), Credential::Fixed(_))
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated,
    Failed(String),
}

pub struct LoginFlow<'a> {
    driver: &'a dyn BrowserDriver,
    prompter: &'a dyn Prompter,
    wait: &'a dyn WaitPolicy,
    credentials: LoginCredentials,
    log_directory: PathBuf,
}

impl<'a> LoginFlow<'a> {
    pub fn new(
        driver: &'a dyn BrowserDriver,
        prompter: &'a dyn Prompter,
        wait: &'a dyn WaitPolicy,
        credentials: LoginCredentials,
        log_directory: &Path,
    ) -> Self {
        Self {
            driver,
            prompter,
            wait,
            credentials,
            log_directory: log_directory.to_path_buf(),
        }
    }

    /// Run the whole login.
    ///
    /// Rejections end in `Failed` with a message. Any other error also saves a
    /// screenshot of the page into the log directory.
    pub async fn login(&self) -> LoginOutcome {
        match self.run().await {
            Ok(()) => {
                println!("Succeeded login");
                LoginOutcome::Authenticated
            }
            Err(e @ (CaptureError::LoginError(_) | CaptureError::CaptchaMismatch)) => {
                LoginOutcome::Failed(e.to_string())
            }
            Err(e) => {
                warn!("Unexpected error during login: {}", e);
                self.save_error_screenshot().await;
                LoginOutcome::Failed(e.to_string())
            }
        }
    }

    async fn run(&self) -> Result<(), CaptureError> {
        println!("Loading Yahoo JAPAN! top page");
        self.driver.visit(TOP_PAGE_URL).await?;
        println!("Loading login page");
        self.driver.click_link("ログイン").await?;

        for attempt in 1..=MAX_ATTEMPTS {
            debug!("Login attempt {}/{}", attempt, MAX_ATTEMPTS);
            self.submit_credentials().await?;

            if self.is_login_error().await? {
                println!("Login failed");
                if self.credentials.is_fixed() {
                    return Err(CaptureError::LoginError(
                        "the stored credentials were rejected".to_string(),
                    ));
                }
                continue;
            }

            self.solve_captchas().await?;
            if self.is_login_page().await? {
                continue;
            }

            self.pass_one_time_password().await?;
            return Ok(());
        }

        Err(CaptureError::LoginError(format!(
            "no success after {} attempts",
            MAX_ATTEMPTS
        )))
    }

    async fn submit_credentials(&self) -> Result<(), CaptureError> {
        let id = match &self.credentials.id {
            Credential::Fixed(id) => id.clone(),
            Credential::Prompt => self.ask("Input Yahoo ID > ", false)?,
        };
        let password = match &self.credentials.password {
            Credential::Fixed(password) => password.clone(),
            Credential::Prompt => self.ask("Input Password > ", true)?,
        };

        println!("Trying login: {}", id);
        self.driver.fill("login", &id).await?;
        self.driver.click("#btnNext").await?;
        self.wait.pause(Duration::from_secs(1)).await;

        self.driver.execute(ENABLE_PASSWORD_SCRIPT).await?;
        self.driver.fill("passwd", &password).await?;
        self.driver.click("#btnSubmit").await?;
        Ok(())
    }

    async fn solve_captchas(&self) -> Result<(), CaptureError> {
        for round in 1..=MAX_CAPTCHA_ROUNDS {
            if !self.is_image_captcha().await? {
                return Ok(());
            }
            info!("Image captcha round {}/{}", round, MAX_CAPTCHA_ROUNDS);

            let path = self.show_captcha().await?;
            println!("Captcha image: {}", path.display());
            let answer = self.ask("Input Captcha > ", false)?;
            self.driver.fill("captchaAnswer", &answer).await?;
            self.driver.click("input[type=image]").await?;

            if round == MAX_CAPTCHA_ROUNDS && self.is_image_captcha().await? {
                println!("The captcha did not match");
                return Err(CaptureError::CaptchaMismatch);
            }
        }
        Ok(())
    }

    async fn pass_one_time_password(&self) -> Result<(), CaptureError> {
        let mut asked = false;
        for _ in 0..MAX_OTP_ROUNDS {
            if !self.is_one_time_password_required().await? {
                return Ok(());
            }
            if asked {
                println!("Invalid one time password");
            }
            let code = self.ask("Input one time password > ", true)?;
            asked = true;
            self.driver.fill("verify_code", &code).await?;
            self.driver.click("[type=submit]").await?;
        }

        if self.is_one_time_password_required().await? {
            return Err(CaptureError::LoginError(
                "the one time password was not accepted".to_string(),
            ));
        }
        Ok(())
    }

    fn ask(&self, prompt: &str, secret: bool) -> Result<String, CaptureError> {
        let answer = if secret {
            self.prompter.ask_secret(prompt)?
        } else {
            self.prompter.ask(prompt)?
        };
        answer.ok_or_else(|| CaptureError::LoginError("input closed".to_string()))
    }

    async fn is_login_page(&self) -> Result<bool, CaptureError> {
        Ok(self.driver.current_url().await?.starts_with(LOGIN_URL))
    }

    async fn is_login_error(&self) -> Result<bool, CaptureError> {
        Ok(self.is_login_page().await? && self.driver.count(LOGIN_ERROR_SELECTOR).await? > 0)
    }

    /// Needs the captcha page title and every captcha form field; a partial
    /// match is not a captcha
    async fn is_image_captcha(&self) -> Result<bool, CaptureError> {
        if !self.is_login_page().await? || self.driver.title().await? != CAPTCHA_TITLE {
            return Ok(false);
        }
        let names: Vec<String> = self
            .driver
            .attributes("input", "name")
            .await?
            .into_iter()
            .flatten()
            .collect();
        Ok(CAPTCHA_FIELDS
            .iter()
            .all(|field| names.iter().any(|name| name == field)))
    }

    async fn is_one_time_password_required(&self) -> Result<bool, CaptureError> {
        Ok(self
            .driver
            .current_url()
            .await?
            .starts_with(ONE_TIME_PASSWORD_URL))
    }

    /// Fetch the challenge, clean it up and write it to the log directory
    async fn show_captcha(&self) -> Result<PathBuf, CaptureError> {
        let src = self
            .driver
            .attribute("#captchaV5MultiByteCaptchaImg", "src")
            .await?
            .ok_or_else(|| CaptureError::LoginError("captcha image not found".to_string()))?;
        let current = self.driver.current_url().await?;
        let src = url::Url::parse(&current)
            .and_then(|base| base.join(&src))
            .map(|u| u.to_string())
            .unwrap_or(src);

        let response = self.driver.fetch(&src).await?;
        if !response.is_ok() {
            return Err(CaptureError::LoginError(format!(
                "captcha image returned HTTP {}",
                response.status
            )));
        }
        let source = image::load_from_memory(&response.body).context("Failed to decode captcha")?;

        let path = self.log_directory.join("captcha.png");
        render_captcha(&source)
            .save_with_format(&path, image::ImageFormat::Png)
            .context(format!("Failed to save {}", path.display()))?;
        Ok(path)
    }

    async fn save_error_screenshot(&self) {
        let path = self.log_directory.join(format!(
            "login_error_{}.png",
            chrono::Utc::now().timestamp()
        ));
        match self.driver.screenshot(&path).await {
            Ok(()) => println!("Saved screenshot to {}", path.display()),
            Err(e) => warn!("Could not save login error screenshot: {}", e),
        }
    }
}

/// Copy only the non-transparent pixels onto a blank canvas
pub fn render_captcha(source: &DynamicImage) -> RgbaImage {
    let source = source.to_rgba8();
    let mut canvas = RgbaImage::from_pixel(
        source.width(),
        source.height(),
        Rgba([0xFF, 0xFF, 0xFF, 0x00]),
    );
    for (x, y, pixel) in source.enumerate_pixels() {
        if pixel.0 != [0, 0, 0, 0] {
            canvas.put_pixel(x, y, *pixel);
        }
    }
    canvas
}

#[cfg(test)]
#[path = "login_test.rs"]
mod login_test;
