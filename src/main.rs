#![allow(clippy::uninlined_format_args)]

use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use autobook::navigator::SCRATCH_SCREENSHOT;
use autobook::options::{parse_options, split_input};
use autobook::output::ensure_directory;
use autobook::prompt::{Prompter, TerminalPrompter};
use autobook::types::ViewportSize;
use autobook::wait::SleepWait;
use autobook::{
    Browser, BrowserOptions, BrowserType, CaptureError, Config, RunContext, Runner,
    SessionOutcome, SiteKind,
};

const EXIT_SUCCESS: i32 = 0;

#[derive(Parser)]
#[command(name = "autobook")]
#[command(about = "Capture paginated manga and book viewers as image sequences", long_about = None)]
struct Cli {
    /// Configuration file (default: ./config.json, then ~/.autobook/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Browser to use (firefox or chrome)
    #[arg(short, long)]
    browser: Option<String>,

    /// WebDriver endpoint (default: the browser's standard local port)
    #[arg(long)]
    webdriver_url: Option<String>,

    /// Browser window size as WIDTHxHEIGHT (overrides window_size in the config)
    #[arg(long)]
    window_size: Option<ViewportSize>,

    /// Run browser in visible mode (disables headless)
    #[arg(long = "no-headless")]
    no_headless: bool,
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so prompts and progress on stdout stay readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "autobook=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(err.exit_code());
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config, CaptureError> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(browser) = &cli.browser {
        config.driver = browser
            .parse::<BrowserType>()
            .map_err(|e| CaptureError::InvalidConfig(e.to_string()))?;
    }
    if let Some(url) = &cli.webdriver_url {
        config.webdriver_url = Some(url.clone());
    }
    if let Some(size) = &cli.window_size {
        config.window_size = size.clone();
    }
    if cli.no_headless {
        config.headless = false;
    }
    Ok(config)
}

async fn run(cli: Cli) -> Result<(), CaptureError> {
    let config = load_config(&cli)?;
    ensure_directory(&config.log_directory)?;

    let mut browser = None;
    let result = input_loop(&config, &mut browser).await;

    if let Some(browser) = browser {
        if let Err(e) = browser.close().await {
            warn!("Failed to close browser session: {}", e);
        }
    }
    result
}

/// Read URLs until `exit` or end of input
async fn input_loop(config: &Config, browser: &mut Option<Browser>) -> Result<(), CaptureError> {
    let prompter = TerminalPrompter;
    let wait = SleepWait;
    let mut context = RunContext::new();

    while let Some(line) = prompter.ask("Input URL > ")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" {
            break;
        }

        let (url, options) = split_input(line);
        let options = options.map(parse_options).unwrap_or_default();
        let Some(kind) = SiteKind::detect(url) else {
            println!("{}", CaptureError::UnsupportedUrl(url.to_string()));
            continue;
        };

        if browser.is_none() {
            match Browser::connect(&BrowserOptions::from(config)).await {
                Ok(connected) => *browser = Some(connected),
                Err(e) => {
                    println!("Error: {:#}", e);
                    continue;
                }
            }
        }
        let Some(driver) = browser.as_ref() else {
            continue;
        };

        let runner = Runner {
            driver,
            prompter: &prompter,
            wait: &wait,
            config,
            scratch: PathBuf::from(SCRATCH_SCREENSHOT),
        };
        match runner.run(kind, url, &options, &mut context).await {
            Ok(outcome) => report(&outcome),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => println!("Error: {}", e),
        }
    }

    println!("Bye.");
    Ok(())
}

fn report(outcome: &SessionOutcome) {
    match outcome {
        SessionOutcome::Success {
            directory,
            saved,
            stopped_early,
        } => {
            info!(
                "Saved {} frames to {} (stopped early: {})",
                saved,
                directory.display(),
                stopped_early
            );
            println!("Saved {} pages to {}", saved, directory.display());
        }
        SessionOutcome::Aborted(reason) => println!("Capture aborted: {}", reason),
        SessionOutcome::LoginFailed(reason) => println!("Login failed: {}", reason),
    }
}
