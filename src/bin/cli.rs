//! Town Event Poster CLI
//!
//! One invocation is one run. Periodic execution is left to cron or a
//! similar scheduler.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use town_event_poster::{
    error::{AppError, Result},
    models::{Config, Credentials},
    pipeline,
    services::{DryRunPublisher, Publisher, XPublisher},
    utils::{console, http::HttpFetcher},
};

/// Town Event Poster - today's weather and events, posted to X
#[derive(Parser, Debug)]
#[command(name = "town-event-poster", version, about = "Posts today's town events")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Day to run for (YYYY-MM-DD); defaults to today in the configured timezone
    #[arg(long, global = true)]
    date: Option<NaiveDate>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Post the weather, then today's events
    Run {
        /// Log posts instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Post only the weather
    Weather {
        /// Log the post instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// Print today's event posts without sending anything
    Events,

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Pick the publisher. Live posting reads credentials once, here.
fn build_publisher(
    config: &Config,
    fetcher: &HttpFetcher,
    dry_run: bool,
) -> Result<Box<dyn Publisher>> {
    if dry_run {
        log::info!("Dry run: nothing will be posted");
        return Ok(Box::new(DryRunPublisher));
    }
    let credentials = Credentials::from_env()?;
    Ok(Box::new(XPublisher::new(
        fetcher.client().clone(),
        &config.post,
        credentials,
    )?))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    let date = cli.date.unwrap_or_else(|| config.timezone.today());
    log::debug!("Running for {}", date);

    match cli.command {
        Command::Run { dry_run } => {
            config.validate()?;
            let fetcher = HttpFetcher::new(&config.http)?;
            let publisher = build_publisher(&config, &fetcher, dry_run)?;
            pipeline::run_daily(&config, &fetcher, publisher.as_ref(), date).await;
        }

        Command::Weather { dry_run } => {
            config.validate()?;
            if !config.weather.enabled {
                return Err(AppError::config("weather is disabled in the configuration"));
            }
            let fetcher = HttpFetcher::new(&config.http)?;
            let publisher = build_publisher(&config, &fetcher, dry_run)?;
            pipeline::post_weather(&config, &fetcher, publisher.as_ref(), date).await;
        }

        Command::Events => {
            config.validate()?;
            let fetcher = HttpFetcher::new(&config.http)?;
            let posts = pipeline::preview_events(&config, &fetcher, date).await;
            if posts.is_empty() {
                log::info!("No events for {}", date);
            }
            for (i, text) in posts.iter().enumerate() {
                println!("----- {}/{} -----\n{}", i + 1, posts.len(), text);
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            console::sub_item(&format!("User-Agent: {}", config.http.user_agent));
            console::sub_item(&format!("Timeout: {}s", config.http.timeout_secs));
            console::sub_item(&format!("Calendar: {}", config.calendar.url_for(date)));
            console::sub_item(&format!("Weather: {}", config.weather.url()));
            console::sub_item(&format!("Listing sources: {}", config.sources.len()));
            console::sub_item(&format!("Annual events: {}", config.annual_events.len()));
            log::info!("✓ Config OK");
        }
    }

    Ok(())
}
