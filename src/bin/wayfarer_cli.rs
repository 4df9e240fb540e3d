use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use structopt::StructOpt;

use wayfarer_telemetry::config::Config;
use wayfarer_telemetry::models::{LoginActivity, LoginMethod};
use wayfarer_telemetry::persistence::SqliteActivityStore;
use wayfarer_telemetry::pipeline::{observe_login, LoginAttempt};
use wayfarer_telemetry::recorder::LoginActivityRecorder;
use wayfarer_telemetry::stats::ActivityAggregator;
use wayfarer_telemetry::LocationResolver;

/// Wayfarer login telemetry command line interface
#[derive(StructOpt, Debug)]
#[structopt(name = "wayfarer", about = "Login activity telemetry CLI")]
pub enum Cli {
    /// Generate a default configuration file
    Config {
        /// Output path for the configuration file
        #[structopt(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
    /// Resolve the current location and print the labeled result
    Resolve {
        /// Path to configuration file
        #[structopt(short, long, default_value = "config.toml")]
        config: PathBuf,
    },
    /// Record one login attempt through the full pipeline
    Record {
        /// Path to configuration file
        #[structopt(short, long, default_value = "config.toml")]
        config: PathBuf,
        /// User id (omit for failed attempts with no resolved account)
        #[structopt(long, default_value = "")]
        user_id: String,
        /// Account email
        #[structopt(long)]
        email: String,
        /// Login method: email, google, facebook or twitter
        #[structopt(long, default_value = "email")]
        method: String,
        /// Record the attempt as failed
        #[structopt(long)]
        failed: bool,
        /// Error message for a failed attempt
        #[structopt(long)]
        error: Option<String>,
        /// User-agent string to fingerprint
        #[structopt(long)]
        user_agent: Option<String>,
    },
    /// Show login history for one user
    History {
        /// Path to configuration file
        #[structopt(short, long, default_value = "config.toml")]
        config: PathBuf,
        /// User id to look up
        #[structopt(long)]
        user: String,
        /// Maximum records to show
        #[structopt(short, long, default_value = "10")]
        limit: usize,
    },
    /// Show recent login activity across all users
    Recent {
        /// Path to configuration file
        #[structopt(short, long, default_value = "config.toml")]
        config: PathBuf,
        /// Maximum records to show
        #[structopt(short, long, default_value = "50")]
        limit: usize,
    },
    /// Show aggregate login statistics
    Stats {
        /// Path to configuration file
        #[structopt(short, long, default_value = "config.toml")]
        config: PathBuf,
        /// How many recent records to sample
        #[structopt(short, long)]
        sample: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::from_args();

    match cli {
        Cli::Config { output } => {
            let config = Config::default();
            config.to_file(&output)?;
            println!("Default configuration written to: {:?}", output);
        }
        Cli::Resolve { config } => {
            let config = load_config(&config)?;
            let resolver = LocationResolver::new(&config.resolver);

            // No device geolocation capability in a headless CLI.
            let detailed = resolver.resolve_detailed(None).await;
            println!("IP:       {}", detailed.info.ip);
            println!("Location: {}", detailed.info.display_location());
            println!("Region:   {}", detailed.info.region);
            println!("Timezone: {}", detailed.info.timezone);
            if let (Some(lat), Some(lon)) = (detailed.info.latitude, detailed.info.longitude) {
                println!("Coords:   {:.4}, {:.4}", lat, lon);
            }
            println!("Accuracy: {}", detailed.accuracy_tier);
            println!("Method:   {}", detailed.method);
        }
        Cli::Record {
            config,
            user_id,
            email,
            method,
            failed,
            error,
            user_agent,
        } => {
            let config = load_config(&config)?;
            let store = Arc::new(SqliteActivityStore::new(&config.storage.db_path)?);
            let recorder = LoginActivityRecorder::new(store);
            let resolver = LocationResolver::new(&config.resolver);

            let attempt = LoginAttempt {
                user_id,
                email,
                method: LoginMethod::from_str(&method)?,
                success: !failed,
                error_message: error,
                user_agent,
            };

            let id = observe_login(&recorder, &resolver, None, attempt).await?;
            println!("Recorded login activity: {}", id);
        }
        Cli::History {
            config,
            user,
            limit,
        } => {
            let config = load_config(&config)?;
            let store = Arc::new(SqliteActivityStore::new(&config.storage.db_path)?);
            let recorder = LoginActivityRecorder::new(store);

            let activities = recorder.by_user(&user, limit)?;
            println!("Login history for {} ({} record(s)):\n", user, activities.len());
            for activity in &activities {
                print_activity(activity);
            }
        }
        Cli::Recent { config, limit } => {
            let config = load_config(&config)?;
            let store = Arc::new(SqliteActivityStore::new(&config.storage.db_path)?);
            let recorder = LoginActivityRecorder::new(store);

            let activities = recorder.recent(limit)?;
            println!("Recent login activity ({} record(s)):\n", activities.len());
            for activity in &activities {
                print_activity(activity);
            }
        }
        Cli::Stats { config, sample } => {
            let config = load_config(&config)?;
            let sample = sample.unwrap_or(config.stats.sample_size);
            let store = Arc::new(SqliteActivityStore::new(&config.storage.db_path)?);
            let aggregator = ActivityAggregator::new(LoginActivityRecorder::new(store));

            let stats = aggregator.stats(sample)?;
            println!("Login statistics (sample of {}):", sample);
            println!("  Total logins:   {}", stats.total_logins);
            println!("  Successful:     {}", stats.successful_logins);
            println!("  Failed:         {}", stats.failed_logins);
            println!("  Unique users:   {}", stats.unique_users);
            println!("  By method:");
            for method in LoginMethod::all() {
                println!(
                    "    {:<10} {}",
                    format!("{}:", method),
                    stats.login_methods.count_for(method)
                );
            }
            if !stats.recent_activities.is_empty() {
                println!("\nMost recent:");
                for activity in &stats.recent_activities {
                    print_activity(activity);
                }
            }
        }
    }

    Ok(())
}

fn load_config(path: &PathBuf) -> Result<Config, Box<dyn std::error::Error>> {
    if path.exists() {
        Config::from_file(path)
    } else {
        log::warn!("Config file not found, using defaults");
        Ok(Config::default())
    }
}

fn print_activity(activity: &LoginActivity) {
    let timestamp = chrono::DateTime::from_timestamp_millis(activity.timestamp)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default();
    let outcome = if activity.success { "ok" } else { "FAILED" };
    let location = activity
        .location
        .as_ref()
        .map(|l| l.display_location())
        .unwrap_or_else(|| "-".to_string());

    println!(
        "  [{}] {} {} via {} from {} ({})",
        timestamp,
        outcome,
        activity.email,
        activity.login_method,
        location,
        activity.ip_address.as_deref().unwrap_or("-"),
    );
}
