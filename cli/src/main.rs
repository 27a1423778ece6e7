//! Dynamic Form CLI
//!
//! Command-line client for server-described multi-step forms.
//!
//! # Usage
//!
//! ```bash
//! dynform fill --roll-number RA2211 --name "Asha Rao"
//! dynform schema --roll-number RA2211 --format yaml
//! dynform check --schema form.json --values answers.json
//! dynform config set api_url http://localhost:3000
//! ```

use clap::{Parser, Subcommand};
use dynform_client::config::DEFAULT_BASE_URL;
use dynform_client::ClientError;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod output;
mod prompt;

#[derive(Parser)]
#[command(name = "dynform")]
#[command(version)]
#[command(about = "Dynamic Form Command Line Interface", long_about = None)]
struct Cli {
    /// Form service URL
    #[arg(long, env = "DYNFORM_API_URL")]
    api_url: Option<String>,

    /// Output format
    #[arg(long, short)]
    format: Option<output::OutputFormat>,

    /// Profile name from config file
    #[arg(long, short)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register and fill in your form interactively
    Fill {
        #[arg(long, env = "DYNFORM_ROLL_NUMBER")]
        roll_number: Option<String>,
        #[arg(long, env = "DYNFORM_NAME")]
        name: Option<String>,
        /// Also save the submission as JSON
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Fetch and show the form assigned to a roll number
    Schema {
        #[arg(long, env = "DYNFORM_ROLL_NUMBER")]
        roll_number: Option<String>,
    },
    /// Validate saved values against a saved form document
    Check {
        /// Form document (schema fetch response)
        #[arg(long)]
        schema: PathBuf,
        /// JSON object of field id to value
        #[arg(long)]
        values: Option<PathBuf>,
    },
    /// Configure CLI
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Set configuration value
    Set { key: String, value: String },
    /// Get configuration value
    Get { key: String },
    /// List all configuration
    List,
    /// Initialize configuration
    Init,
}

fn init_tracing(config: &config::Config) {
    let level = config.log_level.clone().unwrap_or_else(|| "warn".into());
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or(level),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match config::Config::load(cli.profile.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: ignoring config file: {:#}", e);
            config::Config::default()
        }
    };
    init_tracing(&config);

    let format = cli
        .format
        .or_else(|| config.default_format.as_deref().and_then(|f| f.parse().ok()))
        .unwrap_or(output::OutputFormat::Table);
    let api_url = cli
        .api_url
        .or_else(|| config.api_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let ctx = commands::Context {
        api_url,
        format,
        profile: cli.profile,
        config,
    };

    let result = match cli.command {
        Commands::Fill {
            roll_number,
            name,
            output,
        } => {
            let args = commands::fill::FillArgs {
                roll_number,
                name,
                output,
            };
            commands::fill::handle(args, &ctx).await
        }
        Commands::Schema { roll_number } => commands::schema::handle(roll_number, &ctx).await,
        Commands::Check { schema, values } => {
            commands::check::handle(&schema, values.as_deref(), ctx.format)
        }
        Commands::Config { action } => commands::config::handle(action, ctx.profile.as_deref()),
    };

    if let Err(e) = result {
        match e.downcast_ref::<ClientError>() {
            Some(err) if err.is_schema_error() => {
                eprintln!("Error: the form schema is invalid and cannot be used: {}", err)
            }
            Some(err) if err.is_retryable() => {
                eprintln!("Error: could not reach the form service, please try again ({})", err)
            }
            _ => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}
