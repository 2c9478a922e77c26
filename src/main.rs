use clap::{Parser, Subcommand};
use loglift::cli::run::RunOptions;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "loglift")]
#[command(about = "Ship edge module logs to a Log Analytics workspace", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deliver a JSON log batch
    Run {
        /// Batch file, or `-` for stdin
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Print the chunk plan without sending anything
        #[arg(long)]
        dry_run: bool,
    },
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Init {
        #[arg(long)]
        stdout: bool,
    },
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so `config init --stdout` and dry runs stay clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loglift=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config_path = loglift::config::resolve_config_path(cli.config.as_deref());

    match cli.command {
        Commands::Run { input, dry_run } => {
            loglift::cli::run::run(config_path, RunOptions { input, dry_run }).await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Init { stdout } => {
                loglift::cli::config::init(stdout)?;
            }
            ConfigAction::Validate => {
                loglift::cli::config::validate(config_path)?;
            }
        },
    }

    Ok(())
}
