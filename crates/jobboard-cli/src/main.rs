//! `JobBoard` CLI
//!
//! Browse and search jobs, apply with a resume, save jobs, and review
//! applicants from the terminal.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::debug;

use jobboard_cli::applications_cmd::{self, ApplicationsAction};
use jobboard_cli::auth_cmd::{self, AuthAction};
use jobboard_cli::config::FileCredentialStore;
use jobboard_cli::jobs_cmd::{self, JobsAction};
use jobboard_cli::profile_cmd::{self, ProfileAction};
use jobboard_cli::saved_cmd::{self, SavedAction};
use jobboard_client::{ApiError, JobBoardClient};
use jobboard_core::config::load_config;
use jobboard_core::tracing_init::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "jobboard")]
#[command(version, about = "Job board client", long_about = None)]
struct Cli {
    /// API base URL (overrides config files and the URL saved at login).
    #[arg(long, env = "JOBBOARD_API_URL")]
    api_url: Option<String>,

    /// Extra settings file layered over the global one.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Account and session.
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Job search and the employer dashboard.
    Jobs {
        #[command(subcommand)]
        action: JobsAction,
    },
    /// Applying and reviewing applications.
    Applications {
        #[command(subcommand)]
        action: ApplicationsAction,
    },
    /// Saved jobs.
    Saved {
        #[command(subcommand)]
        action: SavedAction,
    },
    /// Your profile.
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let mut err = io::stderr();
            let _ = writeln!(err, "Error: {}", describe(&e));
            if e
                .downcast_ref::<ApiError>()
                .is_some_and(ApiError::requires_login)
            {
                let _ = writeln!(err, "Run `jobboard auth login` to sign in.");
            }
            ExitCode::FAILURE
        }
    }
}

fn describe(e: &anyhow::Error) -> String {
    e.downcast_ref::<ApiError>()
        .map_or_else(|| format!("{e:#}"), ApiError::user_message)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    let store = FileCredentialStore::open_default()?;

    if let Some(saved) = store.snapshot().api_url {
        config.api.base_url = saved;
    }
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    config.validate()?;

    init_tracing(&config.logging.level, cli.log_json || config.logging.json);
    debug!(base_url = %config.api.base_url, "Resolved configuration");

    let store = Arc::new(store);
    let client = JobBoardClient::connect(config, store.clone())?;

    match cli.command {
        Commands::Auth { action } => auth_cmd::run(action, &client, &store).await,
        Commands::Jobs { action } => jobs_cmd::run(action, &client).await,
        Commands::Applications { action } => applications_cmd::run(action, &client).await,
        Commands::Saved { action } => saved_cmd::run(action, &client).await,
        Commands::Profile { action } => profile_cmd::run(action, &client).await,
    }
}
