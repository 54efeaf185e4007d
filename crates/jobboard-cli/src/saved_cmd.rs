//! Saved-job subcommands.

use std::io::{self, Write};

use jobboard_client::JobBoardClient;
use jobboard_core::models::{JobId, SaveStatus};

use crate::fmt::write_saved_row;

#[derive(clap::Subcommand, Debug)]
pub enum SavedAction {
    /// Save a job, or unsave it if already saved.
    Toggle { job: JobId },
    /// List saved jobs.
    List,
}

pub async fn run(action: SavedAction, client: &JobBoardClient) -> anyhow::Result<()> {
    let mut out = io::stdout();
    match action {
        SavedAction::Toggle { job } => match client.toggle_saved(job).await? {
            SaveStatus::Saved => writeln!(out, "Saved job #{job}")?,
            SaveStatus::Unsaved => writeln!(out, "Removed job #{job} from saved jobs")?,
        },
        SavedAction::List => {
            let saved = client.saved_jobs().await?;
            if saved.is_empty() {
                writeln!(out, "No saved jobs.")?;
            }
            for entry in &saved {
                write_saved_row(&mut out, entry)?;
            }
        }
    }
    Ok(())
}
