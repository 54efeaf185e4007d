//! Job subcommands: search, show, and the employer dashboard.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::io::{self, Write};

use jobboard_client::{JobBoardClient, JobSearchCursor};
use jobboard_core::models::{JobDraft, JobId, JobUpdate};

use crate::fmt::{write_job_detail, write_job_row, write_page};

/// Fields shared by `create` and `update`.
#[derive(clap::Args, Debug, Default)]
pub struct JobFields {
    /// Job location.
    #[arg(long)]
    pub location: Option<String>,
    /// Lower salary bound.
    #[arg(long)]
    pub salary_min: Option<i64>,
    /// Upper salary bound.
    #[arg(long)]
    pub salary_max: Option<i64>,
    /// Employment type, e.g. "full-time".
    #[arg(long)]
    pub employment_type: Option<String>,
    /// Company name shown on the posting.
    #[arg(long)]
    pub company: Option<String>,
}

/// Job subcommand actions.
#[derive(clap::Subcommand, Debug)]
pub enum JobsAction {
    /// Search open jobs.
    Search {
        /// Free-text filter.
        query: Option<String>,
        /// Page number, starting at 1.
        #[arg(short, long, default_value = "1")]
        page: u32,
    },
    /// Show a single job.
    Show { id: JobId },
    /// List jobs you posted.
    Mine,
    /// Post a new job.
    Create {
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        description: String,
        #[command(flatten)]
        fields: JobFields,
        /// Post the job closed.
        #[arg(long)]
        closed: bool,
    },
    /// Change a posted job. Only the given fields are sent.
    Update {
        id: JobId,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[command(flatten)]
        fields: JobFields,
        /// Open or close the posting.
        #[arg(long)]
        open: Option<bool>,
    },
    /// Delete a posted job.
    Delete { id: JobId },
}

/// Execute a job subcommand.
pub async fn run(action: JobsAction, client: &JobBoardClient) -> anyhow::Result<()> {
    let mut out = io::stdout();
    match action {
        JobsAction::Search { query, page } => {
            let cursor = JobSearchCursor::at_page(query.as_deref(), page)?;
            let page = client.search_jobs(&cursor).await?;
            write_page(&mut out, &page)?;
        }
        JobsAction::Show { id } => {
            let job = client.job(id).await?;
            write_job_detail(&mut out, &job)?;
        }
        JobsAction::Mine => {
            let jobs = client.my_jobs().await?;
            if jobs.is_empty() {
                writeln!(out, "You have not posted any jobs.")?;
            }
            for job in &jobs {
                write_job_row(&mut out, job)?;
            }
        }
        JobsAction::Create {
            title,
            description,
            fields,
            closed,
        } => {
            let job = client
                .create_job(&JobDraft {
                    title,
                    description,
                    location: fields.location,
                    salary_min: fields.salary_min,
                    salary_max: fields.salary_max,
                    employment_type: fields.employment_type,
                    company: fields.company,
                    is_active: !closed,
                })
                .await?;
            writeln!(out, "Created job #{}", job.id)?;
        }
        JobsAction::Update {
            id,
            title,
            description,
            fields,
            open,
        } => {
            let job = client
                .update_job(
                    id,
                    &JobUpdate {
                        title,
                        description,
                        location: fields.location,
                        salary_min: fields.salary_min,
                        salary_max: fields.salary_max,
                        employment_type: fields.employment_type,
                        company: fields.company,
                        is_active: open,
                    },
                )
                .await?;
            write_job_detail(&mut out, &job)?;
        }
        JobsAction::Delete { id } => {
            client.delete_job(id).await?;
            writeln!(out, "Deleted job #{id}")?;
        }
    }
    Ok(())
}
