//! Application subcommands: apply, list, review.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::io::{self, Write};
use std::path::PathBuf;

use jobboard_client::JobBoardClient;
use jobboard_core::models::{ApplicationForm, ApplicationId, JobId};

use crate::fmt::{write_applicant_row, write_application_row};
use crate::upload::read_upload;

/// Application subcommand actions.
#[derive(clap::Subcommand, Debug)]
pub enum ApplicationsAction {
    /// Apply to a job with a resume.
    Apply {
        job: JobId,
        /// Resume file (PDF, DOC or DOCX).
        #[arg(short, long)]
        resume: PathBuf,
        #[arg(short, long)]
        cover_letter: Option<String>,
    },
    /// List your applications.
    Mine,
    /// List applicants for one of your jobs.
    ForJob { job: JobId },
    /// Move an application to another status.
    SetStatus {
        id: ApplicationId,
        /// One of: applied, under_review, shortlisted, hired, rejected.
        status: String,
    },
}

/// Execute an application subcommand.
pub async fn run(action: ApplicationsAction, client: &JobBoardClient) -> anyhow::Result<()> {
    let mut out = io::stdout();
    match action {
        ApplicationsAction::Apply {
            job,
            resume,
            cover_letter,
        } => {
            let form = ApplicationForm {
                cover_letter,
                resume: read_upload(&resume, "resume")?,
            };
            let application = client.apply(job, form).await?;
            writeln!(
                out,
                "Applied to job #{} (application #{}, {})",
                application.job_id, application.id, application.status
            )?;
        }
        ApplicationsAction::Mine => {
            let applications = client.my_applications().await?;
            if applications.is_empty() {
                writeln!(out, "No applications yet.")?;
            }
            for app in &applications {
                write_application_row(&mut out, app)?;
            }
        }
        ApplicationsAction::ForJob { job } => {
            let applicants = client.applicants(job).await?;
            if applicants.is_empty() {
                writeln!(out, "No applicants for job #{job}.")?;
            }
            for applicant in &applicants {
                let url = client.resume_url(&applicant.application);
                write_applicant_row(&mut out, applicant, url.as_deref())?;
            }
        }
        ApplicationsAction::SetStatus { id, status } => {
            let app = client.transition_named(id, &status).await?;
            writeln!(out, "Application #{} is now {}", app.id, app.status)?;
        }
    }
    Ok(())
}
