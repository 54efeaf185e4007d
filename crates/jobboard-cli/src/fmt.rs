//! Output formatting helpers.

use std::io::{self, Write};

use jobboard_client::JobPage;
use jobboard_core::SessionState;
use jobboard_core::models::{Applicant, Application, Job, SavedJob, UserProfile};

fn salary(job: &Job) -> Option<String> {
    match (job.salary_min, job.salary_max) {
        (Some(min), Some(max)) => Some(format!("{min} - {max}")),
        (Some(min), None) => Some(format!("from {min}")),
        (None, Some(max)) => Some(format!("up to {max}")),
        (None, None) => None,
    }
}

pub fn write_job_row(w: &mut impl Write, job: &Job) -> io::Result<()> {
    let closed = if job.is_open() { "" } else { " [closed]" };
    writeln!(
        w,
        "  {:>5}  {}{}  ({})",
        job.id,
        job.title,
        closed,
        job.location.as_deref().unwrap_or("anywhere")
    )
}

pub fn write_job_detail(w: &mut impl Write, job: &Job) -> io::Result<()> {
    writeln!(w, "  Job:      #{}", job.id)?;
    writeln!(w, "  Title:    {}", job.title)?;
    if let Some(company) = &job.company {
        writeln!(w, "  Company:  {company}")?;
    }
    if let Some(location) = &job.location {
        writeln!(w, "  Location: {location}")?;
    }
    if let Some(kind) = &job.employment_type {
        writeln!(w, "  Type:     {kind}")?;
    }
    if let Some(range) = salary(job) {
        writeln!(w, "  Salary:   {range}")?;
    }
    writeln!(w, "  Open:     {}", if job.is_open() { "yes" } else { "no" })?;
    if let Some(created) = &job.created_at {
        writeln!(w, "  Posted:   {created}")?;
    }
    writeln!(w)?;
    for line in job.description.lines() {
        writeln!(w, "  {line}")?;
    }
    Ok(())
}

pub fn write_page(w: &mut impl Write, page: &JobPage) -> io::Result<()> {
    if page.jobs.is_empty() {
        writeln!(w, "No jobs found.")?;
    } else {
        for job in &page.jobs {
            write_job_row(w, job)?;
        }
    }
    let mut hints = Vec::new();
    if page.has_prev {
        hints.push(format!("--page {} for previous", page.page - 1));
    }
    if page.has_next {
        hints.push(format!("--page {} for more", page.page + 1));
    }
    if hints.is_empty() {
        writeln!(w, "Page {}", page.page)
    } else {
        writeln!(w, "Page {} ({})", page.page, hints.join(", "))
    }
}

pub fn write_application_row(w: &mut impl Write, app: &Application) -> io::Result<()> {
    writeln!(
        w,
        "  {:>5}  job {:<5}  {:<12}  {}",
        app.id,
        app.job_id,
        app.status.as_str(),
        app.created_at.as_deref().unwrap_or("-")
    )
}

pub fn write_applicant_row(
    w: &mut impl Write,
    applicant: &Applicant,
    resume_url: Option<&str>,
) -> io::Result<()> {
    let app = &applicant.application;
    let who = applicant
        .user_email
        .as_deref()
        .map_or_else(|| format!("user {}", app.user_id), str::to_string);
    writeln!(w, "  {:>5}  {:<30}  {}", app.id, who, app.status.as_str())?;
    if let Some(url) = resume_url {
        writeln!(w, "         resume: {url}")?;
    }
    let next = app.status.suggested_next();
    if !next.is_empty() {
        let names: Vec<&str> = next.iter().map(|s| s.as_str()).collect();
        writeln!(w, "         next:   {}", names.join(" | "))?;
    }
    Ok(())
}

pub fn write_saved_row(w: &mut impl Write, saved: &SavedJob) -> io::Result<()> {
    write_job_row(w, &saved.job)
}

pub fn write_profile(
    w: &mut impl Write,
    profile: &UserProfile,
    avatar_url: Option<&str>,
) -> io::Result<()> {
    writeln!(w, "  Name:     {}", profile.name)?;
    writeln!(w, "  Email:    {}", profile.email)?;
    writeln!(w, "  Role:     {}", profile.role)?;
    writeln!(
        w,
        "  Verified: {}",
        if profile.email_verified { "yes" } else { "no" }
    )?;
    if let Some(bio) = &profile.bio {
        writeln!(w, "  Bio:      {bio}")?;
    }
    if let Some(skills) = profile.skills.as_ref().filter(|s| !s.is_empty()) {
        writeln!(w, "  Skills:   {}", skills.join(", "))?;
    }
    if let Some(company) = &profile.company_name {
        writeln!(w, "  Company:  {company}")?;
    }
    if let Some(url) = avatar_url {
        writeln!(w, "  Avatar:   {url}")?;
    }
    Ok(())
}

pub fn write_session(w: &mut impl Write, session: &SessionState) -> io::Result<()> {
    if !session.is_authenticated() {
        return writeln!(w, "Not logged in");
    }
    writeln!(w, "Logged in as: {}", session.email().unwrap_or("-"))?;
    writeln!(w, "Role:         {}", session.role())?;
    if let Some(exp) = session.expires_at() {
        writeln!(w, "Expires at:   {exp} (unix)")?;
    }
    Ok(())
}
