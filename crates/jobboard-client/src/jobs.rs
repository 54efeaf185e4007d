//! Employer job management.

use jobboard_core::access::Action;
use jobboard_core::models::{Job, JobDraft, JobId, JobUpdate};
use serde_json::Value;
use tracing::{info, instrument};

use crate::client::JobBoardClient;
use crate::error::ApiError;
use crate::guard::EntityKey;
use crate::transport::ApiRequest;

fn check_salary(min: Option<i64>, max: Option<i64>) -> Result<(), ApiError> {
    match (min, max) {
        (Some(min), Some(max)) if min > max => Err(ApiError::InvalidInput(format!(
            "salary_min ({min}) exceeds salary_max ({max})"
        ))),
        (Some(v), _) | (_, Some(v)) if v < 0 => {
            Err(ApiError::InvalidInput("salary cannot be negative".into()))
        }
        _ => Ok(()),
    }
}

fn check_draft(draft: &JobDraft) -> Result<(), ApiError> {
    if draft.title.trim().is_empty() {
        return Err(ApiError::InvalidInput("title is required".into()));
    }
    if draft.description.trim().is_empty() {
        return Err(ApiError::InvalidInput("description is required".into()));
    }
    check_salary(draft.salary_min, draft.salary_max)
}

fn to_json<T: serde::Serialize>(body: &T) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::InvalidInput(e.to_string()))
}

impl JobBoardClient {
    /// Jobs owned by the signed-in employer.
    #[instrument(skip(self))]
    pub async fn my_jobs(&self) -> Result<Vec<Job>, ApiError> {
        let session = self.authorize(Action::ViewDashboard)?;
        self.caches
            .employer_jobs
            .read(|| async {
                let request = Self::with_credential(&session, ApiRequest::get("/jobs/me"))?;
                self.call(request).await
            })
            .await
    }

    /// Post a new job.
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn create_job(&self, draft: &JobDraft) -> Result<Job, ApiError> {
        let session = self.authorize(Action::ManageJob)?;
        check_draft(draft)?;
        let _ticket = self.guard.begin(EntityKey::JobCreation)?;

        let request = Self::with_credential(
            &session,
            ApiRequest::post("/jobs/create").json(to_json(draft)?),
        )?;
        let job: Job = self.call(request).await?;

        self.caches.jobs.entry(&job.id).set_confirmed(job.clone());
        self.caches.employer_jobs.invalidate();
        self.caches.job_pages.clear();
        info!(job_id = job.id, "Job created");
        Ok(job)
    }

    /// Change fields of an owned job.
    #[instrument(skip(self, update))]
    pub async fn update_job(&self, job_id: JobId, update: &JobUpdate) -> Result<Job, ApiError> {
        let session = self.authorize(Action::ManageJob)?;
        if update.is_empty() {
            return Err(ApiError::InvalidInput("nothing to update".into()));
        }
        if matches!(&update.title, Some(t) if t.trim().is_empty()) {
            return Err(ApiError::InvalidInput("title cannot be blank".into()));
        }
        check_salary(update.salary_min, update.salary_max)?;
        let _ticket = self.guard.begin(EntityKey::Job(job_id))?;

        let request = Self::with_credential(
            &session,
            ApiRequest::put(format!("/jobs/update/{job_id}")).json(to_json(update)?),
        )?;
        let job: Job = self.call(request).await?;

        self.caches.jobs.entry(&job_id).set_confirmed(job.clone());
        self.caches.employer_jobs.invalidate();
        self.caches.job_pages.clear();
        self.caches.saved_jobs.invalidate();
        info!(job_id, "Job updated");
        Ok(job)
    }

    /// Delete an owned job. Its applications and saves go with it.
    #[instrument(skip(self))]
    pub async fn delete_job(&self, job_id: JobId) -> Result<(), ApiError> {
        let session = self.authorize(Action::ManageJob)?;
        let _ticket = self.guard.begin(EntityKey::Job(job_id))?;

        let request = Self::with_credential(&session, ApiRequest::delete(format!("/jobs/{job_id}")))?;
        self.call::<Value>(request).await?;

        self.caches.jobs.remove(&job_id);
        self.caches.applicants.remove(&job_id);
        self.caches.employer_jobs.invalidate();
        self.caches.job_pages.clear();
        self.caches.saved_jobs.invalidate();
        self.caches.my_applications.invalidate();
        info!(job_id, "Job deleted");
        Ok(())
    }
}
