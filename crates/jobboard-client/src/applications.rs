//! Application lifecycle: applying, listing, and status transitions.
//!
//! Caches only ever hold server-confirmed application state. A submission
//! or transition invalidates both collections that can show the
//! application (the seeker's list and the job's applicant list), so every
//! view converges on the server's answer with its next read.

use jobboard_core::access::Action;
use jobboard_core::models::{
    Applicant, Application, ApplicationForm, ApplicationId, JobId, join_asset_url,
};
use jobboard_core::ApplicationStatus;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::client::JobBoardClient;
use crate::error::ApiError;
use crate::guard::EntityKey;
use crate::transport::ApiRequest;

/// Detail shown when the seeker already applied to the job.
pub const ALREADY_APPLIED: &str = "You have already applied to this job";

fn check_form(form: &ApplicationForm) -> Result<(), ApiError> {
    if form.resume.filename.trim().is_empty() {
        return Err(ApiError::InvalidInput("resume file name is required".into()));
    }
    if form.resume.bytes.is_empty() {
        return Err(ApiError::InvalidInput("resume file is empty".into()));
    }
    Ok(())
}

impl JobBoardClient {
    /// Submit an application to a job as the signed-in seeker.
    ///
    /// A second submission to the same job fails with a conflict carrying
    /// [`ALREADY_APPLIED`].
    #[instrument(skip(self, form))]
    pub async fn apply(&self, job_id: JobId, form: ApplicationForm) -> Result<Application, ApiError> {
        let session = self.authorize(Action::ApplyToJob)?;
        check_form(&form)?;
        let _ticket = self.guard.begin(EntityKey::ApplyTo(job_id))?;

        let request = Self::with_credential(
            &session,
            ApiRequest::post(format!("/applications/jobs/{job_id}/apply")).multipart(form),
        )?;
        let application: Application = match self.call(request).await {
            Ok(application) => application,
            Err(ApiError::Conflict(_)) => {
                info!(job_id, "Already applied");
                // The list evidently lacks this application; refresh it.
                self.caches.my_applications.invalidate();
                return Err(ApiError::Conflict(ALREADY_APPLIED.into()));
            }
            Err(e) => return Err(e),
        };

        self.caches.my_applications.invalidate();
        self.caches.applicants.invalidate(&job_id);
        info!(job_id, application_id = application.id, "Application submitted");
        Ok(application)
    }

    /// The signed-in seeker's applications.
    #[instrument(skip(self))]
    pub async fn my_applications(&self) -> Result<Vec<Application>, ApiError> {
        let session = self.authorize(Action::ViewMyApplications)?;
        self.caches
            .my_applications
            .read(|| async {
                let request = Self::with_credential(&session, ApiRequest::get("/applications/me"))?;
                self.call(request).await
            })
            .await
    }

    /// Whether the seeker has an application for the job.
    pub async fn has_applied(&self, job_id: JobId) -> Result<bool, ApiError> {
        Ok(self
            .my_applications()
            .await?
            .iter()
            .any(|a| a.job_id == job_id))
    }

    /// Applicants for a job the signed-in employer or admin may review.
    #[instrument(skip(self))]
    pub async fn applicants(&self, job_id: JobId) -> Result<Vec<Applicant>, ApiError> {
        let session = self.authorize(Action::ReviewApplicants)?;
        self.caches
            .applicants
            .entry(&job_id)
            .read(|| async {
                let request = Self::with_credential(
                    &session,
                    ApiRequest::get(format!("/applications/jobs/{job_id}")),
                )?;
                self.call(request).await
            })
            .await
    }

    /// Move an application to `target`.
    ///
    /// Any member of the status enumeration may be requested; the server
    /// decides whether the move is legal. On success the confirmed
    /// application is patched into the cached applicant list and both
    /// application collections are invalidated.
    #[instrument(skip(self))]
    pub async fn transition(
        &self,
        application_id: ApplicationId,
        target: ApplicationStatus,
    ) -> Result<Application, ApiError> {
        let session = self.authorize(Action::TransitionApplication)?;
        let _ticket = self.guard.begin(EntityKey::Application(application_id))?;

        let request = Self::with_credential(
            &session,
            ApiRequest::put(format!("/applications/{application_id}/status"))
                .json(json!({ "status": target })),
        )?;
        let confirmed: Application = match self.call(request).await {
            Ok(application) => application,
            Err(e) => {
                warn!(application_id, %target, error = %e, "Status change refused");
                return Err(e);
            }
        };

        if let Some(resource) = self.caches.applicants.get(&confirmed.job_id) {
            resource.patch(|applicants| {
                for applicant in applicants.iter_mut() {
                    if applicant.application.id == confirmed.id {
                        applicant.application.status = confirmed.status;
                    }
                }
            });
        }
        self.caches.applicants.invalidate(&confirmed.job_id);
        self.caches.my_applications.invalidate();
        self.caches.employer_jobs.invalidate();
        info!(
            application_id,
            job_id = confirmed.job_id,
            status = %confirmed.status,
            "Application status changed"
        );
        Ok(confirmed)
    }

    /// [`Self::transition`] with a status given by name. Names outside the
    /// enumeration fail before anything is sent.
    pub async fn transition_named(
        &self,
        application_id: ApplicationId,
        target: &str,
    ) -> Result<Application, ApiError> {
        let target: ApplicationStatus = target.parse()?;
        self.transition(application_id, target).await
    }

    /// Absolute link to an application's resume, if one was uploaded.
    pub fn resume_url(&self, application: &Application) -> Option<String> {
        application
            .resume_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|path| join_asset_url(self.config().api.asset_base(), path))
    }
}
