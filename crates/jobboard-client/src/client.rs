//! Client facade tying session, transport and caches together.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use jobboard_core::access::{self, AccessDecision, Action};
use jobboard_core::models::{Applicant, Application, Job, JobId, SavedJob, UserProfile};
use jobboard_core::{Config, CredentialStore, SessionState};
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::guard::MutationGuard;
use crate::http::HttpTransport;
use crate::resource::{RemoteResource, ResourceMap};
use crate::saved::SaveLanes;
use crate::transport::{ApiRequest, Transport, TransportError};

/// Key of one listing page: normalized search text and 1-based page number.
pub type PageKey = (String, u32);

/// Every cached server resource the client reads.
#[derive(Debug)]
pub struct Caches {
    pub job_pages: ResourceMap<PageKey, Vec<Job>>,
    pub jobs: ResourceMap<JobId, Job>,
    pub employer_jobs: RemoteResource<Vec<Job>>,
    pub my_applications: RemoteResource<Vec<Application>>,
    pub applicants: ResourceMap<JobId, Vec<Applicant>>,
    pub saved_jobs: RemoteResource<Vec<SavedJob>>,
    pub profile: RemoteResource<UserProfile>,
}

impl Caches {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            job_pages: ResourceMap::new("jobs", stale_after),
            jobs: ResourceMap::new("job", stale_after),
            employer_jobs: RemoteResource::new("employer-jobs", stale_after),
            my_applications: RemoteResource::new("my-applications", stale_after),
            applicants: ResourceMap::new("job-applicants", stale_after),
            saved_jobs: RemoteResource::new("saved-jobs", stale_after),
            profile: RemoteResource::new("profile-me", stale_after),
        }
    }

    /// Drop everything that belongs to the signed-in user.
    pub fn clear_user_scoped(&self) {
        self.employer_jobs.clear();
        self.my_applications.clear();
        self.applicants.clear();
        self.saved_jobs.clear();
        self.profile.clear();
    }
}

/// Authenticated job board client.
///
/// Every operation derives the session from the credential store at call
/// time, checks the access policy, and only then talks to the server.
pub struct JobBoardClient {
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialStore>,
    config: Config,
    pub(crate) caches: Caches,
    pub(crate) guard: MutationGuard,
    pub(crate) saves: SaveLanes,
}

impl std::fmt::Debug for JobBoardClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobBoardClient")
            .field("base_url", &self.config.api.base_url)
            .finish_non_exhaustive()
    }
}

impl JobBoardClient {
    pub fn new(
        config: Config,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        let caches = Caches::new(Duration::from_secs(config.cache.stale_after_secs));
        Self {
            transport,
            credentials,
            config,
            caches,
            guard: MutationGuard::new(),
            saves: SaveLanes::default(),
        }
    }

    /// Client backed by the reqwest transport.
    pub fn connect(
        config: Config,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(&config.api)?;
        Ok(Self::new(config, Arc::new(transport), credentials))
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub const fn caches(&self) -> &Caches {
        &self.caches
    }

    pub const fn guard(&self) -> &MutationGuard {
        &self.guard
    }

    pub(crate) fn credentials(&self) -> &dyn CredentialStore {
        self.credentials.as_ref()
    }

    /// Session derived from the stored credential right now.
    pub fn session(&self) -> SessionState {
        self.credentials.session()
    }

    /// Gate `action` for the current session.
    pub(crate) fn authorize(&self, action: Action) -> Result<SessionState, ApiError> {
        let session = self.session();
        match access::decide(&session, action) {
            AccessDecision::Permit => Ok(session),
            AccessDecision::RequireLogin => {
                debug!(?action, "Not signed in");
                Err(ApiError::Unauthenticated)
            }
            AccessDecision::Deny => {
                debug!(?action, role = %session.role(), "Role not permitted");
                Err(ApiError::Forbidden(format!(
                    "{} accounts cannot do that",
                    session.role()
                )))
            }
        }
    }

    /// Attach the session's bearer credential.
    pub(crate) fn with_credential(
        session: &SessionState,
        request: ApiRequest,
    ) -> Result<ApiRequest, ApiError> {
        let credential = session.credential().ok_or(ApiError::Unauthenticated)?;
        Ok(request.bearer(credential.clone()))
    }

    /// Send a request and decode its JSON body.
    pub(crate) async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let method = request.method.as_str();
        let path = request.path.clone();
        let value = self.transport.send(request).await.map_err(|e| {
            warn!(method, %path, error = %e, "Request failed");
            ApiError::from(e)
        })?;
        serde_json::from_value(value).map_err(|e| {
            warn!(method, %path, error = %e, "Unexpected response shape");
            ApiError::Transient(format!("unexpected response: {e}"))
        })
    }

    /// Run an operation on a task of its own.
    ///
    /// The operation runs to completion and updates the shared caches even if
    /// the returned handle is dropped, e.g. when the caller navigates away.
    pub fn detached<T, F, Fut>(self: &Arc<Self>, op: F) -> JoinHandle<Result<T, ApiError>>
    where
        F: FnOnce(Arc<Self>) -> Fut,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
        T: Send + 'static,
    {
        tokio::spawn(op(Arc::clone(self)))
    }
}
