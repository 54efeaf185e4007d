//! Job listing search and pagination.
//!
//! The server pages with `skip`/`limit` and returns no total, so a page that
//! comes back full is taken to mean there may be more. A full last page
//! therefore offers one extra, empty page.

use jobboard_core::models::{Job, JobId};
use tracing::instrument;

use crate::client::JobBoardClient;
use crate::error::ApiError;
use crate::transport::ApiRequest;

/// Position in a paged job search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSearchCursor {
    query: Option<String>,
    page: u32,
}

impl JobSearchCursor {
    /// Start at page 1. Blank search text means no filter.
    pub fn new(query: Option<&str>) -> Self {
        let query = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string);
        Self { query, page: 1 }
    }

    /// Jump to a 1-based page.
    pub fn at_page(query: Option<&str>, page: u32) -> Result<Self, ApiError> {
        if page == 0 {
            return Err(ApiError::InvalidInput("pages are numbered from 1".into()));
        }
        Ok(Self {
            page,
            ..Self::new(query)
        })
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub const fn page(&self) -> u32 {
        self.page
    }

    /// `(skip, limit)` for this page.
    pub fn skip_limit(&self, page_size: u32) -> (u64, u32) {
        (u64::from(self.page - 1) * u64::from(page_size), page_size)
    }

    /// Cursor for the following page, if `current` suggests one exists.
    pub fn next_page(&self, current: &JobPage) -> Option<Self> {
        if !current.has_next {
            return None;
        }
        Some(Self {
            query: self.query.clone(),
            page: self.page.checked_add(1)?,
        })
    }

    pub fn prev_page(&self) -> Option<Self> {
        (self.page > 1).then(|| Self {
            query: self.query.clone(),
            page: self.page - 1,
        })
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPage {
    pub jobs: Vec<Job>,
    pub page: u32,
    pub page_size: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl JobPage {
    fn new(jobs: Vec<Job>, page: u32, page_size: u32) -> Self {
        let has_next = u32::try_from(jobs.len()).is_ok_and(|len| len >= page_size);
        Self {
            jobs,
            page,
            page_size,
            has_next,
            has_prev: page > 1,
        }
    }
}

impl JobBoardClient {
    /// Fetch the page a cursor points at. Public, no session needed.
    #[instrument(skip(self, cursor), fields(query = cursor.query(), page = cursor.page()))]
    pub async fn search_jobs(&self, cursor: &JobSearchCursor) -> Result<JobPage, ApiError> {
        let page_size = self.config().search.page_size;
        if page_size == 0 {
            return Err(ApiError::InvalidInput("page size must be at least 1".into()));
        }
        let (skip, limit) = cursor.skip_limit(page_size);
        let key = (
            cursor.query().unwrap_or_default().to_string(),
            cursor.page(),
        );

        let jobs = self
            .caches
            .job_pages
            .entry(&key)
            .read(|| async {
                let mut request = ApiRequest::get("/jobs/");
                if let Some(q) = cursor.query() {
                    request = request.query("q", q);
                }
                request = request.query("skip", skip).query("limit", limit);
                self.call::<Vec<Job>>(request).await
            })
            .await?;
        Ok(JobPage::new(jobs, cursor.page(), page_size))
    }

    /// A single job. Public, no session needed.
    #[instrument(skip(self))]
    pub async fn job(&self, job_id: JobId) -> Result<Job, ApiError> {
        self.caches
            .jobs
            .entry(&job_id)
            .read(|| self.call(ApiRequest::get(format!("/jobs/{job_id}"))))
            .await
    }
}
