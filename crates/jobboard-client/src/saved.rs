//! Saved-job toggling.
//!
//! A toggle flips server state, so two toggles racing on the same job would
//! leave the client unsure which one landed last. Toggles for one job run
//! one after another through a lane, and each carries a sequence number
//! taken in lane order; a recorded outcome is only replaced by a higher
//! sequence. The status shown for a job is always the server's answer to
//! the most recent toggle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use jobboard_core::access::Action;
use jobboard_core::models::{JobId, SaveStatus, SavedJob, ToggleResponse};
use tracing::{debug, info, instrument};

use crate::client::JobBoardClient;
use crate::error::ApiError;
use crate::transport::ApiRequest;

/// Jobs whose last toggle outcome is remembered. Older outcomes are
/// dropped first; the saved list still answers for them.
const MAX_OUTCOMES: usize = 512;

#[derive(Debug, Default)]
struct Outcomes {
    /// Toggles numbered at or below this were sent for a previous account.
    floor: u64,
    by_job: HashMap<JobId, (u64, SaveStatus)>,
}

#[derive(Debug)]
pub(crate) struct SaveLanes {
    lanes: Mutex<HashMap<JobId, Arc<tokio::sync::Mutex<()>>>>,
    next_seq: AtomicU64,
    outcomes: Mutex<Outcomes>,
    capacity: usize,
}

impl Default for SaveLanes {
    fn default() -> Self {
        Self::with_capacity(MAX_OUTCOMES)
    }
}

impl SaveLanes {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            lanes: Mutex::default(),
            next_seq: AtomicU64::new(0),
            outcomes: Mutex::default(),
            capacity: capacity.max(1),
        }
    }

    fn lane(&self, job_id: JobId) -> Arc<tokio::sync::Mutex<()>> {
        let mut lanes = self.lanes.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(lanes.entry(job_id).or_default())
    }

    fn prune(&self) {
        self.lanes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, lane| Arc::strong_count(lane) > 1);
    }

    fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Record `status` unless a later toggle already reported or the
    /// toggle predates the last account switch.
    /// Returns whether the outcome was recorded.
    fn record(&self, job_id: JobId, seq: u64, status: SaveStatus) -> bool {
        let mut outcomes = self.outcomes.lock().unwrap_or_else(PoisonError::into_inner);
        if seq <= outcomes.floor {
            return false;
        }
        if matches!(outcomes.by_job.get(&job_id), Some((recorded, _)) if *recorded > seq) {
            return false;
        }
        outcomes.by_job.insert(job_id, (seq, status));
        if outcomes.by_job.len() > self.capacity {
            let oldest = outcomes
                .by_job
                .iter()
                .min_by_key(|(_, (seq, _))| *seq)
                .map(|(job, _)| *job);
            if let Some(oldest) = oldest {
                outcomes.by_job.remove(&oldest);
            }
        }
        true
    }

    fn outcome(&self, job_id: JobId) -> Option<SaveStatus> {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .by_job
            .get(&job_id)
            .map(|(_, status)| *status)
    }

    /// Forget all outcomes; toggles still in flight will not record theirs.
    pub(crate) fn reset(&self) {
        let mut outcomes = self.outcomes.lock().unwrap_or_else(PoisonError::into_inner);
        outcomes.floor = self.next_seq.load(Ordering::SeqCst);
        outcomes.by_job.clear();
    }
}

impl JobBoardClient {
    /// Flip the saved state of a job and return the server's verdict.
    #[instrument(skip(self))]
    pub async fn toggle_saved(&self, job_id: JobId) -> Result<SaveStatus, ApiError> {
        self.authorize(Action::SaveJob)?;

        let lane = self.saves.lane(job_id);
        let turn = lane.lock().await;
        let seq = self.saves.next_seq();

        // Re-derive after waiting: a logout may have happened meanwhile.
        let session = self.authorize(Action::SaveJob)?;
        let request = Self::with_credential(&session, ApiRequest::post(format!("/saved-jobs/{job_id}")))?;
        let result = self.call::<ToggleResponse>(request).await;

        drop(turn);
        drop(lane);
        self.saves.prune();

        let status = match result {
            Ok(response) => response.status,
            Err(e) => {
                // The server may have flipped the state before failing.
                self.caches.saved_jobs.invalidate();
                return Err(e);
            }
        };
        if self.saves.record(job_id, seq, status) {
            self.caches.saved_jobs.invalidate();
            info!(job_id, %status, "Saved state changed");
        } else {
            debug!(job_id, seq, "Ignoring outcome of an older toggle");
        }
        Ok(status)
    }

    /// Most recent server-confirmed saved state of a job, if known.
    ///
    /// Prefers the outcome of the latest toggle, then the cached saved list.
    pub fn last_known_status(&self, job_id: JobId) -> Option<SaveStatus> {
        self.saves.outcome(job_id).or_else(|| {
            self.caches.saved_jobs.peek().map(|saved| {
                if saved.iter().any(|s| s.job_id == job_id) {
                    SaveStatus::Saved
                } else {
                    SaveStatus::Unsaved
                }
            })
        })
    }

    /// The seeker's saved jobs.
    #[instrument(skip(self))]
    pub async fn saved_jobs(&self) -> Result<Vec<SavedJob>, ApiError> {
        let session = self.authorize(Action::ViewSavedJobs)?;
        self.caches
            .saved_jobs
            .read(|| async {
                let request = Self::with_credential(&session, ApiRequest::get("/saved-jobs/"))?;
                self.call(request).await
            })
            .await
    }
}
