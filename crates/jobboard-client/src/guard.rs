//! Per-entity exclusion for mutations.
//!
//! While a mutation on an entity is pending, a second mutation on the same
//! entity is refused with [`ApiError::Busy`] instead of racing it. Callers
//! can poll [`MutationGuard::is_pending`] to disable the matching control.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use jobboard_core::models::{ApplicationId, JobId};

use crate::error::ApiError;

/// Entity a mutation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKey {
    /// Update or delete of a job posting.
    Job(JobId),
    /// Posting a new job. One at a time per client.
    JobCreation,
    /// Status transition of an application.
    Application(ApplicationId),
    /// Submitting an application to a job.
    ApplyTo(JobId),
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Job(id) => write!(f, "job {id}"),
            Self::JobCreation => f.write_str("new job"),
            Self::Application(id) => write!(f, "application {id}"),
            Self::ApplyTo(id) => write!(f, "the application to job {id}"),
        }
    }
}

type Pending = Arc<Mutex<HashSet<EntityKey>>>;

#[derive(Debug, Default, Clone)]
pub struct MutationGuard {
    pending: Pending,
}

impl MutationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key` for the lifetime of the returned ticket.
    pub fn begin(&self, key: EntityKey) -> Result<InFlight, ApiError> {
        let inserted = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key);
        if !inserted {
            return Err(ApiError::Busy(key));
        }
        Ok(InFlight {
            key,
            pending: Arc::clone(&self.pending),
        })
    }

    pub fn is_pending(&self, key: EntityKey) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&key)
    }
}

/// Releases its entity when dropped, on success, failure or cancellation.
#[derive(Debug)]
pub struct InFlight {
    key: EntityKey,
    pending: Pending,
}

impl InFlight {
    pub const fn key(&self) -> EntityKey {
        self.key
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
