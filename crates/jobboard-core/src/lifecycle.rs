//! Application status lifecycle.
//!
//! ```text
//! applied -> under_review -> shortlisted -> hired
//!                                        -> rejected
//! ```
//!
//! `hired` and `rejected` are terminal. The client presents this ordering
//! but does not enforce adjacency: any member of the enumeration may be
//! requested as a target and the server decides whether the move is legal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Applied,
    UnderReview,
    Shortlisted,
    Hired,
    Rejected,
}

/// A status name outside the closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown application status `{0}` (expected one of: applied, under_review, shortlisted, hired, rejected)")]
pub struct UnknownStatus(pub String);

impl ApplicationStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Applied,
        Self::UnderReview,
        Self::Shortlisted,
        Self::Hired,
        Self::Rejected,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::UnderReview => "under_review",
            Self::Shortlisted => "shortlisted",
            Self::Hired => "hired",
            Self::Rejected => "rejected",
        }
    }

    /// Position in the lifecycle; both outcomes share the last step.
    pub const fn ordinal(self) -> u8 {
        match self {
            Self::Applied => 0,
            Self::UnderReview => 1,
            Self::Shortlisted => 2,
            Self::Hired | Self::Rejected => 3,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Hired | Self::Rejected)
    }

    /// Statuses one step ahead, offered as a convenience to reviewers.
    pub const fn suggested_next(self) -> &'static [Self] {
        match self {
            Self::Applied => &[Self::UnderReview],
            Self::UnderReview => &[Self::Shortlisted],
            Self::Shortlisted => &[Self::Hired, Self::Rejected],
            Self::Hired | Self::Rejected => &[],
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}
