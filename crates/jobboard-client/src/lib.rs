//! `JobBoard` Client Library
//!
//! Async access to the job board REST API:
//! - A [`Transport`] port with a reqwest adapter ([`HttpTransport`])
//! - Cached server resources with epoch-based invalidation (`resource`)
//! - Per-entity mutation exclusion (`guard`)
//! - Application lifecycle sync, saved-job toggling, paged job search,
//!   job management, sign-in, profile and avatar operations on
//!   [`JobBoardClient`]

pub mod applications;
mod auth;
pub mod client;
pub mod error;
pub mod guard;
pub mod http;
mod jobs;
pub mod resource;
mod saved;
pub mod search;
pub mod transport;

pub use applications::ALREADY_APPLIED;
pub use auth::{AVATAR_EXTENSIONS, MAX_AVATAR_BYTES};
pub use client::{Caches, JobBoardClient};
pub use error::ApiError;
pub use guard::{EntityKey, MutationGuard};
pub use http::HttpTransport;
pub use resource::{RemoteResource, ResourceMap};
pub use search::{JobPage, JobSearchCursor};
pub use transport::{ApiRequest, Body, Method, Transport, TransportError};
