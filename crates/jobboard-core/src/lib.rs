//! `JobBoard` Core Library
//!
//! Shared, I/O-free functionality for `JobBoard` components:
//! - Bearer credential decoding (`token`)
//! - Session derivation and credential storage boundary (`session`)
//! - Role-based access policy for actions and routes (`access`)
//! - Domain models and the application status lifecycle
//! - Configuration resolution and tracing setup

pub mod access;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod session;
pub mod token;
pub mod tracing_init;

pub use access::{AccessDecision, Action, Route};
pub use config::Config;
pub use error::{Error, Result};
pub use lifecycle::{ApplicationStatus, UnknownStatus};
pub use session::{Credential, CredentialStore, MemoryCredentialStore, Role, SessionState};
pub use token::{Claims, DecodeError};
