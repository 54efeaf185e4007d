//! Session derivation from the stored bearer credential.
//!
//! A [`SessionState`] is never stored. It is recomputed from whatever raw
//! credential the [`CredentialStore`] currently holds, so a login, logout or
//! expiry is visible on the very next read.

use std::fmt;
use std::sync::{PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::token;

/// Role asserted by the credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Seeker,
    Employer,
    Admin,
    /// No usable credential.
    #[default]
    #[serde(rename = "none")]
    Anonymous,
}

impl Role {
    /// Parse the `role` claim. Only authenticated roles can appear in a token.
    pub fn from_claim(raw: &str) -> Option<Self> {
        match raw {
            "seeker" => Some(Self::Seeker),
            "employer" => Some(Self::Employer),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Seeker => "seeker",
            Self::Employer => "employer",
            Self::Admin => "admin",
            Self::Anonymous => "none",
        }
    }

    /// Employers and admins manage jobs and review applicants.
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Employer | Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw bearer credential as issued by the server.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `Authorization` header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Identity derived from a credential at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    role: Role,
    email: Option<String>,
    expires_at: Option<i64>,
    credential: Option<Credential>,
}

impl SessionState {
    /// The unauthenticated session.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Derive the session from a raw credential using the current clock.
    pub fn derive(raw: Option<&str>) -> Self {
        Self::derive_at(raw, now_secs())
    }

    /// Derive the session from a raw credential as of `now` (unix seconds).
    ///
    /// Absent, undecodable and expired credentials all yield the anonymous
    /// session. Nothing here is surfaced to the user as an error.
    pub fn derive_at(raw: Option<&str>, now: i64) -> Self {
        let Some(raw) = raw else {
            return Self::anonymous();
        };
        let claims = match token::decode(raw) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "Stored credential is not decodable, treating as signed out");
                return Self::anonymous();
            }
        };
        if claims.is_expired_at(now) {
            debug!(exp = claims.exp, now, "Stored credential has expired");
            return Self::anonymous();
        }
        Self {
            role: claims.role,
            email: Some(claims.email),
            expires_at: Some(claims.exp),
            credential: Some(Credential::new(raw.trim())),
        }
    }

    pub const fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    pub const fn role(&self) -> Role {
        self.role
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub const fn expires_at(&self) -> Option<i64> {
        self.expires_at
    }

    /// Credential to attach as a bearer header; `None` when signed out.
    pub const fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }
}

/// Storage boundary for the raw credential.
///
/// Login writes, logout clears, and sessions are derived from `load` on
/// every read. Implementations must be cheap to call repeatedly.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn store(&self, raw: &str);
    fn clear(&self);

    /// Current session derived from the stored credential.
    fn session(&self) -> SessionState {
        SessionState::derive(self.load().as_deref())
    }
}

/// Process-local credential store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    raw: RwLock<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(raw: impl Into<String>) -> Self {
        Self {
            raw: RwLock::new(Some(raw.into())),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Option<String> {
        self.raw
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store(&self, raw: &str) {
        *self.raw.write().unwrap_or_else(PoisonError::into_inner) = Some(raw.to_string());
    }

    fn clear(&self) {
        *self.raw.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Current unix time in seconds.
pub fn now_secs() -> i64 {
    #[allow(clippy::cast_possible_wrap)]
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    secs
}
