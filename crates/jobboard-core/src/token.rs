//! Offline decoding of bearer credentials.
//!
//! Credentials are three-segment signed claim sets (`header.payload.signature`,
//! base64url segments). Decoding here is structural only: the signature is
//! never verified, so decoded claims drive UI gating and nothing else. The
//! server re-checks every authorization-sensitive request.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::session::Role;

/// Claims carried by an access credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Account email (the `email` claim).
    pub email: String,
    /// Authenticated role (the `role` claim).
    pub role: Role,
    /// Expiration (unix timestamp, seconds).
    pub exp: i64,
    /// Subject, when the issuer sets one.
    pub sub: Option<String>,
    /// Token type (`"access"`, `"refresh"`, ...), when the issuer sets one.
    pub token_type: Option<String>,
}

impl Claims {
    /// Whether the credential is expired at `now` (unix seconds).
    /// A credential whose `exp` equals `now` is already expired.
    pub const fn is_expired_at(&self, now: i64) -> bool {
        self.exp <= now
    }
}

/// Which segment of the credential failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Header,
    Payload,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header => f.write_str("header"),
            Self::Payload => f.write_str("payload"),
        }
    }
}

/// Structural decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("expected 3 dot-separated segments, found {0}")]
    SegmentCount(usize),

    #[error("signature segment is empty")]
    EmptySignature,

    #[error("{segment} is not valid base64url: {reason}")]
    Base64 { segment: Segment, reason: String },

    #[error("{segment} is not valid JSON: {reason}")]
    Json { segment: Segment, reason: String },

    #[error("{0} is not a JSON object")]
    NotAnObject(Segment),

    #[error("missing claim `{0}`")]
    MissingClaim(&'static str),

    #[error("claim `{claim}` is invalid: {reason}")]
    InvalidClaim { claim: &'static str, reason: String },

    #[error("expected an access token, got `{0}`")]
    WrongTokenType(String),
}

/// Decode a credential into its claims without verifying the signature.
pub fn decode(credential: &str) -> Result<Claims, DecodeError> {
    let credential = credential.trim();
    let segments: Vec<&str> = credential.split('.').collect();
    let [header, payload, signature] = segments.as_slice() else {
        return Err(DecodeError::SegmentCount(segments.len()));
    };
    if signature.is_empty() {
        return Err(DecodeError::EmptySignature);
    }

    decode_segment(header, Segment::Header)?;
    let claims = decode_segment(payload, Segment::Payload)?;

    let token_type = optional_string_claim(&claims, "type")?;
    if let Some(kind) = &token_type {
        if kind != "access" {
            return Err(DecodeError::WrongTokenType(kind.clone()));
        }
    }

    let email = string_claim(&claims, "email")?;
    let role = role_claim(&claims)?;
    let exp = exp_claim(&claims)?;
    let sub = optional_string_claim(&claims, "sub")?;

    Ok(Claims {
        email,
        role,
        exp,
        sub,
        token_type,
    })
}

fn decode_segment(segment: &str, which: Segment) -> Result<Map<String, Value>, DecodeError> {
    // Some issuers keep base64 padding; the URL-safe engine here does not accept it.
    let bytes = URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| DecodeError::Base64 {
            segment: which,
            reason: e.to_string(),
        })?;
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(DecodeError::NotAnObject(which)),
        Err(e) => Err(DecodeError::Json {
            segment: which,
            reason: e.to_string(),
        }),
    }
}

fn string_claim(claims: &Map<String, Value>, name: &'static str) -> Result<String, DecodeError> {
    optional_string_claim(claims, name)?.ok_or(DecodeError::MissingClaim(name))
}

fn optional_string_claim(
    claims: &Map<String, Value>,
    name: &'static str,
) -> Result<Option<String>, DecodeError> {
    match claims.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if !s.is_empty() => Ok(Some(s.clone())),
        Some(Value::String(_)) => Err(DecodeError::InvalidClaim {
            claim: name,
            reason: "empty string".into(),
        }),
        Some(other) => Err(DecodeError::InvalidClaim {
            claim: name,
            reason: format!("expected string, got {}", json_kind(other)),
        }),
    }
}

fn role_claim(claims: &Map<String, Value>) -> Result<Role, DecodeError> {
    let raw = string_claim(claims, "role")?;
    Role::from_claim(&raw).ok_or_else(|| DecodeError::InvalidClaim {
        claim: "role",
        reason: format!("unknown role `{raw}`"),
    })
}

fn exp_claim(claims: &Map<String, Value>) -> Result<i64, DecodeError> {
    match claims.get("exp") {
        None | Some(Value::Null) => Err(DecodeError::MissingClaim("exp")),
        Some(Value::Number(n)) => n.as_i64().ok_or_else(|| DecodeError::InvalidClaim {
            claim: "exp",
            reason: format!("expected integer seconds, got {n}"),
        }),
        Some(other) => Err(DecodeError::InvalidClaim {
            claim: "exp",
            reason: format!("expected integer seconds, got {}", json_kind(other)),
        }),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
