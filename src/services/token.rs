//! Bearer credential decoding.
//!
//! Reads the claims embedded in a JWT-shaped token without checking its
//! signature: the backend is the only party that verifies credentials, the
//! claims are used here for routing decisions only. Every failure collapses
//! into "no claims", which callers treat as an expired credential.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::models::Role;

/// Login that is promoted to ADMIN whatever its claims say
pub const MASTER_LOGIN: &str = "master";

const SUBJECT_CLAIMS: &[&str] = &["sub", "login", "username"];
const ROLE_CLAIMS: &[&str] = &["role", "tipo", "authority"];
const AUTHORITIES_CLAIMS: &[&str] = &["authorities", "roles"];

/// Claims read from a credential's payload segment
#[derive(Debug, Clone, PartialEq)]
pub struct Claims {
    pub subject: Option<String>,
    /// Expiry as seconds since the Unix epoch
    pub expires_at: Option<i64>,
    pub role_hint: Option<String>,
    pub authorities: Vec<String>,
}

impl Claims {
    fn from_payload(payload: Map<String, Value>) -> Self {
        let subject = first_string(&payload, SUBJECT_CLAIMS);
        let expires_at = payload.get("exp").and_then(|v| match v {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.floor() as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });
        let role_hint = first_string(&payload, ROLE_CLAIMS);
        let authorities = AUTHORITIES_CLAIMS
            .iter()
            .filter_map(|name| payload.get(*name))
            .flat_map(authority_entries)
            .collect();

        Self {
            subject,
            expires_at,
            role_hint,
            authorities,
        }
    }

    /// Expired once `now` reaches `exp`; a missing `exp` counts as expired
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(exp) => exp <= now.timestamp(),
            None => true,
        }
    }

    pub fn is_master(&self) -> bool {
        self.subject
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(MASTER_LOGIN))
    }

    /// Role derivation with the `master` superuser override enabled
    pub fn role(&self) -> Role {
        self.role_with(true)
    }

    pub fn role_with(&self, master_superuser: bool) -> Role {
        if master_superuser && self.is_master() {
            return Role::Admin;
        }

        if let Some(hint) = &self.role_hint {
            if Role::normalize(hint) == Role::Admin {
                return Role::Admin;
            }
        }

        if self
            .authorities
            .iter()
            .any(|a| a.to_uppercase().contains("ADMIN"))
        {
            return Role::Admin;
        }

        Role::User
    }
}

fn first_string(payload: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| payload.get(*name))
        .find_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        })
}

// Spring-style tokens carry `[{"authority": "ROLE_ADMIN"}]`, others plain strings
fn authority_entries(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(obj) => obj
                    .get("authority")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Decode a base64 segment regardless of alphabet and padding
fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    let normalized: String = segment
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();
    URL_SAFE_NO_PAD.decode(normalized).ok()
}

/// Decode the claims of a three-part credential
pub fn decode_claims(token: &str) -> Option<Claims> {
    let parts: Vec<&str> = token.trim().split('.').collect();
    if parts.len() != 3 {
        return None;
    }

    let bytes = decode_segment(parts[1])?;
    match serde_json::from_slice::<Value>(&bytes).ok()? {
        Value::Object(payload) => Some(Claims::from_payload(payload)),
        _ => None,
    }
}

/// Whether a credential must be treated as expired at `now`
pub fn is_expired_at(token: &str, now: DateTime<Utc>) -> bool {
    decode_claims(token).map_or(true, |c| c.is_expired_at(now))
}

pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, Utc::now())
}

/// Role of a credential, `None` when it cannot be decoded
pub fn role_of(token: &str, master_superuser: bool) -> Option<Role> {
    decode_claims(token).map(|c| c.role_with(master_superuser))
}
