//! Principals and the identities issued for them

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque principal identifier issued by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Textual form of the principal
    pub fn as_text(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An authenticated principal together with the credential that signs its calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// The authenticated principal
    pub principal: Principal,

    /// The delegation presented to the ledger on every call
    pub access_token: String,

    /// Expiry as seconds since the Unix epoch
    pub expires_at: Option<i64>,
}

impl Identity {
    /// Create a new identity valid for `expires_in` seconds from now
    ///
    /// A lifetime that does not fit the clock is treated as no expiry.
    pub fn new(principal: Principal, access_token: String, expires_in: Option<i64>) -> Self {
        Self {
            principal,
            access_token,
            expires_at: expires_in.and_then(|secs| Utc::now().timestamp().checked_add(secs)),
        }
    }

    /// Check if the identity has expired
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now().timestamp() >= expires_at,
            None => false,
        }
    }
}
