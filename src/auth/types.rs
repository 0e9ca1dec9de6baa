//! Wire types exchanged with the identity provider

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Parameters of one interactive login
#[derive(Debug, Clone)]
pub struct LoginRequest {
    /// The identity provider endpoint
    pub identity_provider: String,

    /// Optional identity anchor to pre-select at the provider
    pub anchor: Option<String>,

    /// Requested lifetime of the issued delegation
    pub max_time_to_live: Option<Duration>,
}

impl LoginRequest {
    pub fn new(identity_provider: &str) -> Self {
        Self {
            identity_provider: identity_provider.to_string(),
            anchor: None,
            max_time_to_live: None,
        }
    }

    /// Pre-select an identity anchor
    pub fn with_anchor(mut self, anchor: &str) -> Self {
        self.anchor = Some(anchor.to_string());
        self
    }

    /// Request a delegation lifetime
    pub fn with_max_time_to_live(mut self, ttl: Duration) -> Self {
        self.max_time_to_live = Some(ttl);
        self
    }
}

/// Body of the token request
#[derive(Debug, Serialize)]
pub(crate) struct TokenRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_time_to_live_ns: Option<u64>,
}

/// Answer of the token request
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenResponse {
    pub principal: Option<String>,

    pub access_token: Option<String>,

    /// The expiry time in seconds
    pub expires_in: Option<i64>,

    pub error: Option<String>,

    pub error_description: Option<String>,
}
