//! Configuration options for the coffee tracker client

use std::env;
use std::time::Duration;

use crate::error::{Error, Result};

/// Identity provider used when none is configured
pub const DEFAULT_IDENTITY_PROVIDER_URL: &str = "https://identity.ic0.app";

/// Gateway host used to reach the ledger when none is configured
pub const DEFAULT_LEDGER_HOST: &str = "https://icp-api.io";

/// Completion endpoint used when none is configured
pub const DEFAULT_COMPLETION_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-preview-05-20:generateContent";

pub const ENV_IDENTITY_PROVIDER_URL: &str = "IDENTITY_PROVIDER_URL";
pub const ENV_LEDGER_CANISTER_ID: &str = "CANISTER_ID_COFFEE_LEDGER";
pub const ENV_LEDGER_HOST: &str = "LEDGER_HOST";
pub const ENV_COMPLETION_API_URL: &str = "COMPLETION_API_URL";
pub const ENV_COMPLETION_API_KEY: &str = "COMPLETION_API_KEY";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "REQUEST_TIMEOUT_SECS";

/// Configuration for the coffee tracker client
///
/// Read once at startup; there is no runtime reconfiguration.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// The identity provider that issues principals
    pub identity_provider_url: String,

    /// The ledger service identifier
    pub ledger_canister_id: String,

    /// The gateway host through which the ledger is called
    pub ledger_host: String,

    /// The completion endpoint used by the chat assistant
    pub completion_api_url: String,

    /// The completion API key (may be empty)
    pub completion_api_key: String,

    /// The request timeout
    pub request_timeout: Option<Duration>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            identity_provider_url: DEFAULT_IDENTITY_PROVIDER_URL.to_string(),
            ledger_canister_id: String::new(),
            ledger_host: DEFAULT_LEDGER_HOST.to_string(),
            completion_api_url: DEFAULT_COMPLETION_API_URL.to_string(),
            completion_api_key: String::new(),
            request_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl TrackerConfig {
    /// Create a configuration for the given ledger with defaults elsewhere
    pub fn new(ledger_canister_id: &str) -> Self {
        Self::default().with_ledger_canister_id(ledger_canister_id)
    }

    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read the configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let ledger_canister_id = non_empty(ENV_LEDGER_CANISTER_ID)
            .ok_or_else(|| Error::config(format!("{} must be set", ENV_LEDGER_CANISTER_ID)))?;

        let mut config = Self::new(&ledger_canister_id);

        if let Some(url) = non_empty(ENV_IDENTITY_PROVIDER_URL) {
            config.identity_provider_url = url;
        }
        if let Some(host) = non_empty(ENV_LEDGER_HOST) {
            config.ledger_host = host;
        }
        if let Some(url) = non_empty(ENV_COMPLETION_API_URL) {
            config.completion_api_url = url;
        }
        if let Some(key) = lookup(ENV_COMPLETION_API_KEY) {
            config.completion_api_key = key;
        }
        if let Some(secs) = non_empty(ENV_REQUEST_TIMEOUT_SECS) {
            let secs = secs.trim().parse::<u64>().map_err(|e| {
                Error::config(format!("{} is not a number of seconds: {}", ENV_REQUEST_TIMEOUT_SECS, e))
            })?;
            config.request_timeout = Some(Duration::from_secs(secs));
        }

        for url in [
            &config.identity_provider_url,
            &config.ledger_host,
            &config.completion_api_url,
        ] {
            url::Url::parse(url)?;
        }

        Ok(config)
    }

    /// Set the identity provider URL
    pub fn with_identity_provider_url(mut self, value: &str) -> Self {
        self.identity_provider_url = value.to_string();
        self
    }

    /// Set the ledger service identifier
    pub fn with_ledger_canister_id(mut self, value: &str) -> Self {
        self.ledger_canister_id = value.to_string();
        self
    }

    /// Set the ledger gateway host
    pub fn with_ledger_host(mut self, value: &str) -> Self {
        self.ledger_host = value.to_string();
        self
    }

    /// Set the completion endpoint
    pub fn with_completion_api_url(mut self, value: &str) -> Self {
        self.completion_api_url = value.to_string();
        self
    }

    /// Set the completion API key
    pub fn with_completion_api_key(mut self, value: &str) -> Self {
        self.completion_api_key = value.to_string();
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Build the HTTP client shared by every collaborator
    pub fn http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(builder.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = TrackerConfig::from_lookup(lookup_from(&[(
            ENV_LEDGER_CANISTER_ID,
            "bkyz2-fmaaa-aaaaa-qaaaq-cai",
        )]))
        .unwrap();

        assert_eq!(config.ledger_canister_id, "bkyz2-fmaaa-aaaaa-qaaaq-cai");
        assert_eq!(config.identity_provider_url, DEFAULT_IDENTITY_PROVIDER_URL);
        assert_eq!(config.ledger_host, DEFAULT_LEDGER_HOST);
        assert_eq!(config.completion_api_key, "");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_missing_ledger_id() {
        let result = TrackerConfig::from_lookup(lookup_from(&[(
            ENV_IDENTITY_PROVIDER_URL,
            "http://localhost:4943",
        )]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_overrides() {
        let config = TrackerConfig::from_lookup(lookup_from(&[
            (ENV_LEDGER_CANISTER_ID, "ledger"),
            (ENV_IDENTITY_PROVIDER_URL, "http://localhost:4943"),
            (ENV_LEDGER_HOST, "http://localhost:8080"),
            (ENV_COMPLETION_API_KEY, "secret"),
            (ENV_REQUEST_TIMEOUT_SECS, "5"),
        ]))
        .unwrap();

        assert_eq!(config.identity_provider_url, "http://localhost:4943");
        assert_eq!(config.ledger_host, "http://localhost:8080");
        assert_eq!(config.completion_api_key, "secret");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_bad_timeout_and_url() {
        let bad_timeout = TrackerConfig::from_lookup(lookup_from(&[
            (ENV_LEDGER_CANISTER_ID, "ledger"),
            (ENV_REQUEST_TIMEOUT_SECS, "soon"),
        ]));
        assert!(matches!(bad_timeout, Err(Error::Config(_))));

        let bad_url = TrackerConfig::from_lookup(lookup_from(&[
            (ENV_LEDGER_CANISTER_ID, "ledger"),
            (ENV_LEDGER_HOST, "not a url"),
        ]));
        assert!(matches!(bad_url, Err(Error::Url(_))));
    }
}
