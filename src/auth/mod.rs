//! Session management against the identity provider

mod session;
mod types;

use async_trait::async_trait;
use log::{error, info, warn};
use reqwest::Client;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::fetch::Fetch;

pub use session::*;
pub use types::LoginRequest;
use types::{TokenRequest, TokenResponse};

/// The external identity collaborator
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Recover an identity the provider still holds, if any
    async fn restore(&self) -> Result<Option<Identity>>;

    /// Run the interactive login flow
    async fn login(&self, request: &LoginRequest) -> Result<Identity>;

    /// Tear down the provider-side session for `identity`
    async fn logout(&self, identity: &Identity) -> Result<()>;
}

/// Identity provider reached over HTTP
///
/// Keeps the last issued identity for the lifetime of the process so that
/// `restore` can recover it; nothing is written to disk.
pub struct HttpIdentityProvider {
    url: String,
    client: Client,
    current: Arc<Mutex<Option<Issued>>>,
}

/// An identity and the provider endpoint that issued it
#[derive(Debug, Clone)]
struct Issued {
    endpoint: String,
    identity: Identity,
}

impl HttpIdentityProvider {
    pub fn new(identity_provider_url: &str, client: Client) -> Self {
        Self {
            url: identity_provider_url.trim_end_matches('/').to_string(),
            client,
            current: Arc::new(Mutex::new(None)),
        }
    }

    fn remember(&self, issued: Option<Issued>) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = issued;
    }

    /// Endpoint that issued `identity`, falling back to the configured one
    fn endpoint_for(&self, identity: &Identity) -> String {
        let current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        match current.as_ref() {
            Some(issued) if issued.identity.principal == identity.principal => issued.endpoint.clone(),
            _ => self.url.clone(),
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn restore(&self) -> Result<Option<Identity>> {
        let current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        Ok(current
            .as_ref()
            .map(|issued| issued.identity.clone())
            .filter(|identity| !identity.is_expired()))
    }

    async fn login(&self, request: &LoginRequest) -> Result<Identity> {
        let endpoint = request.identity_provider.trim_end_matches('/').to_string();
        let url = format!("{}/token", endpoint);

        let body = TokenRequest {
            anchor: request.anchor.as_deref(),
            max_time_to_live_ns: request
                .max_time_to_live
                .map(|ttl| u64::try_from(ttl.as_nanos()).unwrap_or(u64::MAX)),
        };

        let response = Fetch::post(&self.client, &url)
            .json(&body)?
            .execute::<TokenResponse>()
            .await
            .map_err(Error::login_failed)?;

        if let Some(err) = response.error {
            let description = response.error_description.unwrap_or_default();
            return Err(Error::login_failed(format!("{} {}", err, description).trim_end()));
        }

        let (principal, access_token) = match (response.principal, response.access_token) {
            (Some(principal), Some(token)) => (principal, token),
            _ => return Err(Error::login_failed("provider returned no principal")),
        };

        let identity = Identity::new(Principal::new(principal), access_token, response.expires_in);
        self.remember(Some(Issued {
            endpoint,
            identity: identity.clone(),
        }));
        Ok(identity)
    }

    async fn logout(&self, identity: &Identity) -> Result<()> {
        let url = format!("{}/logout", self.endpoint_for(identity));

        Fetch::post(&self.client, &url)
            .bearer_auth(&identity.access_token)
            .send()
            .await?
            .map_err(|failed| Error::auth(format!("logout answered {}", failed.status)))?;

        self.remember(None);
        Ok(())
    }
}

/// Owns the authentication lifecycle
pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    identity_provider_url: String,
    identity: Option<Identity>,
    generation: u64,
}

impl SessionManager {
    pub fn new(provider: Arc<dyn IdentityProvider>, identity_provider_url: &str) -> Self {
        Self {
            provider,
            identity_provider_url: identity_provider_url.to_string(),
            identity: None,
            generation: 0,
        }
    }

    /// Establish the provider session and report whether a principal is already authenticated
    pub async fn initialize(&mut self) -> Result<bool> {
        match self.provider.restore().await {
            Ok(Some(identity)) if !identity.is_expired() => {
                info!("Recovered session for {}", identity.principal);
                self.set_identity(Some(identity));
                Ok(true)
            }
            Ok(_) => Ok(false),
            Err(e) => {
                error!("Failed to initialize session: {}", e);
                Err(Error::auth(e))
            }
        }
    }

    /// Log in through the configured identity provider
    ///
    /// On failure the previous session is left untouched.
    pub async fn login(&mut self) -> Result<&Identity> {
        let request = LoginRequest::new(&self.identity_provider_url);
        self.login_with(request).await
    }

    /// Log in with explicit login parameters
    pub async fn login_with(&mut self, request: LoginRequest) -> Result<&Identity> {
        let identity = match self.provider.login(&request).await {
            Ok(identity) => identity,
            Err(Error::LoginFailed(msg)) => {
                error!("Login failed: {}", msg);
                return Err(Error::LoginFailed(msg));
            }
            Err(e) => {
                error!("Login failed: {}", e);
                return Err(Error::login_failed(e));
            }
        };

        info!("Logged in as {}", identity.principal);
        self.set_identity(Some(identity));
        self.identity
            .as_ref()
            .ok_or_else(|| Error::login_failed("no identity after login"))
    }

    /// Tear down the session and forget the principal
    pub async fn logout(&mut self) -> Result<()> {
        let identity = match &self.identity {
            Some(identity) => identity.clone(),
            None => return Err(Error::auth("Not logged in")),
        };

        if let Err(e) = self.provider.logout(&identity).await {
            warn!("Logout failed for {}: {}", identity.principal, e);
            return Err(Error::auth(e));
        }

        info!("Logged out {}", identity.principal);
        self.set_identity(None);
        Ok(())
    }

    fn set_identity(&mut self, identity: Option<Identity>) {
        self.identity = identity;
        self.generation += 1;
    }

    /// The current identity, if authenticated
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// The current principal, if authenticated
    pub fn principal(&self) -> Option<&Principal> {
        self.identity.as_ref().map(|identity| &identity.principal)
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Counter bumped on every identity transition
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
