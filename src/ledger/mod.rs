//! Authenticated access to the remote lot ledger

mod types;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::{Identity, Principal};
use crate::error::Result;
use crate::fetch::Fetch;

pub use types::*;

/// Remote operations of the ledger, bound to one identity
#[async_trait]
pub trait LedgerActor: Send + Sync {
    /// Every lot the ledger holds
    async fn get_all_lots(&self) -> Result<Vec<Lot>>;

    /// A single lot, if it exists
    async fn get_lot(&self, lot_id: LotId) -> Result<Option<Lot>>;

    /// Create a lot; a positive result is the new id, anything else a rejection
    async fn add_lot(&self, farmer: &str, harvest_date: NaiveDate, location: &str) -> Result<i64>;

    /// Append a status update; `false` means the ledger rejected it
    async fn update_lot(&self, lot_id: LotId, status: &str, details: &str) -> Result<bool>;

    /// Enroll the calling principal as a writer
    async fn register_user(&self) -> Result<bool>;
}

/// Builds ledger handles for a given identity
///
/// Handles are never reused across identities since every call is
/// authorized by the identity the handle was built for.
pub trait ActorGateway: Send + Sync {
    fn build_handle(&self, identity: &Identity) -> Arc<dyn LedgerActor>;
}

/// Gateway to a ledger reachable over HTTP
#[derive(Debug, Clone)]
pub struct HttpActorGateway {
    host: String,
    canister_id: String,
    client: Client,
}

impl HttpActorGateway {
    pub fn new(host: &str, canister_id: &str, client: Client) -> Self {
        Self {
            host: host.trim_end_matches('/').to_string(),
            canister_id: canister_id.to_string(),
            client,
        }
    }
}

impl ActorGateway for HttpActorGateway {
    fn build_handle(&self, identity: &Identity) -> Arc<dyn LedgerActor> {
        debug!("Building ledger handle for {}", identity.principal);
        Arc::new(HttpLedgerActor {
            base_url: format!("{}/api/canister/{}", self.host, self.canister_id),
            client: self.client.clone(),
            principal: identity.principal.clone(),
            token: identity.access_token.clone(),
        })
    }
}

/// Ledger handle signing every call with one identity
pub struct HttpLedgerActor {
    base_url: String,
    client: Client,
    principal: Principal,
    token: String,
}

#[derive(Debug, Serialize)]
struct CallRequest {
    args: Value,
}

#[derive(Debug, Deserialize)]
struct CallReply<T> {
    reply: T,
}

#[derive(Clone, Copy)]
enum CallKind {
    Query,
    Update,
}

impl HttpLedgerActor {
    /// The principal this handle acts for
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    async fn call<T: DeserializeOwned>(&self, kind: CallKind, method: &str, args: Value) -> Result<T> {
        let kind = match kind {
            CallKind::Query => "query",
            CallKind::Update => "call",
        };
        let url = format!("{}/{}/{}", self.base_url, kind, method);

        let reply = Fetch::post(&self.client, &url)
            .bearer_auth(&self.token)
            .json(&CallRequest { args })?
            .execute::<CallReply<T>>()
            .await?;

        Ok(reply.reply)
    }
}

#[async_trait]
impl LedgerActor for HttpLedgerActor {
    async fn get_all_lots(&self) -> Result<Vec<Lot>> {
        self.call(CallKind::Query, "get_all_lots", json!([])).await
    }

    async fn get_lot(&self, lot_id: LotId) -> Result<Option<Lot>> {
        self.call(CallKind::Query, "get_lot", json!([lot_id])).await
    }

    async fn add_lot(&self, farmer: &str, harvest_date: NaiveDate, location: &str) -> Result<i64> {
        let id: Option<u64> = self
            .call(CallKind::Update, "add_lot", json!([farmer, harvest_date, location]))
            .await?;

        Ok(id.and_then(|id| i64::try_from(id).ok()).unwrap_or(0))
    }

    async fn update_lot(&self, lot_id: LotId, status: &str, details: &str) -> Result<bool> {
        let ack: Option<String> = self
            .call(CallKind::Update, "update_lot", json!([lot_id, status, details]))
            .await?;

        Ok(ack.is_some())
    }

    async fn register_user(&self) -> Result<bool> {
        self.call(CallKind::Update, "register_user", json!([])).await
    }
}
