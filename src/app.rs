//! The single controller that owns the application state
//!
//! Every operation catches remote failures, logs them and leaves a
//! human-readable [`StatusMessage`] behind; the returned `Result` lets a
//! front end branch on the outcome but the state is already updated.
//!
//! Each remote operation also comes in two phases (`begin_*` returning a
//! pending value that owns what it needs, then `finish_*`) so that a front
//! end can await the network without holding the tracker and can read the
//! `loading`, `is_submitting` and `is_busy` flags meanwhile.

use log::{error, info, warn};
use std::sync::Arc;

use crate::auth::{HttpIdentityProvider, IdentityProvider, Principal, SessionManager};
use crate::chat::{ChatSession, ChatTurn, CompletionClient, GeminiClient, PendingReply};
use crate::config::TrackerConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::ledger::{ActorGateway, HttpActorGateway, LedgerActor, Lot, LotId};
use crate::store::{LotStore, RefreshOutcome, RefreshTicket};
use crate::view::{Effect, LotUpdate, NewLot, ViewMode, ViewState};

/// The one message shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    /// Set when the message reports a failure
    pub error: Option<ErrorKind>,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            error: None,
        }
    }

    pub fn failure(kind: ErrorKind, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            error: Some(kind),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A refresh waiting on the ledger
///
/// Owns its ledger handle so it can be awaited without borrowing the tracker.
pub struct PendingRefresh {
    ticket: RefreshTicket,
    actor: Arc<dyn LedgerActor>,
}

impl PendingRefresh {
    pub async fn run(self) -> RefreshResponse {
        RefreshResponse {
            ticket: self.ticket,
            lots: self.actor.get_all_lots().await,
        }
    }
}

/// The ledger's answer to one refresh
pub struct RefreshResponse {
    ticket: RefreshTicket,
    lots: Result<Vec<Lot>>,
}

enum WriteRequest {
    Add(NewLot),
    Update(LotUpdate),
}

/// A submission waiting on the ledger
pub struct PendingWrite {
    generation: u64,
    actor: Arc<dyn LedgerActor>,
    request: WriteRequest,
}

impl std::fmt::Debug for PendingWrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingWrite")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl PendingWrite {
    pub async fn run(self) -> WriteResponse {
        let reply = match self.request {
            WriteRequest::Add(new_lot) => WriteReply::Added(
                self.actor
                    .add_lot(&new_lot.farmer, new_lot.harvest_date, &new_lot.location)
                    .await,
            ),
            WriteRequest::Update(update) => WriteReply::Updated(
                update.lot_id,
                self.actor
                    .update_lot(update.lot_id, &update.status, &update.details)
                    .await,
            ),
        };

        WriteResponse {
            generation: self.generation,
            reply,
        }
    }
}

enum WriteReply {
    Added(Result<i64>),
    Updated(LotId, Result<bool>),
}

/// The ledger's answer to one submission
pub struct WriteResponse {
    generation: u64,
    reply: WriteReply,
}

/// Coffee lot tracker: session, lot cache, view and chat in one place
pub struct Tracker {
    session: SessionManager,
    gateway: Arc<dyn ActorGateway>,
    /// Handle built for the session generation it is tagged with
    actor: Option<(u64, Arc<dyn LedgerActor>)>,
    lots: LotStore,
    view: ViewState,
    chat: ChatSession,
    message: Option<StatusMessage>,
}

impl Tracker {
    /// Create a tracker talking to the services named in `config`
    pub fn new(config: &TrackerConfig) -> Result<Self> {
        let client = config.http_client()?;

        let provider = Arc::new(HttpIdentityProvider::new(
            &config.identity_provider_url,
            client.clone(),
        ));
        let gateway = Arc::new(HttpActorGateway::new(
            &config.ledger_host,
            &config.ledger_canister_id,
            client.clone(),
        ));
        let completion = Arc::new(GeminiClient::new(
            &config.completion_api_url,
            &config.completion_api_key,
            client,
        ));

        Ok(Self::with_collaborators(
            &config.identity_provider_url,
            provider,
            gateway,
            completion,
        ))
    }

    /// Create a tracker from explicit collaborators
    pub fn with_collaborators(
        identity_provider_url: &str,
        provider: Arc<dyn IdentityProvider>,
        gateway: Arc<dyn ActorGateway>,
        completion: Arc<dyn CompletionClient>,
    ) -> Self {
        Self {
            session: SessionManager::new(provider, identity_provider_url),
            gateway,
            actor: None,
            lots: LotStore::new(),
            view: ViewState::new(),
            chat: ChatSession::new(completion),
            message: None,
        }
    }

    /// Recover an existing session and, if there is one, load the lots
    pub async fn initialize(&mut self) -> Result<bool> {
        match self.session.initialize().await {
            Ok(true) => {
                self.on_identity_changed();
                self.refresh_lots().await?;
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(e) => {
                self.fail(&e, "Failed to initialize the session.");
                Err(e)
            }
        }
    }

    pub async fn login(&mut self) -> Result<()> {
        let result = self.session.login().await.map(|_| ());
        if let Err(e) = result {
            self.fail(&e, "Login failed. Please try again.");
            return Err(e);
        }

        self.on_identity_changed();
        self.message = Some(StatusMessage::info("Successfully logged in."));
        self.refresh_lots().await.map(|_| ())
    }

    /// Log out; the lot cache is dropped with the identity that authorized it
    pub async fn logout(&mut self) -> Result<()> {
        if let Err(e) = self.session.logout().await {
            self.fail(&e, "Logout failed. Please try again.");
            return Err(e);
        }

        self.on_identity_changed();
        self.view = ViewState::new();
        self.message = Some(StatusMessage::info("Successfully logged out."));
        Ok(())
    }

    fn on_identity_changed(&mut self) {
        self.lots.clear();
        self.actor = None;
    }

    /// Ledger handle for the current identity, rebuilt after every identity change
    fn actor(&mut self) -> Option<Arc<dyn LedgerActor>> {
        let generation = self.session.generation();
        if let Some((built_for, actor)) = &self.actor {
            if *built_for == generation {
                return Some(actor.clone());
            }
        }

        let actor = self.gateway.build_handle(self.session.identity()?);
        self.actor = Some((generation, actor.clone()));
        Some(actor)
    }

    /// Reload every lot from the ledger
    pub async fn refresh_lots(&mut self) -> Result<RefreshOutcome> {
        match self.begin_refresh() {
            Some(pending) => {
                let response = pending.run().await;
                self.finish_refresh(response)
            }
            None => Ok(RefreshOutcome::Applied(0)),
        }
    }

    /// Start a refresh; `lots().loading()` stays true until it is finished
    ///
    /// Returns `None` (and empties the cache) when nobody is logged in.
    pub fn begin_refresh(&mut self) -> Option<PendingRefresh> {
        let actor = match self.actor() {
            Some(actor) => actor,
            None => {
                self.lots.clear();
                return None;
            }
        };

        Some(PendingRefresh {
            ticket: self.lots.begin_refresh(),
            actor,
        })
    }

    /// Apply a refresh response; stale responses are dropped
    pub fn finish_refresh(&mut self, response: RefreshResponse) -> Result<RefreshOutcome> {
        match self.lots.apply(response.ticket, response.lots) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.fail(&e, "Failed to load coffee lots.");
                Err(e)
            }
        }
    }

    async fn apply(&mut self, effect: Effect) -> Result<()> {
        match effect {
            Effect::None => Ok(()),
            Effect::RefreshLots => self.refresh_lots().await.map(|_| ()),
        }
    }

    /// Open the add form
    pub fn show_add(&mut self) -> Result<()> {
        let _ = self.view.show_add()?;
        Ok(())
    }

    /// Open the update form for a cached lot
    pub fn show_update(&mut self, lot_id: LotId) -> Result<()> {
        let lot = self
            .lots
            .get(lot_id)
            .ok_or_else(|| Error::general(format!("Lot {} is not loaded", lot_id)))?;
        let _ = self.view.show_update(lot)?;
        Ok(())
    }

    /// Close the open form without submitting
    pub async fn cancel(&mut self) -> Result<()> {
        self.message = None;
        let effect = self.view.cancel();
        self.apply(effect).await
    }

    /// Submit the add form
    pub async fn submit_add(&mut self) -> Result<()> {
        let pending = self.begin_add()?;
        let response = pending.run().await;
        self.finish_write(response).await
    }

    /// Submit the update form
    pub async fn submit_update(&mut self) -> Result<()> {
        let pending = self.begin_update()?;
        let response = pending.run().await;
        self.finish_write(response).await
    }

    /// Validate the add form and mark it submitting
    ///
    /// `view().is_submitting()` stays true, and further submissions are
    /// rejected, until [`Tracker::finish_write`] runs.
    pub fn begin_add(&mut self) -> Result<PendingWrite> {
        if self.view.mode() != ViewMode::Add {
            return Err(Error::general("the add form is not open"));
        }
        let actor = self.writer("Please log in first to add a coffee lot.")?;
        let new_lot = match self.view.add_draft().validate() {
            Ok(new_lot) => new_lot,
            Err(e) => {
                self.message = Some(StatusMessage::failure(e.kind(), e.to_string()));
                return Err(e);
            }
        };
        self.begin_write(actor, WriteRequest::Add(new_lot))
    }

    /// Validate the update form and mark it submitting
    pub fn begin_update(&mut self) -> Result<PendingWrite> {
        if self.view.mode() != ViewMode::Update {
            return Err(Error::general("the update form is not open"));
        }
        let actor = self.writer("Please log in first to update a coffee lot.")?;
        let update = match self.view.update_draft().map(|draft| draft.validate()) {
            Some(Ok(update)) => update,
            Some(Err(e)) => {
                self.message = Some(StatusMessage::failure(e.kind(), e.to_string()));
                return Err(e);
            }
            None => return Err(Error::general("no lot is being updated")),
        };
        self.begin_write(actor, WriteRequest::Update(update))
    }

    fn begin_write(&mut self, actor: Arc<dyn LedgerActor>, request: WriteRequest) -> Result<PendingWrite> {
        self.view.begin_submit()?;
        self.message = None;
        Ok(PendingWrite {
            generation: self.session.generation(),
            actor,
            request,
        })
    }

    /// Resolve a submission: back to the list on confirmation, form kept open otherwise
    ///
    /// A response issued under an identity that has since changed is discarded.
    pub async fn finish_write(&mut self, response: WriteResponse) -> Result<()> {
        if response.generation != self.session.generation() {
            warn!("Discarding write result issued under a previous identity");
            return Err(Error::auth("identity changed while the write was outstanding"));
        }

        match response.reply {
            WriteReply::Added(Ok(raw)) => match LotId::from_add_result(raw) {
                Some(lot_id) => {
                    info!("Added lot {}", lot_id);
                    self.message = Some(StatusMessage::info("Successfully added new coffee lot."));
                    let effect = self.view.finish_submit(true);
                    self.apply(effect).await
                }
                None => {
                    let _ = self.view.finish_submit(false);
                    let e = Error::write(format!("ledger rejected the lot (result {})", raw));
                    self.fail(&e, "Failed to add coffee lot. Please try again.");
                    Err(e)
                }
            },
            WriteReply::Added(Err(e)) => {
                let _ = self.view.finish_submit(false);
                let e = Error::write(e);
                self.fail(&e, "An error occurred while adding the lot.");
                Err(e)
            }
            WriteReply::Updated(lot_id, Ok(true)) => {
                info!("Updated lot {}", lot_id);
                self.message = Some(StatusMessage::info(format!(
                    "Lot ID {} successfully updated.",
                    lot_id
                )));
                let effect = self.view.finish_submit(true);
                self.apply(effect).await
            }
            WriteReply::Updated(lot_id, Ok(false)) => {
                let _ = self.view.finish_submit(false);
                let e = Error::write(format!("ledger rejected the update of lot {}", lot_id));
                self.fail(&e, "Failed to update lot. Please check the ID and try again.");
                Err(e)
            }
            WriteReply::Updated(_, Err(e)) => {
                let _ = self.view.finish_submit(false);
                let e = Error::write(e);
                self.fail(&e, "An error occurred while updating the lot.");
                Err(e)
            }
        }
    }

    /// Enroll the current principal as a ledger writer
    pub async fn register(&mut self) -> Result<()> {
        let actor = self.writer("Please log in first to register.")?;

        match actor.register_user().await {
            Ok(true) => {
                let principal = self.session.principal().map(|p| p.to_string()).unwrap_or_default();
                self.message = Some(StatusMessage::info(format!("Registered {}.", principal)));
                Ok(())
            }
            Ok(false) => {
                let e = Error::write("ledger refused the registration");
                self.fail(&e, "Registration failed. Please try again.");
                Err(e)
            }
            Err(e) => {
                let e = Error::write(e);
                self.fail(&e, "An error occurred while registering.");
                Err(e)
            }
        }
    }

    fn writer(&mut self, not_logged_in: &str) -> Result<Arc<dyn LedgerActor>> {
        match self.actor() {
            Some(actor) => Ok(actor),
            None => {
                let e = Error::write("not logged in");
                self.message = Some(StatusMessage::failure(ErrorKind::Write, not_logged_in));
                Err(e)
            }
        }
    }

    fn fail(&mut self, e: &Error, text: &str) {
        error!("{} ({})", text, e);
        self.message = Some(StatusMessage::failure(e.kind(), text));
    }

    /// Relay a chat message; failures become the fallback reply
    pub async fn send_chat(&mut self, text: &str) -> Option<&ChatTurn> {
        self.chat.send(text).await
    }

    /// Append the user turn; `chat().is_busy()` stays true until [`Tracker::finish_chat`]
    ///
    /// Returns `None` for blank input or while a reply is outstanding.
    pub fn begin_chat(&mut self, text: &str) -> Option<PendingReply> {
        self.chat.begin_send(text)
    }

    /// Append the assistant turn for a resolved chat send
    pub fn finish_chat(&mut self, reply: Result<String>) -> &ChatTurn {
        self.chat.finish_send(reply)
    }

    /// Show or hide the chat panel
    pub fn toggle_chat(&mut self) -> bool {
        self.chat.toggle_open()
    }

    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.session.principal()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn lots(&self) -> &LotStore {
        &self.lots
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Mutable access for editing the open form's fields
    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    pub fn mode(&self) -> ViewMode {
        self.view.mode()
    }

    pub fn message(&self) -> Option<&StatusMessage> {
        self.message.as_ref()
    }

    pub fn clear_message(&mut self) {
        self.message = None;
    }
}
