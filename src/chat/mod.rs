//! Conversational assistant relayed to an external completion endpoint
//!
//! Best effort: one attempt per send, and failures become a fixed assistant
//! reply instead of an error.

mod types;

use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::Client;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::fetch::Fetch;

pub use types::{ChatRole, ChatTurn};
use types::{CompletionRequest, CompletionResponse};

/// Assistant reply used whenever the completion call fails
///
/// This also covers a successful response that carries no candidate text;
/// there is no separate "could not generate a response" reply.
pub const FALLBACK_REPLY: &str = "An error occurred. Please try again later.";

/// The external completion collaborator
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Complete the conversation; `transcript` ends with the newest user turn
    async fn complete(&self, transcript: &[ChatTurn]) -> Result<String>;
}

/// Completion client for the Gemini `generateContent` endpoint
pub struct GeminiClient {
    api_url: String,
    api_key: String,
    client: Client,
}

impl GeminiClient {
    pub fn new(api_url: &str, api_key: &str, client: Client) -> Self {
        Self {
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            client,
        }
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(&self, transcript: &[ChatTurn]) -> Result<String> {
        let payload = CompletionRequest::from_transcript(transcript);

        let response = Fetch::post(&self.client, &self.api_url)
            .query("key", &self.api_key)
            .json(&payload)?
            .send()
            .await
            .map_err(Error::chat)?
            .map_err(|failed| Error::chat(format!("API call failed with status: {}", failed.status)))?;

        let body = response
            .json::<CompletionResponse>()
            .await
            .map_err(Error::chat)?;

        body.first_text()
            .ok_or_else(|| Error::chat("response carried no candidate text"))
    }
}

/// A send that is waiting for its reply
///
/// Owns everything the completion call needs, so it can be awaited while
/// the session stays readable (and reports `is_busy`).
pub struct PendingReply {
    client: Arc<dyn CompletionClient>,
    transcript: Vec<ChatTurn>,
}

impl PendingReply {
    /// Everything the completion call is given, ending with the new user turn
    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    /// Make the single completion attempt
    pub async fn run(self) -> Result<String> {
        debug!("Sending chat transcript of {} turns", self.transcript.len());
        self.client.complete(&self.transcript).await
    }
}

/// Linear chat transcript plus the panel state
pub struct ChatSession {
    client: Arc<dyn CompletionClient>,
    transcript: Vec<ChatTurn>,
    busy: bool,
    open: bool,
}

impl ChatSession {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            transcript: Vec::new(),
            busy: false,
            open: false,
        }
    }

    /// Append the user turn and mark the session busy
    ///
    /// Returns `None` when the input is blank or a reply is still outstanding.
    pub fn begin_send(&mut self, text: &str) -> Option<PendingReply> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if self.busy {
            warn!("Ignoring chat input while a reply is outstanding");
            return None;
        }

        self.transcript.push(ChatTurn::user(text));
        self.busy = true;
        Some(PendingReply {
            client: self.client.clone(),
            transcript: self.transcript.clone(),
        })
    }

    /// Append the assistant turn for a resolved send
    pub fn finish_send(&mut self, reply: Result<String>) -> &ChatTurn {
        let text = match reply {
            Ok(text) => text,
            Err(e) => {
                error!("Chatbot API error: {}", e);
                FALLBACK_REPLY.to_string()
            }
        };

        self.busy = false;
        self.transcript.push(ChatTurn::assistant(text));
        &self.transcript[self.transcript.len() - 1]
    }

    /// Send `text` and wait for the assistant's answer
    pub async fn send(&mut self, text: &str) -> Option<&ChatTurn> {
        let pending = self.begin_send(text)?;
        let reply = pending.run().await;
        Some(self.finish_send(reply))
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Show or hide the chat panel
    pub fn toggle_open(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    pub fn close(&mut self) {
        self.open = false;
    }
}
