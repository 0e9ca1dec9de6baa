//! Error handling for the coffee tracker client

use std::fmt;
use thiserror::Error;

/// Unified error type for the coffee tracker client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Session errors (logout, expired or missing identity)
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The interactive login flow did not produce a principal
    #[error("Login failed: {0}")]
    LoginFailed(String),

    /// Listing lots failed
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Adding or updating a lot was rejected or could not be sent
    #[error("Write error: {0}")]
    Write(String),

    /// Completion call failed
    #[error("Chat error: {0}")]
    Chat(String),

    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// General errors
    #[error("{0}")]
    General(String),
}

/// Where an error belongs in the user-facing taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    Fetch,
    Write,
    Chat,
    Other,
}

impl Error {
    /// Create a new authentication error
    pub fn auth<T: fmt::Display>(msg: T) -> Self {
        Error::Auth(msg.to_string())
    }

    /// Create a new login failure
    pub fn login_failed<T: fmt::Display>(msg: T) -> Self {
        Error::LoginFailed(msg.to_string())
    }

    /// Create a new fetch error
    pub fn fetch<T: fmt::Display>(msg: T) -> Self {
        Error::Fetch(msg.to_string())
    }

    /// Create a new write error
    pub fn write<T: fmt::Display>(msg: T) -> Self {
        Error::Write(msg.to_string())
    }

    /// Create a new chat error
    pub fn chat<T: fmt::Display>(msg: T) -> Self {
        Error::Chat(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Create a new general error
    pub fn general<T: fmt::Display>(msg: T) -> Self {
        Error::General(msg.to_string())
    }

    /// Classify the error for status reporting
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Auth(_) | Error::LoginFailed(_) => ErrorKind::Auth,
            Error::Fetch(_) => ErrorKind::Fetch,
            Error::Write(_) => ErrorKind::Write,
            Error::Chat(_) => ErrorKind::Chat,
            _ => ErrorKind::Other,
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
