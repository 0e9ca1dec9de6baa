//! Coffee Tracker Client Library
//!
//! Tracks coffee lots through a supply chain backed by a remote ledger.
//! A user authenticates with an identity provider, lists lots, adds new ones
//! and appends status updates through a handle bound to their identity. A
//! conversational assistant is relayed to an external completion endpoint.
//!
//! # Example
//!
//! ```no_run
//! use coffee_tracker::prelude::*;
//!
//! # async fn run() -> Result<(), Error> {
//! let config = TrackerConfig::from_env()?;
//! let mut tracker = Tracker::new(&config)?;
//!
//! if !tracker.initialize().await? {
//!     tracker.login().await?;
//! }
//! for lot in tracker.lots().lots() {
//!     println!("Lot #{}: {}", lot.id, lot.status);
//! }
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod fetch;
pub mod ledger;
pub mod store;
pub mod view;

pub use app::{StatusMessage, Tracker};

/// A convenience module for common imports
pub mod prelude {
    pub use crate::app::{StatusMessage, Tracker};
    pub use crate::config::TrackerConfig;
    pub use crate::error::{Error, ErrorKind};
    pub use crate::ledger::{Lot, LotId, Update};
    pub use crate::view::ViewMode;
}
