//! Local projection of the ledger's lots
//!
//! The store is a cache, never the source of truth: every refresh replaces
//! the whole sequence. Each refresh carries a sequence number so that a
//! response older than the last one applied is dropped instead of
//! overwriting newer data.

use log::{debug, error};

use crate::error::{Error, Result};
use crate::ledger::{LedgerActor, Lot, LotId};

/// Claim on one outstanding refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    seq: u64,
}

impl RefreshTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// What happened to a refresh response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The response replaced the cache; holds the new lot count
    Applied(usize),
    /// A newer response (or a clear) superseded this one
    Stale,
}

#[derive(Debug, Default)]
pub struct LotStore {
    lots: Vec<Lot>,
    issued: u64,
    /// Highest sequence applied or invalidated
    floor: u64,
}

impl LotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a sequence number for a refresh about to be sent
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.issued += 1;
        RefreshTicket { seq: self.issued }
    }

    /// Apply the response for `ticket`
    ///
    /// A failed fetch empties the cache and is reported as `Error::Fetch`.
    pub fn apply(&mut self, ticket: RefreshTicket, response: Result<Vec<Lot>>) -> Result<RefreshOutcome> {
        if ticket.seq <= self.floor {
            debug!("Discarding stale refresh #{} (latest applied #{})", ticket.seq, self.floor);
            return Ok(RefreshOutcome::Stale);
        }
        self.floor = ticket.seq;

        match response {
            Ok(lots) => {
                debug!("Refresh #{} loaded {} lots", ticket.seq, lots.len());
                self.lots = lots;
                Ok(RefreshOutcome::Applied(self.lots.len()))
            }
            Err(e) => {
                error!("Failed to fetch lots: {}", e);
                self.lots.clear();
                Err(Error::fetch(e))
            }
        }
    }

    /// Fetch every lot through `actor` and replace the cache with the answer
    pub async fn refresh(&mut self, actor: &dyn LedgerActor) -> Result<RefreshOutcome> {
        let ticket = self.begin_refresh();
        let response = actor.get_all_lots().await;
        self.apply(ticket, response)
    }

    /// Drop every lot and invalidate all outstanding refreshes
    pub fn clear(&mut self) {
        self.lots.clear();
        self.floor = self.issued;
    }

    /// True while the newest refresh has not resolved
    pub fn loading(&self) -> bool {
        self.issued > self.floor
    }

    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    pub fn get(&self, lot_id: LotId) -> Option<&Lot> {
        self.lots.iter().find(|lot| lot.id == lot_id)
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lots.len()
    }
}
