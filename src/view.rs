//! Which form is shown and what it edits

use chrono::NaiveDate;
use std::fmt;

use crate::error::{Error, Result};
use crate::ledger::{Lot, LotId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    List,
    Add,
    Update,
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViewMode::List => "list",
            ViewMode::Add => "add",
            ViewMode::Update => "update",
        };
        f.write_str(name)
    }
}

/// Follow-up work a transition asks of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    /// The list was entered; the lot cache must be reloaded
    RefreshLots,
}

/// Fields of the add form, as typed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddDraft {
    pub farmer: String,
    /// ISO date, `YYYY-MM-DD`
    pub harvest_date: String,
    pub location: String,
}

/// A validated add request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLot {
    pub farmer: String,
    pub harvest_date: NaiveDate,
    pub location: String,
}

impl AddDraft {
    pub fn validate(&self) -> Result<NewLot> {
        let farmer = required("Farmer name", &self.farmer)?;
        let location = required("Location", &self.location)?;
        let date = required("Harvest date", &self.harvest_date)?;
        let harvest_date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|e| Error::write(format!("Harvest date {:?} is not a valid date: {}", date, e)))?;

        Ok(NewLot {
            farmer,
            harvest_date,
            location,
        })
    }
}

/// Edit buffer of the update form
///
/// Seeded with the lot's identifier and current status only; the history
/// stays in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDraft {
    lot_id: LotId,
    current_status: String,
    pub status: String,
    pub details: String,
}

/// A validated update request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotUpdate {
    pub lot_id: LotId,
    pub status: String,
    pub details: String,
}

impl UpdateDraft {
    pub fn for_lot(lot: &Lot) -> Self {
        Self {
            lot_id: lot.id,
            current_status: lot.status.clone(),
            status: String::new(),
            details: String::new(),
        }
    }

    pub fn lot_id(&self) -> LotId {
        self.lot_id
    }

    /// Status of the lot when editing started
    pub fn current_status(&self) -> &str {
        &self.current_status
    }

    pub fn validate(&self) -> Result<LotUpdate> {
        Ok(LotUpdate {
            lot_id: self.lot_id,
            status: required("Status", &self.status)?,
            details: required("Details", &self.details)?,
        })
    }
}

fn required(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::write(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

/// The view state machine: `list`, `add`, `update`
#[derive(Debug, Default)]
pub struct ViewState {
    mode: ViewMode,
    add: AddDraft,
    update: Option<UpdateDraft>,
    submitting: bool,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    /// `list -> add`, with an empty form
    pub fn show_add(&mut self) -> Result<Effect> {
        self.leave_list(ViewMode::Add)?;
        self.add = AddDraft::default();
        Ok(Effect::None)
    }

    /// `list -> update`, seeded from `lot`
    pub fn show_update(&mut self, lot: &Lot) -> Result<Effect> {
        self.leave_list(ViewMode::Update)?;
        self.update = Some(UpdateDraft::for_lot(lot));
        Ok(Effect::None)
    }

    fn leave_list(&mut self, target: ViewMode) -> Result<()> {
        if self.mode != ViewMode::List {
            return Err(Error::general(format!(
                "cannot open {} view from {} view",
                target, self.mode
            )));
        }
        self.mode = target;
        Ok(())
    }

    /// Abandon the open form and return to the list
    pub fn cancel(&mut self) -> Effect {
        if self.mode == ViewMode::List {
            return Effect::None;
        }
        self.enter_list()
    }

    fn enter_list(&mut self) -> Effect {
        self.mode = ViewMode::List;
        self.update = None;
        Effect::RefreshLots
    }

    /// Mark a submission as outstanding; rejects a second one
    pub fn begin_submit(&mut self) -> Result<()> {
        if self.submitting {
            return Err(Error::write("submission already in progress"));
        }
        self.submitting = true;
        Ok(())
    }

    /// Resolve the outstanding submission
    ///
    /// A confirmed write returns to the list; a rejected one keeps the form
    /// open for another attempt.
    pub fn finish_submit(&mut self, confirmed: bool) -> Effect {
        self.submitting = false;
        if !confirmed {
            return Effect::None;
        }
        if self.mode == ViewMode::Add {
            self.add = AddDraft::default();
        }
        self.enter_list()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn add_draft(&self) -> &AddDraft {
        &self.add
    }

    pub fn add_draft_mut(&mut self) -> &mut AddDraft {
        &mut self.add
    }

    pub fn update_draft(&self) -> Option<&UpdateDraft> {
        self.update.as_ref()
    }

    pub fn update_draft_mut(&mut self) -> Option<&mut UpdateDraft> {
        self.update.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Principal;
    use crate::ledger::Update;

    fn lot_42() -> Lot {
        Lot {
            id: LotId(42),
            farmer: "Ama".to_string(),
            harvest_date: "2024-11-02".to_string(),
            location: "Bukidnon".to_string(),
            status: "Dried".to_string(),
            updates: vec![Update {
                status: "Dried".to_string(),
                details: "Sun dried".to_string(),
                timestamp: 1,
                updated_by: Principal::new("alice"),
            }],
            timestamp: 0,
        }
    }

    #[test]
    fn test_update_seeded_from_lot() {
        let mut view = ViewState::new();
        assert_eq!(view.show_update(&lot_42()).unwrap(), Effect::None);

        assert_eq!(view.mode(), ViewMode::Update);
        let draft = view.update_draft().unwrap();
        assert_eq!(draft.lot_id(), LotId(42));
        assert_eq!(draft.current_status(), "Dried");
        assert!(draft.status.is_empty());
    }

    #[test]
    fn test_show_add_clears_form() {
        let mut view = ViewState::new();
        view.add_draft_mut().farmer = "stale".to_string();

        view.show_add().unwrap();
        assert_eq!(view.mode(), ViewMode::Add);
        assert_eq!(view.add_draft(), &AddDraft::default());
    }

    #[test]
    fn test_forms_only_open_from_list() {
        let mut view = ViewState::new();
        view.show_add().unwrap();
        assert!(view.show_update(&lot_42()).is_err());
        assert!(view.show_add().is_err());
        assert_eq!(view.mode(), ViewMode::Add);
    }

    #[test]
    fn test_cancel_enters_list_and_refreshes() {
        let mut view = ViewState::new();
        assert_eq!(view.cancel(), Effect::None);

        view.show_update(&lot_42()).unwrap();
        assert_eq!(view.cancel(), Effect::RefreshLots);
        assert_eq!(view.mode(), ViewMode::List);
        assert!(view.update_draft().is_none());
    }

    #[test]
    fn test_submit_guard() {
        let mut view = ViewState::new();
        view.show_add().unwrap();

        view.begin_submit().unwrap();
        let err = view.begin_submit().unwrap_err();
        assert!(matches!(err, Error::Write(_)));

        assert_eq!(view.finish_submit(false), Effect::None);
        assert_eq!(view.mode(), ViewMode::Add);
        assert!(!view.is_submitting());

        view.begin_submit().unwrap();
        assert_eq!(view.finish_submit(true), Effect::RefreshLots);
        assert_eq!(view.mode(), ViewMode::List);
    }

    #[test]
    fn test_add_validation() {
        let mut draft = AddDraft {
            farmer: "  Ama ".to_string(),
            harvest_date: "2024-11-02".to_string(),
            location: "Bukidnon".to_string(),
        };
        let new_lot = draft.validate().unwrap();
        assert_eq!(new_lot.farmer, "Ama");
        assert_eq!(new_lot.harvest_date, NaiveDate::from_ymd_opt(2024, 11, 2).unwrap());

        draft.harvest_date = "02/11/2024".to_string();
        assert!(matches!(draft.validate(), Err(Error::Write(_))));

        draft.harvest_date = "2024-11-02".to_string();
        draft.location = "   ".to_string();
        assert!(matches!(draft.validate(), Err(Error::Write(_))));
    }

    #[test]
    fn test_update_validation() {
        let mut draft = UpdateDraft::for_lot(&lot_42());
        assert!(draft.validate().is_err());

        draft.status = "Shipped".to_string();
        draft.details = "Left port".to_string();
        let update = draft.validate().unwrap();
        assert_eq!(update.lot_id, LotId(42));
        assert_eq!(update.status, "Shipped");
    }
}
