use std::error::Error;
use std::fmt;

use super::{ChecklistItem, ChecklistItemId, ChecklistPatch, NewChecklistItem};

/// Persistence seam for checklist items.
///
/// Every call is a single round trip; callers sequence them and nothing here
/// spans more than one call in a transaction.
pub trait ChecklistStore {
    /// Items of one issue, ordered by id ascending.
    fn list(&self, issue_id: i64) -> Result<Vec<ChecklistItem>, StoreError>;

    /// Deletes every id or none of them.
    fn delete_by_ids(&self, ids: &[ChecklistItemId]) -> Result<(), StoreError>;

    fn update_by_id(
        &self,
        id: ChecklistItemId,
        patch: &ChecklistPatch,
    ) -> Result<ChecklistItem, StoreError>;

    fn insert_many(&self, items: &[NewChecklistItem]) -> Result<Vec<ChecklistItem>, StoreError>;
}

#[derive(Debug)]
pub enum StoreError {
    Db(rusqlite::Error),
    Unavailable(String),
    InvalidReference(ChecklistItemId),
}

impl StoreError {
    /// True for failures of the backing service itself, as opposed to bad ids.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Db(_) | StoreError::Unavailable(_))
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Db(err) => write!(f, "checklist store unavailable: {}", err),
            StoreError::Unavailable(message) => {
                write!(f, "checklist store unavailable: {}", message)
            }
            StoreError::InvalidReference(id) => {
                write!(f, "checklist item {} does not exist", id)
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreError::Db(err) => Some(err),
            StoreError::Unavailable(_) | StoreError::InvalidReference(_) => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        StoreError::Db(value)
    }
}
