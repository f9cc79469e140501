//! Checklist items and the reconciler that brings a persisted checklist in
//! line with a submitted one.
//!
//! The reconciler never talks to SQLite directly; it goes through
//! [`ChecklistStore`] so the same diff-and-apply logic runs against the real
//! database and the in-memory store used by tests.

#[cfg(test)]
mod memory;
mod reconcile;
mod sqlite;
mod store;

use serde::{Deserialize, Serialize};

pub use reconcile::{plan, ChecklistReconciler, ReconcileError};
pub use sqlite::SqliteChecklistStore;
pub use store::{ChecklistStore, StoreError};

pub type ChecklistItemId = i64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChecklistItem {
    pub id: ChecklistItemId,
    pub issue_id: i64,
    pub content: String,
    pub is_completed: bool,
}

/// One entry of a submitted checklist. Entries without an `id` are new.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChecklistTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ChecklistItemId>,
    pub content: String,
    #[serde(
        default,
        alias = "isCompleted",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_completed: Option<bool>,
}

impl ChecklistTarget {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: None,
            content: content.into(),
            is_completed: None,
        }
    }

    pub fn existing(id: ChecklistItemId, content: impl Into<String>, is_completed: bool) -> Self {
        Self {
            id: Some(id),
            content: content.into(),
            is_completed: Some(is_completed),
        }
    }
}

impl From<&ChecklistItem> for ChecklistTarget {
    fn from(item: &ChecklistItem) -> Self {
        ChecklistTarget::existing(item.id, item.content.clone(), item.is_completed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistPatch {
    pub content: String,
    pub is_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChecklistItem {
    pub issue_id: i64,
    pub content: String,
    pub is_completed: bool,
}
