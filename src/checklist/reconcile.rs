use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt;

use super::{
    ChecklistItem, ChecklistItemId, ChecklistPatch, ChecklistStore, ChecklistTarget,
    NewChecklistItem, StoreError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistUpdate {
    pub id: ChecklistItemId,
    pub patch: ChecklistPatch,
}

/// Writes needed to turn the current checklist into the submitted one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub deletes: Vec<ChecklistItemId>,
    pub updates: Vec<ChecklistUpdate>,
    pub inserts: Vec<NewChecklistItem>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.updates.is_empty() && self.inserts.is_empty()
    }
}

/// Computes the delete, update, and insert sets without touching a store.
///
/// Updates carry the submitted values as-is, even when they match what is
/// stored. New items always start incomplete.
pub fn plan(
    issue_id: i64,
    current: &[ChecklistItem],
    targets: &[ChecklistTarget],
) -> Result<ReconcilePlan, ReconcileError> {
    let mut existing: HashMap<ChecklistItemId, &ChecklistItem> = HashMap::new();
    for item in current {
        if item.issue_id != issue_id {
            return Err(ReconcileError::InvalidReference(item.id));
        }
        existing.insert(item.id, item);
    }

    let mut kept: HashSet<ChecklistItemId> = HashSet::new();
    let mut updates = Vec::new();
    let mut inserts = Vec::new();

    for (index, target) in targets.iter().enumerate() {
        let content = target.content.trim();
        if content.is_empty() {
            return Err(ReconcileError::EmptyContent { index });
        }

        match target.id {
            Some(id) => {
                let stored = existing
                    .get(&id)
                    .ok_or(ReconcileError::InvalidReference(id))?;
                if !kept.insert(id) {
                    return Err(ReconcileError::DuplicateTarget(id));
                }
                updates.push(ChecklistUpdate {
                    id,
                    patch: ChecklistPatch {
                        content: content.to_string(),
                        is_completed: target.is_completed.unwrap_or(stored.is_completed),
                    },
                });
            }
            None => inserts.push(NewChecklistItem {
                issue_id,
                content: content.to_string(),
                is_completed: false,
            }),
        }
    }

    let deletes = current
        .iter()
        .map(|item| item.id)
        .filter(|id| !kept.contains(id))
        .collect();

    Ok(ReconcilePlan {
        deletes,
        updates,
        inserts,
    })
}

pub struct ChecklistReconciler<'s, S: ChecklistStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: ChecklistStore + ?Sized> ChecklistReconciler<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Plans and applies in one step, returning the re-read checklist.
    pub fn reconcile(
        &self,
        issue_id: i64,
        current: &[ChecklistItem],
        targets: &[ChecklistTarget],
    ) -> Result<Vec<ChecklistItem>, ReconcileError> {
        let plan = plan(issue_id, current, targets)?;
        self.apply(issue_id, &plan)
    }

    /// Deletes, then updates one by one, then inserts. Phases already written
    /// stay written when a later one fails.
    pub fn apply(
        &self,
        issue_id: i64,
        plan: &ReconcilePlan,
    ) -> Result<Vec<ChecklistItem>, ReconcileError> {
        log::debug!(
            "reconciling checklist for issue {}: {} delete(s), {} update(s), {} insert(s)",
            issue_id,
            plan.deletes.len(),
            plan.updates.len(),
            plan.inserts.len()
        );

        if !plan.deletes.is_empty() {
            log::trace!("deleting checklist items {:?}", plan.deletes);
            self.store.delete_by_ids(&plan.deletes)?;
        }

        for update in &plan.updates {
            log::trace!("updating checklist item {}", update.id);
            self.store.update_by_id(update.id, &update.patch)?;
        }

        if !plan.inserts.is_empty() {
            log::trace!("inserting {} checklist item(s)", plan.inserts.len());
            self.store.insert_many(&plan.inserts)?;
        }

        Ok(self.store.list(issue_id)?)
    }
}

#[derive(Debug)]
pub enum ReconcileError {
    Store(StoreError),
    InvalidReference(ChecklistItemId),
    DuplicateTarget(ChecklistItemId),
    EmptyContent { index: usize },
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileError::Store(err) => write!(f, "{}", err),
            ReconcileError::InvalidReference(id) => {
                write!(f, "checklist item {} does not belong to this issue", id)
            }
            ReconcileError::DuplicateTarget(id) => {
                write!(f, "checklist item {} appears more than once", id)
            }
            ReconcileError::EmptyContent { index } => {
                write!(f, "checklist entry #{} has empty content", index + 1)
            }
        }
    }
}

impl Error for ReconcileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ReconcileError::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ReconcileError {
    fn from(value: StoreError) -> Self {
        ReconcileError::Store(value)
    }
}
