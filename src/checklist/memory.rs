use std::cell::RefCell;
use std::collections::BTreeMap;

use super::{
    ChecklistItem, ChecklistItemId, ChecklistPatch, ChecklistStore, NewChecklistItem, StoreError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    List,
    Delete,
    Update,
    Insert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    List(i64),
    Delete(Vec<ChecklistItemId>),
    Update(ChecklistItemId),
    Insert(usize),
}

impl StoreOp {
    fn kind(&self) -> OpKind {
        match self {
            StoreOp::List(_) => OpKind::List,
            StoreOp::Delete(_) => OpKind::Delete,
            StoreOp::Update(_) => OpKind::Update,
            StoreOp::Insert(_) => OpKind::Insert,
        }
    }
}

#[derive(Default)]
struct Inner {
    items: BTreeMap<ChecklistItemId, ChecklistItem>,
    next_id: ChecklistItemId,
    ops: Vec<StoreOp>,
    fail_on: Option<(OpKind, usize)>,
}

/// Store double that records every call and can fail the nth call of a kind.
#[derive(Default)]
pub struct MemoryChecklistStore {
    inner: RefCell<Inner>,
}

impl MemoryChecklistStore {
    pub fn seeded(items: &[ChecklistItem]) -> Self {
        let store = Self::default();
        {
            let mut inner = store.inner.borrow_mut();
            for item in items {
                inner.next_id = inner.next_id.max(item.id);
                inner.items.insert(item.id, item.clone());
            }
        }
        store
    }

    /// Fails the `nth` (zero-based) future call of `kind` with `Unavailable`.
    pub fn fail_on(&self, kind: OpKind, nth: usize) {
        self.inner.borrow_mut().fail_on = Some((kind, nth));
    }

    pub fn ops(&self) -> Vec<StoreOp> {
        self.inner.borrow().ops.clone()
    }

    pub fn clear_ops(&self) {
        self.inner.borrow_mut().ops.clear();
    }

    pub fn count(&self, kind: OpKind) -> usize {
        self.inner
            .borrow()
            .ops
            .iter()
            .filter(|op| op.kind() == kind)
            .count()
    }

    pub fn snapshot(&self, issue_id: i64) -> Vec<ChecklistItem> {
        self.inner
            .borrow()
            .items
            .values()
            .filter(|item| item.issue_id == issue_id)
            .cloned()
            .collect()
    }

    fn record(&self, op: StoreOp) -> Result<(), StoreError> {
        let mut inner = self.inner.borrow_mut();
        let kind = op.kind();
        let seen = inner.ops.iter().filter(|past| past.kind() == kind).count();
        inner.ops.push(op);
        match inner.fail_on {
            Some((fail_kind, nth)) if fail_kind == kind && nth == seen => Err(
                StoreError::Unavailable(format!("injected {:?} failure", kind)),
            ),
            _ => Ok(()),
        }
    }
}

impl ChecklistStore for MemoryChecklistStore {
    fn list(&self, issue_id: i64) -> Result<Vec<ChecklistItem>, StoreError> {
        self.record(StoreOp::List(issue_id))?;
        Ok(self.snapshot(issue_id))
    }

    fn delete_by_ids(&self, ids: &[ChecklistItemId]) -> Result<(), StoreError> {
        self.record(StoreOp::Delete(ids.to_vec()))?;
        let mut inner = self.inner.borrow_mut();
        if let Some(missing) = ids.iter().find(|id| !inner.items.contains_key(*id)) {
            return Err(StoreError::InvalidReference(*missing));
        }
        for id in ids {
            inner.items.remove(id);
        }
        Ok(())
    }

    fn update_by_id(
        &self,
        id: ChecklistItemId,
        patch: &ChecklistPatch,
    ) -> Result<ChecklistItem, StoreError> {
        self.record(StoreOp::Update(id))?;
        let mut inner = self.inner.borrow_mut();
        let item = inner
            .items
            .get_mut(&id)
            .ok_or(StoreError::InvalidReference(id))?;
        item.content = patch.content.clone();
        item.is_completed = patch.is_completed;
        Ok(item.clone())
    }

    fn insert_many(&self, items: &[NewChecklistItem]) -> Result<Vec<ChecklistItem>, StoreError> {
        self.record(StoreOp::Insert(items.len()))?;
        let mut inner = self.inner.borrow_mut();
        let mut inserted = Vec::with_capacity(items.len());
        for new_item in items {
            inner.next_id += 1;
            let item = ChecklistItem {
                id: inner.next_id,
                issue_id: new_item.issue_id,
                content: new_item.content.clone(),
                is_completed: new_item.is_completed,
            };
            inner.items.insert(item.id, item.clone());
            inserted.push(item);
        }
        Ok(inserted)
    }
}
