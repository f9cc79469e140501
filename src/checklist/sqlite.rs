use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::now_utc_rfc3339;

use super::{
    ChecklistItem, ChecklistItemId, ChecklistPatch, ChecklistStore, NewChecklistItem, StoreError,
};

pub struct SqliteChecklistStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteChecklistStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn get(&self, id: ChecklistItemId) -> Result<Option<ChecklistItem>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, issue_id, content, is_completed FROM checklist_items WHERE id = ?1",
                params![id],
                item_from_row,
            )
            .optional()?)
    }

    /// Runs `body` inside a savepoint so batch calls apply all-or-nothing,
    /// including when the caller already holds a transaction.
    fn all_or_nothing<T>(
        &self,
        name: &str,
        body: impl FnOnce() -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        self.conn.execute_batch(&format!("SAVEPOINT {name}"))?;
        match body() {
            Ok(value) => {
                self.conn.execute_batch(&format!("RELEASE {name}"))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self
                    .conn
                    .execute_batch(&format!("ROLLBACK TO {name}; RELEASE {name}"))
                {
                    log::warn!("failed to roll back savepoint {}: {}", name, rollback_err);
                }
                Err(err)
            }
        }
    }
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<ChecklistItem> {
    Ok(ChecklistItem {
        id: row.get(0)?,
        issue_id: row.get(1)?,
        content: row.get(2)?,
        is_completed: row.get(3)?,
    })
}

impl ChecklistStore for SqliteChecklistStore<'_> {
    fn list(&self, issue_id: i64) -> Result<Vec<ChecklistItem>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            r#"
SELECT id, issue_id, content, is_completed
FROM checklist_items
WHERE issue_id = ?1
ORDER BY id ASC
"#,
        )?;
        let rows = stmt.query_map(params![issue_id], item_from_row)?;
        let items = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    fn delete_by_ids(&self, ids: &[ChecklistItemId]) -> Result<(), StoreError> {
        if ids.is_empty() {
            return Ok(());
        }
        self.all_or_nothing("checklist_delete", || {
            let mut stmt = self
                .conn
                .prepare_cached("DELETE FROM checklist_items WHERE id = ?1")?;
            for &id in ids {
                if stmt.execute(params![id])? == 0 {
                    return Err(StoreError::InvalidReference(id));
                }
            }
            Ok(())
        })
    }

    fn update_by_id(
        &self,
        id: ChecklistItemId,
        patch: &ChecklistPatch,
    ) -> Result<ChecklistItem, StoreError> {
        self.conn
            .query_row(
                r#"
UPDATE checklist_items
SET content = ?2, is_completed = ?3
WHERE id = ?1
RETURNING id, issue_id, content, is_completed
"#,
                params![id, patch.content, patch.is_completed],
                item_from_row,
            )
            .optional()?
            .ok_or(StoreError::InvalidReference(id))
    }

    fn insert_many(&self, items: &[NewChecklistItem]) -> Result<Vec<ChecklistItem>, StoreError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let created_at = now_utc_rfc3339();
        self.all_or_nothing("checklist_insert", || {
            let mut stmt = self.conn.prepare_cached(
                r#"
INSERT INTO checklist_items (issue_id, content, is_completed, created_at)
VALUES (?1, ?2, ?3, ?4)
RETURNING id, issue_id, content, is_completed
"#,
            )?;
            let mut inserted = Vec::with_capacity(items.len());
            for item in items {
                let row = stmt.query_row(
                    params![item.issue_id, item.content, item.is_completed, created_at],
                    item_from_row,
                )?;
                inserted.push(row);
            }
            Ok(inserted)
        })
    }
}
