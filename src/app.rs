use std::error::Error;
use std::fmt;
use std::str::FromStr;

use rusqlite::Connection;
use serde::Serialize;

use crate::checklist::{
    self, ChecklistItem, ChecklistItemId, ChecklistPatch, ChecklistReconciler, ChecklistStore,
    ChecklistTarget, NewChecklistItem, ReconcileError, SqliteChecklistStore, StoreError,
};
use crate::config::IssueDefaults;
use crate::db::{self, InsertIssue, IssueRecord, NoteRecord, ProfileRecord, ProjectRecord};
use crate::domain::{IssueStatus, IssueType, ParseEnumError, Priority, ProjectStatus, Severity};

pub struct App {
    conn: Connection,
    user: Option<String>,
    issue_defaults: IssueDefaults,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IssueView {
    pub id: i64,
    pub project_id: i64,
    pub project_name: String,
    pub title: String,
    pub description: Option<String>,
    pub status: IssueStatus,
    pub priority: Priority,
    pub severity: Severity,
    pub issue_type: IssueType,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    pub evidence_url: Option<String>,
    pub log_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IssueDetail {
    #[serde(flatten)]
    pub issue: IssueView,
    pub checklist: Vec<ChecklistItem>,
    pub notes: Vec<NoteRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct NewIssue {
    pub project_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub severity: Option<String>,
    pub issue_type: Option<String>,
    pub assignee: Option<String>,
    pub evidence_url: Option<String>,
    pub log_url: Option<String>,
    pub checklist: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct IssuePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub severity: Option<String>,
    /// An empty string clears the assignee.
    pub assignee: Option<String>,
}

impl IssuePatch {
    fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.priority.is_some()
            || self.severity.is_some()
            || self.assignee.is_some()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChecklistSyncView {
    pub issue_id: i64,
    pub applied: bool,
    pub deleted: Vec<ChecklistItemId>,
    pub updated: usize,
    pub inserted: usize,
    pub items: Vec<ChecklistItem>,
}

impl App {
    pub fn open(db_path: &str) -> Result<Self, AppError> {
        ensure_parent_dir(db_path)?;
        let conn = db::open_connection(db_path)?;
        Ok(Self {
            conn,
            user: None,
            issue_defaults: IssueDefaults::default(),
        })
    }

    pub fn with_user(mut self, user: Option<String>) -> Self {
        self.user = user.and_then(|value| non_empty(&value));
        self
    }

    pub fn with_issue_defaults(mut self, defaults: IssueDefaults) -> Self {
        self.issue_defaults = defaults;
        self
    }

    pub fn create_profile(
        &self,
        username: &str,
        email: Option<&str>,
    ) -> Result<ProfileRecord, AppError> {
        let username = required(username, "username")?;
        if db::find_profile_by_username(&self.conn, &username)?.is_some() {
            return Err(AppError::InvalidArgument(format!(
                "user '{}' already exists",
                username
            )));
        }
        let email = email.and_then(non_empty);
        db::insert_profile(&self.conn, &username, email.as_deref())?;
        log::info!("created user {}", username);
        self.require_profile(&username)
    }

    pub fn list_profiles(&self) -> Result<Vec<ProfileRecord>, AppError> {
        Ok(db::list_profiles(&self.conn)?)
    }

    pub fn create_project(
        &self,
        name: &str,
        description: Option<&str>,
        status: Option<&str>,
    ) -> Result<ProjectRecord, AppError> {
        let name = required(name, "project name")?;
        let status = match status {
            Some(raw) => ProjectStatus::from_str(raw)?,
            None => ProjectStatus::default(),
        };
        let description = description.and_then(non_empty);
        let id = db::insert_project(&self.conn, &name, description.as_deref(), status.as_str())?;
        log::info!("created project {} ({})", id, name);
        self.require_project(id)
    }

    pub fn list_projects(&self) -> Result<Vec<ProjectRecord>, AppError> {
        Ok(db::list_projects(&self.conn)?)
    }

    pub fn show_project(&self, id: i64) -> Result<Option<ProjectRecord>, AppError> {
        Ok(db::get_project(&self.conn, id)?)
    }

    /// Writes the issue and its initial checklist atomically.
    pub fn create_issue(&self, input: NewIssue) -> Result<IssueView, AppError> {
        let title = required(&input.title, "title")?;
        self.require_project(input.project_id)?;
        let reporter = self.acting_profile()?;

        let priority = parse_or(input.priority.as_deref(), self.issue_defaults.priority)?;
        let severity = parse_or(input.severity.as_deref(), self.issue_defaults.severity)?;
        let issue_type = parse_or(input.issue_type.as_deref(), self.issue_defaults.issue_type)?;

        let assignee = match input.assignee.as_deref().and_then(non_empty) {
            Some(username) => Some(self.require_profile(&username)?.id),
            None => None,
        };

        let checklist_items: Vec<String> = input
            .checklist
            .iter()
            .filter_map(|content| non_empty(content))
            .collect();
        if issue_type != IssueType::Checklist && !checklist_items.is_empty() {
            return Err(AppError::InvalidArgument(
                "checklist items require issue type 'checklist'".to_string(),
            ));
        }

        let description = input.description.as_deref().and_then(non_empty);
        let evidence_url = input.evidence_url.as_deref().and_then(non_empty);
        let log_url = input.log_url.as_deref().and_then(non_empty);

        let tx = self.conn.unchecked_transaction()?;
        let issue_id = db::insert_issue(
            &tx,
            &InsertIssue {
                project_id: input.project_id,
                title: &title,
                description: description.as_deref(),
                status: IssueStatus::New.as_str(),
                priority: priority.as_str(),
                severity: severity.as_str(),
                issue_type: issue_type.as_str(),
                created_by: Some(reporter.id),
                assigned_to: assignee,
                evidence_url: evidence_url.as_deref(),
                log_url: log_url.as_deref(),
            },
        )?;
        let new_items = checklist_items
            .into_iter()
            .map(|content| NewChecklistItem {
                issue_id,
                content,
                is_completed: false,
            })
            .collect::<Vec<_>>();
        SqliteChecklistStore::new(&tx).insert_many(&new_items)?;
        tx.commit()?;

        log::info!(
            "created issue {} in project {} with {} checklist item(s)",
            issue_id,
            input.project_id,
            new_items.len()
        );
        self.require_issue(issue_id)
    }

    pub fn list_issues(&self, project_id: Option<i64>) -> Result<Vec<IssueView>, AppError> {
        if let Some(id) = project_id {
            self.require_project(id)?;
        }
        db::list_issues(&self.conn, project_id)?
            .into_iter()
            .map(IssueView::try_from)
            .collect()
    }

    pub fn show_issue(&self, id: i64) -> Result<Option<IssueDetail>, AppError> {
        let Some(record) = db::get_issue(&self.conn, id)? else {
            return Ok(None);
        };
        let issue = IssueView::try_from(record)?;
        let checklist = if issue.issue_type == IssueType::Checklist {
            SqliteChecklistStore::new(&self.conn).list(id)?
        } else {
            Vec::new()
        };
        let notes = db::list_notes(&self.conn, id)?;
        Ok(Some(IssueDetail {
            issue,
            checklist,
            notes,
        }))
    }

    pub fn update_issue(&self, id: i64, patch: IssuePatch) -> Result<IssueView, AppError> {
        if !patch.has_changes() {
            return Err(AppError::InvalidArgument(
                "update requires at least one field change".to_string(),
            ));
        }

        let current = self.require_issue(id)?;
        let title = match patch.title.as_deref() {
            Some(raw) => required(raw, "title")?,
            None => current.title.clone(),
        };
        let description = match patch.description.as_deref() {
            Some(raw) => non_empty(raw),
            None => current.description.clone(),
        };
        let priority = parse_or(patch.priority.as_deref(), current.priority)?;
        let severity = parse_or(patch.severity.as_deref(), current.severity)?;
        let assigned_to = match patch.assignee.as_deref() {
            Some(raw) => match non_empty(raw) {
                Some(username) => Some(self.require_profile(&username)?.id),
                None => None,
            },
            None => db::get_issue_assignee_id(&self.conn, id)?,
        };

        db::update_issue(
            &self.conn,
            &db::UpdateIssue {
                id,
                title: &title,
                description: description.as_deref(),
                status: current.status.as_str(),
                priority: priority.as_str(),
                severity: severity.as_str(),
                assigned_to,
            },
        )?;
        self.require_issue(id)
    }

    pub fn set_issue_status(&self, id: i64, status: &str) -> Result<IssueView, AppError> {
        let next = IssueStatus::from_str(status)?;
        let current = self.require_issue(id)?;
        if current.status == next {
            return Ok(current);
        }
        let assigned_to = db::get_issue_assignee_id(&self.conn, id)?;
        db::update_issue(
            &self.conn,
            &db::UpdateIssue {
                id,
                title: &current.title,
                description: current.description.as_deref(),
                status: next.as_str(),
                priority: current.priority.as_str(),
                severity: current.severity.as_str(),
                assigned_to,
            },
        )?;
        log::info!("issue {} status {} -> {}", id, current.status, next);
        self.require_issue(id)
    }

    pub fn list_checklist(&self, issue_id: i64) -> Result<Vec<ChecklistItem>, AppError> {
        self.require_issue(issue_id)?;
        Ok(SqliteChecklistStore::new(&self.conn).list(issue_id)?)
    }

    /// Flips one item, or sets it when `completed` is given.
    pub fn toggle_checklist_item(
        &self,
        item_id: ChecklistItemId,
        completed: Option<bool>,
    ) -> Result<ChecklistItem, AppError> {
        let store = SqliteChecklistStore::new(&self.conn);
        let item = store
            .get(item_id)?
            .ok_or_else(|| AppError::not_found("checklist item", item_id))?;
        let patch = ChecklistPatch {
            content: item.content.clone(),
            is_completed: completed.unwrap_or(!item.is_completed),
        };
        Ok(store.update_by_id(item_id, &patch)?)
    }

    /// Brings an issue's checklist in line with `targets`. With `dry_run` the
    /// plan is reported and nothing is written.
    pub fn reconcile_checklist(
        &self,
        issue_id: i64,
        targets: &[ChecklistTarget],
        dry_run: bool,
    ) -> Result<ChecklistSyncView, AppError> {
        let issue = self.require_issue(issue_id)?;
        if issue.issue_type != IssueType::Checklist {
            return Err(AppError::InvalidArgument(format!(
                "issue {} is not a checklist issue",
                issue_id
            )));
        }

        let store = SqliteChecklistStore::new(&self.conn);
        let current = store.list(issue_id)?;
        let plan = checklist::plan(issue_id, &current, targets)?;
        let deleted = plan.deletes.clone();
        let updated = plan.updates.len();
        let inserted = plan.inserts.len();

        if plan.is_empty() {
            log::debug!("checklist for issue {} is empty on both sides", issue_id);
        }
        let items = if dry_run {
            current
        } else {
            ChecklistReconciler::new(&store).apply(issue_id, &plan)?
        };
        if !dry_run {
            log::info!(
                "checklist for issue {} reconciled: -{} ~{} +{}",
                issue_id,
                deleted.len(),
                updated,
                inserted
            );
        }

        Ok(ChecklistSyncView {
            issue_id,
            applied: !dry_run,
            deleted,
            updated,
            inserted,
            items,
        })
    }

    pub fn add_note(&self, issue_id: i64, text: &str) -> Result<NoteRecord, AppError> {
        let text = required(text, "note")?;
        self.require_issue(issue_id)?;
        let author = self.acting_profile()?;
        let id = db::insert_note(&self.conn, issue_id, author.id, &text)?;
        db::get_note(&self.conn, id)?.ok_or_else(|| AppError::not_found("note", id))
    }

    pub fn list_notes(&self, issue_id: i64) -> Result<Vec<NoteRecord>, AppError> {
        self.require_issue(issue_id)?;
        Ok(db::list_notes(&self.conn, issue_id)?)
    }

    fn acting_profile(&self) -> Result<ProfileRecord, AppError> {
        let username = self.user.as_deref().ok_or_else(|| {
            AppError::InvalidArgument(
                "no acting user; pass --user, set MANTIS_USER, or set `user` in the config"
                    .to_string(),
            )
        })?;
        self.require_profile(username)
    }

    fn require_profile(&self, username: &str) -> Result<ProfileRecord, AppError> {
        db::find_profile_by_username(&self.conn, username)?
            .ok_or_else(|| AppError::not_found("user", username))
    }

    fn require_project(&self, id: i64) -> Result<ProjectRecord, AppError> {
        db::get_project(&self.conn, id)?.ok_or_else(|| AppError::not_found("project", id))
    }

    fn require_issue(&self, id: i64) -> Result<IssueView, AppError> {
        let record = db::get_issue(&self.conn, id)?
            .ok_or_else(|| AppError::not_found("issue", id))?;
        IssueView::try_from(record)
    }
}

fn ensure_parent_dir(path: &str) -> Result<(), AppError> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn required(raw: &str, field: &str) -> Result<String, AppError> {
    non_empty(raw).ok_or_else(|| AppError::InvalidArgument(format!("{} cannot be empty", field)))
}

fn parse_or<T>(raw: Option<&str>, fallback: T) -> Result<T, AppError>
where
    T: FromStr<Err = ParseEnumError>,
{
    match raw {
        Some(value) => Ok(T::from_str(value)?),
        None => Ok(fallback),
    }
}

impl TryFrom<IssueRecord> for IssueView {
    type Error = AppError;

    fn try_from(value: IssueRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id,
            project_id: value.project_id,
            project_name: value.project_name,
            title: value.title,
            description: value.description,
            status: IssueStatus::from_str(&value.status)?,
            priority: Priority::from_str(&value.priority)?,
            severity: Severity::from_str(&value.severity)?,
            issue_type: IssueType::from_str(&value.issue_type)?,
            created_by: value.created_by,
            assigned_to: value.assigned_to,
            evidence_url: value.evidence_url,
            log_url: value.log_url,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(Debug)]
pub enum AppError {
    Io(std::io::Error),
    Db(rusqlite::Error),
    Json(serde_json::Error),
    Config(crate::config::ConfigError),
    Store(StoreError),
    Checklist(ReconcileError),
    Parse(ParseEnumError),
    InvalidArgument(String),
    NotFound { entity: &'static str, key: String },
}

impl AppError {
    pub fn not_found(entity: &'static str, key: impl fmt::Display) -> Self {
        AppError::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io(err) => write!(f, "I/O error: {}", err),
            AppError::Db(err) => write!(f, "database error: {}", err),
            AppError::Json(err) => write!(f, "JSON parse error: {}", err),
            AppError::Config(err) => write!(f, "{}", err),
            AppError::Store(err) => write!(f, "{}", err),
            AppError::Checklist(ReconcileError::Store(err)) if err.is_unavailable() => write!(
                f,
                "checklist partially saved; re-list before retrying: {}",
                err
            ),
            AppError::Checklist(err) => write!(f, "checklist not saved: {}", err),
            AppError::Parse(err) => write!(f, "{}", err),
            AppError::InvalidArgument(message) => write!(f, "{}", message),
            AppError::NotFound { entity, key } => write!(f, "{} '{}' not found", entity, key),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Io(err) => Some(err),
            AppError::Db(err) => Some(err),
            AppError::Json(err) => Some(err),
            AppError::Config(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Checklist(err) => Some(err),
            AppError::Parse(err) => Some(err),
            AppError::InvalidArgument(_) | AppError::NotFound { .. } => None,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        AppError::Io(value)
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(value: rusqlite::Error) -> Self {
        AppError::Db(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        AppError::Json(value)
    }
}

impl From<crate::config::ConfigError> for AppError {
    fn from(value: crate::config::ConfigError) -> Self {
        AppError::Config(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        AppError::Store(value)
    }
}

impl From<ReconcileError> for AppError {
    fn from(value: ReconcileError) -> Self {
        AppError::Checklist(value)
    }
}

impl From<ParseEnumError> for AppError {
    fn from(value: ParseEnumError) -> Self {
        AppError::Parse(value)
    }
}
