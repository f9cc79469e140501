use std::time::Duration;

use rusqlite::{params, Connection, DatabaseName, OptionalExtension, Result, Row};
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub const CURRENT_SCHEMA_VERSION: i64 = 2;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: [Migration; 2] = [
    Migration {
        version: 1,
        name: "baseline_tracker_schema_v1",
        sql: r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS profiles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    email TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    status TEXT NOT NULL DEFAULT 'development',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS issues (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    description TEXT,
    status TEXT NOT NULL DEFAULT 'new',
    priority TEXT NOT NULL DEFAULT 'normal',
    severity TEXT NOT NULL DEFAULT 'minor',
    issue_type TEXT NOT NULL DEFAULT 'standard',
    created_by INTEGER REFERENCES profiles(id),
    assigned_to INTEGER REFERENCES profiles(id) ON DELETE SET NULL,
    evidence_url TEXT,
    log_url TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    issue_id INTEGER NOT NULL REFERENCES issues(id) ON DELETE CASCADE,
    user_id INTEGER REFERENCES profiles(id),
    note TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_issues_project_created ON issues(project_id, created_at);
CREATE INDEX IF NOT EXISTS idx_notes_issue_created ON notes(issue_id, created_at);
"#,
    },
    Migration {
        version: 2,
        name: "checklist_items_v1",
        sql: r#"
CREATE TABLE IF NOT EXISTS checklist_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    issue_id INTEGER NOT NULL REFERENCES issues(id) ON DELETE CASCADE,
    content TEXT NOT NULL,
    is_completed INTEGER NOT NULL DEFAULT 0 CHECK (is_completed IN (0, 1)),
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_checklist_items_issue ON checklist_items(issue_id, id);
"#,
    },
];

pub fn open_connection(path: &str) -> Result<Connection> {
    let mut conn = Connection::open(path)?;
    configure_connection(&conn)?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.pragma_update(None::<DatabaseName>, "journal_mode", "WAL")?;
    conn.pragma_update(None::<DatabaseName>, "synchronous", "NORMAL")?;
    conn.pragma_update(None::<DatabaseName>, "foreign_keys", "ON")?;
    conn.pragma_update(None::<DatabaseName>, "busy_timeout", 5000i64)?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(())
}

fn apply_migrations(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
);
"#,
    )?;

    for migration in MIGRATIONS {
        let already_applied: Option<i64> = tx
            .query_row(
                "SELECT version FROM schema_migrations WHERE version = ?1",
                params![migration.version],
                |row| row.get(0),
            )
            .optional()?;

        if already_applied.is_some() {
            continue;
        }

        log::debug!(
            "applying migration {} ({})",
            migration.version,
            migration.name
        );
        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![migration.version, migration.name, now_utc_rfc3339()],
        )?;
    }

    tx.execute(
        r#"
INSERT INTO meta (key, value)
VALUES ('schema_version', ?1)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
"#,
        params![CURRENT_SCHEMA_VERSION.to_string()],
    )?;

    tx.commit()
}

pub fn now_utc_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .expect("RFC3339 formatting for UTC timestamp should never fail")
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProfileRecord {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub created_at: String,
}

fn profile_from_row(row: &Row<'_>) -> Result<ProfileRecord> {
    Ok(ProfileRecord {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        created_at: row.get(3)?,
    })
}

pub fn insert_profile(conn: &Connection, username: &str, email: Option<&str>) -> Result<i64> {
    conn.execute(
        "INSERT INTO profiles (username, email, created_at) VALUES (?1, ?2, ?3)",
        params![username, email, now_utc_rfc3339()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_profile_by_username(conn: &Connection, username: &str) -> Result<Option<ProfileRecord>> {
    conn.query_row(
        "SELECT id, username, email, created_at FROM profiles WHERE username = ?1",
        params![username],
        profile_from_row,
    )
    .optional()
}

pub fn list_profiles(conn: &Connection) -> Result<Vec<ProfileRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, email, created_at FROM profiles ORDER BY username ASC, id ASC",
    )?;
    let rows = stmt.query_map([], profile_from_row)?;
    rows.collect()
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProjectRecord {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub created_at: String,
}

fn project_from_row(row: &Row<'_>) -> Result<ProjectRecord> {
    Ok(ProjectRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        status: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub fn insert_project(
    conn: &Connection,
    name: &str,
    description: Option<&str>,
    status: &str,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO projects (name, description, status, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![name, description, status, now_utc_rfc3339()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_project(conn: &Connection, id: i64) -> Result<Option<ProjectRecord>> {
    conn.query_row(
        "SELECT id, name, description, status, created_at FROM projects WHERE id = ?1",
        params![id],
        project_from_row,
    )
    .optional()
}

pub fn list_projects(conn: &Connection) -> Result<Vec<ProjectRecord>> {
    let mut stmt = conn.prepare(
        r#"
SELECT id, name, description, status, created_at
FROM projects
ORDER BY id DESC
"#,
    )?;
    let rows = stmt.query_map([], project_from_row)?;
    rows.collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRecord {
    pub id: i64,
    pub project_id: i64,
    pub project_name: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub severity: String,
    pub issue_type: String,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    pub evidence_url: Option<String>,
    pub log_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

const ISSUE_SELECT: &str = r#"
SELECT
    i.id, i.project_id, p.name, i.title, i.description, i.status, i.priority,
    i.severity, i.issue_type, creator.username, assignee.username,
    i.evidence_url, i.log_url, i.created_at, i.updated_at
FROM issues i
JOIN projects p ON p.id = i.project_id
LEFT JOIN profiles creator ON creator.id = i.created_by
LEFT JOIN profiles assignee ON assignee.id = i.assigned_to
"#;

fn issue_from_row(row: &Row<'_>) -> Result<IssueRecord> {
    Ok(IssueRecord {
        id: row.get(0)?,
        project_id: row.get(1)?,
        project_name: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        status: row.get(5)?,
        priority: row.get(6)?,
        severity: row.get(7)?,
        issue_type: row.get(8)?,
        created_by: row.get(9)?,
        assigned_to: row.get(10)?,
        evidence_url: row.get(11)?,
        log_url: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

pub struct InsertIssue<'a> {
    pub project_id: i64,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub status: &'a str,
    pub priority: &'a str,
    pub severity: &'a str,
    pub issue_type: &'a str,
    pub created_by: Option<i64>,
    pub assigned_to: Option<i64>,
    pub evidence_url: Option<&'a str>,
    pub log_url: Option<&'a str>,
}

pub fn insert_issue(conn: &Connection, args: &InsertIssue<'_>) -> Result<i64> {
    let now = now_utc_rfc3339();
    conn.execute(
        r#"
INSERT INTO issues (
    project_id, title, description, status, priority, severity, issue_type,
    created_by, assigned_to, evidence_url, log_url, created_at, updated_at
)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
"#,
        params![
            args.project_id,
            args.title,
            args.description,
            args.status,
            args.priority,
            args.severity,
            args.issue_type,
            args.created_by,
            args.assigned_to,
            args.evidence_url,
            args.log_url,
            now
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub struct UpdateIssue<'a> {
    pub id: i64,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub status: &'a str,
    pub priority: &'a str,
    pub severity: &'a str,
    pub assigned_to: Option<i64>,
}

pub fn update_issue(conn: &Connection, args: &UpdateIssue<'_>) -> Result<()> {
    conn.execute(
        r#"
UPDATE issues SET
    title = ?2,
    description = ?3,
    status = ?4,
    priority = ?5,
    severity = ?6,
    assigned_to = ?7,
    updated_at = ?8
WHERE id = ?1
"#,
        params![
            args.id,
            args.title,
            args.description,
            args.status,
            args.priority,
            args.severity,
            args.assigned_to,
            now_utc_rfc3339()
        ],
    )?;
    Ok(())
}

pub fn get_issue(conn: &Connection, id: i64) -> Result<Option<IssueRecord>> {
    let sql = format!("{ISSUE_SELECT} WHERE i.id = ?1");
    conn.query_row(&sql, params![id], issue_from_row).optional()
}

/// Raw assignee id, which the joined record only exposes as a username.
pub fn get_issue_assignee_id(conn: &Connection, id: i64) -> Result<Option<i64>> {
    let value: Option<Option<i64>> = conn
        .query_row(
            "SELECT assigned_to FROM issues WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value.flatten())
}

pub fn list_issues(conn: &Connection, project_id: Option<i64>) -> Result<Vec<IssueRecord>> {
    let sql = format!(
        "{ISSUE_SELECT} WHERE (?1 IS NULL OR i.project_id = ?1) ORDER BY i.id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![project_id], issue_from_row)?;
    rows.collect()
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NoteRecord {
    pub id: i64,
    pub issue_id: i64,
    pub username: Option<String>,
    pub note: String,
    pub created_at: String,
}

fn note_from_row(row: &Row<'_>) -> Result<NoteRecord> {
    Ok(NoteRecord {
        id: row.get(0)?,
        issue_id: row.get(1)?,
        username: row.get(2)?,
        note: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub fn insert_note(conn: &Connection, issue_id: i64, user_id: i64, note: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO notes (issue_id, user_id, note, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![issue_id, user_id, note, now_utc_rfc3339()],
    )?;
    Ok(conn.last_insert_rowid())
}

const NOTE_SELECT: &str = r#"
SELECT n.id, n.issue_id, author.username, n.note, n.created_at
FROM notes n
LEFT JOIN profiles author ON author.id = n.user_id
"#;

pub fn get_note(conn: &Connection, id: i64) -> Result<Option<NoteRecord>> {
    let sql = format!("{NOTE_SELECT} WHERE n.id = ?1");
    conn.query_row(&sql, params![id], note_from_row).optional()
}

pub fn list_notes(conn: &Connection, issue_id: i64) -> Result<Vec<NoteRecord>> {
    let sql = format!("{NOTE_SELECT} WHERE n.issue_id = ?1 ORDER BY n.id ASC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![issue_id], note_from_row)?;
    rows.collect()
}
