use std::io::{self, IsTerminal};

use crate::app::{ChecklistSyncView, IssueDetail, IssueView};
use crate::checklist::ChecklistItem;
use crate::db::{NoteRecord, ProfileRecord, ProjectRecord};
use crate::domain::{IssueStatus, Priority};

pub fn print_profile_list(profiles: &[ProfileRecord]) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Users"));
    if profiles.is_empty() {
        println!("{}", palette.dim("no users yet"));
        return;
    }
    for profile in profiles {
        let mut line = format!("{} {}", palette.id(&format!("#{}", profile.id)), profile.username);
        if let Some(email) = profile.email.as_deref() {
            line.push(' ');
            line.push_str(&palette.dim(&format!("<{email}>")));
        }
        println!("{line}");
    }
}

pub fn print_project_list(projects: &[ProjectRecord]) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Projects"));
    if projects.is_empty() {
        println!("{}", palette.dim("no projects yet"));
        return;
    }
    for project in projects {
        println!("{}", format_project_row(project, &palette));
    }
    println!("{}", palette.dim(&format!("{} project(s)", projects.len())));
}

pub fn print_project_show(project: &ProjectRecord) {
    let palette = Palette::auto();
    println!("{}", format_project_row(project, &palette));
    if let Some(description) = project.description.as_deref() {
        println!("  {description}");
    }
    println!("{}", palette.dim(&format!("  created {}", project.created_at)));
}

fn format_project_row(project: &ProjectRecord, palette: &Palette) -> String {
    format!(
        "{} {} {}",
        palette.id(&format!("#{}", project.id)),
        palette.tag(&format!("[{}]", project.status)),
        project.name
    )
}

pub fn print_issue_list(issues: &[IssueView], project: Option<i64>, open_only: bool) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Issues"));
    if let Some(summary) = filter_summary(project, open_only) {
        println!("{}", palette.dim(&format!("filters: {summary}")));
    }

    if issues.is_empty() {
        println!("{}", palette.dim("no issues matched"));
        return;
    }
    for issue in issues {
        println!("{}", format_issue_row(issue, &palette));
    }
    println!("{}", palette.dim(&format!("{} issue(s)", issues.len())));
}

pub fn print_issue_show(detail: &IssueDetail) {
    let palette = Palette::auto();
    let issue = &detail.issue;
    println!("{}", format_issue_row(issue, &palette));
    println!(
        "  project: {} ({})",
        issue.project_name,
        palette.id(&format!("#{}", issue.project_id))
    );
    println!(
        "  reporter: {}  assignee: {}",
        issue.created_by.as_deref().unwrap_or("-"),
        issue.assigned_to.as_deref().unwrap_or("-")
    );
    if let Some(description) = issue.description.as_deref() {
        println!();
        for line in description.lines() {
            println!("  {line}");
        }
    }
    for (label, reference) in [("evidence", &issue.evidence_url), ("log", &issue.log_url)] {
        if let Some(reference) = reference.as_deref() {
            println!("  {label}: {reference}");
        }
    }
    println!(
        "{}",
        palette.dim(&format!(
            "  created {}  updated {}",
            issue.created_at, issue.updated_at
        ))
    );

    if !detail.checklist.is_empty() {
        println!();
        println!(
            "{} {}",
            palette.heading("Checklist"),
            palette.dim(&checklist_progress(&detail.checklist))
        );
        for item in &detail.checklist {
            println!("  {}", format_checklist_item(item, &palette));
        }
    }
    if !detail.notes.is_empty() {
        println!();
        println!("{}", palette.heading("Notes"));
        for note in &detail.notes {
            println!("  {}", format_note(note, &palette));
        }
    }
}

fn format_issue_row(issue: &IssueView, palette: &Palette) -> String {
    let mut line = format!(
        "{} {} {} {}",
        palette.id(&format!("#{}", issue.id)),
        palette.status(issue.status),
        palette.priority(issue.priority),
        issue.title
    );
    line.push(' ');
    line.push_str(&palette.tag(&format!("({}, {})", issue.severity, issue.issue_type)));
    if let Some(assignee) = issue.assigned_to.as_deref() {
        line.push(' ');
        line.push_str(&palette.dim(&format!("@{assignee}")));
    }
    line
}

fn filter_summary(project: Option<i64>, open_only: bool) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(project) = project {
        parts.push(format!("project={project}"));
    }
    if open_only {
        parts.push("open=true".to_string());
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

pub fn print_checklist(issue_id: i64, items: &[ChecklistItem]) {
    let palette = Palette::auto();
    println!(
        "{} {}",
        palette.heading(&format!("Checklist for issue #{issue_id}")),
        palette.dim(&checklist_progress(items))
    );
    if items.is_empty() {
        println!("{}", palette.dim("no checklist items"));
        return;
    }
    for item in items {
        println!("{}", format_checklist_item(item, &palette));
    }
}

pub fn print_checklist_item(item: &ChecklistItem) {
    let palette = Palette::auto();
    println!("updated {}", format_checklist_item(item, &palette));
}

pub fn print_checklist_sync(view: &ChecklistSyncView) {
    let palette = Palette::auto();
    let verb = if view.applied { "applied" } else { "would apply" };
    println!(
        "{} checklist for issue #{}: {} deleted, {} updated, {} inserted",
        verb,
        view.issue_id,
        view.deleted.len(),
        view.updated,
        view.inserted
    );
    if !view.deleted.is_empty() {
        let ids = view
            .deleted
            .iter()
            .map(|id| format!("#{id}"))
            .collect::<Vec<_>>();
        println!("{}", palette.dim(&format!("deleted: {}", ids.join(" "))));
    }
    for item in &view.items {
        println!("{}", format_checklist_item(item, &palette));
    }
}

fn format_checklist_item(item: &ChecklistItem, palette: &Palette) -> String {
    let mark = if item.is_completed {
        palette.done("[x]")
    } else {
        "[ ]".to_string()
    };
    format!(
        "{} {} {}",
        mark,
        palette.id(&format!("{}:", item.id)),
        item.content
    )
}

fn checklist_progress(items: &[ChecklistItem]) -> String {
    let done = items.iter().filter(|item| item.is_completed).count();
    format!("({done}/{} done)", items.len())
}

pub fn print_notes(issue_id: i64, notes: &[NoteRecord]) {
    let palette = Palette::auto();
    println!("{}", palette.heading(&format!("Notes for issue #{issue_id}")));
    if notes.is_empty() {
        println!("{}", palette.dim("no notes"));
        return;
    }
    for note in notes {
        println!("{}", format_note(note, &palette));
    }
}

fn format_note(note: &NoteRecord, palette: &Palette) -> String {
    format!(
        "{} {}: {}",
        palette.dim(&note.created_at),
        note.username.as_deref().unwrap_or("(deleted user)"),
        note.note
    )
}

pub(crate) struct Palette {
    enabled: bool,
}

impl Palette {
    pub(crate) fn auto() -> Self {
        let enabled = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self { enabled }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn heading(&self, text: &str) -> String {
        self.paint("1;36", text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }

    pub(crate) fn id(&self, text: &str) -> String {
        self.paint("1;94", text)
    }

    pub(crate) fn status(&self, status: IssueStatus) -> String {
        let upper = status.as_str().to_ascii_uppercase();
        self.paint(status_color_code(status), &format!("[{upper}]"))
    }

    fn priority(&self, priority: Priority) -> String {
        let code = match priority {
            Priority::Immediate => "1;31",
            Priority::High => "33",
            Priority::Normal | Priority::Low => "90",
        };
        self.paint(code, &format!("!{priority}"))
    }

    fn tag(&self, text: &str) -> String {
        self.paint("35", text)
    }

    fn done(&self, text: &str) -> String {
        self.paint("32", text)
    }
}

fn status_color_code(status: IssueStatus) -> &'static str {
    match status {
        IssueStatus::New => "34",
        IssueStatus::Assigned => "33",
        IssueStatus::Resolved => "32",
        IssueStatus::Closed => "90",
    }
}

#[cfg(test)]
mod tests {
    use super::{checklist_progress, filter_summary, format_checklist_item, format_issue_row, Palette};
    use crate::app::IssueView;
    use crate::checklist::ChecklistItem;
    use crate::domain::{IssueStatus, IssueType, Priority, Severity};

    fn plain() -> Palette {
        Palette { enabled: false }
    }

    fn item(id: i64, content: &str, is_completed: bool) -> ChecklistItem {
        ChecklistItem {
            id,
            issue_id: 1,
            content: content.to_string(),
            is_completed,
        }
    }

    #[test]
    fn filter_summary_formats_only_active_filters() {
        assert_eq!(
            filter_summary(Some(4), true).as_deref(),
            Some("project=4 open=true")
        );
        assert_eq!(filter_summary(None, true).as_deref(), Some("open=true"));
        assert!(filter_summary(None, false).is_none());
    }

    #[test]
    fn issue_row_shows_status_priority_and_assignee() {
        let issue = IssueView {
            id: 12,
            project_id: 1,
            project_name: "Mantis".to_string(),
            title: "Crash on save".to_string(),
            description: None,
            status: IssueStatus::Assigned,
            priority: Priority::High,
            severity: Severity::Crash,
            issue_type: IssueType::Standard,
            created_by: Some("ana".to_string()),
            assigned_to: Some("bo".to_string()),
            evidence_url: None,
            log_url: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        };
        assert_eq!(
            format_issue_row(&issue, &plain()),
            "#12 [ASSIGNED] !high Crash on save (crash, standard) @bo"
        );
    }

    #[test]
    fn checklist_items_render_marks_and_progress() {
        let items = vec![item(1, "Tag", true), item(3, "Publish", false)];
        assert_eq!(format_checklist_item(&items[0], &plain()), "[x] 1: Tag");
        assert_eq!(format_checklist_item(&items[1], &plain()), "[ ] 3: Publish");
        assert_eq!(checklist_progress(&items), "(1/2 done)");
        assert_eq!(checklist_progress(&[]), "(0/0 done)");
    }

    #[test]
    fn enabled_palette_wraps_ansi_codes() {
        let palette = Palette { enabled: true };
        assert_eq!(
            palette.status(IssueStatus::Resolved),
            "\x1b[32m[RESOLVED]\x1b[0m"
        );
        assert_eq!(plain().status(IssueStatus::Resolved), "[RESOLVED]");
    }
}
