use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use serde_json::Value;
use uuid::Uuid;

struct Workspace {
    root: PathBuf,
}

impl Workspace {
    fn new(prefix: &str) -> Self {
        let root = std::env::temp_dir().join(format!("{prefix}-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&root).expect("workspace should be creatable");
        Self { root }
    }

    fn db(&self) -> PathBuf {
        self.root.join("mantis.sqlite")
    }

    fn config(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    fn command(&self, user: Option<&str>, args: &[&str]) -> Command {
        let mut command = Command::new(env!("CARGO_BIN_EXE_mantis"));
        command
            .env_remove("MANTIS_USER")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1")
            .arg("--db")
            .arg(self.db())
            .arg("--config")
            .arg(self.config());
        if let Some(user) = user {
            command.arg("--user").arg(user);
        }
        command.args(args);
        command
    }

    fn run(&self, user: Option<&str>, args: &[&str]) -> Output {
        self.command(user, args)
            .output()
            .expect("mantis command should run")
    }

    fn run_with_stdin(&self, user: Option<&str>, args: &[&str], stdin: &str) -> Output {
        let mut child = self
            .command(user, args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("mantis command should spawn");
        child
            .stdin
            .take()
            .expect("stdin should be piped")
            .write_all(stdin.as_bytes())
            .expect("stdin should be writable");
        child.wait_with_output().expect("mantis command should finish")
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.run(Some("ana"), args);
        assert_success(&output);
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "expected success but failed.\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn assert_failure(output: &Output) {
    assert!(
        !output.status.success(),
        "expected failure but command succeeded.\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn seed(workspace: &Workspace) {
    assert_success(&workspace.run(None, &["user", "add", "ana"]));
    assert_success(&workspace.run(None, &["project", "new", "Mantis"]));
}

fn checklist_items(workspace: &Workspace, issue: &str) -> Vec<(i64, String, bool)> {
    let value = workspace.json(&["checklist", "ls", issue, "--json"]);
    value
        .as_array()
        .expect("checklist should be an array")
        .iter()
        .map(|item| {
            (
                item["id"].as_i64().expect("id"),
                item["content"].as_str().expect("content").to_string(),
                item["is_completed"].as_bool().expect("flag"),
            )
        })
        .collect()
}

#[test]
fn issue_lifecycle_round_trips_through_json() {
    let workspace = Workspace::new("mantis-cli-issue");
    seed(&workspace);

    let created = workspace.run(
        Some("ana"),
        &["issue", "new", "1", "Crash on save", "-S", "crash", "-a", "ana"],
    );
    assert_success(&created);
    assert!(String::from_utf8_lossy(&created.stdout).contains("created #1 [NEW] Crash on save"));

    assert_success(&workspace.run(None, &["issue", "status", "1", "resolved"]));
    assert_success(&workspace.run(Some("ana"), &["note", "add", "1", "fixed in main"]));

    let shown = workspace.json(&["issue", "show", "1", "--json"]);
    assert_eq!(shown["title"], "Crash on save");
    assert_eq!(shown["status"], "resolved");
    assert_eq!(shown["severity"], "crash");
    assert_eq!(shown["assigned_to"], "ana");
    assert_eq!(shown["project_name"], "Mantis");
    assert_eq!(shown["notes"][0]["note"], "fixed in main");
    assert_eq!(shown["checklist"], Value::Array(Vec::new()));

    let open = workspace.json(&["issue", "ls", "--open", "--json"]);
    assert_eq!(open, Value::Array(Vec::new()));
}

#[test]
fn checklist_set_reconciles_from_items_and_stdin() {
    let workspace = Workspace::new("mantis-cli-checklist");
    seed(&workspace);
    assert_success(&workspace.run(
        Some("ana"),
        &["issue", "new", "1", "Release", "-k", "checklist", "-i", "A", "-i", "B"],
    ));
    assert_success(&workspace.run(None, &["checklist", "toggle", "2", "--done"]));
    assert_eq!(
        checklist_items(&workspace, "1"),
        vec![(1, "A".to_string(), false), (2, "B".to_string(), true)]
    );

    let preview = workspace.json(&[
        "checklist", "set", "1", "-i", "#1:A2", "-i", "C", "--dry-run", "--json",
    ]);
    assert_eq!(preview["applied"], false);
    assert_eq!(preview["deleted"], serde_json::json!([2]));
    assert_eq!(checklist_items(&workspace, "1").len(), 2);

    assert_success(&workspace.run(None, &["checklist", "set", "1", "-i", "#1:A2", "-i", "C"]));
    assert_eq!(
        checklist_items(&workspace, "1"),
        vec![(1, "A2".to_string(), false), (3, "C".to_string(), false)]
    );

    let stdin = r#"[{"id": 3, "content": "C", "isCompleted": true}, {"content": "D"}]"#;
    let output = workspace.run_with_stdin(None, &["checklist", "set", "1", "--file", "-"], stdin);
    assert_success(&output);
    assert_eq!(
        checklist_items(&workspace, "1"),
        vec![(3, "C".to_string(), true), (4, "D".to_string(), false)]
    );

    assert_success(&workspace.run(None, &["checklist", "set", "1", "--clear"]));
    assert!(checklist_items(&workspace, "1").is_empty());
}

#[test]
fn checklist_set_rejects_unknown_ids_without_writing() {
    let workspace = Workspace::new("mantis-cli-reject");
    seed(&workspace);
    assert_success(&workspace.run(
        Some("ana"),
        &["issue", "new", "1", "Release", "-k", "checklist", "-i", "A"],
    ));

    let output = workspace.run(None, &["checklist", "set", "1", "-i", "#99:ghost", "-i", "new"]);
    assert_failure(&output);
    assert!(stderr(&output).starts_with("error: checklist not saved"));
    assert_eq!(
        checklist_items(&workspace, "1"),
        vec![(1, "A".to_string(), false)]
    );

    let missing_input = workspace.run(None, &["checklist", "set", "1"]);
    assert_failure(&missing_input);
}

#[test]
fn checklist_set_empty_file_requires_clear() {
    let workspace = Workspace::new("mantis-cli-empty-file");
    seed(&workspace);
    assert_success(&workspace.run(
        Some("ana"),
        &["issue", "new", "1", "Release", "-k", "checklist", "-i", "A", "-i", "B"],
    ));

    let output = workspace.run_with_stdin(None, &["checklist", "set", "1", "--file", "-"], "[]");
    assert_failure(&output);
    assert!(stderr(&output).contains("pass --clear"));
    assert_eq!(
        checklist_items(&workspace, "1"),
        vec![(1, "A".to_string(), false), (2, "B".to_string(), false)]
    );

    let output = workspace.run_with_stdin(
        None,
        &["checklist", "set", "1", "--file", "-", "--clear"],
        r#"[{"id": 1, "content": "A"}]"#,
    );
    assert_failure(&output);
    assert_eq!(checklist_items(&workspace, "1").len(), 2);

    let output = workspace.run_with_stdin(
        None,
        &["checklist", "set", "1", "--file", "-", "--clear"],
        "[]",
    );
    assert_success(&output);
    assert!(checklist_items(&workspace, "1").is_empty());
}

#[test]
fn acting_user_comes_from_config_file() {
    let workspace = Workspace::new("mantis-cli-config");
    seed(&workspace);

    let anonymous = workspace.run(None, &["issue", "new", "1", "No reporter"]);
    assert_failure(&anonymous);
    assert!(stderr(&anonymous).contains("no acting user"));

    std::fs::write(
        workspace.config(),
        "user = \"ana\"\n\n[issue_defaults]\npriority = \"high\"\n",
    )
    .expect("config should be writable");
    assert_success(&workspace.run(None, &["issue", "new", "1", "From config"]));
    let issues = workspace.json(&["issue", "ls", "--json"]);
    assert_eq!(issues[0]["created_by"], "ana");
    assert_eq!(issues[0]["priority"], "high");

    std::fs::write(workspace.config(), "color = true\n").expect("config should be writable");
    let bad = workspace.run(None, &["user", "ls"]);
    assert_failure(&bad);
    assert!(stderr(&bad).contains("invalid config TOML"));
}

#[test]
fn missing_entities_exit_nonzero() {
    let workspace = Workspace::new("mantis-cli-missing");
    for args in [
        &["issue", "show", "42"][..],
        &["project", "show", "7"][..],
        &["checklist", "toggle", "5"][..],
        &["note", "ls", "3"][..],
    ] {
        let output = workspace.run(None, args);
        assert_failure(&output);
        assert!(stderr(&output).contains("not found"), "{:?}", args);
    }
}

#[test]
fn completions_print_script_for_named_shell() {
    let workspace = Workspace::new("mantis-cli-completions");
    let output = workspace.run(None, &["completions", "bash"]);
    assert_success(&output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("mantis"));
    assert!(!workspace.db().exists(), "completions should not open the db");
}

