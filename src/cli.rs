use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};

pub use crate::cli_ops::*;

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

pub fn styled_command() -> clap::Command {
    Cli::command()
}

#[derive(Debug, Parser)]
#[command(name = "mantis")]
#[command(bin_name = "mantis")]
#[command(version)]
#[command(about = "A local bug tracker with checklist issues")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        short = 'd',
        long,
        env = "MANTIS_DB_PATH",
        default_value = ".mantis/mantis.sqlite",
        help = "Path to the SQLite database."
    )]
    pub db: String,

    #[arg(
        short = 'c',
        long,
        env = "MANTIS_CONFIG",
        default_value = ".mantis/config.toml",
        help = "Path to the TOML config file."
    )]
    pub config: PathBuf,

    #[arg(
        short = 'u',
        long,
        env = "MANTIS_USER",
        help = "Acting username (overrides the config file)."
    )]
    pub user: Option<String>,

    #[arg(
        short = 'v',
        long,
        action = ArgAction::Count,
        help = "Increase log verbosity (-v info, -vv debug, -vvv trace)."
    )]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Manage users.")]
    User(UserArgs),
    #[command(about = "Manage projects.")]
    Project(ProjectArgs),
    #[command(about = "Report, list, and edit issues.")]
    Issue(IssueArgs),
    #[command(about = "Inspect and edit checklist issues.")]
    Checklist(ChecklistArgs),
    #[command(about = "Add and list issue notes.")]
    Note(NoteArgs),
    #[command(about = "Print shell completions.")]
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    #[arg(help = "Shell name (bash, zsh, fish, elvish, powershell). Auto-detected if omitted.")]
    pub shell: Option<String>,
}

#[derive(Debug, Args)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum UserSubcommands {
    #[command(about = "Create a user.")]
    Add(UserAddArgs),
    #[command(about = "List users.", alias = "list")]
    Ls(JsonArgs),
}

#[derive(Debug, Args)]
pub struct UserAddArgs {
    #[arg(help = "Unique username.")]
    pub username: String,

    #[arg(short = 'e', long, help = "Optional email address.")]
    pub email: Option<String>,
}

#[derive(Debug, Args)]
pub struct JsonArgs {
    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub command: ProjectSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum ProjectSubcommands {
    #[command(about = "Create a project.")]
    New(ProjectNewArgs),
    #[command(about = "List projects, newest first.", alias = "list")]
    Ls(JsonArgs),
    #[command(about = "Show one project.")]
    Show(ProjectShowArgs),
}

#[derive(Debug, Args)]
pub struct ProjectNewArgs {
    #[arg(help = "Project name.")]
    pub name: String,

    #[arg(short = 'd', long = "desc", help = "Optional description text.")]
    pub desc: Option<String>,

    #[arg(
        short = 's',
        long,
        help = "Project status (development, release, stable, obsolete)."
    )]
    pub status: Option<String>,
}

#[derive(Debug, Args)]
pub struct ProjectShowArgs {
    #[arg(help = "Project id.")]
    pub id: i64,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct IssueArgs {
    #[command(subcommand)]
    pub command: IssueSubcommands,
}

#[derive(Debug, Subcommand)]
#[allow(clippy::large_enum_variant)]
pub enum IssueSubcommands {
    #[command(about = "Report a new issue.")]
    New(IssueNewArgs),
    #[command(about = "List issues, newest first.", alias = "list")]
    Ls(IssueListArgs),
    #[command(about = "Show one issue with its checklist and notes.")]
    Show(IssueShowArgs),
    #[command(about = "Move an issue to another status.")]
    Status(IssueStatusArgs),
    #[command(about = "Update issue fields.")]
    Update(IssueUpdateArgs),
}

#[derive(Debug, Args)]
pub struct IssueNewArgs {
    #[arg(help = "Project id.")]
    pub project: i64,

    #[arg(help = "Issue title.")]
    pub title: String,

    #[arg(short = 'd', long = "desc", help = "Optional description text.")]
    pub desc: Option<String>,

    #[arg(
        short = 'p',
        long,
        help = "Priority (low, normal, high, immediate)."
    )]
    pub priority: Option<String>,

    #[arg(
        short = 'S',
        long,
        help = "Severity (feature, minor, major, crash)."
    )]
    pub severity: Option<String>,

    #[arg(short = 'k', long = "type", help = "Issue type (standard, checklist).")]
    pub issue_type: Option<String>,

    #[arg(short = 'a', long, help = "Assignee username.")]
    pub assignee: Option<String>,

    #[arg(long = "evidence", help = "Evidence attachment reference.")]
    pub evidence_url: Option<String>,

    #[arg(long = "log", help = "Log attachment reference.")]
    pub log_url: Option<String>,

    #[arg(
        short = 'i',
        long = "item",
        help = "Initial checklist item (repeatable, checklist issues only)."
    )]
    pub items: Vec<String>,
}

#[derive(Debug, Args)]
pub struct IssueListArgs {
    #[arg(short = 'p', long, help = "Only issues in this project.")]
    pub project: Option<i64>,

    #[arg(short = 'o', long = "open", help = "Hide resolved and closed issues.")]
    pub open_only: bool,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct IssueShowArgs {
    #[arg(help = "Issue id.")]
    pub id: i64,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct IssueStatusArgs {
    #[arg(help = "Issue id.")]
    pub id: i64,

    #[arg(help = "Target status (new, assigned, resolved, closed).")]
    pub status: String,
}

#[derive(Debug, Args)]
pub struct IssueUpdateArgs {
    #[arg(help = "Issue id.")]
    pub id: i64,

    #[arg(short = 't', long, help = "Set title.")]
    pub title: Option<String>,

    #[arg(short = 'd', long, help = "Set description (empty clears).")]
    pub description: Option<String>,

    #[arg(short = 'p', long, help = "Set priority.")]
    pub priority: Option<String>,

    #[arg(short = 'S', long, help = "Set severity.")]
    pub severity: Option<String>,

    #[arg(short = 'a', long, help = "Set assignee username (empty unassigns).")]
    pub assignee: Option<String>,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
