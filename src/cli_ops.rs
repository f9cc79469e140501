use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::checklist::ChecklistTarget;

#[derive(Debug, Args)]
#[command(
    about = "Checklist commands.",
    long_about = "List, toggle, or replace the items of a checklist issue."
)]
pub struct ChecklistArgs {
    #[command(subcommand)]
    pub command: ChecklistSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum ChecklistSubcommands {
    #[command(about = "List checklist items in id order.", alias = "list")]
    Ls(ChecklistListArgs),
    #[command(about = "Flip one item's completion, or force it with --done/--undone.")]
    Toggle(ChecklistToggleArgs),
    #[command(
        about = "Replace an issue's checklist with the submitted one.",
        long_about = "Replace an issue's checklist with the submitted one.\n\n\
            Items with an id are kept and rewritten, items without an id are \
            created, and stored items missing from the submission are deleted."
    )]
    Set(ChecklistSetArgs),
}

#[derive(Debug, Args)]
pub struct ChecklistListArgs {
    #[arg(help = "Issue id.")]
    pub issue: i64,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ChecklistToggleArgs {
    #[arg(help = "Checklist item id.")]
    pub item: i64,

    #[arg(long, conflicts_with = "undone", help = "Mark the item completed.")]
    pub done: bool,

    #[arg(long, help = "Mark the item not completed.")]
    pub undone: bool,
}

impl ChecklistToggleArgs {
    pub fn completed(&self) -> Option<bool> {
        match (self.done, self.undone) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Debug, Args)]
pub struct ChecklistSetArgs {
    #[arg(help = "Issue id.")]
    pub issue: i64,

    #[arg(
        short = 'f',
        long,
        conflicts_with = "items",
        help = "JSON array of items to submit; '-' reads stdin. An empty array needs --clear."
    )]
    pub file: Option<PathBuf>,

    #[arg(
        short = 'i',
        long = "item",
        value_parser = parse_checklist_item,
        help = "Item as '#ID:content' (existing) or 'content' (new), optionally prefixed '[x] ' (repeatable)."
    )]
    pub items: Vec<ChecklistTarget>,

    #[arg(
        long,
        conflicts_with = "items",
        help = "Delete every item; required when the submission is empty."
    )]
    pub clear: bool,

    #[arg(short = 'n', long = "dry-run", help = "Report the plan without writing.")]
    pub dry_run: bool,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
#[command(about = "Note commands.")]
pub struct NoteArgs {
    #[command(subcommand)]
    pub command: NoteSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum NoteSubcommands {
    #[command(about = "Add a note to an issue as the acting user.")]
    Add(NoteAddArgs),
    #[command(about = "List an issue's notes, oldest first.", alias = "list")]
    Ls(NoteListArgs),
}

#[derive(Debug, Args)]
pub struct NoteAddArgs {
    #[arg(help = "Issue id.")]
    pub issue: i64,

    #[arg(help = "Note text.")]
    pub text: String,
}

#[derive(Debug, Args)]
pub struct NoteListArgs {
    #[arg(help = "Issue id.")]
    pub issue: i64,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

/// Parses one `--item` value. A leading `[x] ` or `[ ] ` sets the completion
/// flag; a `#ID:` prefix refers to an existing item. Anything else, including
/// text like `10:30 standup`, is the content of a new item.
pub fn parse_checklist_item(raw: &str) -> Result<ChecklistTarget, String> {
    let mut rest = raw.trim_start();
    let mut is_completed = None;
    for (marker, flag) in [("[x]", true), ("[X]", true), ("[ ]", false)] {
        if let Some(stripped) = rest.strip_prefix(marker) {
            is_completed = Some(flag);
            rest = stripped.trim_start();
            break;
        }
    }

    let mut id = None;
    if let Some((head, tail)) = rest.strip_prefix('#').and_then(|tagged| tagged.split_once(':')) {
        let head = head.trim();
        if !head.is_empty() && head.chars().all(|ch| ch.is_ascii_digit()) {
            id = Some(
                head.parse::<i64>()
                    .map_err(|err| format!("invalid item id '{head}': {err}"))?,
            );
            rest = tail;
        }
    }

    let content = rest.trim();
    if content.is_empty() {
        return Err(format!("checklist item '{raw}' has no content"));
    }
    Ok(ChecklistTarget {
        id,
        content: content.to_string(),
        is_completed,
    })
}
