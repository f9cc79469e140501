mod app;
mod checklist;
mod cli;
mod cli_ops;
mod completions;
mod config;
mod db;
mod domain;
mod ui;

use std::io::Read;
use std::path::Path;

use checklist::ChecklistTarget;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn print_json(value: &impl serde::Serialize) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).expect("json serialization should work")
    );
}

fn init_logging(verbose: u8, config: &config::Config) {
    let mut builder = env_logger::Builder::new();
    builder.format_timestamp(None);
    if std::env::var_os("RUST_LOG").is_some() {
        builder.parse_default_env();
    } else {
        let level = match verbose {
            0 => config.log_filter().unwrap_or(log::LevelFilter::Warn),
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        builder.filter_level(level);
    }
    let _ = builder.try_init();
}

fn run() -> Result<(), app::AppError> {
    use clap::Parser;
    use cli::{
        ChecklistSubcommands, Commands, IssueSubcommands, NoteSubcommands, ProjectSubcommands,
        UserSubcommands,
    };

    let cli = cli::Cli::parse();
    let config = config::Config::load(&cli.config)?;
    init_logging(cli.verbose, &config);

    if let Commands::Completions(args) = &cli.command {
        return completions::run_completions_command(args.shell.as_deref());
    }

    let user = cli.user.clone().or_else(|| config.user.clone());
    let app = app::App::open(&cli.db)?
        .with_user(user)
        .with_issue_defaults(config.issue_defaults);

    match cli.command {
        Commands::User(args) => match args.command {
            UserSubcommands::Add(add) => {
                let profile = app.create_profile(&add.username, add.email.as_deref())?;
                println!("created user {} (#{})", profile.username, profile.id);
            }
            UserSubcommands::Ls(ls) => {
                let profiles = app.list_profiles()?;
                if ls.json {
                    print_json(&profiles);
                } else {
                    ui::print_profile_list(&profiles);
                }
            }
        },
        Commands::Project(args) => match args.command {
            ProjectSubcommands::New(new) => {
                let project =
                    app.create_project(&new.name, new.desc.as_deref(), new.status.as_deref())?;
                println!(
                    "created project #{} {} [{}]",
                    project.id, project.name, project.status
                );
            }
            ProjectSubcommands::Ls(ls) => {
                let projects = app.list_projects()?;
                if ls.json {
                    print_json(&projects);
                } else {
                    ui::print_project_list(&projects);
                }
            }
            ProjectSubcommands::Show(show) => match app.show_project(show.id)? {
                Some(project) => {
                    if show.json {
                        print_json(&project);
                    } else {
                        ui::print_project_show(&project);
                    }
                }
                None => return Err(app::AppError::not_found("project", show.id)),
            },
        },
        Commands::Issue(args) => match args.command {
            IssueSubcommands::New(new) => {
                let issue = app.create_issue(app::NewIssue {
                    project_id: new.project,
                    title: new.title,
                    description: new.desc,
                    priority: new.priority,
                    severity: new.severity,
                    issue_type: new.issue_type,
                    assignee: new.assignee,
                    evidence_url: new.evidence_url,
                    log_url: new.log_url,
                    checklist: new.items,
                })?;
                let palette = ui::Palette::auto();
                println!(
                    "created {} {} {}",
                    palette.id(&format!("#{}", issue.id)),
                    palette.status(issue.status),
                    issue.title
                );
            }
            IssueSubcommands::Ls(ls) => {
                let mut issues = app.list_issues(ls.project)?;
                if ls.open_only {
                    issues.retain(|issue| issue.status.is_open());
                }
                if ls.json {
                    print_json(&issues);
                } else {
                    ui::print_issue_list(&issues, ls.project, ls.open_only);
                }
            }
            IssueSubcommands::Show(show) => match app.show_issue(show.id)? {
                Some(detail) => {
                    if show.json {
                        print_json(&detail);
                    } else {
                        ui::print_issue_show(&detail);
                    }
                }
                None => return Err(app::AppError::not_found("issue", show.id)),
            },
            IssueSubcommands::Status(status) => {
                let issue = app.set_issue_status(status.id, &status.status)?;
                println!("updated #{} -> {}", issue.id, issue.status);
            }
            IssueSubcommands::Update(update) => {
                let issue = app.update_issue(
                    update.id,
                    app::IssuePatch {
                        title: update.title,
                        description: update.description,
                        priority: update.priority,
                        severity: update.severity,
                        assignee: update.assignee,
                    },
                )?;
                println!("updated #{} [{}] {}", issue.id, issue.status, issue.title);
            }
        },
        Commands::Checklist(args) => match args.command {
            ChecklistSubcommands::Ls(ls) => {
                let items = app.list_checklist(ls.issue)?;
                if ls.json {
                    print_json(&items);
                } else {
                    ui::print_checklist(ls.issue, &items);
                }
            }
            ChecklistSubcommands::Toggle(toggle) => {
                let item = app.toggle_checklist_item(toggle.item, toggle.completed())?;
                ui::print_checklist_item(&item);
            }
            ChecklistSubcommands::Set(set) => {
                let submitted = match &set.file {
                    Some(path) => read_targets(path)?,
                    None => set.items,
                };
                let targets = checked_submission(submitted, set.clear)?;
                let view = app.reconcile_checklist(set.issue, &targets, set.dry_run)?;
                if set.json {
                    print_json(&view);
                } else {
                    ui::print_checklist_sync(&view);
                }
            }
        },
        Commands::Note(args) => match args.command {
            NoteSubcommands::Add(add) => {
                let note = app.add_note(add.issue, &add.text)?;
                println!("added note #{} to issue #{}", note.id, note.issue_id);
            }
            NoteSubcommands::Ls(ls) => {
                let notes = app.list_notes(ls.issue)?;
                if ls.json {
                    print_json(&notes);
                } else {
                    ui::print_notes(ls.issue, &notes);
                }
            }
        },
        Commands::Completions(_) => unreachable!("completions return before app initialization"),
    }

    Ok(())
}

/// An empty submission deletes every item, so it needs `--clear`.
fn checked_submission(
    targets: Vec<ChecklistTarget>,
    clear: bool,
) -> Result<Vec<ChecklistTarget>, app::AppError> {
    match (targets.is_empty(), clear) {
        (true, false) => Err(app::AppError::InvalidArgument(
            "empty checklist; pass --clear to delete every item".to_string(),
        )),
        (false, true) => Err(app::AppError::InvalidArgument(format!(
            "--clear deletes every item but {} item(s) were submitted",
            targets.len()
        ))),
        _ => Ok(targets),
    }
}

/// Reads a JSON array of checklist targets from a file, or stdin for `-`.
fn read_targets(path: &Path) -> Result<Vec<ChecklistTarget>, app::AppError> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&raw)?)
}
