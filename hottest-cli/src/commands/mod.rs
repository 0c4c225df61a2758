pub mod gen;
pub mod revert;
pub mod sync;

use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use hottest_sync::{Action, Report};

#[derive(Tabled)]
struct ActionRow {
    #[tabled(rename = "kind")]
    kind: String,
    #[tabled(rename = "item")]
    item: String,
    #[tabled(rename = "action")]
    action: String,
}

fn action_label(action: Action) -> String {
    match action {
        Action::Create => "create".green().bold().to_string(),
        Action::Update => "update".cyan().to_string(),
        Action::Skip => "skip".bright_black().to_string(),
    }
}

/// Summary printed at the end of `sync` and `revert`.
pub fn print_report(report: &Report, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };

    if let Some(dir) = &report.backup {
        println!("{prefix}backup: {}", dir.display());
    }

    if report.actions.is_empty() {
        println!("{prefix}nothing to do");
    } else {
        let rows: Vec<ActionRow> = report
            .actions
            .iter()
            .map(|a| ActionRow {
                kind: a.kind.to_string(),
                item: a.path.to_string(),
                action: action_label(a.action),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        println!(
            "{prefix}{} created, {} updated, {} skipped",
            report.count(Action::Create),
            report.count(Action::Update),
            report.count(Action::Skip),
        );
    }

    for folder in &report.created_folders {
        println!("  +  folder {folder}");
    }
    for (kind, path) in &report.orphans {
        println!("  {}  unreferenced {kind} \"{path}\" left on the server", "?".magenta().bold());
    }
    for warning in &report.warnings {
        println!("  {}  {warning}", "!".yellow().bold());
    }

    if dry_run {
        println!(
            "\n{}",
            "WARNING: dry run enabled. No modifications were done.".yellow()
        );
    }
}
