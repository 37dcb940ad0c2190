//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `taskdeck_core` linkage.
//! - Optionally summarize the sections stored in a database file.

use taskdeck_core::db::open_db;
use taskdeck_core::{ProjectStore, Section, SqliteBlobStore, StoreConfig};

fn main() {
    println!("taskdeck_core ping={}", taskdeck_core::ping());
    println!("taskdeck_core version={}", taskdeck_core::core_version());

    let Some(db_path) = std::env::args().nth(1) else {
        return;
    };
    if let Err(err) = print_summary(&db_path) {
        eprintln!("taskdeck_cli error={err}");
        std::process::exit(1);
    }
}

fn print_summary(db_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_db(db_path)?;
    let blob = SqliteBlobStore::try_new(&conn)?;
    let store = ProjectStore::load(blob, StoreConfig::default());

    let report = store.load_report();
    if let Some(reason) = &report.read_error {
        println!("store read_failed=true error={reason}");
    }
    if let Some(reason) = &report.discarded {
        println!("store recovered=true reason={reason}");
    }
    let view = store.sections();
    for section in Section::ALL {
        let projects = view.get(section);
        let open_tasks: usize = projects
            .iter()
            .map(|project| {
                let progress = project.progress();
                progress.total - progress.completed
            })
            .sum();
        println!(
            "section={} projects={} open_tasks={}",
            section.as_str(),
            projects.len(),
            open_tasks
        );
    }
    let manual = store.manual_sections();
    if !manual.is_empty() {
        let names = manual.iter().map(Section::as_str).collect::<Vec<_>>();
        println!("manual_order={}", names.join(","));
    }
    println!("dark_mode={}", store.dark_mode());
    Ok(())
}
