use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use jotter::core::config::{self, CliOverrides, JotterConfig};
use jotter::core::preferences::PreferencesStore;
use jotter::storage::LocalStorage;
use jotter::tui;
use jotter::tui::shell::ShellOptions;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

#[derive(Parser)]
#[command(name = "jotter", about = "Terminal note-taking client")]
struct Args {
    /// Theme for this run: dark, light, sepia, solarizedDark or legacy
    #[arg(short, long)]
    theme: Option<String>,

    /// Directory holding the markdown notes
    #[arg(long)]
    notes_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to jotter.log in current directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();

    if let Ok(log_file) = File::create("jotter.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = config::load_config().unwrap_or_else(|e| {
        log::error!("{}; falling back to defaults", e);
        JotterConfig::default()
    });
    let resolved = config::resolve(
        &file_config,
        &CliOverrides {
            theme: args.theme,
            notes_dir: args.notes_dir,
        },
    );

    log::info!(
        "Jotter starting up with notes in {}",
        resolved.notes_dir.display()
    );

    let mut preferences = match resolved.preferences_path.clone() {
        Some(path) => PreferencesStore::load(path, resolved.preferences.clone()),
        None => PreferencesStore::new(resolved.preferences.clone()),
    };
    if let Some(theme) = &resolved.theme_override {
        preferences.override_theme(theme);
    }

    let storage = Arc::new(LocalStorage::new(resolved.notes_dir.clone()));
    let options = ShellOptions {
        show_feature_checklist: resolved.show_feature_checklist,
        ..ShellOptions::default()
    };

    tui::run(storage, preferences, options)
}
