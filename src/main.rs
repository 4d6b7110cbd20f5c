use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use journal_pages::app::{App, Theme};
use journal_pages::config::Config;
use journal_pages::cookie_jar::CookieJar;
use journal_pages::journal::Journal;
use journal_pages::ui::UI;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    color_eyre::install()?;
    let config = Config::parse();
    init_logging(&config)?;

    let jar = CookieJar::open(config.jar_path()).with_max_value_bytes(config.max_value_bytes);
    info!(jar = %jar.path().display(), "starting journal");

    let (journal, outcome) = Journal::load(jar, config.date);
    let theme = if config.dark { Theme::Dark } else { Theme::Light };
    let mut app = App::new(journal, &outcome, theme);
    let mut ui = UI::new()?;

    while !app.quit {
        ui.display(&app)?;
        ui.handle_input(&mut app)?;
    }

    info!(pages = app.journal.pages().len(), "journal closed");
    Ok(())
}

fn init_logging(config: &Config) -> Result<()> {
    let path = config.log_path();
    ensure_parent(&path)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| eyre!("Failed to open log file {}: {}", path.display(), e))?;

    let default_level = if config.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
