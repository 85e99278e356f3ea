//! datagrid-tui - browse an account dataset in the terminal
//!
//! Same Component loop as every screen in the crate: events become Actions,
//! Actions update the App, the App draws.

use anyhow::{Context, Result};
use clap::Parser;
use datagrid_tui::action::Action;
use datagrid_tui::app::App;
use datagrid_tui::component::Component;
use datagrid_tui::config::Config;
use datagrid_tui::logging;
use datagrid_tui::model::pagination::Location;
use datagrid_tui::services::dataset;
use datagrid_tui::tui::{Tui, TuiEvent};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about = "Browse, filter, sort and export records in the terminal.")]
struct Args {
    /// Location to open, e.g. `/accounts?status=ACTIVE&page=2`
    #[arg(long, default_value = "/accounts")]
    location: String,

    /// Config file; defaults to ~/.datagrid-tui/config.json
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// CSV dataset, overriding the config
    #[arg(long, value_name = "PATH")]
    dataset: Option<PathBuf>,

    /// Artificial query delay in milliseconds, overriding the config
    #[arg(long, value_name = "MS")]
    latency: Option<u64>,

    /// Write the effective config to the config file and exit
    #[arg(long)]
    write_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(path) = &args.dataset {
        config.dataset_path = Some(path.display().to_string());
    }
    if let Some(latency) = args.latency {
        config.simulated_latency_ms = latency;
    }

    if args.write_config {
        let path = args
            .config
            .clone()
            .or_else(Config::config_path)
            .context("Could not determine config path")?;
        config.save_to(&path)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    if let Some(path) = Config::log_path() {
        // Logging is best effort; the UI works without it
        if let Err(err) = logging::init(&path, &config.log_level) {
            eprintln!("Warning: {:#}", err);
        }
    }

    let location: Location = args
        .location
        .parse()
        .with_context(|| format!("Invalid location '{}'", args.location))?;
    let accounts = dataset::load(&config)?;
    log::info!("starting at {} with {} accounts", location, accounts.len());

    // Setup terminal
    let mut tui = Tui::new()?;
    tui.enter()?;

    let mut app = App::new(config, accounts, location);

    // Main event loop
    let result = run_app(&mut tui, &mut app);

    // Cleanup terminal
    tui.exit()?;

    if let Err(err) = result {
        log::error!("fatal: {:#}", err);
        eprintln!("Error: {:?}", err);
        std::process::exit(1);
    }

    Ok(())
}

/// Run the main application loop
fn run_app(tui: &mut Tui, app: &mut App) -> Result<()> {
    while !app.should_quit {
        let mut draw_result = Ok(());
        tui.draw(|frame| {
            let area = frame.area();
            draw_result = app.draw(frame, area);
        })?;
        draw_result?;

        let action = match tui.next_event()? {
            // Timers and background queries
            TuiEvent::Tick => Some(Action::Tick),
            TuiEvent::Key(key) => app.handle_key_event(key)?,
            TuiEvent::Mouse(mouse) => app.handle_mouse_event(mouse)?,
            TuiEvent::Resize(w, h) => Some(Action::Resize(w, h)),
        };

        // Action might produce a follow-up action
        let mut current_action = action;
        while let Some(a) = current_action {
            current_action = app.update(a)?;
        }
    }

    Ok(())
}
