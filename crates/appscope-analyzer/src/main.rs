mod bootstrap;
mod commands;

use anyhow::Result;
use clap::Parser;
use scope_core::settings::Settings;

fn main() -> Result<()> {
    let settings = Settings::parse();

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("AppScope analyzer v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Source directory: {}", settings.source_dir.display());

    let mut stdout = std::io::stdout().lock();
    let result = if !settings.has_action() {
        commands::help(&mut stdout)
    } else if settings.list {
        commands::list_apps(&settings, &mut stdout)
    } else {
        commands::report(&settings, &mut stdout)
    };

    match result {
        // The reader went away (e.g. `| head`); nothing left to do.
        Err(e) if bootstrap::is_broken_pipe(&e) => Ok(()),
        other => other,
    }
}
