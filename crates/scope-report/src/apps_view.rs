//! Listing of the monitored processes and their applications.

use scope_core::settings::Verbosity;
use scope_data::selector::AppEntry;

use crate::layout::{align, RenderedTable};

/// Render the apps list. Quiet mode drops the PID column; the caller
/// decides whether system processes are part of `apps`.
pub fn render_apps(apps: &[AppEntry], verbosity: Verbosity) -> RenderedTable {
    match verbosity {
        Verbosity::Quiet => align(
            &["UID", "APP PACKAGE"],
            apps.iter()
                .map(|a| vec![a.uid.to_string(), a.app.clone()])
                .collect(),
        ),
        Verbosity::Normal | Verbosity::Verbose => align(
            &["PID", "UID", "APP PACKAGE"],
            apps.iter()
                .map(|a| vec![a.pid.to_string(), a.uid.to_string(), a.app.clone()])
                .collect(),
        ),
    }
}
