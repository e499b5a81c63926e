use std::io::Write;

use anyhow::Result;
use clap::CommandFactory;
use scope_core::settings::{Settings, Verbosity};
use scope_data::analysis::analyze_pairs;
use scope_data::packages::PackageRegistry;
use scope_data::reader::{locate_log_files, pair_log_files};
use scope_data::selector::{collect_pid_uids, monitored_apps, resolve_target, IdentityQuery};
use scope_report::apps_view::render_apps;
use scope_report::stats_view::render_stats;
use scope_report::write_table;
use tracing::{info, warn};

/// No action given: print usage.
pub fn help<W: Write>(out: &mut W) -> Result<()> {
    Settings::command().write_help(out)?;
    out.flush()?;
    Ok(())
}

/// `--list`: print every monitored PID with its UID and package.
pub fn list_apps<W: Write>(settings: &Settings, out: &mut W) -> Result<()> {
    let source = settings.source_dir.as_path();
    let registry = PackageRegistry::load(source)?;
    let pids = collect_pid_uids(&locate_log_files(source).raw)?;

    let verbosity = settings.verbosity();
    let apps = monitored_apps(&pids, &registry, verbosity == Verbosity::Verbose);
    write_table(out, &render_apps(&apps, verbosity), settings.grep_pattern())?;
    Ok(())
}

/// `--pid` / `--uid` / `--app`: print the power report of one target.
pub fn report<W: Write>(settings: &Settings, out: &mut W) -> Result<()> {
    let source = settings.source_dir.as_path();
    let registry = PackageRegistry::load(source)?;
    let files = locate_log_files(source);
    let pids = collect_pid_uids(&files.raw)?;

    let query = IdentityQuery {
        pid: settings.pid,
        uid: settings.uid,
        app: settings.app_name(),
    };
    let Some(target) = resolve_target(query, &pids, &registry, source)? else {
        return Ok(());
    };
    info!(
        "Target: PID {}, UID {}, app {}",
        target.pid.map_or_else(|| "-".to_string(), |p| p.to_string()),
        target.uid,
        target.app
    );

    let options = settings.analysis_options();
    let pairs = pair_log_files(files, options.pairing)?;
    let result = analyze_pairs(&pairs, target.selector, &options)?;

    if !result.skipped.is_empty() {
        warn!(
            "{} of {} file pairs skipped because of malformed data",
            result.skipped.len(),
            pairs.len()
        );
    }
    if result.table.is_empty() {
        warn!("No samples found for {}", target.app);
    }

    let rendered = render_stats(&result.table, settings.verbosity());
    write_table(out, &rendered, settings.grep_pattern())?;
    Ok(())
}
