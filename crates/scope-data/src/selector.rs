//! Identity resolution: turning a user-supplied PID, UID or package name
//! into the filter applied to samples.

use std::collections::BTreeMap;
use std::path::Path;

use scope_core::models::Selector;
use scope_core::{IdentityKind, Result, ScopeError};
use tracing::{debug, warn};

use crate::packages::{PackageRegistry, SYSTEM_UID};
use crate::parser::{parse_identity, raw_data_lines, read_file};
use crate::reader::LogFile;

/// Package name used when a PID's UID has no manifest entry.
pub const UNKNOWN_APP: &str = "unknown";

/// Package name shown in the apps list for an unregistered UID.
pub const UNLISTED_APP: &str = "?";

/// PID → UID, as first seen in the raw-usage logs.
pub type PidUidMap = BTreeMap<u32, u32>;

/// Build the PID → UID map from every data line of `raw_files`.
///
/// The first UID recorded for a PID wins. Lines too short to carry an
/// identity are logged and skipped.
pub fn collect_pid_uids(raw_files: &[LogFile]) -> Result<PidUidMap> {
    let mut pids = PidUidMap::new();

    for file in raw_files {
        let content = read_file(&file.path)?;
        for (line_no, line) in raw_data_lines(&content) {
            match parse_identity(line) {
                Ok((pid, uid)) => {
                    pids.entry(pid).or_insert(uid);
                }
                Err(e) => warn!("{}", e.at(&file.path, line_no)),
            }
        }
    }

    debug!("Mapped {} PIDs from {} raw files", pids.len(), raw_files.len());
    Ok(pids)
}

// ── Target resolution ─────────────────────────────────────────────────────────

/// What the user asked to report on. Every field is optional; see
/// [`resolve_target`] for precedence.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityQuery<'a> {
    pub pid: Option<u32>,
    pub uid: Option<u32>,
    pub app: Option<&'a str>,
}

/// A fully resolved report target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Set only for process-level reports.
    pub pid: Option<u32>,
    pub uid: u32,
    pub app: String,
    pub selector: Selector,
}

/// Resolve `query` against the logs and the manifest.
///
/// The first identity present wins, in the order PID, UID, app. A PID
/// reports one process; a UID or app reports every process of the
/// application. Returns `Ok(None)` when the query is empty, and
/// [`ScopeError::NotFound`] when the chosen identity is unknown.
pub fn resolve_target(
    query: IdentityQuery<'_>,
    pids: &PidUidMap,
    registry: &PackageRegistry,
    source_dir: &Path,
) -> Result<Option<Target>> {
    let not_found = |kind: IdentityKind, value: String| ScopeError::NotFound {
        kind,
        value,
        source_dir: source_dir.to_path_buf(),
    };

    if let Some(pid) = query.pid {
        let uid = *pids
            .get(&pid)
            .ok_or_else(|| not_found(IdentityKind::Pid, pid.to_string()))?;
        let app = registry.name_for_uid(uid).unwrap_or(UNKNOWN_APP).to_string();
        return Ok(Some(Target {
            pid: Some(pid),
            uid,
            app,
            selector: Selector::Pid(pid),
        }));
    }

    if let Some(uid) = query.uid {
        let app = registry
            .name_for_uid(uid)
            .ok_or_else(|| not_found(IdentityKind::Uid, uid.to_string()))?
            .to_string();
        return Ok(Some(Target {
            pid: None,
            uid,
            app,
            selector: Selector::Uid(uid),
        }));
    }

    if let Some(app) = query.app.filter(|a| !a.is_empty()) {
        let uid = registry
            .uid_for_name(app)
            .ok_or_else(|| not_found(IdentityKind::App, app.to_string()))?;
        return Ok(Some(Target {
            pid: None,
            uid,
            app: app.to_string(),
            selector: Selector::Uid(uid),
        }));
    }

    Ok(None)
}

// ── Apps list ─────────────────────────────────────────────────────────────────

/// One row of the monitored-apps listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppEntry {
    pub pid: u32,
    pub uid: u32,
    pub app: String,
}

/// Every PID seen in the logs with its UID and package name, ordered by
/// PID. System processes are left out unless `include_system` is set.
pub fn monitored_apps(
    pids: &PidUidMap,
    registry: &PackageRegistry,
    include_system: bool,
) -> Vec<AppEntry> {
    pids.iter()
        .filter(|(_, &uid)| include_system || uid != SYSTEM_UID)
        .map(|(&pid, &uid)| AppEntry {
            pid,
            uid,
            app: registry.name_for_uid(uid).unwrap_or(UNLISTED_APP).to_string(),
        })
        .collect()
}
