//! Log file discovery and pairing.
//!
//! AppScope writes one raw-usage snapshot and one power snapshot per second
//! into numbered session directories:
//!
//! ```text
//! <source>/<session>/raw/<second>
//! <source>/<session>/power/<second>.log
//! ```
//!
//! This module finds both kinds of file, orders them numerically by second,
//! and matches each raw file to the power file of the same session and
//! second.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use regex::Regex;
use scope_core::models::Timestamp;
use scope_core::settings::PairingMode;
use scope_core::{Result, ScopeError};
use tracing::{debug, warn};

// ── Public types ──────────────────────────────────────────────────────────────

/// One discovered log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    /// Number of the session directory the file lives in.
    pub session: u64,
    /// Second index parsed from the file name.
    pub second: Timestamp,
    pub path: PathBuf,
}

/// All raw and power files under a source directory, each list sorted by
/// `(second, session)`.
#[derive(Debug, Clone, Default)]
pub struct LogFiles {
    pub raw: Vec<LogFile>,
    pub power: Vec<LogFile>,
}

/// A raw-usage file and the power file recorded for the same second.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePair {
    pub session: u64,
    pub second: Timestamp,
    pub raw: PathBuf,
    pub power: PathBuf,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Find every raw and power log under `source`.
///
/// Session directories and file names that are not numeric are ignored.
/// Both lists are ordered by the second in the file name compared as an
/// integer, so `10` sorts after `9`.
pub fn locate_log_files(source: &Path) -> LogFiles {
    if !source.exists() {
        warn!("Source directory does not exist: {}", source.display());
        return LogFiles::default();
    }

    let patterns = FileNamePatterns::new();
    let mut files = LogFiles::default();

    for entry in walkdir::WalkDir::new(source)
        .min_depth(3)
        .max_depth(3)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
    {
        let path = entry.into_path();
        match patterns.classify(source, &path) {
            Some((LogKind::Raw, session, second)) => files.raw.push(LogFile {
                session,
                second,
                path,
            }),
            Some((LogKind::Power, session, second)) => files.power.push(LogFile {
                session,
                second,
                path,
            }),
            None => {}
        }
    }

    files.raw.sort_by_key(|f| (f.second, f.session));
    files.power.sort_by_key(|f| (f.second, f.session));

    debug!(
        "Found {} raw and {} power files in {}",
        files.raw.len(),
        files.power.len(),
        source.display()
    );

    files
}

/// Match raw files to power files by `(session, second)`.
///
/// In [`PairingMode::Strict`] any file without a counterpart, or two files
/// claiming the same second, is a [`ScopeError::FilePairing`]. In
/// [`PairingMode::Lenient`] such files are dropped with a warning.
/// Pairs come back ordered by second.
pub fn pair_log_files(files: LogFiles, mode: PairingMode) -> Result<Vec<FilePair>> {
    let mut power_by_key: BTreeMap<(Timestamp, u64), PathBuf> = BTreeMap::new();
    for power in files.power {
        let key = (power.second, power.session);
        if power_by_key.contains_key(&key) {
            reject(mode, &power.path, "another power log has the same second")?;
            continue;
        }
        power_by_key.insert(key, power.path);
    }

    let mut pairs: Vec<FilePair> = Vec::with_capacity(files.raw.len());
    let mut last_key: Option<(Timestamp, u64)> = None;

    for raw in files.raw {
        let key = (raw.second, raw.session);
        if last_key == Some(key) {
            reject(mode, &raw.path, "another raw log has the same second")?;
            continue;
        }
        last_key = Some(key);

        match power_by_key.remove(&key) {
            Some(power) => pairs.push(FilePair {
                session: raw.session,
                second: raw.second,
                raw: raw.path,
                power,
            }),
            None => reject(mode, &raw.path, "no power log for the same second")?,
        }
    }

    for orphan in power_by_key.into_values() {
        reject(mode, &orphan, "no raw log for the same second")?;
    }

    Ok(pairs)
}

/// [`locate_log_files`] followed by [`pair_log_files`].
pub fn discover_file_pairs(source: &Path, mode: PairingMode) -> Result<Vec<FilePair>> {
    pair_log_files(locate_log_files(source), mode)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogKind {
    Raw,
    Power,
}

struct FileNamePatterns {
    number: Regex,
    power: Regex,
}

impl FileNamePatterns {
    fn new() -> Self {
        Self {
            number: Regex::new(r"^[0-9]+$").expect("regex is valid"),
            power: Regex::new(r"^([0-9]+)\.log$").expect("regex is valid"),
        }
    }

    /// Recognise `<session>/raw/<second>` and `<session>/power/<second>.log`
    /// relative to `source`.
    fn classify(&self, source: &Path, path: &Path) -> Option<(LogKind, u64, Timestamp)> {
        let relative = path.strip_prefix(source).ok()?;
        let parts: Vec<&str> = relative.iter().filter_map(|c| c.to_str()).collect();
        let [session, kind, name] = parts.as_slice() else {
            return None;
        };

        if !self.number.is_match(session) {
            return None;
        }
        let session: u64 = session.parse().ok()?;

        match *kind {
            "raw" if self.number.is_match(name) => {
                Some((LogKind::Raw, session, name.parse().ok()?))
            }
            "power" => {
                let second = self.power.captures(name)?.get(1)?.as_str().parse().ok()?;
                Some((LogKind::Power, session, second))
            }
            _ => None,
        }
    }
}

fn reject(mode: PairingMode, path: &Path, reason: &str) -> Result<()> {
    match mode {
        PairingMode::Strict => Err(ScopeError::FilePairing {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }),
        PairingMode::Lenient => {
            warn!("Skipping {}: {}", path.display(), reason);
            Ok(())
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, rel: &str) -> PathBuf {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "").unwrap();
        path
    }

    fn seconds(files: &[LogFile]) -> Vec<Timestamp> {
        files.iter().map(|f| f.second).collect()
    }

    // ── locate_log_files ──────────────────────────────────────────────────────

    #[test]
    fn test_locate_sorts_numerically() {
        let dir = TempDir::new().unwrap();
        for s in ["10", "9", "100", "2"] {
            touch(dir.path(), &format!("1/raw/{s}"));
            touch(dir.path(), &format!("1/power/{s}.log"));
        }

        let files = locate_log_files(dir.path());
        assert_eq!(seconds(&files.raw), vec![2, 9, 10, 100]);
        assert_eq!(seconds(&files.power), vec![2, 9, 10, 100]);
    }

    #[test]
    fn test_locate_spans_sessions() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "2/raw/5");
        touch(dir.path(), "1/raw/3");
        touch(dir.path(), "1/power/3.log");
        touch(dir.path(), "2/power/5.log");

        let files = locate_log_files(dir.path());
        assert_eq!(seconds(&files.raw), vec![3, 5]);
        assert_eq!(files.raw[0].session, 1);
        assert_eq!(files.raw[1].session, 2);
    }

    #[test]
    fn test_locate_ignores_foreign_files() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "packages.xml");
        touch(dir.path(), "notes/raw/1");
        touch(dir.path(), "1/raw/1.txt");
        touch(dir.path(), "1/power/1");
        touch(dir.path(), "1/power/x.log");
        touch(dir.path(), "1/other/1");
        touch(dir.path(), "1/raw/7");

        let files = locate_log_files(dir.path());
        assert_eq!(seconds(&files.raw), vec![7]);
        assert!(files.power.is_empty());
    }

    #[test]
    fn test_locate_nonexistent_source() {
        let files = locate_log_files(Path::new("/tmp/does-not-exist-appscope-xyz"));
        assert!(files.raw.is_empty());
        assert!(files.power.is_empty());
    }

    // ── pair_log_files ────────────────────────────────────────────────────────

    #[test]
    fn test_pair_matches_by_second() {
        let dir = TempDir::new().unwrap();
        for s in ["1", "2", "3"] {
            touch(dir.path(), &format!("1/raw/{s}"));
            touch(dir.path(), &format!("1/power/{s}.log"));
        }

        let pairs = discover_file_pairs(dir.path(), PairingMode::Strict).unwrap();
        assert_eq!(pairs.len(), 3);
        for pair in &pairs {
            assert_eq!(
                pair.raw.file_name().unwrap().to_str().unwrap(),
                pair.second.to_string()
            );
            assert_eq!(
                pair.power.file_name().unwrap().to_str().unwrap(),
                format!("{}.log", pair.second)
            );
        }
    }

    #[test]
    fn test_pair_does_not_shift_on_gap() {
        // Positional pairing would match raw 2 with power 3 here.
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "1/raw/1");
        touch(dir.path(), "1/raw/2");
        touch(dir.path(), "1/raw/3");
        touch(dir.path(), "1/power/1.log");
        touch(dir.path(), "1/power/3.log");

        let pairs = discover_file_pairs(dir.path(), PairingMode::Lenient).unwrap();
        let got: Vec<Timestamp> = pairs.iter().map(|p| p.second).collect();
        assert_eq!(got, vec![1, 3]);
        assert!(pairs[1].power.ends_with("3.log"));
    }

    #[test]
    fn test_strict_pairing_rejects_unmatched_raw() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "1/raw/1");
        touch(dir.path(), "1/raw/2");
        touch(dir.path(), "1/power/1.log");

        let err = discover_file_pairs(dir.path(), PairingMode::Strict).unwrap_err();
        match err {
            ScopeError::FilePairing { path, .. } => assert!(path.ends_with("raw/2")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_strict_pairing_rejects_unmatched_power() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "1/raw/1");
        touch(dir.path(), "1/power/1.log");
        touch(dir.path(), "1/power/2.log");

        let err = discover_file_pairs(dir.path(), PairingMode::Strict).unwrap_err();
        assert!(matches!(err, ScopeError::FilePairing { ref path, .. } if path.ends_with("2.log")));
    }

    #[test]
    fn test_pairing_keeps_sessions_apart() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "1/raw/4");
        touch(dir.path(), "2/power/4.log");

        assert!(discover_file_pairs(dir.path(), PairingMode::Strict).is_err());
        let pairs = discover_file_pairs(dir.path(), PairingMode::Lenient).unwrap();
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_pairing_rejects_duplicate_second() {
        let files = LogFiles {
            raw: vec![
                LogFile {
                    session: 1,
                    second: 7,
                    path: PathBuf::from("/l/1/raw/7"),
                },
                LogFile {
                    session: 1,
                    second: 7,
                    path: PathBuf::from("/l/1/raw/07"),
                },
            ],
            power: vec![LogFile {
                session: 1,
                second: 7,
                path: PathBuf::from("/l/1/power/7.log"),
            }],
        };

        assert!(pair_log_files(files.clone(), PairingMode::Strict).is_err());
        let pairs = pair_log_files(files, PairingMode::Lenient).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].raw, PathBuf::from("/l/1/raw/7"));
    }

    #[test]
    fn test_pair_empty_source() {
        let dir = TempDir::new().unwrap();
        let pairs = discover_file_pairs(dir.path(), PairingMode::Strict).unwrap();
        assert!(pairs.is_empty());
    }
}
