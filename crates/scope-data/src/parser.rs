//! Raw-usage and power line parsing.
//!
//! A raw-usage line holds the process identity, a variable-length CPU tick
//! histogram, seven usage counters and one trailing token that is ignored:
//!
//! ```text
//! PID TGID UID T0 .. Tn DISP GPS WIFI_SND WIFI_RCV 3G_LOW 3G_HIGH CALLING X
//! ```
//!
//! A power line holds exactly five energy estimates:
//!
//! ```text
//! CPU DISPLAY GPS WIFI 3G
//! ```

use std::path::Path;
use std::str::FromStr;

use scope_core::models::{Energy, Sample, Timestamp, Usage};
use scope_core::{Result, ScopeError};
use tracing::{debug, warn};

use crate::reader::FilePair;

const ID_FIELDS: usize = 3;
const COUNTER_FIELDS: usize = 7;
const TRAILING_FIELDS: usize = 1;
const POWER_FIELDS: usize = 5;

/// The process identity and counters of one raw-usage line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub pid: u32,
    pub tgid: u32,
    pub uid: u32,
    pub usage: Usage,
}

// ── Line parsers ──────────────────────────────────────────────────────────────

/// Parse one raw-usage line.
///
/// The tick bucket count is whatever is left once the identity, counter and
/// trailing fields are accounted for; it must be at least one.
pub fn parse_raw_line(line: &str) -> Result<RawRecord> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let fixed = ID_FIELDS + COUNTER_FIELDS + TRAILING_FIELDS;
    if tokens.len() <= fixed {
        return Err(ScopeError::Record(format!(
            "expected at least {} raw fields, found {}",
            fixed + 1,
            tokens.len()
        )));
    }

    let counters_at = tokens.len() - TRAILING_FIELDS - COUNTER_FIELDS;
    let ticks = &tokens[ID_FIELDS..counters_at];
    let counters = &tokens[counters_at..tokens.len() - TRAILING_FIELDS];

    let cpu_ticks = ticks
        .iter()
        .map(|t| parse_field::<u64>(t, "cpu tick"))
        .collect::<Result<Vec<_>>>()?;

    Ok(RawRecord {
        pid: parse_field(tokens[0], "PID")?,
        tgid: parse_field(tokens[1], "TGID")?,
        uid: parse_field(tokens[2], "UID")?,
        usage: Usage {
            cpu_ticks,
            display: parse_field(counters[0], "display")?,
            gps: parse_field(counters[1], "gps")?,
            wifi_sent: parse_field(counters[2], "wifi sent")?,
            wifi_received: parse_field(counters[3], "wifi received")?,
            cell_low: parse_field(counters[4], "3g low")?,
            cell_high: parse_field(counters[5], "3g high")?,
            calling: parse_field(counters[6], "calling")?,
        },
    })
}

/// Parse only the `PID TGID UID` prefix of a raw-usage line, returning
/// `(pid, uid)`.
pub fn parse_identity(line: &str) -> Result<(u32, u32)> {
    let mut tokens = line.split_whitespace();
    let (Some(pid), Some(_tgid), Some(uid)) = (tokens.next(), tokens.next(), tokens.next()) else {
        return Err(ScopeError::Record(format!(
            "expected PID TGID UID, found {:?}",
            line.trim()
        )));
    };
    Ok((parse_field(pid, "PID")?, parse_field(uid, "UID")?))
}

/// Parse one power line into its five energy components.
pub fn parse_power_line(line: &str) -> Result<Energy> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != POWER_FIELDS {
        return Err(ScopeError::Record(format!(
            "expected {POWER_FIELDS} power values, found {}",
            tokens.len()
        )));
    }

    Ok(Energy {
        cpu: parse_field(tokens[0], "cpu energy")?,
        display: parse_field(tokens[1], "display energy")?,
        gps: parse_field(tokens[2], "gps energy")?,
        wifi: parse_field(tokens[3], "wifi energy")?,
        cellular: parse_field(tokens[4], "3g energy")?,
    })
}

/// Combine a raw-usage line and a power line recorded at `second`.
pub fn parse_sample(raw_line: &str, power_line: &str, second: Timestamp) -> Result<Sample> {
    let raw = parse_raw_line(raw_line)?;
    let energy = parse_power_line(power_line)?;
    Ok(Sample {
        time: second,
        pid: raw.pid,
        tgid: raw.tgid,
        uid: raw.uid,
        usage: raw.usage,
        energy,
    })
}

// ── File-level parsing ────────────────────────────────────────────────────────

/// Data lines of a raw-usage file with their 1-based line numbers. The
/// first line is a header.
pub fn raw_data_lines(content: &str) -> Vec<(usize, &str)> {
    numbered_lines(content).skip(1).filter(|(_, l)| !l.trim().is_empty()).collect()
}

/// Data lines of a power file with their 1-based line numbers. The last
/// line is a trailer.
pub fn power_data_lines(content: &str) -> Vec<(usize, &str)> {
    let mut lines: Vec<(usize, &str)> = numbered_lines(content).collect();
    lines.pop();
    lines.retain(|(_, l)| !l.trim().is_empty());
    lines
}

/// Read both files of `pair` and parse every aligned line pair.
///
/// Lines are matched by position. When the files disagree on the number of
/// data lines, the extra lines of the longer file are ignored and a warning
/// is logged. Errors carry the path and line number of the bad line.
pub fn parse_file_pair(pair: &FilePair) -> Result<Vec<Sample>> {
    let raw_content = read_file(&pair.raw)?;
    let power_content = read_file(&pair.power)?;

    let raw_lines = raw_data_lines(&raw_content);
    let power_lines = power_data_lines(&power_content);

    if raw_lines.len() != power_lines.len() {
        warn!(
            "{} has {} data lines but {} has {}; using the first {}",
            pair.raw.display(),
            raw_lines.len(),
            pair.power.display(),
            power_lines.len(),
            raw_lines.len().min(power_lines.len())
        );
    }

    let mut samples = Vec::with_capacity(raw_lines.len().min(power_lines.len()));
    for (&(raw_no, raw_line), &(power_no, power_line)) in raw_lines.iter().zip(&power_lines) {
        let raw = parse_raw_line(raw_line).map_err(|e| e.at(&pair.raw, raw_no))?;
        let energy = parse_power_line(power_line).map_err(|e| e.at(&pair.power, power_no))?;
        samples.push(Sample {
            time: pair.second,
            pid: raw.pid,
            tgid: raw.tgid,
            uid: raw.uid,
            usage: raw.usage,
            energy,
        });
    }

    debug!(
        "Second {} (session {}): {} samples",
        pair.second,
        pair.session,
        samples.len()
    );

    Ok(samples)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn numbered_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content.lines().enumerate().map(|(i, l)| (i + 1, l))
}

fn parse_field<T: FromStr>(token: &str, field: &str) -> Result<T> {
    token
        .parse()
        .map_err(|_| ScopeError::Record(format!("invalid {field} value {token:?}")))
}

pub(crate) fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| ScopeError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const RAW: &str = "12 5 1000 3 2 1 0 100 50 20 10 5 2 1 9999";
    const POWER: &str = "1.0 2.0 0.5 0.25 0.1";

    fn write_pair(dir: &Path, second: Timestamp, raw: &str, power: &str) -> FilePair {
        let raw_path = dir.join("1").join("raw").join(second.to_string());
        let power_path = dir.join("1").join("power").join(format!("{second}.log"));
        std::fs::create_dir_all(raw_path.parent().unwrap()).unwrap();
        std::fs::create_dir_all(power_path.parent().unwrap()).unwrap();
        std::fs::write(&raw_path, raw).unwrap();
        std::fs::write(&power_path, power).unwrap();
        FilePair {
            session: 1,
            second,
            raw: raw_path,
            power: power_path,
        }
    }

    // ── parse_sample ──────────────────────────────────────────────────────────

    #[test]
    fn test_parse_sample_reference_line() {
        let s = parse_sample(RAW, POWER, 7).unwrap();

        assert_eq!(s.time, 7);
        assert_eq!((s.pid, s.tgid, s.uid), (12, 5, 1000));
        assert_eq!(s.usage.cpu_ticks, vec![3, 2, 1, 0]);
        assert_eq!(s.usage.display, 100);
        assert_eq!(s.usage.gps, 50);
        assert_eq!(s.usage.wifi_sent, 20);
        assert_eq!(s.usage.wifi_received, 10);
        assert_eq!(s.usage.cell_low, 5);
        assert_eq!(s.usage.cell_high, 2);
        assert_eq!(s.usage.calling, 1);
        assert_eq!(
            s.energy,
            Energy {
                cpu: 1.0,
                display: 2.0,
                gps: 0.5,
                wifi: 0.25,
                cellular: 0.1,
            }
        );
        assert!((s.total_energy() - 3.85).abs() < 1e-9);
    }

    // ── parse_raw_line ────────────────────────────────────────────────────────

    #[test]
    fn test_raw_line_tick_count_follows_width() {
        let twelve = "1 1 1 0 1 2 3 4 5 6 7 8 9 10 11 7 6 5 4 3 2 1 0";
        let rec = parse_raw_line(twelve).unwrap();
        assert_eq!(rec.usage.cpu_ticks, (0..12).collect::<Vec<u64>>());
        assert_eq!(rec.usage.display, 7);
        assert_eq!(rec.usage.calling, 1);
    }

    #[test]
    fn test_raw_line_single_bucket() {
        let rec = parse_raw_line("1 1 1 42 0 0 0 0 0 0 0 x").unwrap();
        assert_eq!(rec.usage.cpu_ticks, vec![42]);
    }

    #[test]
    fn test_raw_line_trailing_token_ignored() {
        let rec = parse_raw_line("1 1 1 42 0 0 0 0 0 0 0 not-a-number").unwrap();
        assert_eq!(rec.usage.calling, 0);
    }

    #[test]
    fn test_raw_line_without_buckets_rejected() {
        let err = parse_raw_line("1 1 1 0 0 0 0 0 0 0 9").unwrap_err();
        assert!(err.to_string().contains("expected at least 12 raw fields"));
    }

    #[test]
    fn test_raw_line_bad_integer() {
        let err = parse_raw_line("12 5 abc 3 2 1 0 100 50 20 10 5 2 1 9999").unwrap_err();
        assert!(err.to_string().contains("UID"));
    }

    #[test]
    fn test_raw_line_negative_counter_rejected() {
        assert!(parse_raw_line("12 5 1000 3 2 1 0 -100 50 20 10 5 2 1 9999").is_err());
    }

    // ── parse_power_line ──────────────────────────────────────────────────────

    #[test]
    fn test_power_line_too_short() {
        let err = parse_power_line("1.0 2.0 0.5 0.25").unwrap_err();
        assert_eq!(err.to_string(), "expected 5 power values, found 4");
    }

    #[test]
    fn test_power_line_too_long() {
        assert!(parse_power_line("1 2 3 4 5 6").is_err());
    }

    #[test]
    fn test_power_line_bad_float() {
        let err = parse_power_line("1.0 2.0 zero 0.25 0.1").unwrap_err();
        assert!(err.to_string().contains("gps energy"));
    }

    // ── parse_identity ────────────────────────────────────────────────────────

    #[test]
    fn test_parse_identity() {
        assert_eq!(parse_identity(RAW).unwrap(), (12, 1000));
        assert!(parse_identity("12 5").is_err());
    }

    // ── line selection ────────────────────────────────────────────────────────

    #[test]
    fn test_raw_data_lines_skip_header() {
        let lines = raw_data_lines("header\na\n\nb\n");
        assert_eq!(lines, vec![(2, "a"), (4, "b")]);
    }

    #[test]
    fn test_power_data_lines_drop_trailer() {
        let lines = power_data_lines("a\nb\ntrailer\n");
        assert_eq!(lines, vec![(1, "a"), (2, "b")]);
    }

    // ── parse_file_pair ───────────────────────────────────────────────────────

    #[test]
    fn test_parse_file_pair() {
        let dir = TempDir::new().unwrap();
        let raw = format!("PID TGID UID ...\n{RAW}\n13 13 1001 1 1 1 1 1 1 1 1 1 1 1 0\n");
        let power = format!("{POWER}\n0.1 0.1 0.1 0.1 0.1\n12.5\n");
        let pair = write_pair(dir.path(), 7, &raw, &power);

        let samples = parse_file_pair(&pair).unwrap();
        assert_eq!(samples.len(), 2);
        assert!(samples.iter().all(|s| s.time == 7));
        assert_eq!(samples[0].pid, 12);
        assert_eq!(samples[1].pid, 13);
        assert!((samples[1].total_energy() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_file_pair_truncates_to_shorter() {
        let dir = TempDir::new().unwrap();
        let raw = format!("header\n{RAW}\n{RAW}\n{RAW}\n");
        let power = format!("{POWER}\ntrailer\n");
        let pair = write_pair(dir.path(), 3, &raw, &power);

        assert_eq!(parse_file_pair(&pair).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_file_pair_reports_location() {
        let dir = TempDir::new().unwrap();
        let raw = format!("header\n{RAW}\n{RAW}\n");
        let power = format!("{POWER}\n1.0 2.0\ntrailer\n");
        let pair = write_pair(dir.path(), 4, &raw, &power);

        match parse_file_pair(&pair).unwrap_err() {
            ScopeError::Parse { path, line, .. } => {
                assert_eq!(path, pair.power);
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_file_pair_missing_file() {
        let pair = FilePair {
            session: 1,
            second: 1,
            raw: PathBuf::from("/tmp/does-not-exist-appscope/1/raw/1"),
            power: PathBuf::from("/tmp/does-not-exist-appscope/1/power/1.log"),
        };
        assert!(matches!(
            parse_file_pair(&pair),
            Err(ScopeError::FileRead { .. })
        ));
    }
}
