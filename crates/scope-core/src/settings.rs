use clap::Parser;
use std::path::PathBuf;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Per-process and per-application power reports from AppScope logs
#[derive(Parser, Debug, Clone)]
#[command(
    name = "appscope-analyzer",
    about = "Parses AppScope logs and produces per process (PID) or per application (UID) power consumption data",
    version
)]
pub struct Settings {
    /// List all the package names, UIDs and PIDs of the monitored apps
    #[arg(short = 'l', long, help_heading = "Actions")]
    pub list: bool,

    /// Select this app package name to show the results
    #[arg(short = 'a', long, value_name = "APP", help_heading = "Actions")]
    pub app: Option<String>,

    /// Select this app UID to show the results
    #[arg(short = 'u', long, value_name = "UID", help_heading = "Actions")]
    pub uid: Option<u32>,

    /// Select this process PID to show the results
    #[arg(short = 'p', long, value_name = "PID", help_heading = "Actions")]
    pub pid: Option<u32>,

    /// The directory containing the packages.xml file and the session logs
    #[arg(
        short = 's',
        long = "source-dir",
        value_name = "DIR",
        default_value = "./",
        help_heading = "Configuration Options"
    )]
    pub source_dir: PathBuf,

    /// Pair raw and power logs leniently, dropping files with no counterpart
    #[arg(long, help_heading = "Configuration Options")]
    pub lenient_pairing: bool,

    /// Abort on the first malformed log line instead of skipping its file pair
    #[arg(long, help_heading = "Configuration Options")]
    pub strict_parse: bool,

    /// Print only lines that contain WORD (case-insensitive)
    #[arg(short = 'g', long, value_name = "WORD", help_heading = "Output Options")]
    pub grep: Option<String>,

    /// Print more detailed output to the screen
    #[arg(short = 'v', long, conflicts_with = "quiet", help_heading = "Output Options")]
    pub verbose: bool,

    /// Print a laconic output to the screen
    #[arg(short = 'q', long, help_heading = "Output Options")]
    pub quiet: bool,

    /// Order report rows by timestamp after merging duplicate seconds
    #[arg(long, help_heading = "Output Options")]
    pub sort_by_time: bool,

    /// Logging level (written to stderr)
    #[arg(
        long,
        env = "APPSCOPE_LOG_LEVEL",
        default_value = "WARNING",
        value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"]
    )]
    pub log_level: String,
}

// ── Derived options ────────────────────────────────────────────────────────────

/// Amount of detail in the rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

/// How raw and power files without a counterpart are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PairingMode {
    /// Any unmatched file is an error.
    #[default]
    Strict,
    /// Unmatched files are dropped with a warning.
    Lenient,
}

/// What happens when a file pair contains a malformed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParsePolicy {
    /// Skip the pair, log it, and keep going.
    #[default]
    SkipPair,
    /// Abort the run.
    Abort,
}

/// Row order of the merged statistics table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowOrder {
    /// First occurrence of each distinct timestamp.
    #[default]
    FirstSeen,
    /// Ascending timestamp.
    Time,
}

/// Knobs consumed by the aggregation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnalysisOptions {
    pub pairing: PairingMode,
    pub parse_policy: ParsePolicy,
    pub row_order: RowOrder,
}

impl Settings {
    /// `true` when the user asked for a report or a listing.
    pub fn has_action(&self) -> bool {
        self.list || self.pid.is_some() || self.uid.is_some() || has_text(&self.app)
    }

    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    /// Grep pattern, with an empty string treated as absent.
    pub fn grep_pattern(&self) -> Option<&str> {
        self.grep.as_deref().filter(|g| !g.is_empty())
    }

    /// App package name, with an empty string treated as absent.
    pub fn app_name(&self) -> Option<&str> {
        self.app.as_deref().filter(|a| !a.is_empty())
    }

    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            pairing: if self.lenient_pairing {
                PairingMode::Lenient
            } else {
                PairingMode::Strict
            },
            parse_policy: if self.strict_parse {
                ParsePolicy::Abort
            } else {
                ParsePolicy::SkipPair
            },
            row_order: if self.sort_by_time {
                RowOrder::Time
            } else {
                RowOrder::FirstSeen
            },
        }
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}
