//! Power and usage report for a merged [`StatsTable`].
//!
//! Each verbosity level is a fixed list of [`StatsColumn`]s; rendering walks
//! that list instead of building format strings.

use scope_core::models::StatsTable;
use scope_core::settings::Verbosity;

use crate::layout::{align, RenderedTable};

/// One report column: its header and how to render row `i`.
#[derive(Clone, Copy)]
pub struct StatsColumn {
    pub label: &'static str,
    pub render: fn(&StatsTable, usize) -> String,
}

impl std::fmt::Debug for StatsColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsColumn").field("label", &self.label).finish()
    }
}

const TIME: StatsColumn = StatsColumn {
    label: "TIME",
    render: |t, i| t.time()[i].to_string(),
};

const QUIET: [StatsColumn; 2] = [
    TIME,
    StatsColumn {
        label: "TOTAL POWER CONSUMPTION",
        render: |t, i| energy(t.total_energy()[i]),
    },
];

const NORMAL: [StatsColumn; 7] = [
    TIME,
    StatsColumn {
        label: "CPU",
        render: |t, i| energy(t.cpu_energy()[i]),
    },
    StatsColumn {
        label: "DISPLAY",
        render: |t, i| energy(t.display_energy()[i]),
    },
    StatsColumn {
        label: "GPS",
        render: |t, i| energy(t.gps_energy()[i]),
    },
    StatsColumn {
        label: "WIFI",
        render: |t, i| energy(t.wifi_energy()[i]),
    },
    StatsColumn {
        label: "3G",
        render: |t, i| energy(t.cellular_energy()[i]),
    },
    StatsColumn {
        label: "TOTAL",
        render: |t, i| energy(t.total_energy()[i]),
    },
];

const VERBOSE: [StatsColumn; 15] = [
    TIME,
    StatsColumn {
        label: "CPU TICKS",
        render: |t, i| ticks(&t.cpu_ticks()[i]),
    },
    StatsColumn {
        label: "DISPLAY (US)",
        render: |t, i| t.display()[i].to_string(),
    },
    StatsColumn {
        label: "GPS (US)",
        render: |t, i| t.gps()[i].to_string(),
    },
    StatsColumn {
        label: "WIFI SND PKTS",
        render: |t, i| t.wifi_sent()[i].to_string(),
    },
    StatsColumn {
        label: "WIFI RCV PKTS",
        render: |t, i| t.wifi_received()[i].to_string(),
    },
    StatsColumn {
        label: "3G LOW",
        render: |t, i| t.cell_low()[i].to_string(),
    },
    StatsColumn {
        label: "3G HIGH",
        render: |t, i| t.cell_high()[i].to_string(),
    },
    StatsColumn {
        label: "CALLING",
        render: |t, i| t.calling()[i].to_string(),
    },
    NORMAL[1],
    NORMAL[2],
    NORMAL[3],
    NORMAL[4],
    NORMAL[5],
    NORMAL[6],
];

/// Columns shown at `verbosity`.
pub fn stats_columns(verbosity: Verbosity) -> &'static [StatsColumn] {
    match verbosity {
        Verbosity::Quiet => &QUIET,
        Verbosity::Normal => &NORMAL,
        Verbosity::Verbose => &VERBOSE,
    }
}

/// Render `table` at `verbosity`. An empty table yields only the header.
pub fn render_stats(table: &StatsTable, verbosity: Verbosity) -> RenderedTable {
    let columns = stats_columns(verbosity);
    let labels: Vec<&str> = columns.iter().map(|c| c.label).collect();
    let cells: Vec<Vec<String>> = (0..table.len())
        .map(|i| columns.iter().map(|c| (c.render)(table, i)).collect())
        .collect();
    align(&labels, cells)
}

/// Energy values are always shown with four decimals.
pub fn energy(value: f64) -> String {
    format!("{value:.4}")
}

/// Tick histogram as `|b0 b1 ...|`.
pub fn ticks(buckets: &[u64]) -> String {
    let joined: Vec<String> = buckets.iter().map(u64::to_string).collect();
    format!("|{}|", joined.join(" "))
}
