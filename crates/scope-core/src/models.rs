use std::collections::HashMap;

/// Seconds index taken from a raw-usage log filename.
pub type Timestamp = u64;

/// Per-component energy estimate read from one power-log line.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Energy {
    pub cpu: f64,
    pub display: f64,
    pub gps: f64,
    pub wifi: f64,
    /// Cellular (3G) radio.
    pub cellular: f64,
}

impl Energy {
    /// Sum of the five components. Never read from input.
    pub fn total(&self) -> f64 {
        self.cpu + self.display + self.gps + self.wifi + self.cellular
    }
}

/// Hardware usage counters read from one raw-usage line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Usage {
    /// Scheduling ticks, one bucket per CPU frequency step.
    pub cpu_ticks: Vec<u64>,
    /// Display-on time (us).
    pub display: u64,
    /// GPS-on time (us).
    pub gps: u64,
    pub wifi_sent: u64,
    pub wifi_received: u64,
    /// Cellular traffic in the low-power tier.
    pub cell_low: u64,
    /// Cellular traffic in the high-power tier.
    pub cell_high: u64,
    /// Non-zero while a call is active.
    pub calling: u64,
}

/// One observation for one process at a given second.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub time: Timestamp,
    pub pid: u32,
    pub tgid: u32,
    pub uid: u32,
    pub usage: Usage,
    pub energy: Energy,
}

impl Sample {
    pub fn total_energy(&self) -> f64 {
        self.energy.total()
    }
}

/// Restricts which samples reach the statistics table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selector {
    /// Keep every sample.
    #[default]
    All,
    /// Keep samples of a single process.
    Pid(u32),
    /// Keep samples of every process owned by an application.
    Uid(u32),
}

impl Selector {
    pub fn matches(&self, sample: &Sample) -> bool {
        match *self {
            Selector::All => true,
            Selector::Pid(pid) => sample.pid == pid,
            Selector::Uid(uid) => sample.uid == uid,
        }
    }
}

// ── StatsTable ─────────────────────────────────────────────────────────────────

/// Column-oriented store of samples.
///
/// Index `i` of every column describes the same row. Columns are only
/// mutated a whole row at a time, so all of them always have the same
/// length. Identity columns are wide enough to hold merged sums.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsTable {
    time: Vec<Timestamp>,
    pid: Vec<u64>,
    tgid: Vec<u64>,
    uid: Vec<u64>,
    cpu_ticks: Vec<Vec<u64>>,
    display: Vec<u64>,
    gps: Vec<u64>,
    wifi_sent: Vec<u64>,
    wifi_received: Vec<u64>,
    cell_low: Vec<u64>,
    cell_high: Vec<u64>,
    calling: Vec<u64>,
    cpu_energy: Vec<f64>,
    display_energy: Vec<f64>,
    gps_energy: Vec<f64>,
    wifi_energy: Vec<f64>,
    cellular_energy: Vec<f64>,
    total_energy: Vec<f64>,
}

impl StatsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table holding `samples` in order.
    pub fn from_samples<'a>(samples: impl IntoIterator<Item = &'a Sample>) -> Self {
        let mut table = Self::new();
        for sample in samples {
            table.push(sample);
        }
        table
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Append one sample as a new row.
    pub fn push(&mut self, sample: &Sample) {
        self.time.push(sample.time);
        self.pid.push(u64::from(sample.pid));
        self.tgid.push(u64::from(sample.tgid));
        self.uid.push(u64::from(sample.uid));
        self.cpu_ticks.push(sample.usage.cpu_ticks.clone());
        self.display.push(sample.usage.display);
        self.gps.push(sample.usage.gps);
        self.wifi_sent.push(sample.usage.wifi_sent);
        self.wifi_received.push(sample.usage.wifi_received);
        self.cell_low.push(sample.usage.cell_low);
        self.cell_high.push(sample.usage.cell_high);
        self.calling.push(sample.usage.calling);
        self.cpu_energy.push(sample.energy.cpu);
        self.display_energy.push(sample.energy.display);
        self.gps_energy.push(sample.energy.gps);
        self.wifi_energy.push(sample.energy.wifi);
        self.cellular_energy.push(sample.energy.cellular);
        self.total_energy.push(sample.total_energy());
    }

    /// Lengths of all eighteen columns, in declaration order.
    pub fn column_lengths(&self) -> [usize; 18] {
        [
            self.time.len(),
            self.pid.len(),
            self.tgid.len(),
            self.uid.len(),
            self.cpu_ticks.len(),
            self.display.len(),
            self.gps.len(),
            self.wifi_sent.len(),
            self.wifi_received.len(),
            self.cell_low.len(),
            self.cell_high.len(),
            self.calling.len(),
            self.cpu_energy.len(),
            self.display_energy.len(),
            self.gps_energy.len(),
            self.wifi_energy.len(),
            self.cellular_energy.len(),
            self.total_energy.len(),
        ]
    }

    /// Energy components of row `index`.
    pub fn energy(&self, index: usize) -> Energy {
        Energy {
            cpu: self.cpu_energy[index],
            display: self.display_energy[index],
            gps: self.gps_energy[index],
            wifi: self.wifi_energy[index],
            cellular: self.cellular_energy[index],
        }
    }

    // ── Duplicate-timestamp merge ─────────────────────────────────────────────

    /// Collapse rows sharing a timestamp into one row.
    ///
    /// Every non-timestamp column is summed (bucket-wise for the tick
    /// histogram) and the total is recomputed from the summed components.
    /// Rows keep the order in which each distinct timestamp first appears.
    pub fn merge_duplicate_timestamps(&self) -> StatsTable {
        let mut merged = StatsTable::new();
        let mut slots: HashMap<Timestamp, usize> = HashMap::new();

        for i in 0..self.len() {
            match slots.get(&self.time[i]).copied() {
                Some(slot) => merged.accumulate(slot, self, i),
                None => {
                    slots.insert(self.time[i], merged.len());
                    merged.push_row_from(self, i);
                }
            }
        }

        merged
    }

    /// Stable re-ordering by ascending timestamp.
    pub fn sorted_by_time(&self) -> StatsTable {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by_key(|&i| self.time[i]);

        let mut sorted = StatsTable::new();
        for i in order {
            sorted.push_row_from(self, i);
        }
        sorted
    }

    fn push_row_from(&mut self, other: &StatsTable, i: usize) {
        self.time.push(other.time[i]);
        self.pid.push(other.pid[i]);
        self.tgid.push(other.tgid[i]);
        self.uid.push(other.uid[i]);
        self.cpu_ticks.push(other.cpu_ticks[i].clone());
        self.display.push(other.display[i]);
        self.gps.push(other.gps[i]);
        self.wifi_sent.push(other.wifi_sent[i]);
        self.wifi_received.push(other.wifi_received[i]);
        self.cell_low.push(other.cell_low[i]);
        self.cell_high.push(other.cell_high[i]);
        self.calling.push(other.calling[i]);
        self.cpu_energy.push(other.cpu_energy[i]);
        self.display_energy.push(other.display_energy[i]);
        self.gps_energy.push(other.gps_energy[i]);
        self.wifi_energy.push(other.wifi_energy[i]);
        self.cellular_energy.push(other.cellular_energy[i]);
        self.total_energy.push(other.total_energy[i]);
    }

    /// Add row `i` of `other` into row `slot` of `self`. The timestamp is
    /// left as is. Counters saturate at `u64::MAX`.
    fn accumulate(&mut self, slot: usize, other: &StatsTable, i: usize) {
        // Identity columns merge the same way; no report layout renders them.
        self.pid[slot] = self.pid[slot].saturating_add(other.pid[i]);
        self.tgid[slot] = self.tgid[slot].saturating_add(other.tgid[i]);
        self.uid[slot] = self.uid[slot].saturating_add(other.uid[i]);
        add_buckets(&mut self.cpu_ticks[slot], &other.cpu_ticks[i]);
        self.display[slot] = self.display[slot].saturating_add(other.display[i]);
        self.gps[slot] = self.gps[slot].saturating_add(other.gps[i]);
        self.wifi_sent[slot] = self.wifi_sent[slot].saturating_add(other.wifi_sent[i]);
        self.wifi_received[slot] = self.wifi_received[slot].saturating_add(other.wifi_received[i]);
        self.cell_low[slot] = self.cell_low[slot].saturating_add(other.cell_low[i]);
        self.cell_high[slot] = self.cell_high[slot].saturating_add(other.cell_high[i]);
        self.calling[slot] = self.calling[slot].saturating_add(other.calling[i]);
        self.cpu_energy[slot] += other.cpu_energy[i];
        self.display_energy[slot] += other.display_energy[i];
        self.gps_energy[slot] += other.gps_energy[i];
        self.wifi_energy[slot] += other.wifi_energy[i];
        self.cellular_energy[slot] += other.cellular_energy[i];
        self.total_energy[slot] = self.energy(slot).total();
    }

    // ── Column access ─────────────────────────────────────────────────────────

    pub fn time(&self) -> &[Timestamp] {
        &self.time
    }

    pub fn pid(&self) -> &[u64] {
        &self.pid
    }

    pub fn tgid(&self) -> &[u64] {
        &self.tgid
    }

    pub fn uid(&self) -> &[u64] {
        &self.uid
    }

    pub fn cpu_ticks(&self) -> &[Vec<u64>] {
        &self.cpu_ticks
    }

    pub fn display(&self) -> &[u64] {
        &self.display
    }

    pub fn gps(&self) -> &[u64] {
        &self.gps
    }

    pub fn wifi_sent(&self) -> &[u64] {
        &self.wifi_sent
    }

    pub fn wifi_received(&self) -> &[u64] {
        &self.wifi_received
    }

    pub fn cell_low(&self) -> &[u64] {
        &self.cell_low
    }

    pub fn cell_high(&self) -> &[u64] {
        &self.cell_high
    }

    pub fn calling(&self) -> &[u64] {
        &self.calling
    }

    pub fn cpu_energy(&self) -> &[f64] {
        &self.cpu_energy
    }

    pub fn display_energy(&self) -> &[f64] {
        &self.display_energy
    }

    pub fn gps_energy(&self) -> &[f64] {
        &self.gps_energy
    }

    pub fn wifi_energy(&self) -> &[f64] {
        &self.wifi_energy
    }

    pub fn cellular_energy(&self) -> &[f64] {
        &self.cellular_energy
    }

    pub fn total_energy(&self) -> &[f64] {
        &self.total_energy
    }
}

/// Bucket-wise saturating `acc += other`; `acc` grows with zeros when `other` is longer.
fn add_buckets(acc: &mut Vec<u64>, other: &[u64]) {
    if acc.len() < other.len() {
        acc.resize(other.len(), 0);
    }
    for (slot, value) in acc.iter_mut().zip(other) {
        *slot = slot.saturating_add(*value);
    }
}
