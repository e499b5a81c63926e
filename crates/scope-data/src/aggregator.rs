//! Accumulation of parsed samples into a [`StatsTable`].

use scope_core::models::{Sample, Selector, StatsTable};
use scope_core::settings::RowOrder;

/// Filters samples through a [`Selector`] and collects the survivors.
///
/// The aggregator is an explicit value: create one per run, feed it, then
/// consume it with [`SampleAggregator::finish`].
#[derive(Debug, Clone)]
pub struct SampleAggregator {
    selector: Selector,
    table: StatsTable,
    seen: usize,
}

impl SampleAggregator {
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            table: StatsTable::new(),
            seen: 0,
        }
    }

    /// Append `sample` when it matches the selector. Returns whether it was
    /// kept.
    pub fn add(&mut self, sample: &Sample) -> bool {
        self.seen += 1;
        if !self.selector.matches(sample) {
            return false;
        }
        self.table.push(sample);
        true
    }

    pub fn extend<'a>(&mut self, samples: impl IntoIterator<Item = &'a Sample>) {
        for sample in samples {
            self.add(sample);
        }
    }

    /// Samples offered so far.
    pub fn seen(&self) -> usize {
        self.seen
    }

    /// Samples kept so far.
    pub fn kept(&self) -> usize {
        self.table.len()
    }

    /// Merge duplicate timestamps and apply `order`.
    pub fn finish(self, order: RowOrder) -> StatsTable {
        let merged = self.table.merge_duplicate_timestamps();
        match order {
            RowOrder::FirstSeen => merged,
            RowOrder::Time => merged.sorted_by_time(),
        }
    }
}
