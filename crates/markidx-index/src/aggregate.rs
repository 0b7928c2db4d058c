use std::collections::HashMap;

use markidx_core::traits::MarkupSource;
use markidx_core::types::{MarkupRecord, MeasurementSummary, PageIndex};

/// Per-page measurement summaries folded into a running document total.
#[derive(Debug, Default)]
pub struct MeasurementAggregator {
    pages: HashMap<PageIndex, MeasurementSummary>,
    total: MeasurementSummary,
}

impl MeasurementAggregator {
    pub fn new() -> Self { Self::default() }

    /// Recomputes `page` from `records` and folds the delta into the total.
    pub fn recompute_page(&mut self, page: PageIndex, records: &[MarkupRecord], source: &dyn MarkupSource) -> MeasurementSummary {
        let summary = summarize(records, source);
        if let Some(old) = self.pages.insert(page, summary) {
            self.total.subtract(&old);
        }
        self.total.add(&summary);
        summary
    }

    pub fn remove_page(&mut self, page: PageIndex) {
        if let Some(old) = self.pages.remove(&page) {
            self.total.subtract(&old);
        }
    }

    pub fn page(&self, page: PageIndex) -> Option<MeasurementSummary> {
        self.pages.get(&page).copied()
    }

    pub fn total(&self) -> MeasurementSummary { self.total }

    pub fn clear(&mut self) {
        self.pages.clear();
        self.total = MeasurementSummary::default();
    }
}

fn summarize(records: &[MarkupRecord], source: &dyn MarkupSource) -> MeasurementSummary {
    let mut summary = MeasurementSummary::default();
    for value in records.iter().filter_map(|r| source.markup_measurement_value(r)) {
        // non-finite lengths come from degenerate geometry; skip them
        if !value.is_finite() { continue; }
        summary.count += 1;
        summary.total_magnitude += value;
    }
    summary
}
