use markidx_core::traits::MarkupSource;
use markidx_core::types::PageIndex;
use markidx_text::SearchTextIndex;
use tracing::warn;

use crate::aggregate::MeasurementAggregator;
use crate::page_cache::PageCache;

/// Everything scoped to one document identity.
#[derive(Debug, Default)]
pub struct IndexState {
    pub cache: PageCache,
    pub search: SearchTextIndex,
    pub measurements: MeasurementAggregator,
}

impl IndexState {
    /// Rescans one page from the document.
    ///
    /// Pages past the end are evicted. A page that fails to read is stored
    /// as empty and clean for this cycle; it is picked up again the next
    /// time someone marks it dirty.
    pub fn rebuild_page(&mut self, page: PageIndex, source: &dyn MarkupSource) {
        if page >= source.page_count() {
            self.evict_page(page);
            return;
        }
        self.search.invalidate_page(page);
        match source.page_markups(page) {
            Ok(records) => {
                self.measurements.recompute_page(page, &records, source);
                self.cache.set(page, records);
            }
            Err(err) => {
                warn!(page, error = %err, "page read failed; treating as empty");
                self.measurements.remove_page(page);
                self.cache.set(page, Vec::new());
            }
        }
    }

    pub fn evict_page(&mut self, page: PageIndex) {
        self.cache.remove(page);
        self.search.invalidate_page(page);
        self.measurements.remove_page(page);
    }

    pub fn clear(&mut self) {
        self.cache.clear();
        self.search.clear();
        self.measurements.clear();
    }
}
