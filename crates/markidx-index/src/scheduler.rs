//! Chunked, generation-gated rebuild jobs and background warmup jobs.
//!
//! Jobs never run themselves; `MarkupIndex` pops one per cooperative slice and
//! checks its generation first. A job whose generation is no longer current is
//! dropped on the spot, which is the only cancellation mechanism.

use markidx_core::config::{ProvisionalTuning, RebuildTuning};
use markidx_core::traits::MarkupSource;
use markidx_core::types::{DocumentIdentity, Generation, MarkupRecord, PageIndex};
use markidx_text::{WarmupCursor, WarmupStep};
use tracing::debug;

use crate::page_cache::PageCache;
use crate::state::IndexState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// More dirty pages remain.
    Pending,
    /// Every planned page has been rescanned.
    Complete,
}

#[derive(Debug)]
pub struct RebuildJob {
    pub generation: Generation,
    pub force_immediate: bool,
    /// Selection to restore once this job publishes its final view.
    pub select: Option<MarkupRecord>,
    pages: Vec<PageIndex>,
    cursor: usize,
    chunk: usize,
    cold_start: bool,
    provisional_sent: bool,
}

impl RebuildJob {
    /// `pages` must be sorted ascending.
    pub fn new(
        generation: Generation,
        pages: Vec<PageIndex>,
        force_immediate: bool,
        select: Option<MarkupRecord>,
        tuning: &RebuildTuning,
    ) -> Self {
        debug_assert!(pages.windows(2).all(|w| w[0] < w[1]), "dirty pages must be sorted");
        let chunk = tuning.chunk_size(force_immediate, pages.len());
        Self { generation, force_immediate, select, pages, cursor: 0, chunk, cold_start: false, provisional_sent: false }
    }

    /// Marks this job as a cold start eligible for one provisional publish.
    /// Forced jobs never yield, so a preview would never be seen.
    pub fn with_cold_start(mut self, cache_empty: bool, filter_empty: bool, tuning: &ProvisionalTuning) -> Self {
        self.cold_start = tuning.enabled
            && !self.force_immediate
            && cache_empty
            && filter_empty
            && self.pages.len() >= tuning.min_dirty_pages;
        self
    }

    pub fn chunk_size(&self) -> usize { self.chunk }

    pub fn planned(&self) -> usize { self.pages.len() }

    pub fn processed(&self) -> usize { self.cursor }

    pub fn is_cold_start(&self) -> bool { self.cold_start }

    /// Rescans the next chunk of dirty pages, in ascending order.
    pub fn run_chunk(&mut self, state: &mut IndexState, source: &dyn MarkupSource) -> ChunkOutcome {
        let end = (self.cursor + self.chunk).min(self.pages.len());
        for &page in &self.pages[self.cursor..end] {
            state.rebuild_page(page, source);
        }
        debug!(
            generation = %self.generation,
            from = self.cursor,
            to = end,
            planned = self.pages.len(),
            "rebuilt chunk"
        );
        self.cursor = end;
        if self.cursor >= self.pages.len() { ChunkOutcome::Complete } else { ChunkOutcome::Pending }
    }

    /// Exclusive upper page bound of what this job has scanned so far. On a
    /// cold start every page is dirty, so scanned pages form a prefix.
    pub fn scanned_prefix(&self) -> usize {
        self.cursor.checked_sub(1).map_or(0, |i| self.pages[i] + 1)
    }

    /// Returns the prefix to preview when the one provisional publish of this
    /// job is due, and records that it was sent.
    pub fn take_provisional(&mut self, state: &IndexState, tuning: &ProvisionalTuning) -> Option<usize> {
        if !self.cold_start || self.provisional_sent || self.cursor >= self.pages.len() {
            return None;
        }
        let enough = state.cache.total_count() >= tuning.preview_records || self.cursor >= tuning.preview_pages;
        if !enough {
            return None;
        }
        self.provisional_sent = true;
        Some(self.scanned_prefix())
    }
}

/// Background fill of the search index after a final publish.
#[derive(Debug)]
pub struct WarmupJob {
    pub generation: Generation,
    pub identity: DocumentIdentity,
    cursor: WarmupCursor,
}

impl WarmupJob {
    pub fn new(generation: Generation, identity: DocumentIdentity) -> Self {
        Self { generation, identity, cursor: WarmupCursor::default() }
    }

    pub fn run_slice(&mut self, state: &mut IndexState, source: &dyn MarkupSource, budget: usize) -> WarmupStep {
        let IndexState { cache, search, .. } = state;
        let cache: &PageCache = cache;
        search.warm_slice(&mut self.cursor, source.page_count(), move |p| cache.get(p), source, budget)
    }

    pub fn warmed(&self) -> usize { self.cursor.warmed }
}

#[derive(Debug)]
pub enum Task {
    Rebuild(RebuildJob),
    Warmup(WarmupJob),
}

impl Task {
    pub fn generation(&self) -> Generation {
        match self {
            Task::Rebuild(job) => job.generation,
            Task::Warmup(job) => job.generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markidx_core::memory::MemoryDocument;

    fn tuning() -> RebuildTuning {
        RebuildTuning { background_chunk: 2, forced_chunk: 4, large_dirty_chunk: 8, large_dirty_threshold: 100 }
    }

    #[test]
    fn chunks_walk_pages_in_order() {
        let doc = MemoryDocument::with_notes(5, 1);
        let mut state = IndexState::default();
        let mut job = RebuildJob::new(Generation(1), vec![0, 1, 2, 3, 4], false, None, &tuning());
        assert_eq!(job.chunk_size(), 2);
        assert_eq!(job.run_chunk(&mut state, &doc), ChunkOutcome::Pending);
        assert_eq!(job.scanned_prefix(), 2);
        assert_eq!(job.run_chunk(&mut state, &doc), ChunkOutcome::Pending);
        assert_eq!(job.run_chunk(&mut state, &doc), ChunkOutcome::Complete);
        assert_eq!(doc.take_reads(), vec![0, 1, 2, 3, 4]);
        assert_eq!(state.cache.total_count(), 5);
    }

    #[test]
    fn provisional_fires_once_on_cold_start() {
        let doc = MemoryDocument::with_notes(10, 1);
        let mut state = IndexState::default();
        let prov = ProvisionalTuning { enabled: true, min_dirty_pages: 5, preview_records: 3, preview_pages: 100 };
        let mut job = RebuildJob::new(Generation(1), (0..10).collect(), false, None, &tuning()).with_cold_start(true, true, &prov);
        assert!(job.is_cold_start());
        job.run_chunk(&mut state, &doc);
        assert_eq!(job.take_provisional(&state, &prov), None);
        job.run_chunk(&mut state, &doc);
        assert_eq!(job.take_provisional(&state, &prov), Some(4));
        job.run_chunk(&mut state, &doc);
        assert_eq!(job.take_provisional(&state, &prov), None);
    }

    #[test]
    fn forced_or_filtered_jobs_are_not_cold_starts() {
        let prov = ProvisionalTuning { enabled: true, min_dirty_pages: 1, preview_records: 1, preview_pages: 1 };
        let forced = RebuildJob::new(Generation(1), vec![0, 1], true, None, &tuning()).with_cold_start(true, true, &prov);
        assert!(!forced.is_cold_start());
        let filtered = RebuildJob::new(Generation(1), vec![0, 1], false, None, &tuning()).with_cold_start(true, false, &prov);
        assert!(!filtered.is_cold_start());
    }
}
