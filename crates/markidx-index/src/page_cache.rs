use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use markidx_core::types::{MarkupRecord, PageIndex};

/// Per-page markup lists as of each page's last successful scan.
///
/// A page is dirty when it is flagged or when it has no entry at all; only a
/// clean entry may be trusted by a final publish. `total_count` is kept as a
/// running counter so reading it never walks the pages.
#[derive(Debug, Default)]
pub struct PageCache {
    pages: BTreeMap<PageIndex, Vec<MarkupRecord>>,
    dirty: BTreeSet<PageIndex>,
    total: usize,
}

impl PageCache {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, page: PageIndex) -> Option<&[MarkupRecord]> {
        self.pages.get(&page).map(Vec::as_slice)
    }

    /// Replaces the entry for `page` and marks it clean.
    pub fn set(&mut self, page: PageIndex, records: Vec<MarkupRecord>) {
        let new_len = records.len();
        let old_len = self.pages.insert(page, records).map_or(0, |old| old.len());
        self.adjust_total(old_len, new_len);
        self.dirty.remove(&page);
    }

    pub fn remove(&mut self, page: PageIndex) -> Option<Vec<MarkupRecord>> {
        self.dirty.remove(&page);
        let old = self.pages.remove(&page)?;
        self.adjust_total(old.len(), 0);
        Some(old)
    }

    pub fn total_count(&self) -> usize { self.total }

    pub fn page_len(&self) -> usize { self.pages.len() }

    pub fn is_empty(&self) -> bool { self.pages.is_empty() }

    pub fn mark_dirty(&mut self, page: PageIndex) {
        self.dirty.insert(page);
    }

    pub fn mark_all_dirty(&mut self) {
        self.dirty.extend(self.pages.keys().copied());
    }

    pub fn is_dirty(&self, page: PageIndex) -> bool {
        self.dirty.contains(&page) || !self.pages.contains_key(&page)
    }

    /// Sorted pages needing a rescan for a document of `page_count` pages:
    /// flagged pages, never-scanned pages, and cached pages that no longer
    /// exist (so they get evicted).
    pub fn dirty_pages(&self, page_count: usize) -> Vec<PageIndex> {
        if self.covers_exactly(page_count) {
            return self.dirty.iter().copied().collect();
        }
        let mut out = self.dirty.clone();
        out.extend((0..page_count).filter(|p| !self.pages.contains_key(p)));
        out.extend(self.pages.range(page_count..).map(|(p, _)| *p));
        out.into_iter().collect()
    }

    pub fn has_dirty(&self, page_count: usize) -> bool {
        !self.dirty.is_empty() || !self.covers_exactly(page_count)
    }

    /// Entries in ascending page order, optionally limited to pages below `upper`.
    pub fn scope(&self, upper: Option<PageIndex>) -> impl Iterator<Item = (PageIndex, &[MarkupRecord])> {
        let upper = upper.map_or(Bound::Unbounded, Bound::Excluded);
        self.pages.range((Bound::Unbounded, upper)).map(|(p, rs)| (*p, rs.as_slice()))
    }

    pub fn clear(&mut self) {
        self.pages.clear();
        self.dirty.clear();
        self.total = 0;
    }

    // Keys are distinct, so `len == page_count` with the last key at
    // `page_count - 1` means exactly `0..page_count` is cached.
    fn covers_exactly(&self, page_count: usize) -> bool {
        self.pages.len() == page_count
            && self.pages.last_key_value().map_or(true, |(last, _)| last + 1 == page_count)
    }

    fn adjust_total(&mut self, old_len: usize, new_len: usize) {
        debug_assert!(self.total >= old_len, "page cache running total underflow");
        self.total = self.total.saturating_sub(old_len) + new_len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markidx_core::types::MarkupHandle;

    fn recs(page: PageIndex, ids: &[u64]) -> Vec<MarkupRecord> {
        ids.iter().map(|id| MarkupRecord::new(MarkupHandle(*id), page)).collect()
    }

    #[test]
    fn running_total_tracks_set_and_remove() {
        let mut cache = PageCache::new();
        cache.set(0, recs(0, &[1, 2, 3]));
        cache.set(1, recs(1, &[4]));
        assert_eq!(cache.total_count(), 4);
        cache.set(0, recs(0, &[1]));
        assert_eq!(cache.total_count(), 2);
        assert_eq!(cache.remove(1).map(|v| v.len()), Some(1));
        assert_eq!(cache.total_count(), 1);
        assert!(cache.remove(1).is_none());
        assert_eq!(cache.total_count(), 1);
    }

    #[test]
    fn unscanned_pages_are_dirty() {
        let mut cache = PageCache::new();
        assert_eq!(cache.dirty_pages(3), vec![0, 1, 2]);
        cache.set(1, Vec::new());
        assert!(!cache.is_dirty(1));
        assert!(cache.is_dirty(0));
        assert_eq!(cache.dirty_pages(3), vec![0, 2]);
        cache.set(0, Vec::new());
        cache.set(2, Vec::new());
        assert!(!cache.has_dirty(3));
        assert!(cache.dirty_pages(3).is_empty());
    }

    #[test]
    fn flagged_and_vanished_pages_are_dirty() {
        let mut cache = PageCache::new();
        for p in 0..4 {
            cache.set(p, recs(p, &[p as u64 + 10]));
        }
        cache.mark_dirty(1);
        assert_eq!(cache.dirty_pages(4), vec![1]);
        // document shrank to two pages
        assert_eq!(cache.dirty_pages(2), vec![1, 2, 3]);
        cache.mark_all_dirty();
        assert_eq!(cache.dirty_pages(4), vec![0, 1, 2, 3]);
    }

    #[test]
    fn scope_limits_to_prefix() {
        let mut cache = PageCache::new();
        for p in 0..5 {
            cache.set(p, recs(p, &[p as u64]));
        }
        let pages: Vec<PageIndex> = cache.scope(Some(3)).map(|(p, _)| p).collect();
        assert_eq!(pages, vec![0, 1, 2]);
        assert_eq!(cache.scope(None).count(), 5);
    }
}
