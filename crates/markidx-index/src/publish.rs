use markidx_core::traits::MarkupSource;
use markidx_core::types::IndexViewResult;
use markidx_text::SearchTextIndex;

use crate::page_cache::PageCache;

#[derive(Debug, Clone, Copy)]
pub struct PublishRequest<'a> {
    /// Already normalized; empty lists everything.
    pub filter: &'a str,
    pub is_final: bool,
    /// Provisional publishes only see pages below this index.
    pub scanned_prefix: usize,
    pub cap: usize,
}

/// Builds the observable result from the cache.
///
/// A final publish covers every cached page and keeps counting matches past
/// the cap so `total_matching` is exact. A provisional publish covers pages
/// below `scanned_prefix` and may stop as soon as the cap is exceeded.
pub fn publish(cache: &PageCache, search: &mut SearchTextIndex, source: &dyn MarkupSource, req: &PublishRequest<'_>) -> IndexViewResult {
    let upper = if req.is_final { None } else { Some(req.scanned_prefix) };
    let cap = req.cap;

    if req.filter.is_empty() {
        let total_matching = if req.is_final {
            cache.total_count()
        } else {
            cache.scope(upper).map(|(_, records)| records.len()).sum()
        };
        let mut listed = Vec::with_capacity(total_matching.min(cap));
        for (_, records) in cache.scope(upper) {
            let room = cap - listed.len();
            if room == 0 { break; }
            listed.extend_from_slice(&records[..records.len().min(room)]);
        }
        return IndexViewResult { listed, total_matching, truncated: total_matching > cap };
    }

    let mut listed = Vec::new();
    let mut total_matching = 0usize;
    'pages: for (page, records) in cache.scope(upper) {
        for record in records {
            if !search.text_for(page, record, source).contains(req.filter) { continue; }
            total_matching += 1;
            if listed.len() < cap {
                listed.push(*record);
            } else if !req.is_final {
                break 'pages;
            }
        }
    }
    IndexViewResult { listed, total_matching, truncated: total_matching > cap }
}
