use tracing::trace;

use markidx_core::traits::MarkupSource;
use markidx_core::types::{MarkupRecord, PageIndex};

use crate::index::SearchTextIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarmupStep {
	/// Budget exhausted; call again on the next idle slice.
	Continue,
	/// Every cached markup has an entry.
	Done,
}

/// Resumable position of a background warmup walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmupCursor {
	pub next_page: PageIndex,
	/// Offset into `next_page`'s records.
	pub next_record: usize,
	pub warmed: usize,
}

/// Records visited per slice, as a multiple of the compute budget. Bounds a
/// slice that walks over entries warmed by earlier lookups.
pub const LOOKUPS_PER_ENTRY: usize = 8;

impl SearchTextIndex {
	/// Computes up to `budget` missing entries, walking records in ascending
	/// page order from `cursor`, and visits at most `budget *
	/// LOOKUPS_PER_ENTRY` records in total. Pages for which `records_of`
	/// returns `None` are skipped.
	pub fn warm_slice<'a, F>(
		&mut self,
		cursor: &mut WarmupCursor,
		page_count: usize,
		records_of: F,
		source: &dyn MarkupSource,
		budget: usize,
	) -> WarmupStep
	where
		F: Fn(PageIndex) -> Option<&'a [MarkupRecord]>,
	{
		let max_visits = budget.saturating_mul(LOOKUPS_PER_ENTRY).max(1);
		let mut computed = 0usize;
		let mut visited = 0usize;
		while cursor.next_page < page_count {
			let page = cursor.next_page;
			if let Some(records) = records_of(page) {
				while let Some(record) = records.get(cursor.next_record) {
					if computed >= budget || visited >= max_visits {
						cursor.warmed += computed;
						trace!(page, computed, visited, "warmup slice exhausted");
						return WarmupStep::Continue;
					}
					visited += 1;
					if self.warm(page, record, source) { computed += 1; }
					cursor.next_record += 1;
				}
			}
			cursor.next_page += 1;
			cursor.next_record = 0;
		}
		cursor.warmed += computed;
		trace!(computed, total = cursor.warmed, "warmup complete");
		WarmupStep::Done
	}
}
