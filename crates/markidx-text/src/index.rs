use std::collections::HashMap;

use markidx_core::traits::MarkupSource;
use markidx_core::types::{MarkupHandle, MarkupRecord, PageIndex};

use crate::normalize::normalize_markup;

/// Per-page memo of normalized markup search strings.
///
/// Absence of an entry means "not computed yet", never "no text". Entries are
/// dropped per page whenever that page is rescanned, so the next lookup
/// recomputes against the document's current contents.
#[derive(Debug, Default)]
pub struct SearchTextIndex {
	pages: HashMap<PageIndex, HashMap<MarkupHandle, String>>,
	entries: usize,
}

impl SearchTextIndex {
	pub fn new() -> Self { Self::default() }

	/// Cached search string for `record`, computing and storing it on a miss.
	pub fn text_for(&mut self, page: PageIndex, record: &MarkupRecord, source: &dyn MarkupSource) -> &str {
		let slot = self.pages.entry(page).or_default();
		if !slot.contains_key(&record.handle) {
			let text = compute(record, source);
			slot.insert(record.handle, text);
			self.entries += 1;
		}
		slot.get(&record.handle).map_or("", String::as_str)
	}

	/// Computes the entry if missing. Returns true when something new was stored.
	pub fn warm(&mut self, page: PageIndex, record: &MarkupRecord, source: &dyn MarkupSource) -> bool {
		let slot = self.pages.entry(page).or_default();
		if slot.contains_key(&record.handle) { return false; }
		slot.insert(record.handle, compute(record, source));
		self.entries += 1;
		true
	}

	pub fn contains(&self, page: PageIndex, handle: MarkupHandle) -> bool {
		self.pages.get(&page).is_some_and(|slot| slot.contains_key(&handle))
	}

	/// Forgets every entry for `page`.
	pub fn invalidate_page(&mut self, page: PageIndex) {
		if let Some(slot) = self.pages.remove(&page) {
			debug_assert!(self.entries >= slot.len(), "search entry count underflow");
			self.entries = self.entries.saturating_sub(slot.len());
		}
	}

	pub fn clear(&mut self) {
		self.pages.clear();
		self.entries = 0;
	}

	pub fn len(&self) -> usize { self.entries }

	pub fn is_empty(&self) -> bool { self.entries == 0 }
}

fn compute(record: &MarkupRecord, source: &dyn MarkupSource) -> String {
	match source.markup_kind_tag(record) {
		Some(kind) => normalize_markup(kind, source.markup_text(record)),
		// handle went stale before the page was rescanned
		None => String::new(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use markidx_core::memory::{MarkupData, MemoryDocument};

	#[test]
	fn text_for_memoizes_until_page_invalidated() {
		let mut doc = MemoryDocument::new(1);
		let r = doc.add_markup(0, MarkupData::note("Text", "Old Beam")).unwrap();
		let mut idx = SearchTextIndex::new();
		assert_eq!(idx.text_for(0, &r, &doc), "text\nold beam");
		doc.edit_text(r.handle, "new column").unwrap();
		// still memoized
		assert_eq!(idx.text_for(0, &r, &doc), "text\nold beam");
		idx.invalidate_page(0);
		assert!(idx.is_empty());
		assert_eq!(idx.text_for(0, &r, &doc), "text\nnew column");
		assert_eq!(idx.len(), 1);
	}

	#[test]
	fn stale_handles_index_as_empty() {
		let mut doc = MemoryDocument::new(1);
		let r = doc.add_markup(0, MarkupData::note("text", "gone soon")).unwrap();
		doc.remove_markup(r.handle).unwrap();
		let mut idx = SearchTextIndex::new();
		assert_eq!(idx.text_for(0, &r, &doc), "");
		assert!(idx.contains(0, r.handle));
	}
}
