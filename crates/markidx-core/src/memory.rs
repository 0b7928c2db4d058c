//! In-memory authoritative document.
//!
//! Used by tests and by the CLI to stand in for a real document model. Pages
//! hold ordered handle lists; markup payloads live in one map keyed by handle.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};
use crate::traits::MarkupSource;
use crate::types::{DocumentIdentity, MarkupHandle, MarkupRecord, PageIndex};

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(1);

/// Kind tag the aggregator treats as the measurement subtype.
pub const MEASUREMENT_KIND: &str = "measurement";

#[derive(Debug, Clone)]
pub struct MarkupData {
    pub kind: String,
    pub text: Option<String>,
    pub measurement: Option<f64>,
}

impl MarkupData {
    pub fn note(kind: &str, text: &str) -> Self {
        Self { kind: kind.to_string(), text: Some(text.to_string()), measurement: None }
    }

    pub fn measurement(length: f64) -> Self {
        Self { kind: MEASUREMENT_KIND.to_string(), text: None, measurement: Some(length) }
    }
}

#[derive(Debug)]
pub struct MemoryDocument {
    identity: DocumentIdentity,
    pages: Vec<Vec<MarkupHandle>>,
    markups: HashMap<MarkupHandle, MarkupData>,
    next_handle: u64,
    failing: BTreeSet<PageIndex>,
    reads: RefCell<Vec<PageIndex>>,
}

impl MemoryDocument {
    pub fn new(page_count: usize) -> Self {
        Self {
            identity: DocumentIdentity(NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed)),
            pages: vec![Vec::new(); page_count],
            markups: HashMap::new(),
            next_handle: 1,
            failing: BTreeSet::new(),
            reads: RefCell::new(Vec::new()),
        }
    }

    /// `page_count` pages, each holding `per_page` notes numbered in document order.
    pub fn with_notes(page_count: usize, per_page: usize) -> Self {
        let mut doc = Self::new(page_count);
        for page in 0..page_count {
            for i in 0..per_page {
                let text = format!("note {} on page {}", i, page);
                doc.add_markup(page, MarkupData::note("text", &text)).ok();
            }
        }
        doc
    }

    pub fn add_markup(&mut self, page: PageIndex, data: MarkupData) -> Result<MarkupRecord> {
        let markups = self.pages.get_mut(page).ok_or_else(|| page_missing(page))?;
        let handle = MarkupHandle(self.next_handle);
        self.next_handle += 1;
        markups.push(handle);
        self.markups.insert(handle, data);
        Ok(MarkupRecord::new(handle, page))
    }

    pub fn edit_text(&mut self, handle: MarkupHandle, text: &str) -> Result<()> {
        let data = self.markups.get_mut(&handle).ok_or(Error::MarkupNotFound(handle))?;
        data.text = Some(text.to_string());
        Ok(())
    }

    pub fn set_measurement(&mut self, handle: MarkupHandle, value: Option<f64>) -> Result<()> {
        let data = self.markups.get_mut(&handle).ok_or(Error::MarkupNotFound(handle))?;
        data.measurement = value;
        Ok(())
    }

    /// Returns the page the markup was removed from.
    pub fn remove_markup(&mut self, handle: MarkupHandle) -> Result<PageIndex> {
        let page = self.page_of(handle).ok_or(Error::MarkupNotFound(handle))?;
        self.pages[page].retain(|h| *h != handle);
        self.markups.remove(&handle);
        Ok(page)
    }

    /// Moves a markup to the end of another page. Returns `(from, to)`.
    pub fn move_markup(&mut self, handle: MarkupHandle, to: PageIndex) -> Result<(PageIndex, PageIndex)> {
        if to >= self.pages.len() {
            return Err(page_missing(to));
        }
        let from = self.page_of(handle).ok_or(Error::MarkupNotFound(handle))?;
        self.pages[from].retain(|h| *h != handle);
        self.pages[to].push(handle);
        Ok((from, to))
    }

    pub fn reverse_page(&mut self, page: PageIndex) -> Result<()> {
        self.pages.get_mut(page).ok_or_else(|| page_missing(page))?.reverse();
        Ok(())
    }

    pub fn insert_page(&mut self, at: PageIndex) -> Result<()> {
        if at > self.pages.len() {
            return Err(page_missing(at));
        }
        self.pages.insert(at, Vec::new());
        Ok(())
    }

    pub fn remove_page(&mut self, page: PageIndex) -> Result<()> {
        if page >= self.pages.len() {
            return Err(page_missing(page));
        }
        for handle in self.pages.remove(page) {
            self.markups.remove(&handle);
        }
        Ok(())
    }

    /// Makes subsequent reads of `page` fail until cleared.
    pub fn fail_page(&mut self, page: PageIndex, failing: bool) {
        if failing {
            self.failing.insert(page);
        } else {
            self.failing.remove(&page);
        }
    }

    /// Pages read through `page_markups` since the last call, in read order.
    pub fn take_reads(&self) -> Vec<PageIndex> {
        std::mem::take(&mut *self.reads.borrow_mut())
    }

    pub fn markup_count(&self) -> usize {
        self.markups.len()
    }

    pub fn records_on(&self, page: PageIndex) -> Vec<MarkupRecord> {
        self.pages
            .get(page)
            .map(|hs| hs.iter().map(|h| MarkupRecord::new(*h, page)).collect())
            .unwrap_or_default()
    }

    fn page_of(&self, handle: MarkupHandle) -> Option<PageIndex> {
        self.pages.iter().position(|hs| hs.contains(&handle))
    }
}

fn page_missing(page: PageIndex) -> Error {
    Error::PageUnavailable { page, reason: "no such page".to_string() }
}

impl MarkupSource for MemoryDocument {
    fn document_identity(&self) -> DocumentIdentity {
        self.identity
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_markups(&self, page: PageIndex) -> Result<Vec<MarkupRecord>> {
        self.reads.borrow_mut().push(page);
        if self.failing.contains(&page) {
            return Err(Error::PageUnavailable { page, reason: "simulated read failure".to_string() });
        }
        if page >= self.pages.len() {
            return Err(page_missing(page));
        }
        Ok(self.records_on(page))
    }

    fn markup_kind_tag(&self, record: &MarkupRecord) -> Option<&str> {
        self.markups.get(&record.handle).map(|m| m.kind.as_str())
    }

    fn markup_text(&self, record: &MarkupRecord) -> Option<&str> {
        self.markups.get(&record.handle).and_then(|m| m.text.as_deref())
    }

    fn markup_measurement_value(&self, record: &MarkupRecord) -> Option<f64> {
        self.markups
            .get(&record.handle)
            .filter(|m| m.kind == MEASUREMENT_KIND)
            .and_then(|m| m.measurement)
    }
}
