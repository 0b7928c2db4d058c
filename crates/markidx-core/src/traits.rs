use crate::error::Result;
use crate::types::{DocumentIdentity, IndexView, MarkupRecord, PageIndex};

/// Read access to the authoritative document.
///
/// Every call is expected to cost O(page size) at most; the index never asks
/// for a whole-document scan in one call.
pub trait MarkupSource {
    fn document_identity(&self) -> DocumentIdentity;
    fn page_count(&self) -> usize;
    /// Current markups on `page`, in document order.
    fn page_markups(&self, page: PageIndex) -> Result<Vec<MarkupRecord>>;
    /// `None` when the handle no longer resolves (markup deleted since the
    /// page was last scanned).
    fn markup_kind_tag(&self, record: &MarkupRecord) -> Option<&str>;
    fn markup_text(&self, record: &MarkupRecord) -> Option<&str>;
    /// Only measurement markups report a value.
    fn markup_measurement_value(&self, record: &MarkupRecord) -> Option<f64>;
}

/// UI-side receiver of index events. All methods default to no-ops.
pub trait IndexObserver {
    fn view_changed(&mut self, _view: &IndexView) {}
    /// The document has unsaved changes.
    fn document_modified(&mut self) {}
    /// `None` clears the selection.
    fn selection_changed(&mut self, _selection: Option<&MarkupRecord>) {}
}
