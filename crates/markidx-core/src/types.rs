//! Domain types shared by the cache, the search index and the publish pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Zero-based page position within the current document.
pub type PageIndex = usize;

/// Stable, document-assigned identifier of one markup object.
///
/// The index never owns markup data; it only holds handles and asks the
/// document for the current contents when it needs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkupHandle(pub u64);

impl fmt::Display for MarkupHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// A non-owning reference to a markup plus the page it was found on.
///
/// Equality and hashing go through `handle` only: two records are the same
/// markup iff they carry the same handle, wherever the page field says it
/// lives.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MarkupRecord {
    pub handle: MarkupHandle,
    pub page: PageIndex,
}

impl MarkupRecord {
    pub fn new(handle: MarkupHandle, page: PageIndex) -> Self {
        Self { handle, page }
    }
}

impl PartialEq for MarkupRecord {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Eq for MarkupRecord {}

impl Hash for MarkupRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.handle.hash(state);
    }
}

/// Opaque token naming which document the cache currently reflects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DocumentIdentity(pub u64);

/// Strictly increasing refresh-cycle token. `Generation(0)` is never issued
/// to a refresh; it marks "nothing published yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Generation(pub u64);

impl Generation {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Count and summed magnitude of measurement markups.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MeasurementSummary {
    pub count: u32,
    pub total_magnitude: f64,
}

impl MeasurementSummary {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn add(&mut self, other: &MeasurementSummary) {
        self.count = self.count.saturating_add(other.count);
        self.total_magnitude += other.total_magnitude;
    }

    /// Subtracts `other`. Only the count is clamped: a negative count means
    /// the running total drifted from the per-page entries, while a negative
    /// magnitude is a legitimate sum of signed values.
    pub fn subtract(&mut self, other: &MeasurementSummary) {
        debug_assert!(self.count >= other.count, "measurement count underflow");
        self.count = self.count.saturating_sub(other.count);
        self.total_magnitude -= other.total_magnitude;
        if self.count == 0 {
            self.total_magnitude = 0.0;
        }
    }
}

/// The externally observable output of one publish.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexViewResult {
    pub listed: Vec<MarkupRecord>,
    pub total_matching: usize,
    pub truncated: bool,
}

/// Whether a view is ground truth or an in-progress preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewPhase {
    Provisional,
    #[default]
    Final,
}

/// A published view together with the context it was produced under.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexView {
    pub generation: Generation,
    pub phase: ViewPhase,
    pub filter: String,
    pub cap: usize,
    pub result: IndexViewResult,
}

impl IndexView {
    pub fn is_provisional(&self) -> bool {
        self.phase == ViewPhase::Provisional
    }

    pub fn contains(&self, record: &MarkupRecord) -> bool {
        self.result.listed.contains(record)
    }
}
