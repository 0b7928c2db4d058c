//! markidx-text
//!
//! Lazily computed, per-page search strings for markup filtering, plus the
//! resumable background warmup that fills them in ahead of queries. Matching
//! is plain substring containment on normalized text.
pub mod normalize;
pub mod index;
pub mod warmup;

pub use index::SearchTextIndex;
pub use normalize::{normalize_filter, normalize_markup};
pub use warmup::{WarmupCursor, WarmupStep};
