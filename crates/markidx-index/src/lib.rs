//! markidx-index
//!
//! Per-page markup cache with dirty-page invalidation, a chunked rebuild
//! driven by generations, the publish pipeline that turns the cache into a
//! capped and filtered view, and the `MarkupIndex` facade tying them together.

pub mod aggregate;
pub mod index;
pub mod page_cache;
pub mod publish;
pub mod scheduler;
pub mod state;
pub mod status;

pub use aggregate::MeasurementAggregator;
pub use index::{IndexStats, MarkupIndex};
pub use page_cache::PageCache;
pub use publish::{publish, PublishRequest};
pub use status::status_label;
