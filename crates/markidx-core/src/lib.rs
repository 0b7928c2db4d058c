#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod cap;
pub mod config;
pub mod error;
pub mod memory;
pub mod traits;
pub mod types;

pub use cap::{effective_cap, CapConfiguration, CapTier};
pub use config::{IndexSettings, ProvisionalTuning, RebuildTuning, WarmupTuning};
pub use error::{Error, Result};
pub use memory::{MarkupData, MemoryDocument};
pub use traits::{IndexObserver, MarkupSource};
pub use types::{
    DocumentIdentity, Generation, IndexView, IndexViewResult, MarkupHandle, MarkupRecord, MeasurementSummary,
    PageIndex, ViewPhase,
};
