use thiserror::Error;

use crate::types::{MarkupHandle, PageIndex};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Page {page} unavailable: {reason}")]
    PageUnavailable { page: PageIndex, reason: String },

    #[error("Markup not found: {0}")]
    MarkupNotFound(MarkupHandle),
}

pub type Result<T> = std::result::Result<T, Error>;
