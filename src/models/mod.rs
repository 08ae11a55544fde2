//! Core data models: DOIs and the citation records they resolve to.

mod citation;
mod doi;

pub use citation::CitationRecord;
pub use doi::{Doi, InvalidDoi};
