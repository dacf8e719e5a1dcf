//! Request extractors.

pub mod payload;
pub use payload::{pairs_to_document, Payload};
