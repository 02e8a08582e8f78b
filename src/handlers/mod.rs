//! HTTP handlers for apartment listings.

pub mod apartments;
pub use apartments::*;
