//! PostgreSQL rendering of record queries: identifiers from fixed enums, values as parameters.

mod builder;
pub mod params;
pub use builder::*;
pub use params::*;
