//! Listing, statistics and record services over an `ApartmentStore`.

mod listing;
mod records;
mod stats;
mod validation;
pub use listing::{AppliedFilters, ListingPage, ListingService};
pub use records::{ApartmentDetail, DeletedApartment, RecordService, DEFAULT_FEATURED_LIMIT, DEFAULT_SIMILAR_LIMIT};
pub use stats::{FilterOptions, PriceRange, StatsReport, StatsService};
pub use validation::RequestValidator;
