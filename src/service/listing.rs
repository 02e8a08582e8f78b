//! Paginated listing over the visible scope.

use crate::error::AppError;
use crate::model::Apartment;
use crate::query::{ListingFilters, ListingRequest, SortField, SortOrder};
use crate::response::{Paginated, Pagination};
use crate::store::ApartmentStore;
use serde::Serialize;

/// Filters echoed back with a page, including the effective sort.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFilters {
    #[serde(flatten)]
    pub filters: ListingFilters,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

pub type ListingPage = Paginated<Apartment, AppliedFilters>;

pub struct ListingService;

impl ListingService {
    /// One page of matching records plus the total over the same predicate.
    /// The page and the count are separate reads and may disagree under concurrent writes.
    pub async fn list(store: &dyn ApartmentStore, req: &ListingRequest) -> Result<ListingPage, AppError> {
        let query = req.record_query();
        let data = store.find(&query).await?;
        let total = store.count(&query.filter).await?;
        tracing::debug!(page = req.page, limit = req.limit, total, returned = data.len(), "listing");
        Ok(Paginated {
            data,
            pagination: Pagination::new(req.page, req.limit, u64::try_from(total).unwrap_or(0)),
            filters: AppliedFilters {
                filters: req.filters.clone(),
                sort_by: req.sort_by,
                sort_order: req.sort_order,
            },
        })
    }
}
