//! Single-record operations: create, fetch (counting a view), similar, update, soft delete,
//! featured ranking and project lookup.

use crate::error::AppError;
use crate::model::{Apartment, ApartmentDraft, ApartmentPatch};
use crate::query::{
    Filter, IntField, NumField, Predicate, RecordQuery, Scope, Sort, SortField, SortOrder, TextField, Window,
};
use crate::store::ApartmentStore;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const DEFAULT_SIMILAR_LIMIT: u32 = 3;
pub const DEFAULT_FEATURED_LIMIT: u32 = 6;

/// Inclusive ±20% price band around `price`, computed in whole cents so that a record priced
/// exactly on an edge is inside the band.
fn similar_price_band(price: f64) -> (f64, f64) {
    let cents = (price * 100.0).round();
    let min = (cents * 8.0 / 10.0).ceil();
    let max = (cents * 12.0 / 10.0).floor();
    (min / 100.0, max / 100.0)
}

/// A fetched record with its similar records attached.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApartmentDetail {
    #[serde(flatten)]
    pub apartment: Apartment,
    pub similar_apartments: Vec<Apartment>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedApartment {
    pub id: i64,
    pub deleted_at: Option<DateTime<Utc>>,
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("apartment {}", id))
}

pub struct RecordService;

impl RecordService {
    /// Persist a validated draft. A live record with the same unit number is a conflict.
    pub async fn create(store: &dyn ApartmentStore, draft: &ApartmentDraft) -> Result<Apartment, AppError> {
        if store.unit_number_taken(&draft.unit_number, None).await? {
            tracing::warn!(unit_number = %draft.unit_number, "duplicate unit number rejected");
            return Err(AppError::Conflict(format!(
                "unit number '{}' already exists",
                draft.unit_number
            )));
        }
        let created = store.insert(draft).await?;
        tracing::info!(id = created.id, unit_number = %created.unit_number, slug = %created.slug, "apartment created");
        Ok(created)
    }

    /// Visible record by id; each successful call adds exactly one view.
    pub async fn get_by_id(store: &dyn ApartmentStore, id: i64) -> Result<Apartment, AppError> {
        store.increment_views(id).await?.ok_or_else(|| not_found(id))
    }

    /// Up to `limit` other visible records with the same bedroom count and a price within
    /// ±20% of the target, most viewed first. Empty when the target is not visible.
    pub async fn similar(store: &dyn ApartmentStore, id: i64, limit: u32) -> Result<Vec<Apartment>, AppError> {
        let Some(target) = store.get(id, Scope::Visible).await? else {
            return Ok(Vec::new());
        };
        Self::similar_to(store, &target, limit).await
    }

    pub async fn similar_to(
        store: &dyn ApartmentStore,
        target: &Apartment,
        limit: u32,
    ) -> Result<Vec<Apartment>, AppError> {
        let (min, max) = similar_price_band(target.price);
        let query = RecordQuery {
            filter: Filter::visible()
                .with(Predicate::ExcludeId(target.id))
                .with(Predicate::IntEq {
                    field: IntField::Bedrooms,
                    value: target.bedrooms,
                })
                .with(Predicate::Between {
                    field: NumField::Price,
                    min,
                    max,
                }),
            sort: Sort::by(SortField::ViewCount, SortOrder::Desc),
            window: Window::first(limit),
        };
        store.find(&query).await
    }

    /// Fetch with a view counted, plus similar records.
    pub async fn detail(store: &dyn ApartmentStore, id: i64, similar_limit: u32) -> Result<ApartmentDetail, AppError> {
        let apartment = Self::get_by_id(store, id).await?;
        let similar_apartments = Self::similar_to(store, &apartment, similar_limit).await?;
        Ok(ApartmentDetail {
            apartment,
            similar_apartments,
        })
    }

    /// Overwrite supplied fields of a non-deleted record.
    pub async fn update(store: &dyn ApartmentStore, id: i64, patch: &ApartmentPatch) -> Result<Apartment, AppError> {
        if store.get(id, Scope::NotDeleted).await?.is_none() {
            return Err(not_found(id));
        }
        if let Some(unit_number) = &patch.unit_number {
            if store.unit_number_taken(unit_number, Some(id)).await? {
                return Err(AppError::Conflict(format!("unit number '{}' already exists", unit_number)));
            }
        }
        let updated = store.update(id, patch).await?.ok_or_else(|| not_found(id))?;
        tracing::info!(id, "apartment updated");
        Ok(updated)
    }

    /// Mark a visible record unavailable and deleted. A second call is NotFound.
    pub async fn soft_delete(store: &dyn ApartmentStore, id: i64) -> Result<DeletedApartment, AppError> {
        let deleted = store.soft_delete(id).await?.ok_or_else(|| not_found(id))?;
        tracing::info!(id, "apartment soft-deleted");
        Ok(DeletedApartment {
            id: deleted.id,
            deleted_at: deleted.lifecycle.deleted_at(),
        })
    }

    /// Most viewed visible records, newest first among equal view counts.
    pub async fn featured(store: &dyn ApartmentStore, limit: u32) -> Result<Vec<Apartment>, AppError> {
        let query = RecordQuery {
            filter: Filter::visible(),
            sort: Sort::by(SortField::ViewCount, SortOrder::Desc).then(SortField::CreatedAt, SortOrder::Desc),
            window: Window::first(limit),
        };
        store.find(&query).await
    }

    /// Every visible record whose project contains `name`, newest first.
    pub async fn by_project(store: &dyn ApartmentStore, name: &str) -> Result<Vec<Apartment>, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("project name is required".into()));
        }
        let query = RecordQuery {
            filter: Filter::visible().with(Predicate::Contains {
                field: TextField::Project,
                needle: name.to_string(),
            }),
            sort: Sort::by(SortField::CreatedAt, SortOrder::Desc),
            window: Window::all(),
        };
        store.find(&query).await
    }
}
