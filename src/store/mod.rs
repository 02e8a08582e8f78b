//! Relational store boundary for apartment records.
//!
//! Services talk to `dyn ApartmentStore`. `PgApartmentStore` renders queries to SQL;
//! `MemoryStore` evaluates them in process (tests and `STORE_BACKEND=memory`).

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{ensure_database_exists, ensure_schema, PgApartmentStore, TABLE_NAME};

use crate::error::AppResult;
use crate::model::{Apartment, ApartmentDraft, ApartmentPatch};
use crate::query::{Filter, IntField, RecordQuery, Scope, TextField};
use async_trait::async_trait;
use serde::Serialize;

/// Average, minimum and maximum price over a filter. All zero for an empty set.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PriceSummary {
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStat {
    pub project: String,
    pub count: i64,
    pub average_price: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BedroomBucket {
    pub bedrooms: i32,
    pub count: i64,
}

#[async_trait]
pub trait ApartmentStore: Send + Sync {
    /// Cheap liveness probe for readiness checks.
    async fn ping(&self) -> AppResult<()>;

    async fn find(&self, query: &RecordQuery) -> AppResult<Vec<Apartment>>;

    async fn count(&self, filter: &Filter) -> AppResult<i64>;

    async fn get(&self, id: i64, scope: Scope) -> AppResult<Option<Apartment>>;

    async fn unit_number_taken(&self, unit_number: &str, exclude_id: Option<i64>) -> AppResult<bool>;

    /// Insert with view_count 0. Duplicate live unit number is `AppError::Conflict`.
    async fn insert(&self, draft: &ApartmentDraft) -> AppResult<Apartment>;

    /// Partial update of a non-deleted record. `None` when missing or deleted.
    async fn update(&self, id: i64, patch: &ApartmentPatch) -> AppResult<Option<Apartment>>;

    /// Mark a visible record unavailable and deleted. `None` when not visible.
    async fn soft_delete(&self, id: i64) -> AppResult<Option<Apartment>>;

    /// Atomically add one view to a visible record. `None` when not visible.
    async fn increment_views(&self, id: i64) -> AppResult<Option<Apartment>>;

    async fn price_summary(&self, filter: &Filter) -> AppResult<PriceSummary>;

    /// Per-project count and average price, by count descending then project name.
    async fn project_breakdown(&self, filter: &Filter) -> AppResult<Vec<ProjectStat>>;

    /// Record count per bedroom value, ascending.
    async fn bedroom_distribution(&self, filter: &Filter) -> AppResult<Vec<BedroomBucket>>;

    async fn distinct_text(&self, field: TextField, filter: &Filter) -> AppResult<Vec<String>>;

    async fn distinct_int(&self, field: IntField, filter: &Filter) -> AppResult<Vec<i32>>;
}
