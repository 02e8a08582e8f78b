//! Apartment listings: a REST backend for browsing, filtering and managing rental units.

pub mod config;
pub mod error;
pub mod model;
pub mod query;
pub mod response;
pub mod sql;
pub mod state;
pub mod store;
pub mod service;
pub mod handlers;
pub mod routes;

pub use config::{AppConfig, StoreBackend};
pub use error::{AppError, AppResult, ConfigError};
pub use model::{Apartment, ApartmentDraft, ApartmentPatch, Lifecycle};
pub use response::{success_many, success_one, Pagination};
pub use state::AppState;
pub use store::{ensure_database_exists, ensure_schema, ApartmentStore, MemoryStore, PgApartmentStore};
pub use routes::{app_router, HttpOptions, API_PREFIX};
pub use service::{ListingService, RecordService, RequestValidator, StatsService};
