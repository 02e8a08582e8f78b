//! Apartment routes, mounted under `/api/v1`.

use crate::handlers::apartments::{
    by_project, create, delete as delete_handler, featured, filter_options, list, read, stats, update,
};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn apartment_routes(state: AppState) -> Router {
    Router::new()
        .route("/apartments", get(list).post(create))
        .route("/apartments/stats", get(stats))
        .route("/apartments/filters", get(filter_options))
        .route("/apartments/featured/recommendations", get(featured))
        .route("/apartments/project/:project_name", get(by_project))
        .route(
            "/apartments/:id",
            get(read).put(update).delete(delete_handler),
        )
        .with_state(state)
}
