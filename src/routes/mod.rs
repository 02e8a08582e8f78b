//! Router assembly: operational routes at the root, apartment routes under `/api/v1`,
//! wrapped in tracing, CORS and body-limit layers.

mod apartments;
mod common;

pub use apartments::apartment_routes;
pub use common::common_routes;

use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

pub const API_PREFIX: &str = "/api/v1";

/// HTTP surface settings that are not part of the store.
#[derive(Clone, Debug)]
pub struct HttpOptions {
    /// Empty means any origin.
    pub cors_origins: Vec<String>,
    pub body_limit_bytes: usize,
}

impl Default for HttpOptions {
    fn default() -> Self {
        HttpOptions {
            cors_origins: Vec::new(),
            body_limit_bytes: 1024 * 1024,
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin = %o, "ignoring malformed CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}

/// Full application router. `body_limit_bytes` is the only request body cap; axum's built-in
/// extractor limit is disabled so it cannot undercut it.
pub fn app_router(state: AppState, options: &HttpOptions) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .nest(API_PREFIX, apartment_routes(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(options.body_limit_bytes))
                .layer(cors_layer(&options.cors_origins))
                .layer(DefaultBodyLimit::disable()),
        )
}
