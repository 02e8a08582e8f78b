use apartment_listings::{
    app_router, ensure_database_exists, ensure_schema, AppConfig, AppState, ApartmentStore, HttpOptions,
    MemoryStore, PgApartmentStore, StoreBackend,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("apartment_listings=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    let store: Arc<dyn ApartmentStore> = match config.store_backend {
        StoreBackend::Postgres => {
            ensure_database_exists(&config.database_url).await?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .acquire_timeout(config.db_connect_timeout)
                .connect(&config.database_url)
                .await?;
            ensure_schema(&pool, &config.db_schema).await?;
            tracing::info!(schema = %config.db_schema, "postgres store ready");
            Arc::new(PgApartmentStore::new(pool, &config.db_schema))
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let options = HttpOptions {
        cors_origins: config.cors_origins.clone(),
        body_limit_bytes: config.body_limit_bytes,
    };
    let app = app_router(AppState::new(store), &options);
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("apartment listings listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
