//! `PgApartmentStore` against a real database. Each test gets a fresh database from
//! `#[sqlx::test]` (requires `DATABASE_URL`) and bootstraps the table with `ensure_schema`.

use apartment_listings::{
    ensure_schema,
    query::{Filter, Scope},
    AppError, ApartmentDraft, ApartmentPatch, ApartmentStore, Lifecycle, ListingService, PgApartmentStore,
    RecordService, RequestValidator, StatsService,
};
use assert_matches::assert_matches;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;

async fn store(pool: &PgPool) -> PgApartmentStore {
    ensure_schema(pool, "public").await.unwrap();
    PgApartmentStore::new(pool.clone(), "public")
}

fn draft(unit_number: &str, project: &str, price: f64, bedrooms: i32) -> ApartmentDraft {
    RequestValidator::new_apartment(json!({
        "unitName": format!("Unit {}", unit_number),
        "unitNumber": unit_number,
        "project": project,
        "price": price,
        "bedrooms": bedrooms,
        "bathrooms": 1,
        "area": 64.25,
        "location": "Downtown"
    }))
    .unwrap()
}

#[sqlx::test(migrations = false)]
async fn schema_bootstrap_is_idempotent(pool: PgPool) {
    ensure_schema(&pool, "public").await.unwrap();
    ensure_schema(&pool, "public").await.unwrap();
    ensure_schema(&pool, "rentals").await.unwrap();
    let other = PgApartmentStore::new(pool.clone(), "rentals");
    other.ping().await.unwrap();
    assert_eq!(other.count(&Filter::not_deleted()).await.unwrap(), 0);
}

#[sqlx::test(migrations = false)]
async fn insert_returns_the_stored_row(pool: PgPool) {
    let store = store(&pool).await;
    let mut d = draft("A1-001", "Skyline", 1234.5, 2);
    d.images = vec!["https://img.test/1.jpg".into()];
    d.amenities = vec!["pool".into(), "gym".into()];
    d.description = Some("corner unit".into());

    let created = store.insert(&d).await.unwrap();
    assert!(created.id > 0);
    assert_eq!(created.price, 1234.5);
    assert_eq!(created.area, 64.25);
    assert_eq!(created.view_count, 0);
    assert_eq!(created.slug, "unit-a1-001-a1-001");
    assert!(matches!(created.lifecycle, Lifecycle::Active));

    let fetched = store.get(created.id, Scope::Visible).await.unwrap().unwrap();
    assert_eq!(fetched.images, d.images);
    assert_eq!(fetched.amenities, d.amenities);
    assert_eq!(fetched.description.as_deref(), Some("corner unit"));
    assert_eq!(fetched.location.as_deref(), Some("Downtown"));
}

#[sqlx::test(migrations = false)]
async fn duplicate_live_unit_number_is_a_conflict(pool: PgPool) {
    let store = store(&pool).await;
    store.insert(&draft("A1-001", "Skyline", 1000.0, 2)).await.unwrap();

    // The partial unique index rejects the raw insert, not only the service pre-check.
    assert_matches!(store.insert(&draft("A1-001", "Harbor", 900.0, 1)).await, Err(AppError::Conflict(_)));
    assert_matches!(
        RecordService::create(&store, &draft("A1-001", "Harbor", 900.0, 1)).await,
        Err(AppError::Conflict(_))
    );
    assert_eq!(store.count(&Filter::not_deleted()).await.unwrap(), 1);
}

#[sqlx::test(migrations = false)]
async fn update_to_taken_unit_number_is_a_conflict(pool: PgPool) {
    let store = store(&pool).await;
    store.insert(&draft("A1-001", "Skyline", 1000.0, 2)).await.unwrap();
    let other = store.insert(&draft("A1-002", "Skyline", 1000.0, 2)).await.unwrap();
    let patch = ApartmentPatch {
        unit_number: Some("A1-001".into()),
        ..ApartmentPatch::default()
    };
    assert_matches!(store.update(other.id, &patch).await, Err(AppError::Conflict(_)));
}

#[sqlx::test(migrations = false)]
async fn update_writes_only_supplied_fields(pool: PgPool) {
    let store = store(&pool).await;
    let mut d = draft("A1-001", "Skyline", 1000.0, 2);
    d.description = Some("corner unit".into());
    let created = store.insert(&d).await.unwrap();

    let patch = RequestValidator::patch(json!({ "price": 1100.5, "description": null, "isAvailable": false })).unwrap();
    let updated = store.update(created.id, &patch).await.unwrap().unwrap();
    assert_eq!(updated.price, 1100.5);
    assert_eq!(updated.description, None);
    assert!(!updated.is_available);
    assert_eq!(updated.location.as_deref(), Some("Downtown"));
    assert_eq!(updated.slug, created.slug);
    assert!(updated.updated_at >= created.updated_at);
}

#[sqlx::test(migrations = false)]
async fn three_fetches_leave_three_views(pool: PgPool) {
    let store = store(&pool).await;
    let created = store.insert(&draft("A1-001", "Skyline", 1000.0, 2)).await.unwrap();
    for expected in 1..=3 {
        let fetched = RecordService::get_by_id(&store, created.id).await.unwrap();
        assert_eq!(fetched.view_count, expected);
    }
}

#[sqlx::test(migrations = false)]
async fn concurrent_fetches_count_every_view(pool: PgPool) {
    const FETCHES: i64 = 25;
    let store = Arc::new(store(&pool).await);
    let id = store.insert(&draft("A1-001", "Skyline", 1000.0, 2)).await.unwrap().id;

    let handles: Vec<_> = (0..FETCHES)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { RecordService::get_by_id(store.as_ref(), id).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = store.get(id, Scope::Visible).await.unwrap().unwrap();
    assert_eq!(stored.view_count, FETCHES);
}

#[sqlx::test(migrations = false)]
async fn soft_delete_keeps_the_row(pool: PgPool) {
    let store = store(&pool).await;
    let created = store.insert(&draft("A1-001", "Skyline", 1000.0, 2)).await.unwrap();

    let deleted = RecordService::soft_delete(&store, created.id).await.unwrap();
    assert!(deleted.deleted_at.is_some());
    assert_matches!(RecordService::soft_delete(&store, created.id).await, Err(AppError::NotFound(_)));
    assert_matches!(RecordService::get_by_id(&store, created.id).await, Err(AppError::NotFound(_)));
    assert!(store.get(created.id, Scope::NotDeleted).await.unwrap().is_none());
    assert!(store.update(created.id, &RequestValidator::patch(json!({ "price": 1.0 })).unwrap()).await.unwrap().is_none());

    let (is_available, deleted_at): (bool, Option<DateTime<Utc>>) =
        sqlx::query_as("SELECT is_available, deleted_at FROM apartments WHERE id = $1")
            .bind(created.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(!is_available);
    assert!(deleted_at.is_some());

    // The unit number is free again once the old row is deleted.
    store.insert(&draft("A1-001", "Skyline", 1000.0, 2)).await.unwrap();
}

#[sqlx::test(migrations = false)]
async fn stats_on_empty_table(pool: PgPool) {
    let store = store(&pool).await;
    let report = StatsService::report(&store).await.unwrap();
    assert_eq!(report.total_apartments, 0);
    assert_eq!(report.available_apartments, 0);
    assert_eq!(report.unavailable_apartments, 0);
    assert_eq!(report.average_price, 0.0);
    assert_eq!((report.price_range.min, report.price_range.max), (0.0, 0.0));
    assert!(report.project_stats.is_empty());
    assert!(report.bedroom_distribution.is_empty());

    let options = StatsService::filter_options(&store).await.unwrap();
    assert!(options.projects.is_empty());
    assert!(options.bedrooms.is_empty());
}

#[sqlx::test(migrations = false)]
async fn stats_aggregate_visible_records(pool: PgPool) {
    let store = store(&pool).await;
    store.insert(&draft("A-1", "Skyline", 1000.0, 2)).await.unwrap();
    store.insert(&draft("A-2", "Skyline", 2000.0, 2)).await.unwrap();
    store.insert(&draft("A-3", "Harbor", 1500.0, 3)).await.unwrap();
    let mut hidden = draft("A-4", "Harbor", 3000.0, 1);
    hidden.is_available = false;
    store.insert(&hidden).await.unwrap();

    let report = StatsService::report(&store).await.unwrap();
    assert_eq!(report.total_apartments, 4);
    assert_eq!(report.available_apartments, 3);
    assert_eq!(report.unavailable_apartments, 1);
    assert_eq!(report.average_price, 1500.0);
    assert_eq!((report.price_range.min, report.price_range.max), (1000.0, 2000.0));
    let projects: Vec<(&str, i64)> = report.project_stats.iter().map(|p| (p.project.as_str(), p.count)).collect();
    assert_eq!(projects, vec![("Skyline", 2), ("Harbor", 1)]);
    let buckets: Vec<(i32, i64)> = report.bedroom_distribution.iter().map(|b| (b.bedrooms, b.count)).collect();
    assert_eq!(buckets, vec![(2, 2), (3, 1)]);

    let options = StatsService::filter_options(&store).await.unwrap();
    assert_eq!(options.projects, vec!["Harbor", "Skyline"]);
    assert_eq!(options.bedrooms, vec![2, 3]);
    assert_eq!(options.locations, vec!["Downtown"]);
}

#[sqlx::test(migrations = false)]
async fn listing_filters_and_escapes_search(pool: PgPool) {
    let store = store(&pool).await;
    let mut promo = draft("P-1", "Skyline", 1000.0, 2);
    promo.description = Some("50% off first month".into());
    let promo = store.insert(&promo).await.unwrap();
    store.insert(&draft("P-2", "Skyline", 1500.0, 2)).await.unwrap();
    store.insert(&draft("P-3", "Harbor", 2500.0, 3)).await.unwrap();

    let params = |pairs: &[(&str, &str)]| -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    };

    let req = RequestValidator::listing(&params(&[("search", "%")])).unwrap();
    let page = ListingService::list(&store, &req).await.unwrap();
    assert_eq!(page.data.iter().map(|a| a.id).collect::<Vec<_>>(), vec![promo.id]);

    let req = RequestValidator::listing(&params(&[
        ("project", "Sky"),
        ("minPrice", "1000"),
        ("maxPrice", "1500"),
        ("sortBy", "price"),
        ("sortOrder", "desc"),
        ("limit", "1"),
    ]))
    .unwrap();
    let page = ListingService::list(&store, &req).await.unwrap();
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].price, 1500.0);
    assert_eq!(page.pagination.total, 2);
    assert_eq!(page.pagination.total_pages, 2);
    assert!(page.pagination.has_next);
}

#[sqlx::test(migrations = false)]
async fn similar_band_edges_on_numeric_columns(pool: PgPool) {
    let store = store(&pool).await;
    let target = store.insert(&draft("S-0", "Skyline", 1000.20, 2)).await.unwrap();
    let edge = store.insert(&draft("S-1", "Skyline", 800.16, 2)).await.unwrap();
    store.insert(&draft("S-2", "Skyline", 800.15, 2)).await.unwrap();
    store.insert(&draft("S-3", "Skyline", 1000.0, 3)).await.unwrap();

    let similar = RecordService::similar(&store, target.id, 3).await.unwrap();
    assert_eq!(similar.iter().map(|a| a.id).collect::<Vec<_>>(), vec![edge.id]);
}
