use apartment_listings::{
    query::{Filter, Scope},
    AppError, ApartmentStore, MemoryStore, RecordService, RequestValidator, StatsService,
};
use assert_matches::assert_matches;
use serde_json::json;

fn draft(unit_number: &str, price: f64, bedrooms: i32) -> apartment_listings::ApartmentDraft {
    RequestValidator::new_apartment(json!({
        "unitName": "Unit",
        "unitNumber": unit_number,
        "project": "Skyline",
        "price": price,
        "bedrooms": bedrooms,
        "bathrooms": 1,
        "area": 60
    }))
    .unwrap()
}

#[tokio::test]
async fn second_create_with_same_unit_number_conflicts() {
    let store = MemoryStore::new();
    RecordService::create(&store, &draft("A1-001", 1000.0, 2)).await.unwrap();
    let err = RecordService::create(&store, &draft("A1-001", 1000.0, 2)).await.unwrap_err();
    assert_matches!(err, AppError::Conflict(_));
    assert_eq!(store.count(&Filter::not_deleted()).await.unwrap(), 1);
}

#[tokio::test]
async fn soft_delete_is_not_repeatable() {
    let store = MemoryStore::new();
    let apt = RecordService::create(&store, &draft("A1-001", 1000.0, 2)).await.unwrap();
    let deleted = RecordService::soft_delete(&store, apt.id).await.unwrap();
    assert_eq!(deleted.id, apt.id);
    assert!(deleted.deleted_at.is_some());
    assert_matches!(RecordService::soft_delete(&store, apt.id).await, Err(AppError::NotFound(_)));
    assert_matches!(RecordService::get_by_id(&store, apt.id).await, Err(AppError::NotFound(_)));
    assert!(store.get(apt.id, Scope::Visible).await.unwrap().is_none());
    assert!(store.get(apt.id, Scope::NotDeleted).await.unwrap().is_none());
}

#[tokio::test]
async fn similar_is_empty_for_missing_target() {
    let store = MemoryStore::new();
    assert!(RecordService::similar(&store, 42, 3).await.unwrap().is_empty());
}

#[tokio::test]
async fn similar_does_not_count_views() {
    let store = MemoryStore::new();
    let target = RecordService::create(&store, &draft("T", 1000.0, 2)).await.unwrap();
    let other = RecordService::create(&store, &draft("S", 1050.0, 2)).await.unwrap();
    let similar = RecordService::similar(&store, target.id, 3).await.unwrap();
    assert_eq!(similar.len(), 1);
    assert_eq!(similar[0].id, other.id);
    assert_eq!(similar[0].view_count, 0);
    let reread = store.get(target.id, Scope::Visible).await.unwrap().unwrap();
    assert_eq!(reread.view_count, 0);
}

#[tokio::test]
async fn by_project_requires_a_name() {
    let store = MemoryStore::new();
    assert_matches!(RecordService::by_project(&store, "  ").await, Err(AppError::Validation(_)));
}

#[tokio::test]
async fn stats_average_is_rounded_to_cents() {
    let store = MemoryStore::new();
    for (n, price) in [("A", 100.0), ("B", 100.0), ("C", 100.01)] {
        RecordService::create(&store, &draft(n, price, 1)).await.unwrap();
    }
    let report = StatsService::report(&store).await.unwrap();
    assert_eq!(report.total_apartments, 3);
    assert_eq!(report.average_price, 100.0);
    assert_eq!(report.project_stats[0].average_price, 100.0);
}
