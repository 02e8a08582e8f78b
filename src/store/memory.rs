//! In-process store that evaluates record queries directly. Every operation runs under one lock,
//! so increments and unique checks are atomic with respect to each other.

use crate::error::{AppError, AppResult};
use crate::model::{Apartment, ApartmentDraft, ApartmentPatch, Lifecycle};
use crate::query::{Filter, IntField, RecordQuery, Scope, TextField};
use crate::store::{ApartmentStore, BedroomBucket, PriceSummary, ProjectStat};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Inner {
    rows: Vec<Apartment>,
    next_id: i64,
}

impl Inner {
    fn live_unit_number_taken(&self, unit_number: &str, exclude_id: Option<i64>) -> bool {
        self.rows.iter().any(|r| {
            Scope::NotDeleted.admits(r) && r.unit_number == unit_number && Some(r.id) != exclude_id
        })
    }

    fn matching<'a>(&'a self, filter: &'a Filter) -> impl Iterator<Item = &'a Apartment> + 'a {
        self.rows.iter().filter(move |r| filter.admits(r))
    }

    fn row_mut(&mut self, id: i64, scope: Scope) -> Option<&mut Apartment> {
        self.rows.iter_mut().find(|r| r.id == id && scope.admits(r))
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored row, soft-deleted ones included, in insertion order.
    pub fn snapshot(&self) -> AppResult<Vec<Apartment>> {
        Ok(self.read()?.rows.clone())
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| AppError::Internal("memory store lock poisoned".into()))
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| AppError::Internal("memory store lock poisoned".into()))
    }
}

fn conflict(unit_number: &str) -> AppError {
    AppError::Conflict(format!("unit number '{}' already exists", unit_number))
}

#[async_trait]
impl ApartmentStore for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        self.read().map(|_| ())
    }

    async fn find(&self, query: &RecordQuery) -> AppResult<Vec<Apartment>> {
        let inner = self.read()?;
        let mut rows: Vec<Apartment> = inner.matching(&query.filter).cloned().collect();
        rows.sort_by(|a, b| query.sort.compare(a, b));
        let offset = usize::try_from(query.window.offset).unwrap_or(usize::MAX);
        let rows = rows.into_iter().skip(offset);
        Ok(match query.window.limit {
            Some(limit) => rows.take(limit as usize).collect(),
            None => rows.collect(),
        })
    }

    async fn count(&self, filter: &Filter) -> AppResult<i64> {
        Ok(self.read()?.matching(filter).count() as i64)
    }

    async fn get(&self, id: i64, scope: Scope) -> AppResult<Option<Apartment>> {
        Ok(self
            .read()?
            .rows
            .iter()
            .find(|r| r.id == id && scope.admits(r))
            .cloned())
    }

    async fn unit_number_taken(&self, unit_number: &str, exclude_id: Option<i64>) -> AppResult<bool> {
        Ok(self.read()?.live_unit_number_taken(unit_number, exclude_id))
    }

    async fn insert(&self, draft: &ApartmentDraft) -> AppResult<Apartment> {
        let mut inner = self.write()?;
        if inner.live_unit_number_taken(&draft.unit_number, None) {
            return Err(conflict(&draft.unit_number));
        }
        inner.next_id += 1;
        let now = Utc::now();
        let apt = Apartment {
            id: inner.next_id,
            unit_name: draft.unit_name.clone(),
            unit_number: draft.unit_number.clone(),
            project: draft.project.clone(),
            description: draft.description.clone(),
            price: draft.price,
            bedrooms: draft.bedrooms,
            bathrooms: draft.bathrooms,
            area: draft.area,
            location: draft.location.clone(),
            images: draft.images.clone(),
            amenities: draft.amenities.clone(),
            is_available: draft.is_available,
            slug: draft.slug.clone(),
            view_count: 0,
            is_featured: draft.is_featured,
            created_at: now,
            updated_at: now,
            lifecycle: Lifecycle::Active,
        };
        inner.rows.push(apt.clone());
        Ok(apt)
    }

    async fn update(&self, id: i64, patch: &ApartmentPatch) -> AppResult<Option<Apartment>> {
        let mut inner = self.write()?;
        if let Some(unit_number) = &patch.unit_number {
            if inner.live_unit_number_taken(unit_number, Some(id)) {
                return Err(conflict(unit_number));
            }
        }
        let Some(row) = inner.row_mut(id, Scope::NotDeleted) else {
            return Ok(None);
        };
        patch.apply_to(row);
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn soft_delete(&self, id: i64) -> AppResult<Option<Apartment>> {
        let mut inner = self.write()?;
        let Some(row) = inner.row_mut(id, Scope::Visible) else {
            return Ok(None);
        };
        let now = Utc::now();
        row.is_available = false;
        row.lifecycle = Lifecycle::Deleted { at: now };
        row.updated_at = now;
        Ok(Some(row.clone()))
    }

    async fn increment_views(&self, id: i64) -> AppResult<Option<Apartment>> {
        let mut inner = self.write()?;
        Ok(inner.row_mut(id, Scope::Visible).map(|row| {
            row.view_count += 1;
            row.clone()
        }))
    }

    async fn price_summary(&self, filter: &Filter) -> AppResult<PriceSummary> {
        let inner = self.read()?;
        let prices: Vec<f64> = inner.matching(filter).map(|r| r.price).collect();
        if prices.is_empty() {
            return Ok(PriceSummary::default());
        }
        let sum: f64 = prices.iter().sum();
        Ok(PriceSummary {
            average: sum / prices.len() as f64,
            min: prices.iter().copied().fold(f64::INFINITY, f64::min),
            max: prices.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }

    async fn project_breakdown(&self, filter: &Filter) -> AppResult<Vec<ProjectStat>> {
        let inner = self.read()?;
        let mut groups: BTreeMap<&str, (i64, f64)> = BTreeMap::new();
        for r in inner.matching(filter) {
            let entry = groups.entry(r.project.as_str()).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += r.price;
        }
        let mut stats: Vec<ProjectStat> = groups
            .into_iter()
            .map(|(project, (count, sum))| ProjectStat {
                project: project.to_string(),
                count,
                average_price: sum / count as f64,
            })
            .collect();
        // BTreeMap order already gives project-name ascending for equal counts.
        stats.sort_by(|a, b| b.count.cmp(&a.count));
        Ok(stats)
    }

    async fn bedroom_distribution(&self, filter: &Filter) -> AppResult<Vec<BedroomBucket>> {
        let inner = self.read()?;
        let mut buckets: BTreeMap<i32, i64> = BTreeMap::new();
        for r in inner.matching(filter) {
            *buckets.entry(r.bedrooms).or_insert(0) += 1;
        }
        Ok(buckets
            .into_iter()
            .map(|(bedrooms, count)| BedroomBucket { bedrooms, count })
            .collect())
    }

    async fn distinct_text(&self, field: TextField, filter: &Filter) -> AppResult<Vec<String>> {
        let inner = self.read()?;
        let values: BTreeSet<&str> = inner.matching(filter).filter_map(|r| field.value(r)).collect();
        Ok(values.into_iter().map(String::from).collect())
    }

    async fn distinct_int(&self, field: IntField, filter: &Filter) -> AppResult<Vec<i32>> {
        let inner = self.read()?;
        let values: BTreeSet<i32> = inner.matching(filter).map(|r| field.value(r)).collect();
        Ok(values.into_iter().collect())
    }
}
