//! Aggregate report and filter-option lookup.
//!
//! `totalApartments` counts every record that is not soft-deleted, while the price figures and
//! breakdowns cover visible records only; `unavailableApartments` is the difference between
//! the two counts. The individual aggregates are separate reads, not one snapshot.

use crate::error::AppError;
use crate::model::round_cents;
use crate::query::{Filter, IntField, TextField};
use crate::store::{ApartmentStore, BedroomBucket, ProjectStat};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub total_apartments: i64,
    pub available_apartments: i64,
    pub unavailable_apartments: i64,
    pub average_price: f64,
    pub price_range: PriceRange,
    pub project_stats: Vec<ProjectStat>,
    pub bedroom_distribution: Vec<BedroomBucket>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub projects: Vec<String>,
    pub locations: Vec<String>,
    pub price_range: PriceRange,
    pub bedrooms: Vec<i32>,
    pub bathrooms: Vec<i32>,
}

pub struct StatsService;

impl StatsService {
    pub async fn report(store: &dyn ApartmentStore) -> Result<StatsReport, AppError> {
        let visible = Filter::visible();
        let total = store.count(&Filter::not_deleted()).await?;
        let available = store.count(&visible).await?;
        let prices = store.price_summary(&visible).await?;
        let project_stats = store
            .project_breakdown(&visible)
            .await?
            .into_iter()
            .map(|p| ProjectStat {
                average_price: round_cents(p.average_price),
                ..p
            })
            .collect();
        let bedroom_distribution = store.bedroom_distribution(&visible).await?;
        Ok(StatsReport {
            total_apartments: total,
            available_apartments: available,
            unavailable_apartments: total - available,
            average_price: round_cents(prices.average),
            price_range: PriceRange {
                min: prices.min,
                max: prices.max,
            },
            project_stats,
            bedroom_distribution,
            generated_at: Utc::now(),
        })
    }

    /// Distinct values for populating the filter form, over visible records.
    pub async fn filter_options(store: &dyn ApartmentStore) -> Result<FilterOptions, AppError> {
        let visible = Filter::visible();
        let prices = store.price_summary(&visible).await?;
        Ok(FilterOptions {
            projects: store.distinct_text(TextField::Project, &visible).await?,
            locations: store.distinct_text(TextField::Location, &visible).await?,
            price_range: PriceRange {
                min: prices.min,
                max: prices.max,
            },
            bedrooms: store.distinct_int(IntField::Bedrooms, &visible).await?,
            bathrooms: store.distinct_int(IntField::Bathrooms, &visible).await?,
        })
    }
}
