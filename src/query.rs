//! Store-neutral record queries: scope, predicates, sort, and window.
//!
//! The PostgreSQL store renders these into SQL (see `sql::builder`); the in-memory store
//! evaluates them directly with [`Filter::admits`] and [`Sort::compare`].

use crate::model::Apartment;
use serde::Serialize;
use std::cmp::Ordering;

/// Which lifecycle/availability states a query sees. The one place that defines "visible".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    /// `is_available AND deleted_at IS NULL`.
    Visible,
    /// `deleted_at IS NULL`, any availability.
    NotDeleted,
}

impl Scope {
    pub fn sql(&self) -> &'static str {
        match self {
            Scope::Visible => "is_available = TRUE AND deleted_at IS NULL",
            Scope::NotDeleted => "deleted_at IS NULL",
        }
    }

    pub fn admits(&self, apt: &Apartment) -> bool {
        match self {
            Scope::Visible => apt.is_available && !apt.lifecycle.is_deleted(),
            Scope::NotDeleted => !apt.lifecycle.is_deleted(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextField {
    UnitName,
    UnitNumber,
    Project,
    Description,
    Location,
}

impl TextField {
    pub fn column(&self) -> &'static str {
        match self {
            TextField::UnitName => "unit_name",
            TextField::UnitNumber => "unit_number",
            TextField::Project => "project",
            TextField::Description => "description",
            TextField::Location => "location",
        }
    }

    pub fn value<'a>(&self, apt: &'a Apartment) -> Option<&'a str> {
        match self {
            TextField::UnitName => Some(&apt.unit_name),
            TextField::UnitNumber => Some(&apt.unit_number),
            TextField::Project => Some(&apt.project),
            TextField::Description => apt.description.as_deref(),
            TextField::Location => apt.location.as_deref(),
        }
    }
}

/// Fields searched by the free-text `search` parameter.
pub const SEARCH_FIELDS: &[TextField] = &[
    TextField::UnitName,
    TextField::UnitNumber,
    TextField::Project,
    TextField::Description,
    TextField::Location,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntField {
    Bedrooms,
    Bathrooms,
}

impl IntField {
    pub fn column(&self) -> &'static str {
        match self {
            IntField::Bedrooms => "bedrooms",
            IntField::Bathrooms => "bathrooms",
        }
    }

    pub fn value(&self, apt: &Apartment) -> i32 {
        match self {
            IntField::Bedrooms => apt.bedrooms,
            IntField::Bathrooms => apt.bathrooms,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumField {
    Price,
    Area,
}

impl NumField {
    pub fn column(&self) -> &'static str {
        match self {
            NumField::Price => "price",
            NumField::Area => "area",
        }
    }

    pub fn value(&self, apt: &Apartment) -> f64 {
        match self {
            NumField::Price => apt.price,
            NumField::Area => apt.area,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// Substring match on one column.
    Contains { field: TextField, needle: String },
    /// Substring match on any of several columns.
    ContainsAny { fields: &'static [TextField], needle: String },
    IntEq { field: IntField, value: i32 },
    /// Inclusive range.
    Between { field: NumField, min: f64, max: f64 },
    AtLeast { field: NumField, min: f64 },
    AtMost { field: NumField, max: f64 },
    ExcludeId(i64),
}

impl Predicate {
    /// Range predicate from optional bounds: both → inclusive range, one → one-sided, none → nothing.
    pub fn range(field: NumField, min: Option<f64>, max: Option<f64>) -> Option<Predicate> {
        match (min, max) {
            (Some(min), Some(max)) => Some(Predicate::Between { field, min, max }),
            (Some(min), None) => Some(Predicate::AtLeast { field, min }),
            (None, Some(max)) => Some(Predicate::AtMost { field, max }),
            (None, None) => None,
        }
    }

    pub fn admits(&self, apt: &Apartment) -> bool {
        match self {
            Predicate::Contains { field, needle } => {
                field.value(apt).is_some_and(|v| v.contains(needle.as_str()))
            }
            Predicate::ContainsAny { fields, needle } => fields
                .iter()
                .any(|f| f.value(apt).is_some_and(|v| v.contains(needle.as_str()))),
            Predicate::IntEq { field, value } => field.value(apt) == *value,
            Predicate::Between { field, min, max } => {
                let v = field.value(apt);
                v >= *min && v <= *max
            }
            Predicate::AtLeast { field, min } => field.value(apt) >= *min,
            Predicate::AtMost { field, max } => field.value(apt) <= *max,
            Predicate::ExcludeId(id) => apt.id != *id,
        }
    }
}

/// Scope plus a conjunction of predicates.
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub scope: Scope,
    pub predicates: Vec<Predicate>,
}

impl Filter {
    pub fn visible() -> Self {
        Filter {
            scope: Scope::Visible,
            predicates: Vec::new(),
        }
    }

    pub fn not_deleted() -> Self {
        Filter {
            scope: Scope::NotDeleted,
            predicates: Vec::new(),
        }
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn with_opt(self, predicate: Option<Predicate>) -> Self {
        match predicate {
            Some(p) => self.with(p),
            None => self,
        }
    }

    pub fn admits(&self, apt: &Apartment) -> bool {
        self.scope.admits(apt) && self.predicates.iter().all(|p| p.admits(apt))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Price,
    CreatedAt,
    Area,
    Bedrooms,
    ViewCount,
    Id,
}

impl SortField {
    /// Fields a listing request may sort by.
    pub fn parse_listing(s: &str) -> Option<SortField> {
        match s {
            "price" => Some(SortField::Price),
            "createdAt" => Some(SortField::CreatedAt),
            "area" => Some(SortField::Area),
            "bedrooms" => Some(SortField::Bedrooms),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            SortField::Price => "price",
            SortField::CreatedAt => "created_at",
            SortField::Area => "area",
            SortField::Bedrooms => "bedrooms",
            SortField::ViewCount => "view_count",
            SortField::Id => "id",
        }
    }

    fn compare(&self, a: &Apartment, b: &Apartment) -> Ordering {
        match self {
            SortField::Price => a.price.total_cmp(&b.price),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::Area => a.area.total_cmp(&b.area),
            SortField::Bedrooms => a.bedrooms.cmp(&b.bedrooms),
            SortField::ViewCount => a.view_count.cmp(&b.view_count),
            SortField::Id => a.id.cmp(&b.id),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(s: &str) -> Option<SortOrder> {
        if s.eq_ignore_ascii_case("asc") {
            Some(SortOrder::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Some(SortOrder::Desc)
        } else {
            None
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Ordered sort keys. An `id` tiebreak in the direction of the first key is always appended.
#[derive(Clone, Debug, PartialEq)]
pub struct Sort {
    keys: Vec<(SortField, SortOrder)>,
}

impl Sort {
    pub fn by(field: SortField, order: SortOrder) -> Self {
        Sort {
            keys: vec![(field, order)],
        }
    }

    pub fn then(mut self, field: SortField, order: SortOrder) -> Self {
        self.keys.push((field, order));
        self
    }

    /// Keys including the trailing `id` tiebreak.
    pub fn keys(&self) -> Vec<(SortField, SortOrder)> {
        let mut keys = self.keys.clone();
        if !keys.iter().any(|(f, _)| *f == SortField::Id) {
            let dir = keys.first().map(|(_, o)| *o).unwrap_or(SortOrder::Asc);
            keys.push((SortField::Id, dir));
        }
        keys
    }

    pub fn compare(&self, a: &Apartment, b: &Apartment) -> Ordering {
        for (field, order) in self.keys() {
            let ord = field.compare(a, b);
            let ord = match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

/// Offset/limit window. `limit: None` returns every match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: Option<u32>,
}

impl Window {
    pub fn all() -> Self {
        Window {
            offset: 0,
            limit: None,
        }
    }

    pub fn first(limit: u32) -> Self {
        Window {
            offset: 0,
            limit: Some(limit),
        }
    }

    /// Page window: offset = (page - 1) * limit. `page` is 1-based.
    pub fn page(page: u32, limit: u32) -> Self {
        Window {
            offset: u64::from(page.saturating_sub(1)) * u64::from(limit),
            limit: Some(limit),
        }
    }
}

/// Everything a store needs to run a record query.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordQuery {
    pub filter: Filter,
    pub sort: Sort,
    pub window: Window,
}

/// Optional listing filters as accepted from the query string (echoed back in the response).
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_area: Option<f64>,
}

impl ListingFilters {
    /// Visible scope plus one predicate per supplied filter.
    pub fn to_filter(&self) -> Filter {
        Filter::visible()
            .with_opt(self.search.clone().map(|needle| Predicate::ContainsAny {
                fields: SEARCH_FIELDS,
                needle,
            }))
            .with_opt(self.project.clone().map(|needle| Predicate::Contains {
                field: TextField::Project,
                needle,
            }))
            .with_opt(self.location.clone().map(|needle| Predicate::Contains {
                field: TextField::Location,
                needle,
            }))
            .with_opt(Predicate::range(NumField::Price, self.min_price, self.max_price))
            .with_opt(self.bedrooms.map(|value| Predicate::IntEq {
                field: IntField::Bedrooms,
                value,
            }))
            .with_opt(self.bathrooms.map(|value| Predicate::IntEq {
                field: IntField::Bathrooms,
                value,
            }))
            .with_opt(Predicate::range(NumField::Area, self.min_area, self.max_area))
    }
}

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// A validated listing request: filters, page (1-based), limit (1..=100), sort.
#[derive(Clone, Debug, PartialEq)]
pub struct ListingRequest {
    pub filters: ListingFilters,
    pub page: u32,
    pub limit: u32,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl Default for ListingRequest {
    fn default() -> Self {
        ListingRequest {
            filters: ListingFilters::default(),
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            sort_by: SortField::CreatedAt,
            sort_order: SortOrder::Desc,
        }
    }
}

impl ListingRequest {
    pub fn record_query(&self) -> RecordQuery {
        RecordQuery {
            filter: self.filters.to_filter(),
            sort: Sort::by(self.sort_by, self.sort_order),
            window: Window::page(self.page, self.limit),
        }
    }
}
