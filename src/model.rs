//! Apartment record, write payloads, and slug derivation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Soft-delete state of a record. Serialized as the nullable `deletedAt` field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Lifecycle {
    #[default]
    Active,
    Deleted { at: DateTime<Utc> },
}

impl Lifecycle {
    pub fn from_deleted_at(deleted_at: Option<DateTime<Utc>>) -> Self {
        match deleted_at {
            Some(at) => Lifecycle::Deleted { at },
            None => Lifecycle::Active,
        }
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Lifecycle::Active => None,
            Lifecycle::Deleted { at } => Some(*at),
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, Lifecycle::Deleted { .. })
    }
}

impl Serialize for Lifecycle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.deleted_at().serialize(serializer)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Apartment {
    pub id: i64,
    pub unit_name: String,
    pub unit_number: String,
    pub project: String,
    pub description: Option<String>,
    pub price: f64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area: f64,
    pub location: Option<String>,
    pub images: Vec<String>,
    pub amenities: Vec<String>,
    pub is_available: bool,
    pub slug: String,
    pub view_count: i64,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "deletedAt")]
    pub lifecycle: Lifecycle,
}

/// Row shape as selected from PostgreSQL (numeric columns cast to float8).
#[derive(Debug, sqlx::FromRow)]
pub struct ApartmentRow {
    pub id: i64,
    pub unit_name: String,
    pub unit_number: String,
    pub project: String,
    pub description: Option<String>,
    pub price: f64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area: f64,
    pub location: Option<String>,
    pub images: Vec<String>,
    pub amenities: Vec<String>,
    pub is_available: bool,
    pub slug: String,
    pub view_count: i64,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<ApartmentRow> for Apartment {
    fn from(r: ApartmentRow) -> Self {
        Apartment {
            id: r.id,
            unit_name: r.unit_name,
            unit_number: r.unit_number,
            project: r.project,
            description: r.description,
            price: r.price,
            bedrooms: r.bedrooms,
            bathrooms: r.bathrooms,
            area: r.area,
            location: r.location,
            images: r.images,
            amenities: r.amenities,
            is_available: r.is_available,
            slug: r.slug,
            view_count: r.view_count,
            is_featured: r.is_featured,
            created_at: r.created_at,
            updated_at: r.updated_at,
            lifecycle: Lifecycle::from_deleted_at(r.deleted_at),
        }
    }
}

/// POST body. Required fields are non-optional; unknown keys (e.g. `viewCount`, `slug`) are rejected.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewApartment {
    pub unit_name: String,
    pub unit_number: String,
    pub project: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area: f64,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub amenities: Option<Vec<String>>,
    #[serde(default)]
    pub is_available: Option<bool>,
    #[serde(default)]
    pub is_featured: Option<bool>,
}

/// Validated create payload with defaults applied and slug derived; what the store inserts.
#[derive(Clone, Debug, PartialEq)]
pub struct ApartmentDraft {
    pub unit_name: String,
    pub unit_number: String,
    pub project: String,
    pub description: Option<String>,
    pub price: f64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area: f64,
    pub location: Option<String>,
    pub images: Vec<String>,
    pub amenities: Vec<String>,
    pub is_available: bool,
    pub is_featured: bool,
    pub slug: String,
}

impl From<NewApartment> for ApartmentDraft {
    fn from(n: NewApartment) -> Self {
        let slug = slugify(&format!("{} {}", n.unit_name, n.unit_number));
        ApartmentDraft {
            unit_name: n.unit_name,
            unit_number: n.unit_number,
            project: n.project,
            description: n.description,
            price: n.price,
            bedrooms: n.bedrooms,
            bathrooms: n.bathrooms,
            area: n.area,
            location: n.location,
            images: n.images.unwrap_or_default(),
            amenities: n.amenities.unwrap_or_default(),
            is_available: n.is_available.unwrap_or(true),
            is_featured: n.is_featured.unwrap_or(false),
            slug,
        }
    }
}

/// PUT body: only supplied fields are written. Nullable columns use `Option<Option<_>>`
/// so an explicit `null` clears the value while an absent key leaves it untouched.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ApartmentPatch {
    pub unit_name: Option<String>,
    pub unit_number: Option<String>,
    pub project: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub description: Option<Option<String>>,
    pub price: Option<f64>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area: Option<f64>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub location: Option<Option<String>>,
    pub images: Option<Vec<String>>,
    pub amenities: Option<Vec<String>>,
    pub is_available: Option<bool>,
    pub is_featured: Option<bool>,
}

impl ApartmentPatch {
    pub fn is_empty(&self) -> bool {
        self.unit_name.is_none()
            && self.unit_number.is_none()
            && self.project.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.bedrooms.is_none()
            && self.bathrooms.is_none()
            && self.area.is_none()
            && self.location.is_none()
            && self.images.is_none()
            && self.amenities.is_none()
            && self.is_available.is_none()
            && self.is_featured.is_none()
    }

    /// Apply supplied fields to an in-memory record. Slug is left as created.
    pub fn apply_to(&self, apt: &mut Apartment) {
        if let Some(v) = &self.unit_name {
            apt.unit_name = v.clone();
        }
        if let Some(v) = &self.unit_number {
            apt.unit_number = v.clone();
        }
        if let Some(v) = &self.project {
            apt.project = v.clone();
        }
        if let Some(v) = &self.description {
            apt.description = v.clone();
        }
        if let Some(v) = self.price {
            apt.price = v;
        }
        if let Some(v) = self.bedrooms {
            apt.bedrooms = v;
        }
        if let Some(v) = self.bathrooms {
            apt.bathrooms = v;
        }
        if let Some(v) = self.area {
            apt.area = v;
        }
        if let Some(v) = &self.location {
            apt.location = v.clone();
        }
        if let Some(v) = &self.images {
            apt.images = v.clone();
        }
        if let Some(v) = &self.amenities {
            apt.amenities = v.clone();
        }
        if let Some(v) = self.is_available {
            apt.is_available = v;
        }
        if let Some(v) = self.is_featured {
            apt.is_featured = v;
        }
    }
}

fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Round to whole cents, the precision the table stores prices and areas at.
pub fn round_cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// URL-friendly slug: lower-cased, every run of non-alphanumerics becomes one `-`, ends trimmed.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_sep = false;
    for c in input.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('-');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }
    out
}
