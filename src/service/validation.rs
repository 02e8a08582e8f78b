//! Request validation: query-string parsing for listings and range/length rules for write bodies.
//! Everything here runs before a service method is called.

use crate::error::AppError;
use crate::model::{round_cents, ApartmentDraft, ApartmentPatch, NewApartment};
use crate::query::{ListingFilters, ListingRequest, SortField, SortOrder, MAX_PAGE_LIMIT};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

const MAX_ROOMS: i32 = 10;
const MAX_PRICE: f64 = 999_999_999_999.99;
const MAX_AREA: f64 = 99_999_999.99;
const URL_PATTERN: &str = r"^https?://[^\s]+$";

/// Listing parameters with no backing column. Rejected rather than silently ignored.
const UNSUPPORTED_FILTERS: &[&str] = &["type", "furnishing", "petFriendly"];

/// Per-field limits for text and numeric inputs.
struct Rule {
    min_length: Option<usize>,
    max_length: Option<usize>,
    minimum: Option<f64>,
    maximum: Option<f64>,
}

const UNIT_NAME: Rule = Rule { min_length: Some(1), max_length: Some(255), minimum: None, maximum: None };
const UNIT_NUMBER: Rule = Rule { min_length: Some(1), max_length: Some(50), minimum: None, maximum: None };
const PROJECT: Rule = Rule { min_length: Some(1), max_length: Some(255), minimum: None, maximum: None };
const LOCATION: Rule = Rule { min_length: None, max_length: Some(255), minimum: None, maximum: None };
const AMENITY: Rule = Rule { min_length: Some(1), max_length: Some(100), minimum: None, maximum: None };
const PRICE: Rule = Rule { min_length: None, max_length: None, minimum: Some(0.0), maximum: Some(MAX_PRICE) };
const AREA: Rule = Rule { min_length: None, max_length: None, minimum: Some(0.0), maximum: Some(MAX_AREA) };
const ROOMS: Rule = Rule { min_length: None, max_length: None, minimum: Some(0.0), maximum: Some(MAX_ROOMS as f64) };

pub struct RequestValidator;

impl RequestValidator {
    /// Parse and validate listing query parameters. Blank values count as absent; malformed or
    /// out-of-range values, unsupported filters, and unknown keys are validation errors.
    pub fn listing(params: &HashMap<String, String>) -> Result<ListingRequest, AppError> {
        let mut req = ListingRequest::default();
        let mut filters = ListingFilters::default();
        for (key, raw) in params {
            let v = raw.trim();
            if v.is_empty() {
                continue;
            }
            match key.as_str() {
                "page" => req.page = parse_page(v)?,
                "limit" => req.limit = parse_limit(key, v, MAX_PAGE_LIMIT)?,
                "search" => filters.search = Some(v.to_string()),
                "project" => filters.project = Some(v.to_string()),
                "location" => filters.location = Some(v.to_string()),
                "minPrice" => filters.min_price = Some(parse_number(key, v, &PRICE)?),
                "maxPrice" => filters.max_price = Some(parse_number(key, v, &PRICE)?),
                "minArea" => filters.min_area = Some(parse_number(key, v, &AREA)?),
                "maxArea" => filters.max_area = Some(parse_number(key, v, &AREA)?),
                "bedrooms" => filters.bedrooms = Some(parse_rooms(key, v)?),
                "bathrooms" => filters.bathrooms = Some(parse_rooms(key, v)?),
                "sortBy" => {
                    req.sort_by = SortField::parse_listing(v).ok_or_else(|| {
                        AppError::Validation(
                            "sortBy must be one of: price, createdAt, area, bedrooms".into(),
                        )
                    })?
                }
                "sortOrder" => {
                    req.sort_order = SortOrder::parse(v)
                        .ok_or_else(|| AppError::Validation("sortOrder must be ASC or DESC".into()))?
                }
                k if UNSUPPORTED_FILTERS.contains(&k) => {
                    return Err(AppError::Validation(format!("filter '{}' is not supported", k)))
                }
                k => return Err(AppError::Validation(format!("unknown query parameter '{}'", k))),
            }
        }
        check_bounds("minPrice", filters.min_price, "maxPrice", filters.max_price)?;
        check_bounds("minArea", filters.min_area, "maxArea", filters.max_area)?;
        req.filters = filters;
        Ok(req)
    }

    /// Optional `limit` query parameter (1..=max), the only key accepted.
    pub fn limit_only(params: &HashMap<String, String>, default: u32, max: u32) -> Result<u32, AppError> {
        let mut limit = default;
        for (key, raw) in params {
            let v = raw.trim();
            match key.as_str() {
                "limit" if v.is_empty() => {}
                "limit" => limit = parse_limit(key, v, max)?,
                k => return Err(AppError::Validation(format!("unknown query parameter '{}'", k))),
            }
        }
        Ok(limit)
    }

    /// Decode and validate a create body. Trims text, drops blank optionals, derives the slug.
    pub fn new_apartment(body: Value) -> Result<ApartmentDraft, AppError> {
        let mut new: NewApartment = serde_json::from_value(body).map_err(|e| AppError::Validation(e.to_string()))?;
        new.unit_name = validate_text("unitName", &new.unit_name, &UNIT_NAME)?;
        new.unit_number = validate_text("unitNumber", &new.unit_number, &UNIT_NUMBER)?;
        new.project = validate_text("project", &new.project, &PROJECT)?;
        new.description = blank_to_none(new.description);
        new.location = match blank_to_none(new.location) {
            Some(l) => Some(validate_text("location", &l, &LOCATION)?),
            None => None,
        };
        validate_number("price", new.price, &PRICE)?;
        validate_number("area", new.area, &AREA)?;
        new.price = round_cents(new.price);
        new.area = round_cents(new.area);
        validate_number("bedrooms", f64::from(new.bedrooms), &ROOMS)?;
        validate_number("bathrooms", f64::from(new.bathrooms), &ROOMS)?;
        if let Some(images) = &new.images {
            validate_images(images)?;
        }
        if let Some(amenities) = new.amenities.take() {
            new.amenities = Some(validate_amenities(amenities)?);
        }
        Ok(ApartmentDraft::from(new))
    }

    /// Decode and validate an update body. Only supplied fields are checked; at least one is required.
    pub fn patch(body: Value) -> Result<ApartmentPatch, AppError> {
        let mut patch: ApartmentPatch =
            serde_json::from_value(body).map_err(|e| AppError::Validation(e.to_string()))?;
        if patch.is_empty() {
            return Err(AppError::Validation("update body must contain at least one field".into()));
        }
        if let Some(v) = &patch.unit_name {
            patch.unit_name = Some(validate_text("unitName", v, &UNIT_NAME)?);
        }
        if let Some(v) = &patch.unit_number {
            patch.unit_number = Some(validate_text("unitNumber", v, &UNIT_NUMBER)?);
        }
        if let Some(v) = &patch.project {
            patch.project = Some(validate_text("project", v, &PROJECT)?);
        }
        if let Some(v) = patch.description.take() {
            patch.description = Some(blank_to_none(v));
        }
        if let Some(v) = patch.location.take() {
            patch.location = Some(match blank_to_none(v) {
                Some(l) => Some(validate_text("location", &l, &LOCATION)?),
                None => None,
            });
        }
        if let Some(v) = patch.price {
            validate_number("price", v, &PRICE)?;
            patch.price = Some(round_cents(v));
        }
        if let Some(v) = patch.area {
            validate_number("area", v, &AREA)?;
            patch.area = Some(round_cents(v));
        }
        if let Some(v) = patch.bedrooms {
            validate_number("bedrooms", f64::from(v), &ROOMS)?;
        }
        if let Some(v) = patch.bathrooms {
            validate_number("bathrooms", f64::from(v), &ROOMS)?;
        }
        if let Some(images) = &patch.images {
            validate_images(images)?;
        }
        if let Some(amenities) = patch.amenities.take() {
            patch.amenities = Some(validate_amenities(amenities)?);
        }
        Ok(patch)
    }

    /// Path id: a positive integer.
    pub fn id(raw: &str) -> Result<i64, AppError> {
        match raw.parse::<i64>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(AppError::BadRequest("invalid id".into())),
        }
    }
}

fn parse_page(v: &str) -> Result<u32, AppError> {
    match v.parse::<u32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(AppError::Validation("page must be a positive integer".into())),
    }
}

fn parse_limit(key: &str, v: &str, max: u32) -> Result<u32, AppError> {
    match v.parse::<u32>() {
        Ok(n) if (1..=max).contains(&n) => Ok(n),
        _ => Err(AppError::Validation(format!(
            "{} must be an integer between 1 and {}",
            key, max
        ))),
    }
}

fn parse_number(key: &str, v: &str, rule: &Rule) -> Result<f64, AppError> {
    let n = v
        .parse::<f64>()
        .map_err(|_| AppError::Validation(format!("{} must be a number", key)))?;
    validate_number(key, n, rule)?;
    Ok(n)
}

fn parse_rooms(key: &str, v: &str) -> Result<i32, AppError> {
    let n = v
        .parse::<i32>()
        .map_err(|_| AppError::Validation(format!("{} must be an integer", key)))?;
    validate_number(key, f64::from(n), &ROOMS)?;
    Ok(n)
}

fn check_bounds(min_key: &str, min: Option<f64>, max_key: &str, max: Option<f64>) -> Result<(), AppError> {
    match (min, max) {
        (Some(lo), Some(hi)) if lo > hi => Err(AppError::Validation(format!(
            "{} must not exceed {}",
            min_key, max_key
        ))),
        _ => Ok(()),
    }
}

fn validate_number(col: &str, n: f64, rule: &Rule) -> Result<(), AppError> {
    if !n.is_finite() {
        return Err(AppError::Validation(format!("{} must be a finite number", col)));
    }
    if let Some(min) = rule.minimum {
        if n < min {
            return Err(AppError::Validation(format!("{} must be at least {}", col, min)));
        }
    }
    if let Some(max) = rule.maximum {
        if n > max {
            return Err(AppError::Validation(format!("{} must be at most {}", col, max)));
        }
    }
    Ok(())
}

/// Trimmed text within the rule's length bounds (counted in characters).
fn validate_text(col: &str, s: &str, rule: &Rule) -> Result<String, AppError> {
    let s = s.trim();
    let len = s.chars().count();
    if let Some(min) = rule.min_length {
        if len < min {
            return Err(AppError::Validation(if min == 1 {
                format!("{} is required", col)
            } else {
                format!("{} must be at least {} characters", col, min)
            }));
        }
    }
    if let Some(max) = rule.max_length {
        if len > max {
            return Err(AppError::Validation(format!(
                "{} must be at most {} characters",
                col, max
            )));
        }
    }
    Ok(s.to_string())
}

fn blank_to_none(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn validate_images(images: &[String]) -> Result<(), AppError> {
    let re = Regex::new(URL_PATTERN).map_err(|_| AppError::Internal("invalid image url pattern".into()))?;
    for url in images {
        if !re.is_match(url) {
            return Err(AppError::Validation(format!("images must be http(s) URLs, got '{}'", url)));
        }
    }
    Ok(())
}

fn validate_amenities(amenities: Vec<String>) -> Result<Vec<String>, AppError> {
    amenities
        .iter()
        .map(|a| validate_text("amenities", a, &AMENITY))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn valid_body() -> Value {
        json!({
            "unitName": "  Sky Villa ",
            "unitNumber": "A1-001",
            "project": "Skyline",
            "price": 1500,
            "bedrooms": 2,
            "bathrooms": 1,
            "area": 72.5,
            "images": ["https://cdn.example.com/a.jpg"],
            "amenities": [" pool ", "gym"]
        })
    }

    #[test]
    fn listing_defaults() {
        let req = RequestValidator::listing(&HashMap::new()).unwrap();
        assert_eq!(req, ListingRequest::default());
        assert_eq!(req.limit, 10);
        assert_eq!(req.sort_by, SortField::CreatedAt);
        assert_eq!(req.sort_order, SortOrder::Desc);
    }

    #[test]
    fn listing_parses_every_filter() {
        let req = RequestValidator::listing(&params(&[
            ("page", "2"),
            ("limit", "25"),
            ("search", "view"),
            ("project", "Sky"),
            ("location", "Down"),
            ("minPrice", "100"),
            ("maxPrice", "2000.5"),
            ("bedrooms", "2"),
            ("bathrooms", "1"),
            ("minArea", "40"),
            ("maxArea", "90"),
            ("sortBy", "price"),
            ("sortOrder", "asc"),
        ]))
        .unwrap();
        assert_eq!(req.page, 2);
        assert_eq!(req.limit, 25);
        assert_eq!(req.filters.max_price, Some(2000.5));
        assert_eq!(req.filters.bathrooms, Some(1));
        assert_eq!(req.sort_by, SortField::Price);
        assert_eq!(req.sort_order, SortOrder::Asc);
    }

    #[test]
    fn malformed_numbers_are_rejected_not_coerced() {
        for (k, v) in [
            ("minPrice", "cheap"),
            ("maxArea", "NaN"),
            ("bedrooms", "two"),
            ("bedrooms", "11"),
            ("page", "0"),
            ("limit", "101"),
            ("limit", "-1"),
        ] {
            assert_matches!(
                RequestValidator::listing(&params(&[(k, v)])),
                Err(AppError::Validation(_)),
                "{}={}",
                k,
                v
            );
        }
    }

    #[test]
    fn blank_values_are_absent() {
        let req = RequestValidator::listing(&params(&[("search", "  "), ("minPrice", "")])).unwrap();
        assert_eq!(req.filters, ListingFilters::default());
    }

    #[test]
    fn unsupported_filters_are_named() {
        let err = RequestValidator::listing(&params(&[("petFriendly", "true")])).unwrap_err();
        assert_eq!(err.to_string(), "validation: filter 'petFriendly' is not supported");
        assert_matches!(
            RequestValidator::listing(&params(&[("colour", "red")])),
            Err(AppError::Validation(_))
        );
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert_matches!(
            RequestValidator::listing(&params(&[("minPrice", "500"), ("maxPrice", "100")])),
            Err(AppError::Validation(_))
        );
    }

    #[test]
    fn bad_sort_is_rejected() {
        assert_matches!(
            RequestValidator::listing(&params(&[("sortBy", "viewCount")])),
            Err(AppError::Validation(_))
        );
    }

    #[test]
    fn create_body_is_normalized() {
        let draft = RequestValidator::new_apartment(valid_body()).unwrap();
        assert_eq!(draft.unit_name, "Sky Villa");
        assert_eq!(draft.amenities, vec!["pool".to_string(), "gym".to_string()]);
        assert_eq!(draft.slug, "sky-villa-a1-001");
    }

    #[test]
    fn money_and_area_are_rounded_to_cents() {
        let mut body = valid_body();
        body["price"] = json!(1234.567);
        body["area"] = json!(72.504);
        let draft = RequestValidator::new_apartment(body).unwrap();
        assert_eq!(draft.price, 1234.57);
        assert_eq!(draft.area, 72.5);

        let patch = RequestValidator::patch(json!({ "price": 999.999, "area": 10.001 })).unwrap();
        assert_eq!(patch.price, Some(1000.0));
        assert_eq!(patch.area, Some(10.0));
    }

    #[test]
    fn create_body_range_checks() {
        for (k, v) in [
            ("bedrooms", json!(11)),
            ("bathrooms", json!(-1)),
            ("price", json!(-0.01)),
            ("area", json!(-5)),
            ("price", json!("1000")),
            ("unitName", json!("   ")),
            ("images", json!(["ftp://nope"])),
        ] {
            let mut body = valid_body();
            body[k] = v;
            assert_matches!(RequestValidator::new_apartment(body), Err(AppError::Validation(_)), "{}", k);
        }
    }

    #[test]
    fn create_body_requires_fields() {
        let mut body = valid_body();
        body.as_object_mut().unwrap().remove("unitNumber");
        let err = RequestValidator::new_apartment(body).unwrap_err();
        assert!(err.to_string().contains("unitNumber"));
    }

    #[test]
    fn patch_rejects_empty_and_view_count() {
        assert_matches!(RequestValidator::patch(json!({})), Err(AppError::Validation(_)));
        assert_matches!(RequestValidator::patch(json!({ "viewCount": 99 })), Err(AppError::Validation(_)));
        assert_matches!(RequestValidator::patch(json!({ "bedrooms": 12 })), Err(AppError::Validation(_)));
    }

    #[test]
    fn patch_blank_description_clears() {
        let patch = RequestValidator::patch(json!({ "description": "  " })).unwrap();
        assert_eq!(patch.description, Some(None));
    }

    #[test]
    fn ids_must_be_positive_integers() {
        assert_eq!(RequestValidator::id("42").unwrap(), 42);
        assert_matches!(RequestValidator::id("abc"), Err(AppError::BadRequest(_)));
        assert_matches!(RequestValidator::id("0"), Err(AppError::BadRequest(_)));
    }

    #[test]
    fn limit_only_accepts_just_limit() {
        assert_eq!(RequestValidator::limit_only(&HashMap::new(), 6, 100).unwrap(), 6);
        assert_eq!(RequestValidator::limit_only(&params(&[("limit", "3")]), 6, 100).unwrap(), 3);
        assert_matches!(
            RequestValidator::limit_only(&params(&[("page", "3")]), 6, 100),
            Err(AppError::Validation(_))
        );
    }
}
