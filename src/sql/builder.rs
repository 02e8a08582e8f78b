//! Builds parameterized PostgreSQL statements for the apartments table.
//! Identifiers come from fixed enums only; every user value is a bound parameter.

use crate::model::{ApartmentDraft, ApartmentPatch};
use crate::query::{Filter, IntField, Predicate, RecordQuery, Scope, TextField};
use crate::sql::params::{like_contains, BindValue};

/// Quote identifier for PostgreSQL.
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
pub fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<BindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: BindValue) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

/// Selected columns in `ApartmentRow` order. Numeric columns come back as float8.
const SELECT_COLUMNS: &str = "id, unit_name, unit_number, project, description, \
price::float8 AS price, bedrooms, bathrooms, area::float8 AS area, location, images, amenities, \
is_available, slug, view_count, is_featured, created_at, updated_at, deleted_at";

/// WHERE body for a filter: the scope first, then each predicate, joined with AND.
fn where_body(q: &mut QueryBuf, filter: &Filter) -> String {
    let mut parts = vec![filter.scope.sql().to_string()];
    for p in &filter.predicates {
        parts.push(predicate_sql(q, p));
    }
    parts.join(" AND ")
}

fn predicate_sql(q: &mut QueryBuf, p: &Predicate) -> String {
    match p {
        Predicate::Contains { field, needle } => {
            let n = q.push_param(BindValue::Text(like_contains(needle)));
            format!("{} LIKE ${}", field.column(), n)
        }
        Predicate::ContainsAny { fields, needle } => {
            let n = q.push_param(BindValue::Text(like_contains(needle)));
            let ors: Vec<String> = fields
                .iter()
                .map(|f| format!("{} LIKE ${}", f.column(), n))
                .collect();
            format!("({})", ors.join(" OR "))
        }
        Predicate::IntEq { field, value } => {
            let n = q.push_param(BindValue::I32(*value));
            format!("{} = ${}", field.column(), n)
        }
        Predicate::Between { field, min, max } => {
            let lo = q.push_param(BindValue::F64(*min));
            let hi = q.push_param(BindValue::F64(*max));
            format!("{} BETWEEN ${}::numeric AND ${}::numeric", field.column(), lo, hi)
        }
        Predicate::AtLeast { field, min } => {
            let n = q.push_param(BindValue::F64(*min));
            format!("{} >= ${}::numeric", field.column(), n)
        }
        Predicate::AtMost { field, max } => {
            let n = q.push_param(BindValue::F64(*max));
            format!("{} <= ${}::numeric", field.column(), n)
        }
        Predicate::ExcludeId(id) => {
            let n = q.push_param(BindValue::I64(*id));
            format!("id <> ${}", n)
        }
    }
}

/// SELECT page: filter, ORDER BY sort keys (with id tiebreak), LIMIT/OFFSET.
pub fn select_records(table: &str, query: &RecordQuery) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = where_body(&mut q, &query.filter);
    let order: Vec<String> = query
        .sort
        .keys()
        .iter()
        .map(|(f, o)| format!("{} {}", f.column(), o.sql()))
        .collect();
    let limit_clause = query
        .window
        .limit
        .map(|n| format!(" LIMIT {}", n))
        .unwrap_or_default();
    let offset_clause = if query.window.offset > 0 {
        format!(" OFFSET {}", query.window.offset)
    } else {
        String::new()
    };
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} ORDER BY {}{}{}",
        SELECT_COLUMNS,
        table,
        where_clause,
        order.join(", "),
        limit_clause,
        offset_clause
    );
    q
}

pub fn count(table: &str, filter: &Filter) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = where_body(&mut q, filter);
    q.sql = format!("SELECT COUNT(*) FROM {} WHERE {}", table, where_clause);
    q
}

/// SELECT one record by id within a scope.
pub fn select_by_id(table: &str, id: i64, scope: Scope) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(BindValue::I64(id));
    q.sql = format!(
        "SELECT {} FROM {} WHERE id = ${} AND {}",
        SELECT_COLUMNS,
        table,
        n,
        scope.sql()
    );
    q
}

/// Whether a non-deleted record already holds `unit_number`, optionally ignoring one id.
pub fn unit_number_taken(table: &str, unit_number: &str, exclude_id: Option<i64>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(BindValue::Text(unit_number.to_string()));
    let exclude = match exclude_id {
        Some(id) => format!(" AND id <> ${}", q.push_param(BindValue::I64(id))),
        None => String::new(),
    };
    q.sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE unit_number = ${} AND {}{})",
        table,
        n,
        Scope::NotDeleted.sql(),
        exclude
    );
    q
}

/// INSERT with view_count starting at 0. Numeric columns get an explicit cast.
pub fn insert(table: &str, draft: &ApartmentDraft) -> QueryBuf {
    let mut q = QueryBuf::new();
    let values: Vec<(&str, BindValue, Option<&str>)> = vec![
        ("unit_name", BindValue::Text(draft.unit_name.clone()), None),
        ("unit_number", BindValue::Text(draft.unit_number.clone()), None),
        ("project", BindValue::Text(draft.project.clone()), None),
        ("description", BindValue::NullableText(draft.description.clone()), None),
        ("price", BindValue::F64(draft.price), Some("numeric")),
        ("bedrooms", BindValue::I32(draft.bedrooms), None),
        ("bathrooms", BindValue::I32(draft.bathrooms), None),
        ("area", BindValue::F64(draft.area), Some("numeric")),
        ("location", BindValue::NullableText(draft.location.clone()), None),
        ("images", BindValue::TextArray(draft.images.clone()), None),
        ("amenities", BindValue::TextArray(draft.amenities.clone()), None),
        ("is_available", BindValue::Bool(draft.is_available), None),
        ("is_featured", BindValue::Bool(draft.is_featured), None),
        ("slug", BindValue::Text(draft.slug.clone()), None),
    ];
    let mut cols = Vec::with_capacity(values.len() + 1);
    let mut placeholders = Vec::with_capacity(values.len() + 1);
    for (col, val, cast) in values {
        let n = q.push_param(val);
        cols.push(col);
        placeholders.push(match cast {
            Some(t) => format!("${}::{}", n, t),
            None => format!("${}", n),
        });
    }
    cols.push("view_count");
    placeholders.push("0".to_string());
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        table,
        cols.join(", "),
        placeholders.join(", "),
        SELECT_COLUMNS
    );
    q
}

/// UPDATE by id: SET only supplied fields, refresh updated_at. Deleted rows are not touched.
/// view_count and slug are never written here.
pub fn update(table: &str, id: i64, patch: &ApartmentPatch) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    let mut set = |q: &mut QueryBuf, col: &str, val: BindValue, cast: Option<&str>| {
        let n = q.push_param(val);
        let rhs = match cast {
            Some(t) => format!("${}::{}", n, t),
            None => format!("${}", n),
        };
        sets.push(format!("{} = {}", col, rhs));
    };
    if let Some(v) = &patch.unit_name {
        set(&mut q, "unit_name", BindValue::Text(v.clone()), None);
    }
    if let Some(v) = &patch.unit_number {
        set(&mut q, "unit_number", BindValue::Text(v.clone()), None);
    }
    if let Some(v) = &patch.project {
        set(&mut q, "project", BindValue::Text(v.clone()), None);
    }
    if let Some(v) = &patch.description {
        set(&mut q, "description", BindValue::NullableText(v.clone()), None);
    }
    if let Some(v) = patch.price {
        set(&mut q, "price", BindValue::F64(v), Some("numeric"));
    }
    if let Some(v) = patch.bedrooms {
        set(&mut q, "bedrooms", BindValue::I32(v), None);
    }
    if let Some(v) = patch.bathrooms {
        set(&mut q, "bathrooms", BindValue::I32(v), None);
    }
    if let Some(v) = patch.area {
        set(&mut q, "area", BindValue::F64(v), Some("numeric"));
    }
    if let Some(v) = &patch.location {
        set(&mut q, "location", BindValue::NullableText(v.clone()), None);
    }
    if let Some(v) = &patch.images {
        set(&mut q, "images", BindValue::TextArray(v.clone()), None);
    }
    if let Some(v) = &patch.amenities {
        set(&mut q, "amenities", BindValue::TextArray(v.clone()), None);
    }
    if let Some(v) = patch.is_available {
        set(&mut q, "is_available", BindValue::Bool(v), None);
    }
    if let Some(v) = patch.is_featured {
        set(&mut q, "is_featured", BindValue::Bool(v), None);
    }
    sets.push("updated_at = NOW()".to_string());
    let id_param = q.push_param(BindValue::I64(id));
    q.sql = format!(
        "UPDATE {} SET {} WHERE id = ${} AND {} RETURNING {}",
        table,
        sets.join(", "),
        id_param,
        Scope::NotDeleted.sql(),
        SELECT_COLUMNS
    );
    q
}

/// Soft delete a visible record: unavailable and stamped with deleted_at.
pub fn soft_delete(table: &str, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(BindValue::I64(id));
    q.sql = format!(
        "UPDATE {} SET is_available = FALSE, deleted_at = NOW(), updated_at = NOW() \
         WHERE id = ${} AND {} RETURNING {}",
        table,
        n,
        Scope::Visible.sql(),
        SELECT_COLUMNS
    );
    q
}

/// Atomic view increment on a visible record; returns the updated row.
pub fn increment_views(table: &str, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(BindValue::I64(id));
    q.sql = format!(
        "UPDATE {} SET view_count = view_count + 1 WHERE id = ${} AND {} RETURNING {}",
        table,
        n,
        Scope::Visible.sql(),
        SELECT_COLUMNS
    );
    q
}

/// (avg, min, max) of price; 0 for an empty set.
pub fn price_summary(table: &str, filter: &Filter) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = where_body(&mut q, filter);
    q.sql = format!(
        "SELECT COALESCE(AVG(price), 0)::float8, COALESCE(MIN(price), 0)::float8, \
         COALESCE(MAX(price), 0)::float8 FROM {} WHERE {}",
        table, where_clause
    );
    q
}

/// (project, count, avg price) per project, most populated first.
pub fn project_breakdown(table: &str, filter: &Filter) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = where_body(&mut q, filter);
    q.sql = format!(
        "SELECT project, COUNT(*) AS count, COALESCE(AVG(price), 0)::float8 AS average_price \
         FROM {} WHERE {} GROUP BY project ORDER BY count DESC, project ASC",
        table, where_clause
    );
    q
}

/// (bedrooms, count) ascending by bedrooms.
pub fn bedroom_distribution(table: &str, filter: &Filter) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = where_body(&mut q, filter);
    q.sql = format!(
        "SELECT bedrooms, COUNT(*) AS count FROM {} WHERE {} GROUP BY bedrooms ORDER BY bedrooms ASC",
        table, where_clause
    );
    q
}

/// Distinct non-null values of a text column, ascending.
pub fn distinct_text(table: &str, field: TextField, filter: &Filter) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = where_body(&mut q, filter);
    let col = field.column();
    q.sql = format!(
        "SELECT DISTINCT {col} FROM {table} WHERE {where_clause} AND {col} IS NOT NULL ORDER BY {col} ASC"
    );
    q
}

/// Distinct values of an integer column, ascending.
pub fn distinct_int(table: &str, field: IntField, filter: &Filter) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = where_body(&mut q, filter);
    let col = field.column();
    q.sql = format!("SELECT DISTINCT {col} FROM {table} WHERE {where_clause} ORDER BY {col} ASC");
    q
}
