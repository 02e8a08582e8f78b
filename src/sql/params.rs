//! Typed bind values collected while building a statement, and binding them onto a sqlx query.

use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::QueryAs;

/// A value bound to a `$n` placeholder. Each variant binds as its native PostgreSQL type.
#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    Bool(bool),
    I32(i32),
    I64(i64),
    F64(f64),
    Text(String),
    NullableText(Option<String>),
    TextArray(Vec<String>),
}

pub fn bind_as<'q, O>(
    query: QueryAs<'q, Postgres, O, PgArguments>,
    v: &BindValue,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    match v.clone() {
        BindValue::Bool(b) => query.bind(b),
        BindValue::I32(n) => query.bind(n),
        BindValue::I64(n) => query.bind(n),
        BindValue::F64(n) => query.bind(n),
        BindValue::Text(s) => query.bind(s),
        BindValue::NullableText(s) => query.bind(s),
        BindValue::TextArray(a) => query.bind(a),
    }
}

/// Escape `LIKE` wildcards so a user needle is matched literally inside `%…%`.
pub fn like_contains(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}
