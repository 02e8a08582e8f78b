//! PostgreSQL store: table DDL, database bootstrap, and `ApartmentStore` over a `PgPool`.

use crate::error::{AppError, AppResult};
use crate::model::{Apartment, ApartmentDraft, ApartmentPatch, ApartmentRow};
use crate::query::{Filter, IntField, RecordQuery, Scope, TextField};
use crate::sql::{self, bind_as, qualified_table, quoted, QueryBuf};
use crate::store::{ApartmentStore, BedroomBucket, PriceSummary, ProjectStat};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{ConnectOptions, FromRow, PgPool};
use std::str::FromStr;

pub const TABLE_NAME: &str = "apartments";

/// Create the schema, the apartments table and its indexes if they do not exist.
/// Unit numbers are unique only among rows that are not soft-deleted.
pub async fn ensure_schema(pool: &PgPool, schema: &str) -> Result<(), AppError> {
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema)))
        .execute(pool)
        .await?;

    let table = qualified_table(schema, TABLE_NAME);
    let ddl = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id BIGSERIAL PRIMARY KEY,
            unit_name VARCHAR(255) NOT NULL,
            unit_number VARCHAR(50) NOT NULL,
            project VARCHAR(255) NOT NULL,
            description TEXT,
            price NUMERIC(14, 2) NOT NULL CHECK (price >= 0),
            bedrooms INTEGER NOT NULL CHECK (bedrooms BETWEEN 0 AND 10),
            bathrooms INTEGER NOT NULL CHECK (bathrooms BETWEEN 0 AND 10),
            area NUMERIC(10, 2) NOT NULL CHECK (area >= 0),
            location VARCHAR(255),
            images TEXT[] NOT NULL DEFAULT '{{}}',
            amenities TEXT[] NOT NULL DEFAULT '{{}}',
            is_available BOOLEAN NOT NULL DEFAULT TRUE,
            slug VARCHAR(320) NOT NULL,
            view_count BIGINT NOT NULL DEFAULT 0 CHECK (view_count >= 0),
            is_featured BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            deleted_at TIMESTAMPTZ,
            CHECK (deleted_at IS NULL OR is_available = FALSE)
        )
        "#,
        table
    );
    sqlx::query(&ddl).execute(pool).await?;

    let indexes = [
        format!(
            "CREATE INDEX IF NOT EXISTS apartments_project_available_idx ON {} (project, is_available)",
            table
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS apartments_price_bedrooms_available_idx ON {} (price, bedrooms, is_available)",
            table
        ),
        format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS apartments_unit_number_live_idx ON {} (unit_number) WHERE deleted_at IS NULL",
            table
        ),
    ];
    for ddl in &indexes {
        sqlx::query(ddl).execute(pool).await?;
    }
    tracing::info!(table = %table, "apartments table ready");
    Ok(())
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::BadRequest(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quoted(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| AppError::BadRequest("DATABASE_URL: no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let (db_name, query) = match path_and_query.split_once('?') {
        Some((name, query)) => (name.trim(), Some(query)),
        None => (path_and_query.trim(), None),
    };
    let base = url.get(..path_start).unwrap_or(url);
    let admin_url = match query {
        Some(query) => format!("{}postgres?{}", base, query),
        None => format!("{}postgres", base),
    };
    Ok((admin_url, db_name.to_string()))
}

#[derive(Clone)]
pub struct PgApartmentStore {
    pool: PgPool,
    table: String,
}

impl PgApartmentStore {
    pub fn new(pool: PgPool, schema: &str) -> Self {
        PgApartmentStore {
            pool,
            table: qualified_table(schema, TABLE_NAME),
        }
    }

    async fn fetch_all_raw<O>(&self, q: &QueryBuf) -> Result<Vec<O>, sqlx::Error>
    where
        O: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_as::<_, O>(&q.sql);
        for p in &q.params {
            query = bind_as(query, p);
        }
        query.fetch_all(&self.pool).await
    }

    async fn fetch_all<O>(&self, q: &QueryBuf) -> AppResult<Vec<O>>
    where
        O: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        Ok(self.fetch_all_raw(q).await?)
    }

    async fn fetch_one<O>(&self, q: &QueryBuf) -> AppResult<O>
    where
        O: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        self.fetch_all(q)
            .await?
            .into_iter()
            .next()
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    async fn fetch_records(&self, q: &QueryBuf) -> AppResult<Vec<Apartment>> {
        let rows: Vec<ApartmentRow> = self.fetch_all(q).await?;
        Ok(rows.into_iter().map(Apartment::from).collect())
    }

    async fn fetch_record(&self, q: &QueryBuf) -> AppResult<Option<Apartment>> {
        Ok(self.fetch_records(q).await?.into_iter().next())
    }

    /// Like `fetch_record`, but a unique-index violation becomes a conflict on `unit_number`.
    async fn write_record(&self, q: &QueryBuf, unit_number: Option<&str>) -> AppResult<Option<Apartment>> {
        match self.fetch_all_raw::<ApartmentRow>(q).await {
            Ok(rows) => Ok(rows.into_iter().next().map(Apartment::from)),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(AppError::Conflict(format!(
                "unit number '{}' already exists",
                unit_number.unwrap_or_default()
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ApartmentStore for PgApartmentStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }

    async fn find(&self, query: &RecordQuery) -> AppResult<Vec<Apartment>> {
        let q = sql::select_records(&self.table, query);
        self.fetch_records(&q).await
    }

    async fn count(&self, filter: &Filter) -> AppResult<i64> {
        let q = sql::count(&self.table, filter);
        let (n,): (i64,) = self.fetch_one(&q).await?;
        Ok(n)
    }

    async fn get(&self, id: i64, scope: Scope) -> AppResult<Option<Apartment>> {
        let q = sql::select_by_id(&self.table, id, scope);
        self.fetch_record(&q).await
    }

    async fn unit_number_taken(&self, unit_number: &str, exclude_id: Option<i64>) -> AppResult<bool> {
        let q = sql::unit_number_taken(&self.table, unit_number, exclude_id);
        let (taken,): (bool,) = self.fetch_one(&q).await?;
        Ok(taken)
    }

    async fn insert(&self, draft: &ApartmentDraft) -> AppResult<Apartment> {
        let q = sql::insert(&self.table, draft);
        self.write_record(&q, Some(&draft.unit_number))
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    async fn update(&self, id: i64, patch: &ApartmentPatch) -> AppResult<Option<Apartment>> {
        let q = sql::update(&self.table, id, patch);
        self.write_record(&q, patch.unit_number.as_deref()).await
    }

    async fn soft_delete(&self, id: i64) -> AppResult<Option<Apartment>> {
        let q = sql::soft_delete(&self.table, id);
        self.fetch_record(&q).await
    }

    async fn increment_views(&self, id: i64) -> AppResult<Option<Apartment>> {
        let q = sql::increment_views(&self.table, id);
        self.fetch_record(&q).await
    }

    async fn price_summary(&self, filter: &Filter) -> AppResult<PriceSummary> {
        let q = sql::price_summary(&self.table, filter);
        let (average, min, max): (f64, f64, f64) = self.fetch_one(&q).await?;
        Ok(PriceSummary { average, min, max })
    }

    async fn project_breakdown(&self, filter: &Filter) -> AppResult<Vec<ProjectStat>> {
        let q = sql::project_breakdown(&self.table, filter);
        let rows: Vec<(String, i64, f64)> = self.fetch_all(&q).await?;
        Ok(rows
            .into_iter()
            .map(|(project, count, average_price)| ProjectStat {
                project,
                count,
                average_price,
            })
            .collect())
    }

    async fn bedroom_distribution(&self, filter: &Filter) -> AppResult<Vec<BedroomBucket>> {
        let q = sql::bedroom_distribution(&self.table, filter);
        let rows: Vec<(i32, i64)> = self.fetch_all(&q).await?;
        Ok(rows
            .into_iter()
            .map(|(bedrooms, count)| BedroomBucket { bedrooms, count })
            .collect())
    }

    async fn distinct_text(&self, field: TextField, filter: &Filter) -> AppResult<Vec<String>> {
        let q = sql::distinct_text(&self.table, field, filter);
        let rows: Vec<(String,)> = self.fetch_all(&q).await?;
        Ok(rows.into_iter().map(|(v,)| v).collect())
    }

    async fn distinct_int(&self, field: IntField, filter: &Filter) -> AppResult<Vec<i32>> {
        let q = sql::distinct_int(&self.table, field, filter);
        let rows: Vec<(i32,)> = self.fetch_all(&q).await?;
        Ok(rows.into_iter().map(|(v,)| v).collect())
    }
}
