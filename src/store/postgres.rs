//! Postgres-backed [`DocumentStore`].
//!
//! All collections share one `documents` table keyed by `(collection, id)`.
//! Bodies are JSONB and indexed with a GIN `jsonb_path_ops` index. With a
//! scalar value, both [`Filter::Eq`] and [`Filter::Contains`] are compiled to
//! `body @> ...` containment tests that the index can serve. Containment is
//! partial for arrays and objects, so those values fall back to exact `jsonb`
//! equality on the field (or on each array element).
//!
//! Single-document atomicity for updates and deletes comes from selecting the
//! target row with `FOR UPDATE` inside the same statement and re-checking the
//! filter on the locked row.

use chrono::{DateTime, Utc};
use rocket_db_pools::sqlx::postgres::PgRow;
use rocket_db_pools::sqlx::types::Json;
use rocket_db_pools::sqlx::{self, FromRow, PgPool, Postgres, QueryBuilder, Row};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{DocumentStore, Filter, StoreResult, StoredDocument};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Apply the document schema migrations.
pub async fn run_migrations(pool: &PgPool) -> StoreResult<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

struct DocumentRow(StoredDocument);

impl<'r> FromRow<'r, PgRow> for DocumentRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let body: Json<Value> = row.try_get("body")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;
        Ok(DocumentRow(StoredDocument {
            id: row.try_get("id")?,
            version: row.try_get("version")?,
            created_at,
            updated_at,
            body: body.0,
        }))
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    match filter {
        Filter::All => {
            qb.push("TRUE");
        }
        Filter::Id(id) => {
            qb.push("id = ").push_bind(*id);
        }
        Filter::Version(version) => {
            qb.push("version = ").push_bind(*version);
        }
        Filter::Eq(field, value) if is_scalar(value) => {
            qb.push("body @> ")
                .push_bind(Json(single_field(field, value.clone())));
        }
        Filter::Eq(field, value) => {
            qb.push("body -> ")
                .push_bind(field.clone())
                .push(" = ")
                .push_bind(Json(value.clone()));
        }
        Filter::Contains(field, value) if is_scalar(value) => {
            qb.push("body @> ")
                .push_bind(Json(single_field(field, Value::Array(vec![value.clone()]))));
        }
        Filter::Contains(field, value) => {
            qb.push("EXISTS (SELECT 1 FROM jsonb_array_elements(CASE WHEN jsonb_typeof(body -> ")
                .push_bind(field.clone())
                .push(") = 'array' THEN body -> ")
                .push_bind(field.clone())
                .push(" ELSE '[]'::jsonb END) AS element WHERE element = ")
                .push_bind(Json(value.clone()))
                .push(")");
        }
        Filter::And(filters) => push_joined(qb, filters, " AND ", "TRUE"),
        Filter::Or(filters) => push_joined(qb, filters, " OR ", "FALSE"),
    }
}

fn push_joined(
    qb: &mut QueryBuilder<'_, Postgres>,
    filters: &[Filter],
    separator: &str,
    empty: &str,
) {
    if filters.is_empty() {
        qb.push(empty);
        return;
    }
    qb.push("(");
    for (index, filter) in filters.iter().enumerate() {
        if index > 0 {
            qb.push(separator);
        }
        push_filter(qb, filter);
    }
    qb.push(")");
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn single_field(field: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(field.to_string(), value);
    Value::Object(map)
}

/// `collection = $n AND (<filter>)`
fn push_scope(qb: &mut QueryBuilder<'_, Postgres>, collection: &str, filter: &Filter) {
    qb.push("collection = ")
        .push_bind(collection.to_string())
        .push(" AND (");
    push_filter(qb, filter);
    qb.push(")");
}

/// Subquery locking the oldest document matching the filter.
fn push_locked_target(qb: &mut QueryBuilder<'_, Postgres>, collection: &str, filter: &Filter) {
    qb.push("id = (SELECT id FROM documents WHERE ");
    push_scope(qb, collection, filter);
    qb.push(" ORDER BY created_at, id LIMIT 1 FOR UPDATE)");
}

#[rocket::async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert_one(&self, collection: &str, body: Value) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO documents (collection, id, version, body, created_at, updated_at) \
             VALUES ($1, $2, 1, $3, now(), now())",
        )
        .bind(collection)
        .bind(id)
        .bind(Json(body))
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> StoreResult<Option<StoredDocument>> {
        let mut qb = QueryBuilder::new(
            "SELECT id, version, body, created_at, updated_at FROM documents WHERE ",
        );
        push_scope(&mut qb, collection, filter);
        qb.push(" ORDER BY created_at, id LIMIT 1");

        let row = qb
            .build_query_as::<DocumentRow>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|DocumentRow(doc)| doc))
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> StoreResult<Vec<StoredDocument>> {
        let mut qb = QueryBuilder::new(
            "SELECT id, version, body, created_at, updated_at FROM documents WHERE ",
        );
        push_scope(&mut qb, collection, filter);
        qb.push(" ORDER BY created_at, id");

        let rows = qb
            .build_query_as::<DocumentRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|DocumentRow(doc)| doc).collect())
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        fields: Map<String, Value>,
    ) -> StoreResult<bool> {
        let mut qb = QueryBuilder::new("UPDATE documents SET body = body || ");
        qb.push_bind(Json(Value::Object(fields)))
            .push(", version = version + 1, updated_at = now() WHERE ");
        push_scope(&mut qb, collection, filter);
        qb.push(" AND ");
        push_locked_target(&mut qb, collection, filter);

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<bool> {
        let mut qb = QueryBuilder::new("DELETE FROM documents WHERE ");
        push_scope(&mut qb, collection, filter);
        qb.push(" AND ");
        push_locked_target(&mut qb, collection, filter);

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
