use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgArguments, PgPool, Row as _};

use crate::database::manager::DatabaseError;
use crate::database::query_builder::{QueryBuilder, SqlResult};
use crate::database::schema::ResourceSchema;
use crate::database::store::{Criteria, Row, Store};

const UNIQUE_VIOLATION: &str = "23505";

/// Postgres-backed store.
///
/// Per-tenant uniqueness is enforced by partial unique indexes created in
/// [`DatabaseManager::migrate`](crate::database::DatabaseManager::migrate).
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_rows(&self, schema: &ResourceSchema, sql: &SqlResult) -> Result<Vec<Row>, DatabaseError> {
        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param_query(q, p);
        }
        let rows = q.fetch_all(&self.pool).await.map_err(|e| map_sqlx_error(schema, e))?;

        rows.iter()
            .map(|row| -> Result<Row, DatabaseError> {
                match row.try_get::<Value, _>("row")? {
                    Value::Object(map) => Ok(map),
                    other => Err(DatabaseError::QueryError(format!("unexpected record format: {}", other))),
                }
            })
            .collect()
    }
}

#[async_trait]
impl Store for PgStore {
    async fn select(
        &self,
        schema: &ResourceSchema,
        account_id: i64,
        criteria: &Criteria,
    ) -> Result<Vec<Row>, DatabaseError> {
        let sql = QueryBuilder::new(schema).select(account_id, criteria)?;
        self.fetch_rows(schema, &sql).await
    }

    async fn insert(&self, schema: &ResourceSchema, values: Row) -> Result<Row, DatabaseError> {
        let sql = QueryBuilder::new(schema).insert(&values)?;
        self.fetch_rows(schema, &sql)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DatabaseError::QueryError(format!("insert into {} returned no row", schema.table)))
    }

    async fn update(
        &self,
        schema: &ResourceSchema,
        account_id: i64,
        id: i64,
        changes: Row,
    ) -> Result<Option<Row>, DatabaseError> {
        let sql = QueryBuilder::new(schema).update(account_id, id, &changes)?;
        Ok(self.fetch_rows(schema, &sql).await?.into_iter().next())
    }

    async fn delete(
        &self,
        schema: &ResourceSchema,
        account_id: i64,
        criteria: &Criteria,
    ) -> Result<u64, DatabaseError> {
        let sql = QueryBuilder::new(schema).delete(account_id, criteria)?;
        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param_query(q, p);
        }
        let result = q.execute(&self.pool).await.map_err(|e| map_sqlx_error(schema, e))?;
        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn map_sqlx_error(schema: &ResourceSchema, err: sqlx::Error) -> DatabaseError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            let constraint = db_err.constraint().unwrap_or_default();
            let column = schema
                .unique
                .iter()
                .find(|c| constraint.contains(*c))
                .map(|c| c.to_string())
                .unwrap_or_else(|| constraint.to_string());
            return DatabaseError::UniqueViolation {
                table: schema.table.to_string(),
                column,
            };
        }
    }
    DatabaseError::Sqlx(err)
}

fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}
