use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::database::manager::DatabaseError;
use crate::database::schema::ResourceSchema;

/// A row as the store sees it: column name to JSON value
pub type Row = Map<String, Value>;

/// Conjunction of column conditions, always applied on top of the tenant filter
#[derive(Debug, Clone, Default)]
pub struct Criteria {
    pub equals: Vec<(String, Value)>,
    pub not_equals: Vec<(String, Value)>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.equals.push((column.into(), value.into()));
        self
    }

    pub fn ne(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.not_equals.push((column.into(), value.into()));
        self
    }

    /// Evaluate against an in-memory row
    pub fn matches(&self, row: &Row) -> bool {
        let equal = self
            .equals
            .iter()
            .all(|(column, value)| row.get(column).unwrap_or(&Value::Null) == value);
        let not_equal = self
            .not_equals
            .iter()
            .all(|(column, value)| row.get(column).unwrap_or(&Value::Null) != value);
        equal && not_equal
    }
}

/// Generic data-access interface behind the repositories.
///
/// Every call is scoped to `account_id`. Implementations own id generation,
/// timestamps, and the per-tenant uniqueness of `schema.unique` columns among
/// rows whose status is not REMOVED, reporting conflicts as
/// [`DatabaseError::UniqueViolation`].
#[async_trait]
pub trait Store: Send + Sync {
    async fn select(
        &self,
        schema: &ResourceSchema,
        account_id: i64,
        criteria: &Criteria,
    ) -> Result<Vec<Row>, DatabaseError>;

    /// `values` already carries tenant and status columns
    async fn insert(&self, schema: &ResourceSchema, values: Row) -> Result<Row, DatabaseError>;

    /// Apply `changes` to the tenant's row `id`; `None` when there is no such row
    async fn update(
        &self,
        schema: &ResourceSchema,
        account_id: i64,
        id: i64,
        changes: Row,
    ) -> Result<Option<Row>, DatabaseError>;

    /// Destroy matching rows, returning how many were removed
    async fn delete(
        &self,
        schema: &ResourceSchema,
        account_id: i64,
        criteria: &Criteria,
    ) -> Result<u64, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}
