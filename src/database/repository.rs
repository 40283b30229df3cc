use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::database::manager::DatabaseError;
use crate::database::models::Contact;
use crate::database::schema::{Resource, ResourceStatus, ACCOUNT_COLUMN, ID_COLUMN, STATUS_COLUMN};
use crate::database::store::{Criteria, Row, Store};
use crate::validation::Payload;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("A {kind} with this {field} already exists")]
    ConstraintViolation { kind: &'static str, field: String },

    #[error("Failed to decode {kind} row: {source}")]
    Decode {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Store(DatabaseError),
}

/// Tenant-scoped persistence for one resource kind.
///
/// Every operation takes the caller's `account_id` and never reaches rows
/// owned by another account; a foreign row looks exactly like a missing one.
pub struct Repository<R> {
    store: Arc<dyn Store>,
    _phantom: PhantomData<R>,
}

impl<R: Resource> Repository<R> {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    pub async fn find_all(&self, account_id: i64, include_removed: bool) -> Result<Vec<R>, RepositoryError> {
        let criteria = if include_removed {
            Criteria::new()
        } else {
            Criteria::new().ne(STATUS_COLUMN, ResourceStatus::Removed.as_str())
        };
        let rows = self
            .store
            .select(&R::SCHEMA, account_id, &criteria)
            .await
            .map_err(|e| self.store_error(e))?;
        rows.into_iter().map(|row| self.decode(row)).collect()
    }

    pub async fn find_by_id(&self, id: i64, account_id: i64) -> Result<Option<R>, RepositoryError> {
        let criteria = Criteria::new().eq(ID_COLUMN, id);
        let rows = self
            .store
            .select(&R::SCHEMA, account_id, &criteria)
            .await
            .map_err(|e| self.store_error(e))?;
        rows.into_iter().next().map(|row| self.decode(row)).transpose()
    }

    /// Persist a new ACTIVE row owned by `account_id`
    pub async fn add(&self, payload: Payload, account_id: i64) -> Result<R, RepositoryError> {
        let mut values = payload.into_row();
        values.insert(ACCOUNT_COLUMN.to_string(), Value::from(account_id));
        values.insert(
            STATUS_COLUMN.to_string(),
            Value::from(ResourceStatus::Active.as_str()),
        );

        let row = self
            .store
            .insert(&R::SCHEMA, values)
            .await
            .map_err(|e| self.store_error(e))?;
        let created = self.decode(row)?;
        tracing::debug!("Created {} {} for account {}", R::SCHEMA.kind, created.id(), account_id);
        Ok(created)
    }

    /// Apply the fields present in `payload`; `None` when the tenant has no such row
    pub async fn set(&self, id: i64, payload: Payload, account_id: i64) -> Result<Option<R>, RepositoryError> {
        self.apply(id, payload.into_row(), account_id).await
    }

    /// Soft delete: flag the row REMOVED and return it
    pub async fn soft_remove(&self, id: i64, account_id: i64) -> Result<Option<R>, RepositoryError> {
        let mut changes = Row::new();
        changes.insert(
            STATUS_COLUMN.to_string(),
            Value::from(ResourceStatus::Removed.as_str()),
        );
        self.apply(id, changes, account_id).await
    }

    /// Hard delete; reports whether a row was destroyed
    pub async fn remove_by_id(&self, id: i64, account_id: i64) -> Result<bool, RepositoryError> {
        let criteria = Criteria::new().eq(ID_COLUMN, id);
        let removed = self
            .store
            .delete(&R::SCHEMA, account_id, &criteria)
            .await
            .map_err(|e| self.store_error(e))?;
        if removed > 0 {
            tracing::debug!("Destroyed {} {} for account {}", R::SCHEMA.kind, id, account_id);
        }
        Ok(removed > 0)
    }

    async fn apply(&self, id: i64, mut changes: Row, account_id: i64) -> Result<Option<R>, RepositoryError> {
        changes.remove(ID_COLUMN);
        changes.remove(ACCOUNT_COLUMN);

        let row = self
            .store
            .update(&R::SCHEMA, account_id, id, changes)
            .await
            .map_err(|e| self.store_error(e))?;
        row.map(|row| self.decode(row)).transpose()
    }

    fn decode(&self, row: Row) -> Result<R, RepositoryError> {
        serde_json::from_value(Value::Object(row)).map_err(|source| RepositoryError::Decode {
            kind: R::SCHEMA.kind,
            source,
        })
    }

    fn store_error(&self, err: DatabaseError) -> RepositoryError {
        match err {
            DatabaseError::UniqueViolation { column, .. } => {
                tracing::warn!("Unique constraint on {}.{} rejected a write", R::SCHEMA.table, column);
                RepositoryError::ConstraintViolation {
                    kind: R::SCHEMA.kind,
                    field: column,
                }
            }
            other => RepositoryError::Store(other),
        }
    }
}

impl Repository<Contact> {
    /// Hard delete by the contact's unique key, returning the number of rows destroyed
    pub async fn remove_by_email(&self, email: &str, account_id: i64) -> Result<u64, RepositoryError> {
        let criteria = Criteria::new().eq("email", email);
        self.store
            .delete(&Contact::SCHEMA, account_id, &criteria)
            .await
            .map_err(|e| self.store_error(e))
    }
}
