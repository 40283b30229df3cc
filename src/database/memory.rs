use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::schema::{
    ResourceSchema, ResourceStatus, ACCOUNT_COLUMN, CREATED_AT_COLUMN, ID_COLUMN, STATUS_COLUMN,
    UPDATED_AT_COLUMN,
};
use crate::database::store::{Criteria, Row, Store};

#[derive(Default)]
struct Table {
    last_id: i64,
    rows: BTreeMap<i64, Row>,
}

impl Table {
    /// First unique column on which `candidate` collides with another live row
    fn conflict(&self, schema: &ResourceSchema, candidate: &Row, own_id: Option<i64>) -> Option<&'static str> {
        if is_removed(candidate) {
            return None;
        }
        let account = candidate.get(ACCOUNT_COLUMN)?;

        schema.unique.iter().copied().find(|column| {
            let value = match candidate.get(*column) {
                Some(Value::Null) | None => return false,
                Some(v) => v,
            };
            self.rows.iter().any(|(id, row)| {
                Some(*id) != own_id
                    && !is_removed(row)
                    && row.get(ACCOUNT_COLUMN) == Some(account)
                    && row.get(*column) == Some(value)
            })
        })
    }
}

fn is_removed(row: &Row) -> bool {
    row.get(STATUS_COLUMN).and_then(Value::as_str) == Some(ResourceStatus::Removed.as_str())
}

fn owned_by(row: &Row, account_id: i64) -> bool {
    row.get(ACCOUNT_COLUMN).and_then(Value::as_i64) == Some(account_id)
}

fn now() -> Value {
    Value::String(Utc::now().to_rfc3339())
}

/// Process-local store used for tests and database-less development.
///
/// One write lock covers each uniqueness check together with its write.
#[derive(Default, Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<HashMap<&'static str, Table>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn select(
        &self,
        schema: &ResourceSchema,
        account_id: i64,
        criteria: &Criteria,
    ) -> Result<Vec<Row>, DatabaseError> {
        let tables = self.tables.read().await;
        let Some(table) = tables.get(schema.table) else {
            return Ok(vec![]);
        };
        Ok(table
            .rows
            .values()
            .filter(|row| owned_by(row, account_id) && criteria.matches(row))
            .cloned()
            .collect())
    }

    async fn insert(&self, schema: &ResourceSchema, mut values: Row) -> Result<Row, DatabaseError> {
        let mut tables = self.tables.write().await;
        let table = tables.entry(schema.table).or_default();

        if let Some(column) = table.conflict(schema, &values, None) {
            return Err(DatabaseError::UniqueViolation {
                table: schema.table.to_string(),
                column: column.to_string(),
            });
        }

        table.last_id += 1;
        let id = table.last_id;
        let stamp = now();
        values.insert(ID_COLUMN.to_string(), Value::from(id));
        values.insert(CREATED_AT_COLUMN.to_string(), stamp.clone());
        values.insert(UPDATED_AT_COLUMN.to_string(), stamp);

        table.rows.insert(id, values.clone());
        Ok(values)
    }

    async fn update(
        &self,
        schema: &ResourceSchema,
        account_id: i64,
        id: i64,
        mut changes: Row,
    ) -> Result<Option<Row>, DatabaseError> {
        changes.remove(ID_COLUMN);
        changes.remove(ACCOUNT_COLUMN);
        changes.remove(CREATED_AT_COLUMN);

        let mut tables = self.tables.write().await;
        let table = tables.entry(schema.table).or_default();

        let mut merged = match table.rows.get(&id) {
            Some(row) if owned_by(row, account_id) => row.clone(),
            _ => return Ok(None),
        };
        merged.extend(changes);
        merged.insert(UPDATED_AT_COLUMN.to_string(), now());

        if let Some(column) = table.conflict(schema, &merged, Some(id)) {
            return Err(DatabaseError::UniqueViolation {
                table: schema.table.to_string(),
                column: column.to_string(),
            });
        }

        table.rows.insert(id, merged.clone());
        Ok(Some(merged))
    }

    async fn delete(
        &self,
        schema: &ResourceSchema,
        account_id: i64,
        criteria: &Criteria,
    ) -> Result<u64, DatabaseError> {
        let mut tables = self.tables.write().await;
        let Some(table) = tables.get_mut(schema.table) else {
            return Ok(0);
        };
        let before = table.rows.len();
        table
            .rows
            .retain(|_, row| !(owned_by(row, account_id) && criteria.matches(row)));
        Ok((before - table.rows.len()) as u64)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Contact;
    use crate::database::schema::Resource;
    use serde_json::json;

    fn contact(account_id: i64, email: &str) -> Row {
        match json!({ "accountId": account_id, "name": "Jest", "email": email, "status": "ACTIVE" }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids_and_timestamps() {
        let store = MemoryStore::new();
        let first = store.insert(&Contact::SCHEMA, contact(1, "a@x.com")).await.unwrap();
        let second = store.insert(&Contact::SCHEMA, contact(2, "a@x.com")).await.unwrap();

        assert_eq!(first["id"], 1);
        assert_eq!(second["id"], 2);
        assert!(first["createdAt"].is_string());
        assert_eq!(first["createdAt"], first["updatedAt"]);
    }

    #[tokio::test]
    async fn unique_column_is_scoped_to_tenant_and_live_rows() {
        let store = MemoryStore::new();
        let first = store.insert(&Contact::SCHEMA, contact(1, "a@x.com")).await.unwrap();

        let err = store.insert(&Contact::SCHEMA, contact(1, "a@x.com")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::UniqueViolation { ref column, .. } if column == "email"));

        let mut removed = Row::new();
        removed.insert("status".into(), json!("REMOVED"));
        let id = first["id"].as_i64().unwrap();
        store.update(&Contact::SCHEMA, 1, id, removed).await.unwrap().unwrap();

        store.insert(&Contact::SCHEMA, contact(1, "a@x.com")).await.unwrap();
    }

    #[tokio::test]
    async fn update_ignores_foreign_rows_and_system_columns() {
        let store = MemoryStore::new();
        let row = store.insert(&Contact::SCHEMA, contact(1, "a@x.com")).await.unwrap();
        let id = row["id"].as_i64().unwrap();

        let mut changes = Row::new();
        changes.insert("name".into(), json!("Other"));
        changes.insert("accountId".into(), json!(2));
        assert!(store.update(&Contact::SCHEMA, 2, id, changes.clone()).await.unwrap().is_none());

        let updated = store.update(&Contact::SCHEMA, 1, id, changes).await.unwrap().unwrap();
        assert_eq!(updated["name"], "Other");
        assert_eq!(updated["accountId"], 1);
    }

    #[tokio::test]
    async fn delete_counts_only_tenant_rows() {
        let store = MemoryStore::new();
        store.insert(&Contact::SCHEMA, contact(1, "a@x.com")).await.unwrap();
        store.insert(&Contact::SCHEMA, contact(2, "a@x.com")).await.unwrap();

        let by_email = Criteria::new().eq("email", "a@x.com");
        assert_eq!(store.delete(&Contact::SCHEMA, 1, &by_email).await.unwrap(), 1);
        assert_eq!(store.delete(&Contact::SCHEMA, 1, &by_email).await.unwrap(), 0);
        assert_eq!(store.select(&Contact::SCHEMA, 2, &Criteria::new()).await.unwrap().len(), 1);
    }
}
