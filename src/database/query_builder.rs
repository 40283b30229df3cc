use serde_json::Value;

use crate::database::manager::DatabaseError;
use crate::database::schema::{
    ResourceSchema, ACCOUNT_COLUMN, CREATED_AT_COLUMN, ID_COLUMN, SYSTEM_COLUMNS, UPDATED_AT_COLUMN,
};
use crate::database::store::{Criteria, Row};

/// SQL text plus positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}

/// Builds tenant-scoped statements for one resource table.
///
/// Identifiers are only ever taken from the schema, never from callers.
pub struct QueryBuilder<'a> {
    schema: &'a ResourceSchema,
    params: Vec<Value>,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(schema: &'a ResourceSchema) -> Self {
        Self { schema, params: Vec::new() }
    }

    pub fn select(mut self, account_id: i64, criteria: &Criteria) -> Result<SqlResult, DatabaseError> {
        let where_clause = self.where_clause(account_id, criteria)?;
        let query = format!(
            "SELECT row_to_json(t) AS row FROM (SELECT * FROM {} WHERE {} ORDER BY {}) t",
            quote(self.schema.table),
            where_clause,
            quote(ID_COLUMN)
        );
        Ok(self.finish(query))
    }

    pub fn insert(mut self, values: &Row) -> Result<SqlResult, DatabaseError> {
        let mut columns = Vec::with_capacity(values.len());
        let mut placeholders = Vec::with_capacity(values.len());
        for (column, value) in values {
            if column == ID_COLUMN || column == CREATED_AT_COLUMN || column == UPDATED_AT_COLUMN {
                continue;
            }
            self.check_column(column)?;
            columns.push(quote(column));
            placeholders.push(self.push(value.clone()));
        }

        let query = format!(
            "WITH inserted AS (INSERT INTO {} ({}) VALUES ({}) RETURNING *) \
             SELECT row_to_json(inserted) AS row FROM inserted",
            quote(self.schema.table),
            columns.join(", "),
            placeholders.join(", ")
        );
        Ok(self.finish(query))
    }

    pub fn update(mut self, account_id: i64, id: i64, changes: &Row) -> Result<SqlResult, DatabaseError> {
        let mut assignments = Vec::with_capacity(changes.len() + 1);
        for (column, value) in changes {
            if column == ID_COLUMN
                || column == ACCOUNT_COLUMN
                || column == CREATED_AT_COLUMN
                || column == UPDATED_AT_COLUMN
            {
                continue;
            }
            self.check_column(column)?;
            let placeholder = self.push(value.clone());
            assignments.push(format!("{} = {}", quote(column), placeholder));
        }
        assignments.push(format!("{} = now()", quote(UPDATED_AT_COLUMN)));

        let where_clause = self.where_clause(account_id, &Criteria::new().eq(ID_COLUMN, id))?;
        let query = format!(
            "WITH updated AS (UPDATE {} SET {} WHERE {} RETURNING *) \
             SELECT row_to_json(updated) AS row FROM updated",
            quote(self.schema.table),
            assignments.join(", "),
            where_clause
        );
        Ok(self.finish(query))
    }

    pub fn delete(mut self, account_id: i64, criteria: &Criteria) -> Result<SqlResult, DatabaseError> {
        let where_clause = self.where_clause(account_id, criteria)?;
        let query = format!("DELETE FROM {} WHERE {}", quote(self.schema.table), where_clause);
        Ok(self.finish(query))
    }

    fn where_clause(&mut self, account_id: i64, criteria: &Criteria) -> Result<String, DatabaseError> {
        let mut conditions = vec![format!("{} = {}", quote(ACCOUNT_COLUMN), self.push(Value::from(account_id)))];

        for (column, value) in &criteria.equals {
            self.check_column(column)?;
            if value.is_null() {
                conditions.push(format!("{} IS NULL", quote(column)));
            } else {
                let placeholder = self.push(value.clone());
                conditions.push(format!("{} = {}", quote(column), placeholder));
            }
        }
        for (column, value) in &criteria.not_equals {
            self.check_column(column)?;
            if value.is_null() {
                conditions.push(format!("{} IS NOT NULL", quote(column)));
            } else {
                let placeholder = self.push(value.clone());
                conditions.push(format!("{} IS DISTINCT FROM {}", quote(column), placeholder));
            }
        }

        Ok(conditions.join(" AND "))
    }

    fn check_column(&self, column: &str) -> Result<(), DatabaseError> {
        if SYSTEM_COLUMNS.contains(&column) || self.schema.field(column).is_some() {
            Ok(())
        } else {
            Err(DatabaseError::QueryError(format!(
                "unknown column '{}' for table '{}'",
                column, self.schema.table
            )))
        }
    }

    fn push(&mut self, value: Value) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }

    fn finish(self, query: String) -> SqlResult {
        SqlResult { query, params: self.params }
    }
}

/// Quote SQL identifier to prevent injection
fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Contact, Message};
    use crate::database::schema::Resource;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn select_is_always_tenant_scoped() {
        let sql = QueryBuilder::new(&Contact::SCHEMA)
            .select(7, &Criteria::new().ne("status", "REMOVED"))
            .unwrap();
        assert_eq!(
            sql.query,
            "SELECT row_to_json(t) AS row FROM (SELECT * FROM \"contacts\" WHERE \"accountId\" = $1 \
             AND \"status\" IS DISTINCT FROM $2 ORDER BY \"id\") t"
        );
        assert_eq!(sql.params, vec![json!(7), json!("REMOVED")]);
    }

    #[test]
    fn update_never_assigns_account() {
        let changes = row(json!({ "subject": "Hi", "accountId": 99 }));
        let sql = QueryBuilder::new(&Message::SCHEMA).update(3, 12, &changes).unwrap();

        assert!(!sql.query.contains("SET \"accountId\""));
        assert!(sql.query.contains("\"subject\" = $1, \"updatedAt\" = now()"));
        assert!(sql.query.contains("WHERE \"accountId\" = $2 AND \"id\" = $3"));
        assert_eq!(sql.params, vec![json!("Hi"), json!(3), json!(12)]);
    }

    #[test]
    fn insert_skips_store_managed_columns() {
        let values = row(json!({ "accountId": 1, "name": "Jest", "id": 5, "createdAt": "x" }));
        let sql = QueryBuilder::new(&Contact::SCHEMA).insert(&values).unwrap();
        assert!(sql.query.starts_with("WITH inserted AS (INSERT INTO \"contacts\" (\"accountId\", \"name\") VALUES ($1, $2)"));
        assert_eq!(sql.params.len(), 2);
    }

    #[test]
    fn null_criteria_use_is_null() {
        let sql = QueryBuilder::new(&Contact::SCHEMA)
            .delete(1, &Criteria::new().eq("phone", Value::Null))
            .unwrap();
        assert_eq!(sql.query, "DELETE FROM \"contacts\" WHERE \"accountId\" = $1 AND \"phone\" IS NULL");
    }

    #[test]
    fn rejects_unknown_columns() {
        let result = QueryBuilder::new(&Contact::SCHEMA).select(1, &Criteria::new().eq("street", "x"));
        assert!(matches!(result, Err(DatabaseError::QueryError(_))));
    }
}
