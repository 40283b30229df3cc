use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// System columns present on every resource table
pub const ID_COLUMN: &str = "id";
pub const ACCOUNT_COLUMN: &str = "accountId";
pub const STATUS_COLUMN: &str = "status";
pub const CREATED_AT_COLUMN: &str = "createdAt";
pub const UPDATED_AT_COLUMN: &str = "updatedAt";

pub const SYSTEM_COLUMNS: &[&str] = &[
    ID_COLUMN,
    ACCOUNT_COLUMN,
    STATUS_COLUMN,
    CREATED_AT_COLUMN,
    UPDATED_AT_COLUMN,
];

/// Lifecycle state shared by every resource kind.
///
/// Rows only move `Active -> Removed` (soft delete) or get destroyed outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceStatus {
    Active,
    Removed,
}

impl ResourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceStatus::Active => "ACTIVE",
            ResourceStatus::Removed => "REMOVED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text { max_len: usize },
    Email,
    /// Positive integer reference to another entity
    Reference,
}

/// A client-writable column
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Must be present on create
    pub required: bool,
    pub nullable: bool,
}

/// Row-schema description a repository and store are parameterized over
#[derive(Debug, Clone, Copy)]
pub struct ResourceSchema {
    pub table: &'static str,
    /// Singular name used in logs and error messages
    pub kind: &'static str,
    pub fields: &'static [FieldSpec],
    /// Columns unique per tenant among rows that are not REMOVED
    pub unique: &'static [&'static str],
}

impl ResourceSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }
}

/// A persisted, tenant-owned row
pub trait Resource: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    const SCHEMA: ResourceSchema;

    fn id(&self) -> i64;
    fn account_id(&self) -> i64;
    fn status(&self) -> ResourceStatus;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Contact, Message};

    #[test]
    fn status_serializes_uppercase() {
        assert_eq!(serde_json::to_value(ResourceStatus::Removed).unwrap(), "REMOVED");
        let parsed: ResourceStatus = serde_json::from_str("\"ACTIVE\"").unwrap();
        assert_eq!(parsed, ResourceStatus::Active);
        assert_eq!(ResourceStatus::Removed.as_str(), "REMOVED");
    }

    #[test]
    fn required_fields_per_kind() {
        let contact: Vec<_> = Contact::SCHEMA.required_fields().map(|f| f.name).collect();
        assert_eq!(contact, vec!["name", "email"]);

        let message: Vec<_> = Message::SCHEMA.required_fields().map(|f| f.name).collect();
        assert_eq!(message, vec!["accountEmailId"]);
    }

    #[test]
    fn system_columns_are_not_writable() {
        for column in SYSTEM_COLUMNS {
            assert!(Contact::SCHEMA.field(column).is_none());
            assert!(Message::SCHEMA.field(column).is_none());
        }
    }
}
