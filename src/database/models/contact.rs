use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::schema::{FieldKind, FieldSpec, Resource, ResourceSchema, ResourceStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: i64,
    pub account_id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub status: ResourceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for Contact {
    const SCHEMA: ResourceSchema = ResourceSchema {
        table: "contacts",
        kind: "contact",
        fields: &[
            FieldSpec { name: "name", kind: FieldKind::Text { max_len: 150 }, required: true, nullable: false },
            FieldSpec { name: "email", kind: FieldKind::Email, required: true, nullable: false },
            FieldSpec { name: "phone", kind: FieldKind::Text { max_len: 20 }, required: false, nullable: true },
        ],
        unique: &["email"],
    };

    fn id(&self) -> i64 {
        self.id
    }

    fn account_id(&self) -> i64 {
        self.account_id
    }

    fn status(&self) -> ResourceStatus {
        self.status
    }
}
