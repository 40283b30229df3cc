use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::schema::{FieldKind, FieldSpec, Resource, ResourceSchema, ResourceStatus};

/// An outbound message owned by an account.
///
/// `account_email_id` points at the sending address configured in the
/// accounts service; it is not resolved here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub account_id: i64,
    pub account_email_id: i64,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    pub status: ResourceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for Message {
    const SCHEMA: ResourceSchema = ResourceSchema {
        table: "messages",
        kind: "message",
        fields: &[
            FieldSpec { name: "accountEmailId", kind: FieldKind::Reference, required: true, nullable: false },
            FieldSpec { name: "subject", kind: FieldKind::Text { max_len: 150 }, required: false, nullable: true },
            FieldSpec { name: "body", kind: FieldKind::Text { max_len: 65_535 }, required: false, nullable: true },
        ],
        unique: &[],
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
