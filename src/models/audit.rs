// Audit log data model
// Append-only record of admin actions; write-only from the app side

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuditLogEntry {
    #[serde(rename = "adminId")]
    pub admin_id: String,
    #[serde(rename = "adminEmail")]
    pub admin_email: Option<String>,
    pub action: String,
    #[serde(rename = "entityType")]
    pub entity_type: String,
    #[serde(rename = "entityId")]
    pub entity_id: String,
    #[serde(rename = "entityTitle")]
    pub entity_title: Option<String>,
    /// RFC3339, server-assigned
    pub timestamp: Option<String>,
}
