// Audit logging for admin actions
// Append-only; read back only by the admin log viewer

use serde_json::json;
use tracing::debug;

use crate::api::auth::Principal;
use crate::api::firestore::{FieldTransform, FirestoreClient, Write};
use crate::error::AppError;
use crate::models::audit::AuditLogEntry;
use crate::utils::config::paths;
use crate::utils::ids::random_id;

/// Record one admin action with a server-assigned timestamp
pub async fn record(
    store: &FirestoreClient,
    actor: &Principal,
    action: &str,
    entity_type: &str,
    entity_id: &str,
    entity_title: Option<&str>,
) -> Result<(), AppError> {
    let write = Write::set_with(
        paths::audit_log(&random_id()),
        json!({
            "adminId": actor.uid,
            "adminEmail": actor.email,
            "action": action,
            "entityType": entity_type,
            "entityId": entity_id,
            "entityTitle": entity_title,
        }),
        vec![FieldTransform::ServerTimestamp {
            field: "timestamp".to_string(),
        }],
    );
    store.commit(None, vec![write]).await?;
    Ok(())
}

/// Recent audit entries, newest first (log viewer)
pub async fn recent(
    store: &FirestoreClient,
    limit: usize,
) -> Result<Vec<(String, AuditLogEntry)>, AppError> {
    let docs = store
        .run_query("", "auditLogs", Some(("timestamp", "DESCENDING")), limit)
        .await?;

    let mut entries = Vec::with_capacity(docs.len());
    for (id, data) in docs {
        match serde_json::from_value::<AuditLogEntry>(data) {
            Ok(e) => entries.push((id, e)),
            Err(err) => debug!("Skipping malformed audit entry {}: {}", id, err),
        }
    }
    Ok(entries)
}
