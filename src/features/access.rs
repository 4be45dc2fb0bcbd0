// Access ledger
// Per-user CourseAccess grants: the unlock policy's source of truth

use serde_json::json;
use tracing::{debug, info};

use crate::api::firestore::{FieldTransform, FirestoreClient, Write};
use crate::error::AppError;
use crate::models::access::CourseAccess;
use crate::utils::config::paths;

/// Fetch one grant, if any
pub async fn get_access(
    store: &FirestoreClient,
    uid: &str,
    course_id: &str,
) -> Result<Option<CourseAccess>, AppError> {
    let doc = store
        .get_document(&paths::course_access(uid, course_id))
        .await?;
    Ok(doc.and_then(|v| serde_json::from_value(v).ok()))
}

/// All grants for a user (dashboard listing)
pub async fn list_access(store: &FirestoreClient, uid: &str) -> Result<Vec<CourseAccess>, AppError> {
    let collection = format!("{}/courseAccess", paths::user(uid));
    let docs = store.list_collection(&collection).await?;

    let mut grants = Vec::with_capacity(docs.len());
    for (id, data) in docs {
        match serde_json::from_value::<CourseAccess>(data) {
            Ok(a) => grants.push(a),
            Err(err) => debug!("Skipping malformed grant {}: {}", id, err),
        }
    }
    Ok(grants)
}

/// Direct admin grant. Idempotent upsert keyed by courseId, same shape a
/// redemption writes minus the link reference.
pub async fn grant_access(
    store: &FirestoreClient,
    uid: &str,
    course_id: &str,
) -> Result<(), AppError> {
    let write = Write::set_with(
        paths::course_access(uid, course_id),
        json!({ "courseId": course_id }),
        vec![FieldTransform::ServerTimestamp {
            field: "grantedAt".to_string(),
        }],
    );
    store.commit(None, vec![write]).await?;
    info!("granted {} access to course {}", uid, course_id);
    Ok(())
}

/// Direct admin revocation
pub async fn revoke_access(
    store: &FirestoreClient,
    uid: &str,
    course_id: &str,
) -> Result<(), AppError> {
    store
        .delete_document(&paths::course_access(uid, course_id))
        .await?;
    info!("revoked {} access to course {}", uid, course_id);
    Ok(())
}
