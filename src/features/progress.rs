// Progress tracker
// Merge-writes one completedLessons entry at a time; never removes entries

use serde_json::json;

use crate::api::firestore::{FieldTransform, FirestoreClient, Write};
use crate::error::AppError;
use crate::models::progress::Progress;
use crate::utils::config::paths;

/// Fetch a user's progress for one course
pub async fn get_progress(
    store: &FirestoreClient,
    uid: &str,
    course_id: &str,
) -> Result<Progress, AppError> {
    let doc = store.get_document(&paths::progress(uid, course_id)).await?;
    Ok(doc
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default())
}

/// Mark one lesson complete. A dotted-path server-timestamp transform
/// touches only that map entry, so existing completions are preserved.
pub async fn mark_lesson_complete(
    store: &FirestoreClient,
    uid: &str,
    course_id: &str,
    lesson_id: &str,
) -> Result<(), AppError> {
    let write = completion_write(uid, course_id, lesson_id);
    store.commit(None, vec![write]).await?;
    Ok(())
}

/// The single merge write for one completion
pub fn completion_write(uid: &str, course_id: &str, lesson_id: &str) -> Write {
    Write::set_with(
        paths::progress(uid, course_id),
        json!({}),
        vec![FieldTransform::ServerTimestamp {
            field: format!("completedLessons.{}", lesson_id),
        }],
    )
}
