// Profile, access ledger and progress endpoints for the signed-in user

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::api::auth::Principal;
use crate::error::AppError;
use crate::features::{access, progress};
use crate::models::course::Course;
use crate::models::user::UserRecord;
use crate::routes::{load_viewer, AppState};
use crate::utils::config::paths;

/// Return the caller's user document, creating it on first sign-in
pub async fn get_me(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Value>, AppError> {
    let (record, admin) = load_viewer(&state, &principal).await?;

    let record = match record {
        Some(record) => record,
        None => {
            // First federated sign-in: provision the profile
            let record = UserRecord::from_principal(&principal);
            state
                .firestore
                .set_document(&paths::user(&principal.uid), &serde_json::to_value(&record)?)
                .await?;
            record
        }
    };

    Ok(Json(json!({
        "uid": principal.uid,
        "profile": record,
        "isAdmin": admin,
    })))
}

/// All course grants for the caller (dashboard)
pub async fn list_my_access(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Value>, AppError> {
    let grants = access::list_access(&state.firestore, &principal.uid).await?;
    Ok(Json(json!({ "access": grants })))
}

/// Completion map for one course
pub async fn get_my_progress(
    State(state): State<AppState>,
    principal: Principal,
    Path(course_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let course_progress = progress::get_progress(&state.firestore, &principal.uid, &course_id).await?;
    Ok(Json(serde_json::to_value(&course_progress)?))
}

/// Mark one lesson complete for the caller
pub async fn complete_lesson(
    State(state): State<AppState>,
    principal: Principal,
    Path((course_id, lesson_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    // The lesson must exist in the course document
    let course: Course = state
        .firestore
        .get_document(&paths::course(&course_id))
        .await?
        .and_then(|v| serde_json::from_value(v).ok())
        .ok_or(AppError::NotFound("course"))?;
    if course.find_lesson(&lesson_id).is_none() {
        return Err(AppError::NotFound("lesson"));
    }

    progress::mark_lesson_complete(&state.firestore, &principal.uid, &course_id, &lesson_id).await?;
    Ok(Json(json!({ "completed": lesson_id })))
}
