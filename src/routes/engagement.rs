// Reaction and comment endpoints

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::auth::Principal;
use crate::error::AppError;
use crate::features::{comments, reactions};
use crate::models::engagement::ReactionType;
use crate::routes::{load_viewer, AppState};

#[derive(Debug, Deserialize)]
pub struct ToggleReactionRequest {
    #[serde(rename = "type")]
    pub kind: ReactionType,
}

/// Toggle the caller's reaction and return the fresh derived counts.
/// The client applies the change optimistically; a PERMISSION_DENIED or
/// STORE_ERROR response tells it to roll the UI back.
pub async fn toggle_reaction(
    State(state): State<AppState>,
    principal: Principal,
    Path((course_id, lesson_id)): Path<(String, String)>,
    Json(request): Json<ToggleReactionRequest>,
) -> Result<Json<Value>, AppError> {
    let resulting = reactions::toggle_reaction(
        &state.firestore,
        &course_id,
        &lesson_id,
        &principal.uid,
        request.kind,
    )
    .await?;

    let (likes, dislikes) = reactions::reaction_counts(&state.firestore, &course_id, &lesson_id).await?;

    Ok(Json(json!({
        "reaction": resulting,
        "likes": likes,
        "dislikes": dislikes,
    })))
}

/// Live like/dislike counts for a lesson
pub async fn get_reactions(
    State(state): State<AppState>,
    _principal: Principal,
    Path((course_id, lesson_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let (likes, dislikes) = reactions::reaction_counts(&state.firestore, &course_id, &lesson_id).await?;
    Ok(Json(json!({ "likes": likes, "dislikes": dislikes })))
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

pub async fn list_comments(
    State(state): State<AppState>,
    _principal: Principal,
    Path((course_id, lesson_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let mut all = comments::list_comments(&state.firestore, &course_id, &lesson_id).await?;
    // Pinned comments float to the top, newest-first within each group
    all.sort_by_key(|(_, c)| !c.is_pinned);

    let body: Vec<Value> = all
        .into_iter()
        .map(|(id, c)| {
            let mut v = serde_json::to_value(&c).unwrap_or_else(|_| json!({}));
            v["id"] = json!(id);
            v
        })
        .collect();
    Ok(Json(json!({ "comments": body })))
}

pub async fn add_comment(
    State(state): State<AppState>,
    principal: Principal,
    Path((course_id, lesson_id)): Path<(String, String)>,
    Json(request): Json<CommentRequest>,
) -> Result<Json<Value>, AppError> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("comment text is required".into()));
    }

    let id = comments::add_comment(&state.firestore, &course_id, &lesson_id, &principal, text).await?;
    Ok(Json(json!({ "id": id })))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    principal: Principal,
    Path((course_id, lesson_id, comment_id)): Path<(String, String, String)>,
) -> Result<Json<Value>, AppError> {
    let (_, admin) = load_viewer(&state, &principal).await?;
    comments::delete_comment(
        &state.firestore,
        &course_id,
        &lesson_id,
        &comment_id,
        &principal.uid,
        admin,
    )
    .await?;
    Ok(Json(json!({ "deleted": comment_id })))
}

pub async fn toggle_comment_like(
    State(state): State<AppState>,
    principal: Principal,
    Path((course_id, lesson_id, comment_id)): Path<(String, String, String)>,
) -> Result<Json<Value>, AppError> {
    let liked = comments::toggle_comment_like(
        &state.firestore,
        &course_id,
        &lesson_id,
        &comment_id,
        &principal.uid,
    )
    .await?;
    Ok(Json(json!({ "liked": liked })))
}

pub async fn list_replies(
    State(state): State<AppState>,
    _principal: Principal,
    Path((course_id, lesson_id, comment_id)): Path<(String, String, String)>,
) -> Result<Json<Value>, AppError> {
    let replies = comments::list_replies(&state.firestore, &course_id, &lesson_id, &comment_id).await?;

    let body: Vec<Value> = replies
        .into_iter()
        .map(|(id, r)| {
            let mut v = serde_json::to_value(&r).unwrap_or_else(|_| json!({}));
            v["id"] = json!(id);
            v
        })
        .collect();
    Ok(Json(json!({ "replies": body })))
}

pub async fn add_reply(
    State(state): State<AppState>,
    principal: Principal,
    Path((course_id, lesson_id, comment_id)): Path<(String, String, String)>,
    Json(request): Json<CommentRequest>,
) -> Result<Json<Value>, AppError> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("reply text is required".into()));
    }

    let id = comments::add_reply(
        &state.firestore,
        &course_id,
        &lesson_id,
        &comment_id,
        &principal,
        text,
    )
    .await?;
    Ok(Json(json!({ "id": id })))
}

pub async fn delete_reply(
    State(state): State<AppState>,
    principal: Principal,
    Path((course_id, lesson_id, comment_id, reply_id)): Path<(String, String, String, String)>,
) -> Result<Json<Value>, AppError> {
    let (_, admin) = load_viewer(&state, &principal).await?;
    comments::delete_reply(
        &state.firestore,
        &course_id,
        &lesson_id,
        &comment_id,
        &reply_id,
        &principal.uid,
        admin,
    )
    .await?;
    Ok(Json(json!({ "deleted": reply_id })))
}
