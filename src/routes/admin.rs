// Admin back office: authoring, premium links, roles, audit log
// Thin wrappers over the store; every mutation lands in the audit log

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::auth::Principal;
use crate::error::AppError;
use crate::features::{access, audit, comments};
use crate::models::access::PremiumLink;
use crate::models::course::Course;
use crate::models::user::{Role, UserRecord};
use crate::routes::{require_admin, AppState};
use crate::utils::config::paths;
use crate::utils::ids::random_id;

// ============ Courses ============

pub async fn create_course(
    State(state): State<AppState>,
    principal: Principal,
    Json(course): Json<Course>,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &principal).await?;

    let course_id = random_id();
    state
        .firestore
        .set_document(&paths::course(&course_id), &serde_json::to_value(&course)?)
        .await?;

    audit::record(
        &state.firestore,
        &principal,
        "create",
        "course",
        &course_id,
        Some(&course.title),
    )
    .await?;

    Ok(Json(json!({ "id": course_id })))
}

pub async fn update_course(
    State(state): State<AppState>,
    principal: Principal,
    Path(course_id): Path<String>,
    Json(course): Json<Course>,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &principal).await?;

    let path = paths::course(&course_id);
    if state.firestore.get_document(&path).await?.is_none() {
        return Err(AppError::NotFound("course"));
    }
    state
        .firestore
        .set_document(&path, &serde_json::to_value(&course)?)
        .await?;

    audit::record(
        &state.firestore,
        &principal,
        "update",
        "course",
        &course_id,
        Some(&course.title),
    )
    .await?;

    Ok(Json(json!({ "id": course_id })))
}

pub async fn delete_course(
    State(state): State<AppState>,
    principal: Principal,
    Path(course_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &principal).await?;

    state.firestore.delete_document(&paths::course(&course_id)).await?;

    audit::record(&state.firestore, &principal, "delete", "course", &course_id, None).await?;

    Ok(Json(json!({ "deleted": course_id })))
}

// ============ Premium links ============

#[derive(Debug, Deserialize)]
pub struct LinkRequest {
    pub name: String,
    #[serde(rename = "courseIds")]
    pub course_ids: Vec<String>,
    /// 0 = unlimited
    #[serde(rename = "maxUses", default)]
    pub max_uses: i64,
    /// Manual activation switch; quota exhaustion flips it off on its own
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

pub async fn list_links(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &principal).await?;

    let docs = state.firestore.list_collection("premiumLinks").await?;
    let links: Vec<Value> = docs
        .into_iter()
        .map(|(id, mut data)| {
            data["id"] = json!(id);
            data
        })
        .collect();
    Ok(Json(json!({ "links": links })))
}

pub async fn create_link(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<LinkRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &principal).await?;

    if request.course_ids.is_empty() {
        return Err(AppError::BadRequest("courseIds must not be empty".into()));
    }
    if request.max_uses < 0 {
        return Err(AppError::BadRequest("maxUses must be >= 0".into()));
    }

    let link = PremiumLink {
        name: request.name.clone(),
        course_ids: request.course_ids,
        max_uses: request.max_uses,
        uses: 0,
        active: request.active,
    };

    let link_id = random_id();
    state
        .firestore
        .set_document(&paths::premium_link(&link_id), &serde_json::to_value(&link)?)
        .await?;

    audit::record(
        &state.firestore,
        &principal,
        "create",
        "premiumLink",
        &link_id,
        Some(&request.name),
    )
    .await?;

    Ok(Json(json!({ "id": link_id })))
}

/// Manual link edit. The uses counter is deliberately not writable here;
/// it only moves through the redemption transaction.
pub async fn update_link(
    State(state): State<AppState>,
    principal: Principal,
    Path(link_id): Path<String>,
    Json(request): Json<LinkRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &principal).await?;

    let path = paths::premium_link(&link_id);
    if state.firestore.get_document(&path).await?.is_none() {
        return Err(AppError::NotFound("link"));
    }

    state
        .firestore
        .set_document(
            &path,
            &json!({
                "name": request.name,
                "courseIds": request.course_ids,
                "maxUses": request.max_uses,
                "active": request.active,
            }),
        )
        .await?;

    audit::record(
        &state.firestore,
        &principal,
        "update",
        "premiumLink",
        &link_id,
        Some(&request.name),
    )
    .await?;

    Ok(Json(json!({ "id": link_id })))
}

pub async fn delete_link(
    State(state): State<AppState>,
    principal: Principal,
    Path(link_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &principal).await?;

    state
        .firestore
        .delete_document(&paths::premium_link(&link_id))
        .await?;

    audit::record(&state.firestore, &principal, "delete", "premiumLink", &link_id, None).await?;

    Ok(Json(json!({ "deleted": link_id })))
}

// ============ Users ============

pub async fn list_users(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &principal).await?;

    let docs = state.firestore.list_collection("users").await?;
    let users: Vec<Value> = docs
        .into_iter()
        .map(|(uid, mut data)| {
            data["uid"] = json!(uid);
            data
        })
        .collect();
    Ok(Json(json!({ "users": users })))
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: Role,
}

pub async fn set_role(
    State(state): State<AppState>,
    principal: Principal,
    Path(uid): Path<String>,
    Json(request): Json<RoleRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &principal).await?;

    let path = paths::user(&uid);
    let record: UserRecord = state
        .firestore
        .get_document(&path)
        .await?
        .and_then(|v| serde_json::from_value(v).ok())
        .ok_or(AppError::NotFound("user"))?;

    state
        .firestore
        .set_document(&path, &json!({ "role": request.role }))
        .await?;

    audit::record(
        &state.firestore,
        &principal,
        "setRole",
        "user",
        &uid,
        record.email.as_deref(),
    )
    .await?;

    Ok(Json(json!({ "uid": uid, "role": request.role })))
}

/// Direct grant from the admin panel. The panel flips its switch
/// optimistically and rolls back on a non-2xx response.
pub async fn grant_access(
    State(state): State<AppState>,
    principal: Principal,
    Path((uid, course_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &principal).await?;

    access::grant_access(&state.firestore, &uid, &course_id).await?;
    audit::record(&state.firestore, &principal, "grantAccess", "courseAccess", &course_id, None)
        .await?;

    Ok(Json(json!({ "uid": uid, "courseId": course_id, "granted": true })))
}

pub async fn revoke_access(
    State(state): State<AppState>,
    principal: Principal,
    Path((uid, course_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &principal).await?;

    access::revoke_access(&state.firestore, &uid, &course_id).await?;
    audit::record(&state.firestore, &principal, "revokeAccess", "courseAccess", &course_id, None)
        .await?;

    Ok(Json(json!({ "uid": uid, "courseId": course_id, "granted": false })))
}

// ============ Comments & audit log ============

#[derive(Debug, Deserialize)]
pub struct PinRequest {
    pub pinned: bool,
}

pub async fn pin_comment(
    State(state): State<AppState>,
    principal: Principal,
    Path((course_id, lesson_id, comment_id)): Path<(String, String, String)>,
    Json(request): Json<PinRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &principal).await?;

    comments::set_comment_pinned(&state.firestore, &course_id, &lesson_id, &comment_id, request.pinned)
        .await?;

    Ok(Json(json!({ "id": comment_id, "pinned": request.pinned })))
}

pub async fn list_audit(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &principal).await?;

    let entries = audit::recent(&state.firestore, 100).await?;
    let body: Vec<Value> = entries
        .into_iter()
        .map(|(id, e)| {
            let mut v = serde_json::to_value(&e).unwrap_or_else(|_| json!({}));
            v["id"] = json!(id);
            v
        })
        .collect();
    Ok(Json(json!({ "entries": body })))
}
