// HTTP API surface
// Handlers stay thin; invariants live in the feature modules

pub mod admin;
pub mod courses;
pub mod engagement;
pub mod ideas;
pub mod me;
pub mod redeem;

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::auth::{AuthVerifier, Principal};
use crate::api::firestore::FirestoreClient;
use crate::error::AppError;
use crate::features::unlock;
use crate::models::user::UserRecord;
use crate::utils::config::paths;

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub firestore: Arc<FirestoreClient>,
    pub auth: Arc<AuthVerifier>,
    pub http: reqwest::Client,
}

/// Extract and verify the bearer ID token on a request
#[axum::async_trait]
impl FromRequestParts<AppState> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthenticated)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthenticated)?;

        state
            .auth
            .verify(token)
            .await
            .map_err(|_| AppError::Unauthenticated)
    }
}

/// Load the caller's user document and resolve the admin predicate once
pub(crate) async fn load_viewer(
    state: &AppState,
    principal: &Principal,
) -> Result<(Option<UserRecord>, bool), AppError> {
    let record = state
        .firestore
        .get_document(&paths::user(&principal.uid))
        .await?
        .and_then(|v| serde_json::from_value::<UserRecord>(v).ok());
    let admin = unlock::is_admin(principal, record.as_ref());
    Ok((record, admin))
}

/// Reject non-admin callers
pub(crate) async fn require_admin(state: &AppState, principal: &Principal) -> Result<(), AppError> {
    let (_, admin) = load_viewer(state, principal).await?;
    if admin {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}

/// Build the full application router
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        // Catalog and course view
        .route("/courses", get(courses::list_courses))
        .route("/courses/:course_id", get(courses::get_course))
        // Redemption
        .route("/redeem", post(redeem::redeem_link))
        // Profile, access ledger, progress
        .route("/me", get(me::get_me))
        .route("/me/access", get(me::list_my_access))
        .route("/me/progress/:course_id", get(me::get_my_progress))
        .route(
            "/me/progress/:course_id/:lesson_id",
            post(me::complete_lesson),
        )
        // Reactions and comments
        .route(
            "/lessons/:course_id/:lesson_id/reactions",
            get(engagement::get_reactions).post(engagement::toggle_reaction),
        )
        .route(
            "/lessons/:course_id/:lesson_id/comments",
            get(engagement::list_comments).post(engagement::add_comment),
        )
        .route(
            "/lessons/:course_id/:lesson_id/comments/:comment_id",
            delete(engagement::delete_comment),
        )
        .route(
            "/lessons/:course_id/:lesson_id/comments/:comment_id/like",
            post(engagement::toggle_comment_like),
        )
        .route(
            "/lessons/:course_id/:lesson_id/comments/:comment_id/replies",
            get(engagement::list_replies).post(engagement::add_reply),
        )
        .route(
            "/lessons/:course_id/:lesson_id/comments/:comment_id/replies/:reply_id",
            delete(engagement::delete_reply),
        )
        // Idea generation
        .route("/ideas/generate", post(ideas::generate))
        // Admin back office
        .route("/admin/courses", post(admin::create_course))
        .route(
            "/admin/courses/:course_id",
            put(admin::update_course).delete(admin::delete_course),
        )
        .route("/admin/links", get(admin::list_links).post(admin::create_link))
        .route(
            "/admin/links/:link_id",
            put(admin::update_link).delete(admin::delete_link),
        )
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/:uid/role", post(admin::set_role))
        .route(
            "/admin/users/:uid/access/:course_id",
            post(admin::grant_access).delete(admin::revoke_access),
        )
        .route(
            "/admin/comments/:course_id/:lesson_id/:comment_id/pin",
            put(admin::pin_comment),
        )
        .route("/admin/audit", get(admin::list_audit));

    Router::new()
        .nest("/api", api)
        .route("/health", get(|| async { "ok" }))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
