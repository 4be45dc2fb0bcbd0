// Premium link redemption endpoint

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::auth::Principal;
use crate::error::AppError;
use crate::features::redemption;
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    #[serde(rename = "linkId")]
    pub link_id: String,
}

/// Redeem a premium link for the caller. On failure nothing is granted
/// and the client must not redirect to the dashboard; the typed error
/// body tells it what to show instead.
pub async fn redeem_link(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<RedeemRequest>,
) -> Result<Json<Value>, AppError> {
    if request.link_id.trim().is_empty() {
        return Err(AppError::BadRequest("linkId is required".into()));
    }

    let outcome = redemption::redeem(&state.firestore, request.link_id.trim(), &principal.uid).await?;

    Ok(Json(json!({
        "grantedCourseIds": outcome.granted_course_ids,
        "uses": outcome.uses,
        "active": outcome.active,
    })))
}
