// AI idea generation endpoint

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::api::auth::Principal;
use crate::error::AppError;
use crate::features::ideas::{self, IdeaRequest};
use crate::routes::AppState;

/// Generate validated business ideas for the signed-in user
pub async fn generate(
    State(state): State<AppState>,
    _principal: Principal,
    Json(request): Json<IdeaRequest>,
) -> Result<Json<Value>, AppError> {
    if request.topic.trim().is_empty() {
        return Err(AppError::BadRequest("topic is required".into()));
    }

    let generated = ideas::generate_ideas(&state.http, &request).await?;
    Ok(Json(json!({ "ideas": generated })))
}
