use axum::{extract::State, http::StatusCode, Json};

use crate::errors::AppError;
use crate::models::roadmap::Roadmap;
use crate::models::user::UserProfile;
use crate::state::AppState;

/// GET /api/v1/session
pub async fn handle_get_session(
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, AppError> {
    state
        .session
        .profile()
        .await
        .map(Json)
        .ok_or(AppError::Unauthorized)
}

/// POST /api/v1/session/refresh
/// Re-verifies the token. A rejected token signs the user out.
pub async fn handle_refresh_session(
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, AppError> {
    match state.session.refresh().await {
        Ok(Some(profile)) => Ok(Json(profile)),
        Ok(None) => Err(AppError::Unauthorized),
        Err(e) if e.status() == Some(401) => Err(AppError::Unauthorized),
        Err(e) => Err(e.into()),
    }
}

/// DELETE /api/v1/session
/// Signs out and drops every loaded roadmap view.
pub async fn handle_sign_out(State(state): State<AppState>) -> StatusCode {
    state.session.sign_out().await;
    state.views.lock().await.clear();
    StatusCode::NO_CONTENT
}

/// GET /api/v1/roadmaps
pub async fn handle_list_roadmaps(
    State(state): State<AppState>,
) -> Result<Json<Vec<Roadmap>>, AppError> {
    let user_id = state.session.user_id().await?;
    Ok(Json(state.backend.user_roadmaps(&user_id).await?))
}
