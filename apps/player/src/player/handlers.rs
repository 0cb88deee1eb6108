use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::roadmap::ResourceRef;
use crate::player::machine::FrameEvent;
use crate::player::{PlayerView, RoadmapPlayer};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ResourceRequest {
    pub module_id: String,
    pub resource_id: String,
}

impl ResourceRequest {
    fn target(self) -> ResourceRef {
        ResourceRef::new(self.module_id, self.resource_id)
    }
}

#[derive(Deserialize)]
pub struct RateRequest {
    pub module_id: String,
    pub resource_id: String,
    pub rating: u8,
    pub comment: Option<String>,
}

#[derive(Deserialize)]
pub struct FrameRequest {
    pub module_id: String,
    pub resource_id: String,
    pub event: FrameEvent,
}

/// POST /api/v1/roadmaps/:id/view
/// Loads (or reloads) the roadmap view. Any previous view for the id is
/// dropped along with its timer.
pub async fn handle_load_view(
    State(state): State<AppState>,
    Path(roadmap_id): Path<String>,
) -> Result<(StatusCode, Json<PlayerView>), AppError> {
    let user_id = state.session.user_id().await?;
    let player = RoadmapPlayer::load(
        &roadmap_id,
        &user_id,
        state.backend.clone(),
        state.probe.clone(),
        state.notifier.clone(),
        state.policy.clone(),
    )
    .await?;
    let view = player.view().await;
    let replaced = state.views.lock().await.insert(roadmap_id.clone(), player);
    if let Some(previous) = replaced {
        previous.close().await;
        info!("Replaced view for roadmap {roadmap_id}");
    }
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/roadmaps/:id/view
pub async fn handle_get_view(
    State(state): State<AppState>,
    Path(roadmap_id): Path<String>,
) -> Result<Json<PlayerView>, AppError> {
    Ok(Json(state.view(&roadmap_id).await?.view().await))
}

/// DELETE /api/v1/roadmaps/:id/view
pub async fn handle_drop_view(
    State(state): State<AppState>,
    Path(roadmap_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let removed = state.views.lock().await.remove(&roadmap_id);
    match removed {
        Some(player) => {
            player.close().await;
            info!("Dropped view for roadmap {roadmap_id}");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(AppError::NotFound(format!(
            "No roadmap view is loaded for {roadmap_id}"
        ))),
    }
}

/// POST /api/v1/roadmaps/:id/view/refresh
pub async fn handle_refresh(
    State(state): State<AppState>,
    Path(roadmap_id): Path<String>,
) -> Result<Json<PlayerView>, AppError> {
    Ok(Json(state.view(&roadmap_id).await?.refresh().await?))
}

/// POST /api/v1/roadmaps/:id/view/open
pub async fn handle_open(
    State(state): State<AppState>,
    Path(roadmap_id): Path<String>,
    Json(req): Json<ResourceRequest>,
) -> Result<Json<PlayerView>, AppError> {
    let player = state.view(&roadmap_id).await?;
    Ok(Json(player.open(req.target()).await?))
}

/// POST /api/v1/roadmaps/:id/view/close
pub async fn handle_close(
    State(state): State<AppState>,
    Path(roadmap_id): Path<String>,
) -> Result<Json<PlayerView>, AppError> {
    Ok(Json(state.view(&roadmap_id).await?.close().await))
}

/// POST /api/v1/roadmaps/:id/view/complete
pub async fn handle_complete(
    State(state): State<AppState>,
    Path(roadmap_id): Path<String>,
    Json(req): Json<ResourceRequest>,
) -> Result<Json<PlayerView>, AppError> {
    let player = state.view(&roadmap_id).await?;
    Ok(Json(player.complete(req.target()).await?))
}

/// POST /api/v1/roadmaps/:id/view/skip
pub async fn handle_skip(
    State(state): State<AppState>,
    Path(roadmap_id): Path<String>,
    Json(req): Json<ResourceRequest>,
) -> Result<Json<PlayerView>, AppError> {
    let player = state.view(&roadmap_id).await?;
    Ok(Json(player.skip(req.target()).await?))
}

/// POST /api/v1/roadmaps/:id/view/rate
pub async fn handle_rate(
    State(state): State<AppState>,
    Path(roadmap_id): Path<String>,
    Json(req): Json<RateRequest>,
) -> Result<Json<PlayerView>, AppError> {
    let player = state.view(&roadmap_id).await?;
    let target = ResourceRef::new(req.module_id, req.resource_id);
    Ok(Json(player.rate(target, req.rating, req.comment).await?))
}

/// POST /api/v1/roadmaps/:id/view/frame
/// Reports whether the inline frame loaded or failed.
pub async fn handle_frame(
    State(state): State<AppState>,
    Path(roadmap_id): Path<String>,
    Json(req): Json<FrameRequest>,
) -> Result<Json<PlayerView>, AppError> {
    let player = state.view(&roadmap_id).await?;
    let target = ResourceRef::new(req.module_id, req.resource_id);
    Ok(Json(player.report_frame(target, req.event).await))
}

/// POST /api/v1/roadmaps/:id/view/summaries/ack
pub async fn handle_ack_summaries(
    State(state): State<AppState>,
    Path(roadmap_id): Path<String>,
) -> Result<Json<PlayerView>, AppError> {
    Ok(Json(
        state.view(&roadmap_id).await?.acknowledge_summaries().await,
    ))
}
