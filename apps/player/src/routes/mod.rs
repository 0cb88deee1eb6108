pub mod embed;
pub mod health;
pub mod notifications;
pub mod session;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::player::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session
        .route(
            "/api/v1/session",
            get(session::handle_get_session).delete(session::handle_sign_out),
        )
        .route(
            "/api/v1/session/refresh",
            post(session::handle_refresh_session),
        )
        .route("/api/v1/roadmaps", get(session::handle_list_roadmaps))
        // Roadmap player
        .route(
            "/api/v1/roadmaps/:id/view",
            post(handlers::handle_load_view)
                .get(handlers::handle_get_view)
                .delete(handlers::handle_drop_view),
        )
        .route(
            "/api/v1/roadmaps/:id/view/refresh",
            post(handlers::handle_refresh),
        )
        .route("/api/v1/roadmaps/:id/view/open", post(handlers::handle_open))
        .route(
            "/api/v1/roadmaps/:id/view/close",
            post(handlers::handle_close),
        )
        .route(
            "/api/v1/roadmaps/:id/view/complete",
            post(handlers::handle_complete),
        )
        .route("/api/v1/roadmaps/:id/view/skip", post(handlers::handle_skip))
        .route("/api/v1/roadmaps/:id/view/rate", post(handlers::handle_rate))
        .route(
            "/api/v1/roadmaps/:id/view/frame",
            post(handlers::handle_frame),
        )
        .route(
            "/api/v1/roadmaps/:id/view/summaries/ack",
            post(handlers::handle_ack_summaries),
        )
        // Embeds and notifications
        .route("/api/v1/embed", get(embed::handle_resolve_embed))
        .route(
            "/api/v1/notifications",
            get(notifications::handle_list_notifications),
        )
        .route(
            "/api/v1/notifications/:id",
            delete(notifications::handle_dismiss_notification),
        )
        .with_state(state)
}
