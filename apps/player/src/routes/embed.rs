use axum::{extract::Query, Json};
use serde::{Deserialize, Serialize};

use crate::embed::{self, youtube, EmbedResolution, FallbackLinks};
use crate::errors::AppError;

#[derive(Deserialize)]
pub struct EmbedQuery {
    pub url: String,
}

#[derive(Serialize)]
pub struct EmbedResponse {
    /// The URL after YouTube canonicalization; unchanged for other providers.
    pub url: String,
    pub embed: EmbedResolution,
    pub fallbacks: FallbackLinks,
}

/// GET /api/v1/embed?url=
pub async fn handle_resolve_embed(
    Query(params): Query<EmbedQuery>,
) -> Result<Json<EmbedResponse>, AppError> {
    let raw = params.url.trim();
    if raw.is_empty() {
        return Err(AppError::Validation("url must not be empty".to_string()));
    }

    let url = match youtube::video_id(raw) {
        Some(id) => youtube::canonical_url(id),
        None => raw.to_string(),
    };
    Ok(Json(EmbedResponse {
        embed: embed::resolve(&url),
        fallbacks: embed::fallbacks(&url),
        url,
    }))
}
