//! Signed-in identity and cached profile.
//!
//! The identity provider hands us a token; the backend turns it into a profile.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::backend::{BackendError, RoadmapBackend};
use crate::models::user::UserProfile;
use crate::player::PlayerError;

#[derive(Clone)]
pub struct Session {
    token: Arc<RwLock<Option<String>>>,
    profile: Arc<RwLock<Option<UserProfile>>>,
    backend: Arc<dyn RoadmapBackend>,
}

impl Session {
    pub fn new(backend: Arc<dyn RoadmapBackend>) -> Self {
        Self {
            token: Arc::new(RwLock::new(None)),
            profile: Arc::new(RwLock::new(None)),
            backend,
        }
    }

    /// Verifies `token` with the backend and caches the resulting profile.
    pub async fn sign_in(&self, token: String) -> Result<UserProfile, BackendError> {
        let profile = self.backend.verify_token(&token).await?;
        info!("Signed in as {} ({})", profile.email, profile.id);
        *self.token.write().await = Some(token);
        *self.profile.write().await = Some(profile.clone());
        Ok(profile)
    }

    /// Re-fetches the profile for the current token. A failed refresh clears the cache.
    pub async fn refresh(&self) -> Result<Option<UserProfile>, BackendError> {
        let Some(token) = self.token.read().await.clone() else {
            return Ok(None);
        };
        match self.backend.verify_token(&token).await {
            Ok(profile) => {
                *self.profile.write().await = Some(profile.clone());
                Ok(Some(profile))
            }
            Err(e) => {
                warn!("Error refreshing user data: {e}");
                *self.profile.write().await = None;
                Err(e)
            }
        }
    }

    pub async fn sign_out(&self) {
        *self.token.write().await = None;
        *self.profile.write().await = None;
    }

    pub async fn profile(&self) -> Option<UserProfile> {
        self.profile.read().await.clone()
    }

    pub async fn user_id(&self) -> Result<String, PlayerError> {
        self.profile
            .read()
            .await
            .as_ref()
            .map(|p| p.id.clone())
            .ok_or(PlayerError::NotSignedIn)
    }
}
