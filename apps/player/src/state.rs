use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::backend::RoadmapBackend;
use crate::embed::youtube::AvailabilityProbe;
use crate::errors::AppError;
use crate::notify::Notifier;
use crate::player::{PlayerError, PlayerPolicy, RoadmapPlayer};
use crate::session::Session;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn RoadmapBackend>,
    /// YouTube availability lookup used when a video resource is opened.
    pub probe: Arc<dyn AvailabilityProbe>,
    pub session: Session,
    pub notifier: Notifier,
    pub policy: PlayerPolicy,
    /// Loaded roadmap views keyed by roadmap id. Removing an entry drops its
    /// timer.
    pub views: Arc<Mutex<HashMap<String, RoadmapPlayer>>>,
}

impl AppState {
    pub fn new(
        backend: Arc<dyn RoadmapBackend>,
        probe: Arc<dyn AvailabilityProbe>,
        notifier: Notifier,
        policy: PlayerPolicy,
    ) -> Self {
        Self {
            session: Session::new(backend.clone()),
            backend,
            probe,
            notifier,
            policy,
            views: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn view(&self, roadmap_id: &str) -> Result<RoadmapPlayer, AppError> {
        self.views
            .lock()
            .await
            .get(roadmap_id)
            .cloned()
            .ok_or_else(|| PlayerError::NoView(roadmap_id.to_string()).into())
    }
}
