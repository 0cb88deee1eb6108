//! In-memory `RoadmapBackend` used by the player tests.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{BackendError, RoadmapBackend};
use crate::models::roadmap::{
    ModuleSummary, RatingRequest, ResolutionResponse, ResourceRef, ResourceStatus, Roadmap,
    TimeSpentResponse,
};
use crate::models::user::UserProfile;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    UserRoadmaps(String),
    Open(ResourceRef),
    TimeSpent(ResourceRef, u64),
    Complete(ResourceRef),
    Skip(ResourceRef),
    Rate(String, u8),
}

#[derive(Default)]
struct Inner {
    roadmaps: Vec<Roadmap>,
    calls: Vec<Call>,
    fail_mutations: bool,
    fail_time_spent: bool,
    auto_complete_at: Option<u64>,
    summaries: Vec<ModuleSummary>,
}

/// Serves scripted snapshots and applies complete/skip to its own copy so
/// re-fetches observe the mutation the way the real backend would.
#[derive(Clone, Default)]
pub struct FakeBackend {
    inner: Arc<Mutex<Inner>>,
}

impl FakeBackend {
    pub fn with_roadmap(roadmap: Roadmap) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                roadmaps: vec![roadmap],
                ..Inner::default()
            })),
        }
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.inner.lock().await.calls.clone()
    }

    pub async fn time_spent_calls(&self) -> Vec<u64> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|c| match c {
                Call::TimeSpent(_, seconds) => Some(seconds),
                _ => None,
            })
            .collect()
    }

    pub async fn fail_mutations(&self, fail: bool) {
        self.inner.lock().await.fail_mutations = fail;
    }

    pub async fn fail_time_spent(&self, fail: bool) {
        self.inner.lock().await.fail_time_spent = fail;
    }

    pub async fn auto_complete_at(&self, seconds: u64) {
        self.inner.lock().await.auto_complete_at = Some(seconds);
    }

    pub async fn set_summaries(&self, summaries: Vec<ModuleSummary>) {
        self.inner.lock().await.summaries = summaries;
    }

    pub async fn replace_roadmap(&self, roadmap: Roadmap) {
        let mut inner = self.inner.lock().await;
        inner.roadmaps.retain(|r| r.id != roadmap.id);
        inner.roadmaps.push(roadmap);
    }

    pub async fn roadmap(&self, id: &str) -> Option<Roadmap> {
        self.inner
            .lock()
            .await
            .roadmaps
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    fn unavailable() -> BackendError {
        BackendError::Api {
            status: 503,
            message: "backend offline".to_string(),
        }
    }
}

fn set_status(inner: &mut Inner, roadmap_id: &str, target: &ResourceRef, status: ResourceStatus) {
    let Some(roadmap) = inner.roadmaps.iter_mut().find(|r| r.id == roadmap_id) else {
        return;
    };
    for module in roadmap.modules.iter_mut() {
        if module.id != target.module_id {
            continue;
        }
        for resource in module.resources.iter_mut() {
            if resource.id == target.resource_id {
                resource.status = status;
            }
        }
        module.is_completed = module.resources.iter().all(|r| r.status.is_resolved());
    }
    let first_open = roadmap
        .modules
        .iter()
        .position(|m| !m.is_completed)
        .unwrap_or(roadmap.modules.len().saturating_sub(1));
    roadmap.current_module_index = first_open;
}

#[async_trait]
impl RoadmapBackend for FakeBackend {
    async fn verify_token(&self, token: &str) -> Result<UserProfile, BackendError> {
        if token.is_empty() {
            return Err(BackendError::Api {
                status: 401,
                message: "invalid token".to_string(),
            });
        }
        Ok(UserProfile {
            id: "user-1".to_string(),
            email: "learner@example.com".to_string(),
            name: "Learner".to_string(),
            role: None,
        })
    }

    async fn user_roadmaps(&self, user_id: &str) -> Result<Vec<Roadmap>, BackendError> {
        let mut inner = self.inner.lock().await;
        inner.calls.push(Call::UserRoadmaps(user_id.to_string()));
        Ok(inner.roadmaps.clone())
    }

    async fn open_resource(
        &self,
        _roadmap_id: &str,
        target: &ResourceRef,
    ) -> Result<(), BackendError> {
        self.inner.lock().await.calls.push(Call::Open(target.clone()));
        Ok(())
    }

    async fn update_time_spent(
        &self,
        _roadmap_id: &str,
        target: &ResourceRef,
        seconds: u64,
    ) -> Result<TimeSpentResponse, BackendError> {
        let mut inner = self.inner.lock().await;
        inner.calls.push(Call::TimeSpent(target.clone(), seconds));
        if inner.fail_time_spent {
            return Err(Self::unavailable());
        }
        let auto_completed = inner.auto_complete_at.is_some_and(|at| seconds >= at);
        Ok(TimeSpentResponse { auto_completed })
    }

    async fn complete_resource(
        &self,
        roadmap_id: &str,
        target: &ResourceRef,
    ) -> Result<ResolutionResponse, BackendError> {
        let mut inner = self.inner.lock().await;
        inner.calls.push(Call::Complete(target.clone()));
        if inner.fail_mutations {
            return Err(Self::unavailable());
        }
        set_status(&mut inner, roadmap_id, target, ResourceStatus::Completed);
        Ok(ResolutionResponse {
            module_summaries: Some(inner.summaries.clone()),
        })
    }

    async fn skip_resource(
        &self,
        roadmap_id: &str,
        target: &ResourceRef,
    ) -> Result<ResolutionResponse, BackendError> {
        let mut inner = self.inner.lock().await;
        inner.calls.push(Call::Skip(target.clone()));
        if inner.fail_mutations {
            return Err(Self::unavailable());
        }
        set_status(&mut inner, roadmap_id, target, ResourceStatus::Skipped);
        Ok(ResolutionResponse::default())
    }

    async fn rate_resource(
        &self,
        _roadmap_id: &str,
        _user_id: &str,
        resource_url: &str,
        rating: &RatingRequest,
    ) -> Result<(), BackendError> {
        let mut inner = self.inner.lock().await;
        inner
            .calls
            .push(Call::Rate(resource_url.to_string(), rating.rating));
        if inner.fail_mutations {
            return Err(Self::unavailable());
        }
        Ok(())
    }
}
