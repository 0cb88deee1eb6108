//! Async driver for one roadmap view.
//!
//! `RoadmapPlayer` owns the `PlayerState` behind a short-lived lock and performs
//! the network side of each operation. Ticks and Open/Close never wait on the
//! network; Complete, Skip and Rate are serialized through a mutation gate.

use std::ops::ControlFlow;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::backend::RoadmapBackend;
use crate::embed::youtube::AvailabilityProbe;
use crate::models::roadmap::{RatingRequest, ResourceRef, Roadmap};
use crate::notify::Notifier;
use crate::player::machine::{FrameEvent, PlayerState, Resolution, TickOutcome};
use crate::player::timer::{TickSink, TimerHandle};
use crate::player::{PlayerError, PlayerPolicy, PlayerView};

/// Fetches the user's roadmaps and picks out `roadmap_id`.
pub async fn fetch_roadmap(
    backend: &dyn RoadmapBackend,
    user_id: &str,
    roadmap_id: &str,
) -> Result<Roadmap, PlayerError> {
    backend
        .user_roadmaps(user_id)
        .await?
        .into_iter()
        .find(|r| r.id == roadmap_id)
        .ok_or_else(|| PlayerError::RoadmapNotFound(roadmap_id.to_string()))
}

/// Collaborators shared by the player and its background tasks.
#[derive(Clone)]
struct Context {
    roadmap_id: String,
    user_id: String,
    backend: Arc<dyn RoadmapBackend>,
    probe: Arc<dyn AvailabilityProbe>,
    notifier: Notifier,
}

impl Context {
    async fn refresh(&self, state: &Mutex<PlayerState>) -> Result<(), PlayerError> {
        let fresh = fetch_roadmap(self.backend.as_ref(), &self.user_id, &self.roadmap_id).await?;
        debug!(
            "Refreshed roadmap {}: current module {}, progress {}%",
            fresh.id, fresh.current_module_index, fresh.progress_percentage
        );
        state.lock().await.apply_snapshot(fresh);
        Ok(())
    }
}

#[derive(Clone)]
pub struct RoadmapPlayer {
    ctx: Context,
    state: Arc<Mutex<PlayerState>>,
    mutations: Arc<Mutex<()>>,
}

impl RoadmapPlayer {
    /// Fetches the roadmap and builds a fresh view over it.
    pub async fn load(
        roadmap_id: &str,
        user_id: &str,
        backend: Arc<dyn RoadmapBackend>,
        probe: Arc<dyn AvailabilityProbe>,
        notifier: Notifier,
        policy: PlayerPolicy,
    ) -> Result<Self, PlayerError> {
        let roadmap = fetch_roadmap(backend.as_ref(), user_id, roadmap_id).await?;
        info!(
            "Loaded roadmap {} ({} modules, current module {})",
            roadmap.id,
            roadmap.modules.len(),
            roadmap.current_module_index
        );
        Ok(Self {
            ctx: Context {
                roadmap_id: roadmap_id.to_string(),
                user_id: user_id.to_string(),
                backend,
                probe,
                notifier,
            },
            state: Arc::new(Mutex::new(PlayerState::new(roadmap, policy))),
            mutations: Arc::new(Mutex::new(())),
        })
    }

    pub async fn view(&self) -> PlayerView {
        PlayerView::from_state(&*self.state.lock().await)
    }

    /// Open: starts the timer and shows the embed immediately. The backend
    /// notification and the YouTube probe run in the background.
    pub async fn open(&self, target: ResourceRef) -> Result<PlayerView, PlayerError> {
        let plan = {
            let mut state = self.state.lock().await;
            let plan = state.open(&target)?;
            let period = state.policy().tick_period;
            let sink = TimeSink {
                ctx: self.ctx.clone(),
                state: Arc::downgrade(&self.state),
            };
            state.attach_timer(TimerHandle::spawn(plan.generation, period, sink));
            plan
        };

        let ctx = self.ctx.clone();
        let opened = plan.target.clone();
        tokio::spawn(async move {
            if let Err(e) = ctx.backend.open_resource(&ctx.roadmap_id, &opened).await {
                warn!(
                    "Failed to record open of {}/{}: {e}",
                    opened.module_id, opened.resource_id
                );
            }
        });

        if let Some(url) = plan.probe_url {
            let ctx = self.ctx.clone();
            let state = Arc::downgrade(&self.state);
            let generation = plan.generation;
            tokio::spawn(async move {
                let availability = ctx.probe.probe(&url).await;
                let unavailable = availability.is_unavailable();
                let Some(state) = state.upgrade() else {
                    return;
                };
                let current = state.lock().await.set_availability(generation, availability);
                if current && unavailable {
                    ctx.notifier
                        .warning("This video appears to be unavailable. It may have been removed or made private.")
                        .await;
                }
            });
        }

        Ok(self.view().await)
    }

    pub async fn close(&self) -> PlayerView {
        let mut state = self.state.lock().await;
        state.close();
        PlayerView::from_state(&state)
    }

    pub async fn complete(&self, target: ResourceRef) -> Result<PlayerView, PlayerError> {
        self.resolve(target, Resolution::Complete).await
    }

    pub async fn skip(&self, target: ResourceRef) -> Result<PlayerView, PlayerError> {
        self.resolve(target, Resolution::Skip).await
    }

    /// Complete and Skip share this path: predict the successor from the
    /// current snapshot, mutate, re-fetch, then open the prediction.
    async fn resolve(
        &self,
        target: ResourceRef,
        kind: Resolution,
    ) -> Result<PlayerView, PlayerError> {
        let _gate = self.mutations.lock().await;

        let plan = self.state.lock().await.prepare_resolution(&target, kind)?;
        debug!(
            "{} {}/{}; predicted successor {:?}",
            kind.verb(),
            target.module_id,
            target.resource_id,
            plan.successor.as_ref().map(|s| &s.target)
        );

        let backend = &self.ctx.backend;
        let response = match kind {
            Resolution::Complete => {
                backend
                    .complete_resource(&self.ctx.roadmap_id, &target)
                    .await
            }
            Resolution::Skip => backend.skip_resource(&self.ctx.roadmap_id, &target).await,
        };
        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!("Failed to {} resource: {e}", kind.verb());
                self.ctx
                    .notifier
                    .error(format!("Failed to {} resource: {e}", kind.verb()))
                    .await;
                return Err(e.into());
            }
        };

        self.state
            .lock()
            .await
            .record_summaries(response.into_summaries());

        if let Err(e) = self.ctx.refresh(&self.state).await {
            self.ctx
                .notifier
                .error(format!("Failed to refresh roadmap: {e}"))
                .await;
            return Err(e);
        }
        self.state.lock().await.focus_after(&plan);

        if let Some(successor) = plan.successor {
            if let Err(e) = self.open(successor.target).await {
                // Stale prediction; the fresh snapshot is already in place.
                warn!("Predicted successor could not be opened: {e}");
            }
        }

        self.ctx
            .notifier
            .success(format!("Resource {} successfully!", kind.past_tense()))
            .await;
        Ok(self.view().await)
    }

    pub async fn rate(
        &self,
        target: ResourceRef,
        rating: u8,
        comment: Option<String>,
    ) -> Result<PlayerView, PlayerError> {
        let _gate = self.mutations.lock().await;

        let resource_url = self.state.lock().await.rating_target(&target, rating)?;
        let request = RatingRequest {
            rating,
            comment: comment.filter(|c| !c.trim().is_empty()),
        };

        if let Err(e) = self
            .ctx
            .backend
            .rate_resource(
                &self.ctx.roadmap_id,
                &self.ctx.user_id,
                &resource_url,
                &request,
            )
            .await
        {
            warn!("Failed to rate resource: {e}");
            self.ctx.notifier.error("Failed to submit rating").await;
            return Err(e.into());
        }

        self.ctx
            .notifier
            .success("Rating submitted successfully!")
            .await;
        if let Err(e) = self.ctx.refresh(&self.state).await {
            warn!("Failed to refresh roadmap after rating: {e}");
        }
        Ok(self.view().await)
    }

    pub async fn report_frame(&self, target: ResourceRef, event: FrameEvent) -> PlayerView {
        let mut state = self.state.lock().await;
        if !state.report_frame(&target, event) {
            debug!(
                "Ignoring frame event for {}/{}: not the opened resource",
                target.module_id, target.resource_id
            );
        }
        PlayerView::from_state(&state)
    }

    pub async fn acknowledge_summaries(&self) -> PlayerView {
        let mut state = self.state.lock().await;
        state.acknowledge_summaries();
        PlayerView::from_state(&state)
    }

    /// Re-fetches the roadmap without touching the timer or the opened resource.
    pub async fn refresh(&self) -> Result<PlayerView, PlayerError> {
        self.ctx.refresh(&self.state).await?;
        Ok(self.view().await)
    }
}

/// Drives the active timer: one second of accrual per tick, persistence on
/// every cadence boundary.
struct TimeSink {
    ctx: Context,
    state: Weak<Mutex<PlayerState>>,
}

#[async_trait]
impl TickSink for TimeSink {
    async fn on_tick(&self, generation: u64) -> ControlFlow<()> {
        let Some(state) = self.state.upgrade() else {
            return ControlFlow::Break(());
        };
        let outcome = state.lock().await.tick(generation);

        match outcome {
            TickOutcome::Stale => ControlFlow::Break(()),
            TickOutcome::Accrued { .. } => ControlFlow::Continue(()),
            TickOutcome::PersistDue { target, seconds } => {
                tokio::spawn(persist_time(
                    self.ctx.clone(),
                    Arc::downgrade(&state),
                    generation,
                    target,
                    seconds,
                ));
                ControlFlow::Continue(())
            }
        }
    }
}

/// Failures are logged and retried implicitly at the next cadence boundary.
async fn persist_time(
    ctx: Context,
    state: Weak<Mutex<PlayerState>>,
    generation: u64,
    target: ResourceRef,
    seconds: u64,
) {
    let response = match ctx
        .backend
        .update_time_spent(&ctx.roadmap_id, &target, seconds)
        .await
    {
        Ok(r) => r,
        Err(e) => {
            warn!(
                "Failed to update time for {}/{} at {seconds}s: {e}",
                target.module_id, target.resource_id
            );
            return;
        }
    };

    if !response.auto_completed {
        return;
    }
    let Some(state) = state.upgrade() else {
        return;
    };
    if !state.lock().await.auto_completed(generation) {
        return;
    }
    info!(
        "{}/{} auto-completed at {seconds}s",
        target.module_id, target.resource_id
    );
    ctx.notifier
        .info("Resource marked as completed based on time spent.")
        .await;
    if let Err(e) = ctx.refresh(&state).await {
        warn!("Failed to refresh roadmap after auto-completion: {e}");
    }
}
