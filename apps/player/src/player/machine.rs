//! The per-roadmap resource player state machine.
//!
//! Holds the roadmap snapshot, per-resource elapsed time, the single active
//! timer and the opened resource. Everything here is synchronous; network
//! effects are planned here and carried out by `runtime::RoadmapPlayer`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::embed::{self, youtube, youtube::Availability, EmbedResolution};
use crate::models::roadmap::{ModuleSummary, ResourceRef, ResourceStatus, Roadmap};
use crate::player::gating::{self, Location};
use crate::player::successor::{predict_successor, Successor};
use crate::player::timer::TimerHandle;
use crate::player::{PlayerError, PlayerPolicy};

/// Render-time state of the inline frame, reported by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameStatus {
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameEvent {
    Loaded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Complete,
    Skip,
}

impl Resolution {
    pub fn verb(self) -> &'static str {
        match self {
            Resolution::Complete => "complete",
            Resolution::Skip => "skip",
        }
    }

    pub fn past_tense(self) -> &'static str {
        match self {
            Resolution::Complete => "completed",
            Resolution::Skip => "skipped",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenedResource {
    pub target: ResourceRef,
    pub url: String,
    pub title: String,
    pub generation: u64,
    pub embed: EmbedResolution,
    pub frame: FrameStatus,
    pub availability: Option<Availability>,
}

#[derive(Debug)]
struct ActiveTimer {
    target: ResourceRef,
    generation: u64,
    // Dropping the handle aborts the tick task.
    handle: Option<TimerHandle>,
}

/// Side effects the caller must start after a successful Open.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenPlan {
    pub generation: u64,
    pub target: ResourceRef,
    pub probe_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The tick belongs to a timer that has since been replaced or stopped.
    Stale,
    Accrued { seconds: u64 },
    PersistDue { target: ResourceRef, seconds: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionPlan {
    pub location: Location,
    pub successor: Option<Successor>,
}

pub struct PlayerState {
    policy: PlayerPolicy,
    roadmap: Roadmap,
    time_spent: HashMap<ResourceRef, u64>,
    focused_module: usize,
    active: Option<ActiveTimer>,
    opened: Option<OpenedResource>,
    pending_summaries: Vec<ModuleSummary>,
    generation: u64,
}

impl PlayerState {
    pub fn new(roadmap: Roadmap, policy: PlayerPolicy) -> Self {
        let focused_module = roadmap.current_module_index;
        let time_spent = server_time(&roadmap);
        Self {
            policy,
            roadmap,
            time_spent,
            focused_module,
            active: None,
            opened: None,
            pending_summaries: Vec::new(),
            generation: 0,
        }
    }

    pub fn policy(&self) -> &PlayerPolicy {
        &self.policy
    }

    pub fn roadmap(&self) -> &Roadmap {
        &self.roadmap
    }

    pub fn opened(&self) -> Option<&OpenedResource> {
        self.opened.as_ref()
    }

    pub fn active_target(&self) -> Option<&ResourceRef> {
        self.active.as_ref().map(|a| &a.target)
    }

    pub fn focused_module(&self) -> usize {
        self.focused_module
    }

    pub fn pending_summaries(&self) -> &[ModuleSummary] {
        &self.pending_summaries
    }

    /// Local elapsed seconds for `target`, falling back to the snapshot value.
    pub fn time_spent(&self, target: &ResourceRef) -> u64 {
        self.time_spent.get(target).copied().unwrap_or(0)
    }

    /// Opens `target`, replacing any running timer. Re-opening the same
    /// resource restarts its timer without losing accrued time.
    pub fn open(&mut self, target: &ResourceRef) -> Result<OpenPlan, PlayerError> {
        let location = gating::check_open(&self.roadmap, target)?;

        self.stop_timer();
        self.generation += 1;
        let generation = self.generation;

        let resource = &mut self.roadmap.modules[location.module_index].resources
            [location.resource_index];
        if resource.status == ResourceStatus::NotStarted {
            resource.status = ResourceStatus::InProgress;
        }

        let video_id = youtube::is_youtube(&resource.url)
            .then(|| youtube::video_id(&resource.url))
            .flatten();
        let (url, probe_url) = match video_id {
            Some(id) => {
                let canonical = youtube::canonical_url(id);
                (canonical.clone(), Some(canonical))
            }
            None => (resource.url.clone(), None),
        };
        let title = resource.title.clone();
        let server_seconds = resource.time_spent_seconds;

        self.time_spent
            .entry(target.clone())
            .or_insert(server_seconds);

        debug!(
            "Opening {}/{} (timer generation {generation})",
            target.module_id, target.resource_id
        );
        self.opened = Some(OpenedResource {
            target: target.clone(),
            embed: embed::resolve(&url),
            url,
            title,
            generation,
            frame: FrameStatus::Loading,
            availability: None,
        });
        self.active = Some(ActiveTimer {
            target: target.clone(),
            generation,
            handle: None,
        });
        self.focused_module = location.module_index;

        Ok(OpenPlan {
            generation,
            target: target.clone(),
            probe_url,
        })
    }

    /// Hands ownership of a tick task to the active timer. A handle for a
    /// superseded generation is dropped, which cancels it.
    pub fn attach_timer(&mut self, handle: TimerHandle) {
        match self.active.as_mut() {
            Some(active) if active.generation == handle.generation() => {
                active.handle = Some(handle);
            }
            _ => debug!("Discarding timer for stale generation {}", handle.generation()),
        }
    }

    pub fn tick(&mut self, generation: u64) -> TickOutcome {
        let Some(target) = self
            .active
            .as_ref()
            .filter(|a| a.generation == generation)
            .map(|a| a.target.clone())
        else {
            return TickOutcome::Stale;
        };

        let elapsed = self.time_spent.entry(target.clone()).or_insert(0);
        *elapsed += 1;
        let seconds = *elapsed;

        let every = self.policy.persist_every_secs;
        if every > 0 && seconds % every == 0 {
            TickOutcome::PersistDue { target, seconds }
        } else {
            TickOutcome::Accrued { seconds }
        }
    }

    pub fn stop_timer(&mut self) {
        if let Some(active) = self.active.take() {
            debug!("Stopping timer generation {}", active.generation);
        }
    }

    pub fn close(&mut self) {
        self.stop_timer();
        self.opened = None;
    }

    /// Validates a Complete/Skip and predicts the successor from the current
    /// snapshot. Stops the timer when it belongs to `target`.
    pub fn prepare_resolution(
        &mut self,
        target: &ResourceRef,
        kind: Resolution,
    ) -> Result<ResolutionPlan, PlayerError> {
        let location = gating::check_open(&self.roadmap, target)?;

        if kind == Resolution::Complete {
            let resource = gating::resource_at(&self.roadmap, location);
            let spent = self.time_spent(target);
            if !gating::meets_threshold(
                spent,
                resource.estimated_hours,
                self.policy.completion_threshold,
            ) {
                return Err(PlayerError::BelowThreshold {
                    resource_id: target.resource_id.clone(),
                    progress_percent: gating::progress_percent(spent, resource.estimated_hours),
                    required_percent: (self.policy.completion_threshold * 100.0).round() as u32,
                });
            }
        }

        let successor = predict_successor(&self.roadmap, location);

        if self.active_target() == Some(target) {
            self.stop_timer();
        }

        Ok(ResolutionPlan {
            location,
            successor,
        })
    }

    /// Replaces the snapshot wholesale. The active resource keeps the larger of
    /// its local and server time so elapsed time never runs backwards.
    pub fn apply_snapshot(&mut self, roadmap: Roadmap) {
        let mut time_spent = server_time(&roadmap);
        if let Some(active) = &self.active {
            let local = self.time_spent(&active.target);
            let merged = time_spent.entry(active.target.clone()).or_insert(0);
            *merged = (*merged).max(local);
        }

        self.time_spent = time_spent;
        self.roadmap = roadmap;
        self.focused_module = self
            .focused_module
            .min(self.roadmap.modules.len().saturating_sub(1));
    }

    /// Focuses the successor's module, or stays on the acted-upon module.
    pub fn focus_after(&mut self, plan: &ResolutionPlan) {
        self.focused_module = plan
            .successor
            .as_ref()
            .map(|s| s.location.module_index)
            .unwrap_or(plan.location.module_index);
    }

    pub fn record_summaries(&mut self, summaries: Vec<ModuleSummary>) {
        if !summaries.is_empty() {
            self.pending_summaries = summaries;
        }
    }

    pub fn acknowledge_summaries(&mut self) -> usize {
        std::mem::take(&mut self.pending_summaries).len()
    }

    /// Server-side auto-completion for `generation`; true if it stopped the live timer.
    pub fn auto_completed(&mut self, generation: u64) -> bool {
        if self
            .active
            .as_ref()
            .is_some_and(|a| a.generation == generation)
        {
            self.stop_timer();
            true
        } else {
            false
        }
    }

    pub fn report_frame(&mut self, target: &ResourceRef, event: FrameEvent) -> bool {
        match self.opened.as_mut() {
            Some(opened) if &opened.target == target => {
                opened.frame = match event {
                    FrameEvent::Loaded => FrameStatus::Loaded,
                    FrameEvent::Failed => FrameStatus::Failed,
                };
                true
            }
            _ => false,
        }
    }

    pub fn set_availability(&mut self, generation: u64, availability: Availability) -> bool {
        match self.opened.as_mut() {
            Some(opened) if opened.generation == generation => {
                opened.availability = Some(availability);
                true
            }
            _ => false,
        }
    }

    /// Returns the URL the backend keys ratings on.
    pub fn rating_target(&self, target: &ResourceRef, rating: u8) -> Result<String, PlayerError> {
        if !(1..=5).contains(&rating) {
            return Err(PlayerError::InvalidRating(rating));
        }
        let location = gating::locate(&self.roadmap, target)?;
        let resource = gating::resource_at(&self.roadmap, location);
        if resource.status != ResourceStatus::Completed {
            return Err(PlayerError::NotRateable);
        }
        Ok(resource.url.clone())
    }
}

fn server_time(roadmap: &Roadmap) -> HashMap<ResourceRef, u64> {
    roadmap
        .modules
        .iter()
        .flat_map(|m| {
            m.resources
                .iter()
                .map(move |r| (ResourceRef::new(&m.id, &r.id), r.time_spent_seconds))
        })
        .collect()
}
