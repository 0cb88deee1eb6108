use serde::Serialize;

use crate::embed::{self, youtube::Availability, EmbedResolution, FallbackLinks};
use crate::models::roadmap::{ModuleSummary, ResourceRef, ResourceStatus};
use crate::player::gating::{self, Location};
use crate::player::machine::{FrameStatus, PlayerState};

#[derive(Debug, Clone, Serialize)]
pub struct ResourceView {
    pub id: String,
    pub title: String,
    pub url: String,
    pub resource_type: String,
    pub status: ResourceStatus,
    pub estimated_hours: f64,
    pub time_spent_seconds: u64,
    pub progress_percent: u32,
    pub locked: bool,
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleView {
    pub id: String,
    pub title: String,
    pub week_number: u32,
    pub locked: bool,
    pub is_completed: bool,
    pub resolved_resources: usize,
    pub total_resources: usize,
    pub progress_percent: u32,
    pub resources: Vec<ResourceView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpenedView {
    pub module_id: String,
    pub resource_id: String,
    pub title: String,
    pub url: String,
    pub embed: EmbedResolution,
    pub fallbacks: Option<FallbackLinks>,
    pub frame: FrameStatus,
    pub availability: Option<Availability>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimerView {
    pub module_id: String,
    pub resource_id: String,
    pub elapsed_seconds: u64,
    pub elapsed_label: String,
    pub progress_percent: u32,
    pub can_complete: bool,
}

/// Everything the presentation layer needs to draw the roadmap detail page.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub roadmap_id: String,
    pub target_role: String,
    pub progress_percentage: f64,
    pub current_module_index: usize,
    pub focused_module: usize,
    pub completed_modules: usize,
    pub total_modules: usize,
    pub modules: Vec<ModuleView>,
    pub opened: Option<OpenedView>,
    pub timer: Option<TimerView>,
    pub pending_summaries: Vec<ModuleSummary>,
}

impl PlayerView {
    pub fn from_state(state: &PlayerState) -> Self {
        let roadmap = state.roadmap();

        let modules: Vec<ModuleView> = roadmap
            .modules
            .iter()
            .enumerate()
            .map(|(module_index, module)| {
                let resources = module
                    .resources
                    .iter()
                    .enumerate()
                    .map(|(resource_index, r)| {
                        let spent = state.time_spent(&ResourceRef::new(&module.id, &r.id));
                        ResourceView {
                            id: r.id.clone(),
                            title: r.title.clone(),
                            url: r.url.clone(),
                            resource_type: r.resource_type.clone(),
                            status: r.status,
                            estimated_hours: r.estimated_hours,
                            time_spent_seconds: spent,
                            progress_percent: gating::progress_percent(spent, r.estimated_hours),
                            locked: gating::is_locked(
                                roadmap,
                                Location {
                                    module_index,
                                    resource_index,
                                },
                            ),
                            rating: r.rating,
                        }
                    })
                    .collect();

                let resolved = module.resolved_count();
                let total = module.resources.len();
                ModuleView {
                    id: module.id.clone(),
                    title: module.title.clone(),
                    week_number: module
                        .week_number
                        .unwrap_or(module_index as u32 / 2 + 1),
                    locked: gating::module_locked(roadmap, module_index),
                    is_completed: module.is_completed,
                    resolved_resources: resolved,
                    total_resources: total,
                    progress_percent: if total > 0 {
                        (resolved as f64 / total as f64 * 100.0).round() as u32
                    } else {
                        0
                    },
                    resources,
                }
            })
            .collect();

        let opened = state.opened().map(|o| OpenedView {
            module_id: o.target.module_id.clone(),
            resource_id: o.target.resource_id.clone(),
            title: o.title.clone(),
            url: o.url.clone(),
            fallbacks: (!o.embed.can_embed || o.frame == FrameStatus::Failed)
                .then(|| embed::fallbacks(&o.url)),
            embed: o.embed.clone(),
            frame: o.frame,
            availability: o.availability.clone(),
        });

        let timer = state.active_target().and_then(|target| {
            let location = gating::locate(roadmap, target).ok()?;
            let resource = gating::resource_at(roadmap, location);
            let elapsed = state.time_spent(target);
            Some(TimerView {
                module_id: target.module_id.clone(),
                resource_id: target.resource_id.clone(),
                elapsed_seconds: elapsed,
                elapsed_label: format_elapsed(elapsed),
                progress_percent: gating::progress_percent(elapsed, resource.estimated_hours),
                can_complete: gating::meets_threshold(
                    elapsed,
                    resource.estimated_hours,
                    state.policy().completion_threshold,
                ),
            })
        });

        PlayerView {
            roadmap_id: roadmap.id.clone(),
            target_role: roadmap.target_role.clone(),
            progress_percentage: roadmap.progress_percentage,
            current_module_index: roadmap.current_module_index,
            focused_module: state.focused_module(),
            completed_modules: roadmap.modules.iter().filter(|m| m.is_completed).count(),
            total_modules: roadmap.modules.len(),
            modules,
            opened,
            timer,
            pending_summaries: state.pending_summaries().to_vec(),
        }
    }
}

/// "1h 2m 3s", "2m 3s" or "3s".
pub fn format_elapsed(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::machine::tests::{resource, roadmap_with};
    use crate::player::machine::FrameEvent;
    use crate::player::PlayerPolicy;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "0s");
        assert_eq!(format_elapsed(59), "59s");
        assert_eq!(format_elapsed(123), "2m 3s");
        assert_eq!(format_elapsed(3723), "1h 2m 3s");
        assert_eq!(format_elapsed(3600), "1h 0m 0s");
    }

    #[test]
    fn test_view_marks_locks_and_counts() {
        let state = PlayerState::new(
            roadmap_with(vec![
                vec![
                    resource("a", ResourceStatus::Completed, 1.0),
                    resource("b", ResourceStatus::NotStarted, 1.0),
                    resource("c", ResourceStatus::NotStarted, 1.0),
                ],
                vec![resource("d", ResourceStatus::NotStarted, 1.0)],
            ]),
            PlayerPolicy::default(),
        );
        let view = PlayerView::from_state(&state);

        let first = &view.modules[0];
        assert_eq!(first.resolved_resources, 1);
        assert_eq!(first.progress_percent, 33);
        let locks: Vec<bool> = first.resources.iter().map(|r| r.locked).collect();
        assert_eq!(locks, vec![false, false, true]);
        assert!(view.modules[1].locked);
        assert!(view.modules[1].resources[0].locked);
        assert_eq!(view.total_modules, 2);
        assert!(view.opened.is_none());
        assert!(view.timer.is_none());
    }

    #[test]
    fn test_view_of_opened_resource_offers_fallbacks_when_not_embeddable() {
        let mut state = PlayerState::new(
            roadmap_with(vec![vec![resource("a", ResourceStatus::NotStarted, 0.01)]]),
            PlayerPolicy::default(),
        );
        let target = ResourceRef::new("m0", "a");
        state.open(&target).unwrap();
        for _ in 0..33 {
            state.tick(1);
        }

        let view = PlayerView::from_state(&state);
        let opened = view.opened.unwrap();
        assert!(!opened.embed.can_embed);
        assert!(opened.fallbacks.is_some());
        let timer = view.timer.unwrap();
        assert_eq!(timer.elapsed_seconds, 33);
        assert_eq!(timer.elapsed_label, "33s");
        // 33s of a 36s estimate.
        assert!(timer.can_complete);
        assert_eq!(view.modules[0].resources[0].time_spent_seconds, 33);
    }

    #[test]
    fn test_failed_frame_surfaces_fallbacks_for_embeddable_url() {
        let mut video = resource("v", ResourceStatus::NotStarted, 1.0);
        video.url = "https://vimeo.com/76979871".to_string();
        let mut state = PlayerState::new(roadmap_with(vec![vec![video]]), PlayerPolicy::default());
        let target = ResourceRef::new("m0", "v");
        state.open(&target).unwrap();

        assert!(PlayerView::from_state(&state).opened.unwrap().fallbacks.is_none());
        state.report_frame(&target, FrameEvent::Failed);
        let opened = PlayerView::from_state(&state).opened.unwrap();
        assert!(opened.embed.can_embed);
        assert_eq!(opened.frame, FrameStatus::Failed);
        assert!(opened.fallbacks.is_some());
    }
}
