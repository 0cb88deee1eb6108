//! Sequential unlocking rules.
//!
//! Modules unlock through the roadmap's `current_module_index`; inside a module
//! a resource unlocks once its predecessor is completed or skipped.

use crate::models::roadmap::{Module, Resource, ResourceRef, Roadmap};
use crate::player::PlayerError;

/// Absorbs float noise from `estimated_hours * 3600` so exactly-at-threshold passes.
const THRESHOLD_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub module_index: usize,
    pub resource_index: usize,
}

pub fn module_locked(roadmap: &Roadmap, module_index: usize) -> bool {
    module_index > roadmap.current_module_index
}

pub fn resource_locked(module: &Module, resource_index: usize) -> bool {
    resource_index > 0
        && module
            .resources
            .get(resource_index - 1)
            .is_some_and(|prev| !prev.status.is_resolved())
}

/// Module gate and intra-module gate combined.
pub fn is_locked(roadmap: &Roadmap, location: Location) -> bool {
    module_locked(roadmap, location.module_index)
        || roadmap
            .modules
            .get(location.module_index)
            .is_some_and(|m| resource_locked(m, location.resource_index))
}

pub fn locate(roadmap: &Roadmap, target: &ResourceRef) -> Result<Location, PlayerError> {
    let module_index = roadmap
        .modules
        .iter()
        .position(|m| m.id == target.module_id)
        .ok_or_else(|| PlayerError::UnknownModule(target.module_id.clone()))?;

    let resource_index = roadmap.modules[module_index]
        .resources
        .iter()
        .position(|r| r.id == target.resource_id)
        .ok_or_else(|| PlayerError::UnknownResource {
            module_id: target.module_id.clone(),
            resource_id: target.resource_id.clone(),
        })?;

    Ok(Location {
        module_index,
        resource_index,
    })
}

pub fn resource_at(roadmap: &Roadmap, location: Location) -> &Resource {
    &roadmap.modules[location.module_index].resources[location.resource_index]
}

/// Locates `target` and rejects it if either gate is closed.
pub fn check_open(roadmap: &Roadmap, target: &ResourceRef) -> Result<Location, PlayerError> {
    let location = locate(roadmap, target)?;

    if module_locked(roadmap, location.module_index) {
        return Err(PlayerError::ModuleLocked {
            module_index: location.module_index,
        });
    }
    if resource_locked(&roadmap.modules[location.module_index], location.resource_index) {
        return Err(PlayerError::ResourceLocked {
            resource_id: target.resource_id.clone(),
        });
    }
    Ok(location)
}

/// Fraction of the estimate spent so far. Resources without an estimate report 0.
pub fn time_progress(time_spent_seconds: u64, estimated_hours: f64) -> f64 {
    let estimated_seconds = estimated_hours * 3600.0;
    if estimated_seconds <= 0.0 {
        return 0.0;
    }
    time_spent_seconds as f64 / estimated_seconds
}

pub fn progress_percent(time_spent_seconds: u64, estimated_hours: f64) -> u32 {
    (time_progress(time_spent_seconds, estimated_hours) * 100.0).round() as u32
}

pub fn meets_threshold(time_spent_seconds: u64, estimated_hours: f64, threshold: f64) -> bool {
    time_progress(time_spent_seconds, estimated_hours) + THRESHOLD_TOLERANCE >= threshold
}
