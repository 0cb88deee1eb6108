// Resource player: sequential gating, successor prediction, time tracking and
// the per-roadmap view state machine that ties them together.
// All backend I/O goes through backend::RoadmapBackend.

pub mod gating;
pub mod handlers;
pub mod machine;
pub mod runtime;
pub mod successor;
pub mod timer;
pub mod view;

use std::time::Duration;

use thiserror::Error;

use crate::backend::BackendError;

pub use runtime::RoadmapPlayer;
pub use view::PlayerView;

/// Tunable policy constants for a player view.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerPolicy {
    /// Fraction of estimated time that must be spent before Complete is allowed.
    pub completion_threshold: f64,
    pub probe_timeout: Duration,
    /// Accumulated seconds between time-spent persistence calls.
    pub persist_every_secs: u64,
    pub tick_period: Duration,
}

impl Default for PlayerPolicy {
    fn default() -> Self {
        Self {
            completion_threshold: 0.90,
            probe_timeout: Duration::from_secs(3),
            persist_every_secs: 30,
            tick_period: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Roadmap {0} not found")]
    RoadmapNotFound(String),

    #[error("Module {0} not found")]
    UnknownModule(String),

    #[error("Resource {resource_id} not found in module {module_id}")]
    UnknownResource {
        module_id: String,
        resource_id: String,
    },

    #[error("Module {module_index} is locked")]
    ModuleLocked { module_index: usize },

    #[error("Resource {resource_id} is locked until the previous resource is completed or skipped")]
    ResourceLocked { resource_id: String },

    #[error("Resource {resource_id} is at {progress_percent}% of its estimated time; {required_percent}% is required to complete it")]
    BelowThreshold {
        resource_id: String,
        progress_percent: u32,
        required_percent: u32,
    },

    #[error("Only completed resources can be rated")]
    NotRateable,

    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("No roadmap view is loaded for {0}")]
    NoView(String),

    #[error("Not signed in")]
    NotSignedIn,

    #[error(transparent)]
    Backend(#[from] BackendError),
}
