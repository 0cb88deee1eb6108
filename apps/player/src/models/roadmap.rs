use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle of a single learning resource as stored by the backend.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Skipped,
}

impl ResourceStatus {
    /// Completed and skipped resources both unlock their successor.
    pub fn is_resolved(self) -> bool {
        matches!(self, ResourceStatus::Completed | ResourceStatus::Skipped)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub estimated_hours: f64,
    #[serde(default)]
    pub resource_type: String,
    #[serde(default)]
    pub status: ResourceStatus,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub time_spent_seconds: u64,
    #[serde(default)]
    pub opened_at: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub rating_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Module {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub skills_covered: Vec<String>,
    #[serde(default)]
    pub week_number: Option<u32>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub estimated_total_hours: f64,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub is_completed: bool,
}

impl Module {
    pub fn resolved_count(&self) -> usize {
        self.resources
            .iter()
            .filter(|r| r.status.is_resolved())
            .count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Roadmap {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub target_role: String,
    #[serde(default)]
    pub skill_gaps: Vec<String>,
    #[serde(default)]
    pub modules: Vec<Module>,
    #[serde(default)]
    pub total_estimated_hours: f64,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub progress_percentage: f64,
    #[serde(default)]
    pub current_module_index: usize,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Addresses one resource inside a roadmap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    pub module_id: String,
    pub resource_id: String,
}

impl ResourceRef {
    pub fn new(module_id: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            module_id: module_id.into(),
            resource_id: resource_id.into(),
        }
    }
}

/// Module completion summary generated server-side. The shape is owned by the
/// backend, so it is carried through untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ModuleSummary(pub Value);

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeSpentResponse {
    #[serde(default)]
    pub auto_completed: bool,
}

/// Response to complete-resource and skip-resource.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolutionResponse {
    #[serde(default)]
    pub module_summaries: Option<Vec<ModuleSummary>>,
}

impl ResolutionResponse {
    pub fn into_summaries(self) -> Vec<ModuleSummary> {
        self.module_summaries.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatingRequest {
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_roadmap_deserializes_backend_shape() {
        let raw = json!({
            "_id": "rm1",
            "user_id": "u1",
            "target_role": "Backend Engineer",
            "modules": [{
                "id": "m1",
                "title": "Basics",
                "resources": [{
                    "id": "r1",
                    "title": "Intro",
                    "url": "https://example.com",
                    "estimated_hours": 1.5,
                    "resource_type": "article",
                    "status": "in_progress",
                    "time_spent_seconds": 120
                }],
                "is_completed": false
            }],
            "progress_percentage": 12.5,
            "current_module_index": 0
        });

        let roadmap: Roadmap = serde_json::from_value(raw).unwrap();
        assert_eq!(roadmap.id, "rm1");
        let resource = &roadmap.modules[0].resources[0];
        assert_eq!(resource.status, ResourceStatus::InProgress);
        assert_eq!(resource.time_spent_seconds, 120);
        assert_eq!(resource.estimated_hours, 1.5);
    }

    #[test]
    fn test_missing_status_defaults_to_not_started() {
        let resource: Resource =
            serde_json::from_value(json!({"id": "r", "url": "https://x.dev"})).unwrap();
        assert_eq!(resource.status, ResourceStatus::NotStarted);
        assert_eq!(resource.time_spent_seconds, 0);
    }

    #[test]
    fn test_resolved_statuses() {
        assert!(ResourceStatus::Completed.is_resolved());
        assert!(ResourceStatus::Skipped.is_resolved());
        assert!(!ResourceStatus::InProgress.is_resolved());
        assert!(!ResourceStatus::NotStarted.is_resolved());
    }

    #[test]
    fn test_null_module_summaries_become_empty() {
        let response: ResolutionResponse =
            serde_json::from_value(json!({"module_summaries": null})).unwrap();
        assert!(response.into_summaries().is_empty());
    }

    #[test]
    fn test_resolution_response_ignores_message() {
        let response: ResolutionResponse = serde_json::from_value(json!({
            "message": "Resource completed",
            "module_summaries": [{"module_id": "m0", "summary": "Done"}]
        }))
        .unwrap();
        assert_eq!(response.into_summaries().len(), 1);
    }

    #[test]
    fn test_rating_request_omits_missing_comment() {
        let body = serde_json::to_value(RatingRequest {
            rating: 4,
            comment: None,
        })
        .unwrap();
        assert_eq!(body, json!({"rating": 4}));
    }
}
