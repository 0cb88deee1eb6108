//! Backend client: the single point of entry for all PathForge REST calls.
//!
//! Every other module talks to the backend through the `RoadmapBackend` trait;
//! `HttpBackend` is the production implementation.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::roadmap::{
    RatingRequest, ResolutionResponse, ResourceRef, Roadmap, TimeSpentResponse,
};
use crate::models::user::UserProfile;

#[cfg(test)]
pub mod fake;

const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Backend unavailable after {retries} retries")]
    Exhausted { retries: u32 },
}

impl BackendError {
    /// HTTP status reported by the backend, if it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// The REST surface the resource player depends on.
#[async_trait]
pub trait RoadmapBackend: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<UserProfile, BackendError>;

    async fn user_roadmaps(&self, user_id: &str) -> Result<Vec<Roadmap>, BackendError>;

    async fn open_resource(&self, roadmap_id: &str, target: &ResourceRef)
        -> Result<(), BackendError>;

    async fn update_time_spent(
        &self,
        roadmap_id: &str,
        target: &ResourceRef,
        seconds: u64,
    ) -> Result<TimeSpentResponse, BackendError>;

    async fn complete_resource(
        &self,
        roadmap_id: &str,
        target: &ResourceRef,
    ) -> Result<ResolutionResponse, BackendError>;

    async fn skip_resource(
        &self,
        roadmap_id: &str,
        target: &ResourceRef,
    ) -> Result<ResolutionResponse, BackendError>;

    async fn rate_resource(
        &self,
        roadmap_id: &str,
        user_id: &str,
        resource_url: &str,
        rating: &RatingRequest,
    ) -> Result<(), BackendError>;
}

#[derive(Debug, Serialize)]
struct ResourceBody<'a> {
    #[serde(rename = "moduleId")]
    module_id: &'a str,
    #[serde(rename = "resourceId")]
    resource_id: &'a str,
}

#[derive(Debug, Serialize)]
struct TimeSpentBody<'a> {
    #[serde(rename = "moduleId")]
    module_id: &'a str,
    #[serde(rename = "resourceId")]
    resource_id: &'a str,
    seconds: u64,
}

#[derive(Debug, Serialize)]
struct VerifyTokenBody<'a> {
    token: &'a str,
}

#[derive(Debug, Deserialize)]
struct VerifyTokenResponse {
    user: UserProfile,
}

/// Error envelope used by the backend (`{"detail": ...}`).
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    detail: Value,
}

impl<'a> From<&'a ResourceRef> for ResourceBody<'a> {
    fn from(target: &'a ResourceRef) -> Self {
        Self {
            module_id: &target.module_id,
            resource_id: &target.resource_id,
        }
    }
}

/// reqwest-backed implementation of `RoadmapBackend`.
/// Reads are retried with exponential backoff; mutations are sent once.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, token: String, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET with retries on 429, 5xx and transport errors (1s, 2s backoff).
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let url = self.url(path);
        let mut last_error: Option<BackendError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "GET {} attempt {} failed, retrying after {}ms...",
                    path,
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self.client.get(&url).bearer_auth(&self.token).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(BackendError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if should_retry(status.as_u16()) {
                warn!("Backend returned {} for GET {}", status, path);
                last_error = Some(BackendError::Api {
                    status: status.as_u16(),
                    message: error_message(&body),
                });
                continue;
            }

            if !status.is_success() {
                return Err(BackendError::Api {
                    status: status.as_u16(),
                    message: error_message(&body),
                });
            }

            debug!("GET {} succeeded", path);
            return decode_body(&body);
        }

        Err(last_error.unwrap_or(BackendError::Exhausted {
            retries: MAX_RETRIES,
        }))
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<T, BackendError> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.token)
            .query(query)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(BackendError::Api {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        debug!("POST {} succeeded", path);
        decode_body(&text)
    }
}

#[async_trait]
impl RoadmapBackend for HttpBackend {
    async fn verify_token(&self, token: &str) -> Result<UserProfile, BackendError> {
        let response: VerifyTokenResponse = self
            .post_json("/auth/verify-token", &[], &VerifyTokenBody { token })
            .await?;
        Ok(response.user)
    }

    async fn user_roadmaps(&self, user_id: &str) -> Result<Vec<Roadmap>, BackendError> {
        self.get_json(&format!("/roadmaps/user/{user_id}")).await
    }

    async fn open_resource(
        &self,
        roadmap_id: &str,
        target: &ResourceRef,
    ) -> Result<(), BackendError> {
        let _: Value = self
            .post_json(
                &format!("/roadmaps/{roadmap_id}/open-resource"),
                &[],
                &ResourceBody::from(target),
            )
            .await?;
        Ok(())
    }

    async fn update_time_spent(
        &self,
        roadmap_id: &str,
        target: &ResourceRef,
        seconds: u64,
    ) -> Result<TimeSpentResponse, BackendError> {
        let body = TimeSpentBody {
            module_id: &target.module_id,
            resource_id: &target.resource_id,
            seconds,
        };
        self.post_json(&format!("/roadmaps/{roadmap_id}/time-spent"), &[], &body)
            .await
    }

    async fn complete_resource(
        &self,
        roadmap_id: &str,
        target: &ResourceRef,
    ) -> Result<ResolutionResponse, BackendError> {
        self.post_json(
            &format!("/roadmaps/{roadmap_id}/complete-resource"),
            &[],
            &ResourceBody::from(target),
        )
        .await
    }

    async fn skip_resource(
        &self,
        roadmap_id: &str,
        target: &ResourceRef,
    ) -> Result<ResolutionResponse, BackendError> {
        self.post_json(
            &format!("/roadmaps/{roadmap_id}/skip-resource"),
            &[],
            &ResourceBody::from(target),
        )
        .await
    }

    async fn rate_resource(
        &self,
        roadmap_id: &str,
        user_id: &str,
        resource_url: &str,
        rating: &RatingRequest,
    ) -> Result<(), BackendError> {
        let _: Value = self
            .post_json(
                &format!("/roadmaps/{roadmap_id}/rate-resource"),
                &[("user_id", user_id), ("resource_url", resource_url)],
                rating,
            )
            .await?;
        Ok(())
    }
}

fn should_retry(status: u16) -> bool {
    status == 429 || (500..=599).contains(&status)
}

/// Empty bodies decode as JSON `null` so acknowledgement endpoints may reply with nothing.
fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T, BackendError> {
    let body = body.trim();
    let body = if body.is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(BackendError::Parse)
}

/// Pulls the human-readable message out of an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            detail: Value::String(message),
        }) => message,
        Ok(ErrorEnvelope { detail }) => detail.to_string(),
        Err(_) => body.trim().chars().take(240).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_statuses() {
        assert!(should_retry(429));
        assert!(should_retry(503));
        assert!(!should_retry(404));
        assert!(!should_retry(400));
    }

    #[test]
    fn test_error_message_from_detail_string() {
        assert_eq!(
            error_message(r#"{"detail": "Roadmap not found"}"#),
            "Roadmap not found"
        );
    }

    #[test]
    fn test_error_message_from_structured_detail() {
        let message = error_message(r#"{"detail": [{"loc": ["body"], "msg": "bad"}]}"#);
        assert!(message.contains("bad"));
    }

    #[test]
    fn test_error_message_falls_back_to_raw_body() {
        assert_eq!(error_message("  Bad Gateway \n"), "Bad Gateway");
    }

    #[test]
    fn test_empty_body_decodes_as_null() {
        let value: Value = decode_body("").unwrap();
        assert!(value.is_null());
    }

    #[test]
    fn test_url_join_trims_slashes() {
        let backend = HttpBackend::new(
            "http://localhost:8000/api/",
            "token".to_string(),
            Duration::from_secs(5),
        );
        assert_eq!(
            backend.url("/roadmaps/user/u1"),
            "http://localhost:8000/api/roadmaps/user/u1"
        );
    }

    #[test]
    fn test_resource_body_uses_camel_case_keys() {
        let target = ResourceRef::new("m1", "r1");
        let body = serde_json::to_value(ResourceBody::from(&target)).unwrap();
        assert_eq!(body, serde_json::json!({"moduleId": "m1", "resourceId": "r1"}));
    }

    #[test]
    fn test_not_found_detection() {
        let err = BackendError::Api {
            status: 404,
            message: "missing".to_string(),
        };
        assert!(err.is_not_found());
    }
}
