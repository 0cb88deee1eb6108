use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

const NOEMBED_URL: &str = "https://noembed.com/embed";

fn video_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/shorts/)([a-zA-Z0-9_-]{11})")
            .expect("YouTube id pattern is valid")
    })
}

pub fn is_youtube(url: &str) -> bool {
    url.contains("youtube.com") || url.contains("youtu.be")
}

/// Extracts the 11-character video id from watch, short-link and shorts URLs.
pub fn video_id(url: &str) -> Option<&str> {
    video_id_pattern()
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

pub fn canonical_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

pub fn embed_url(video_id: &str) -> String {
    format!("https://www.youtube.com/embed/{video_id}")
}

/// Outcome of a best-effort availability lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum Availability {
    Available,
    Unavailable(String),
    /// Lookup timed out or failed; treated as available.
    Unknown,
}

impl Availability {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Availability::Unavailable(_))
    }
}

#[async_trait]
pub trait AvailabilityProbe: Send + Sync {
    async fn probe(&self, canonical_url: &str) -> Availability;
}

/// Probes video availability through the public noembed lookup.
pub struct NoembedProbe {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl NoembedProbe {
    pub fn new(timeout: Duration) -> Self {
        Self::with_endpoint(NOEMBED_URL, timeout)
    }

    pub fn with_endpoint(endpoint: &str, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
            timeout,
        }
    }

    async fn lookup(&self, canonical_url: &str) -> Result<Availability, reqwest::Error> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("url", canonical_url)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Ok(Availability::Unavailable(format!("HTTP {}", status.as_u16())));
        }

        let body: Value = response.json().await?;
        Ok(classify_lookup(&body))
    }
}

#[async_trait]
impl AvailabilityProbe for NoembedProbe {
    async fn probe(&self, canonical_url: &str) -> Availability {
        match tokio::time::timeout(self.timeout, self.lookup(canonical_url)).await {
            Ok(Ok(availability)) => {
                if availability.is_unavailable() {
                    warn!("YouTube video unavailable: {canonical_url} ({availability:?})");
                }
                availability
            }
            Ok(Err(e)) => {
                debug!("Could not verify video availability (assuming available): {e}");
                Availability::Unknown
            }
            Err(_) => {
                debug!(
                    "Availability probe timed out after {}ms (assuming available)",
                    self.timeout.as_millis()
                );
                Availability::Unknown
            }
        }
    }
}

/// Only an explicit `error` field counts as unavailable.
fn classify_lookup(body: &Value) -> Availability {
    match body.get("error") {
        Some(Value::String(reason)) => Availability::Unavailable(reason.clone()),
        Some(Value::Null) | None => Availability::Available,
        Some(other) => Availability::Unavailable(other.to_string()),
    }
}
