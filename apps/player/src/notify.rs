//! Transient, dismissable user notifications.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Success,
    Error,
    Warning,
    Info,
}

impl Level {
    fn title(self) -> &'static str {
        match self {
            Level::Success => "Success",
            Level::Error => "Error",
            Level::Warning => "Warning",
            Level::Info => "Info",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub level: Level,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct Notifier {
    entries: Arc<Mutex<Vec<Notification>>>,
    ttl: Duration,
}

impl Notifier {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            ttl,
        }
    }

    pub async fn push(&self, level: Level, message: impl Into<String>) -> Uuid {
        let notification = Notification {
            id: Uuid::new_v4(),
            title: level.title().to_string(),
            message: message.into(),
            level,
            created_at: Utc::now(),
        };
        debug!("Notify [{:?}] {}", level, notification.message);
        let id = notification.id;
        let mut entries = self.entries.lock().await;
        entries.retain(|n| notification.created_at - n.created_at < self.ttl);
        entries.push(notification);
        id
    }

    pub async fn success(&self, message: impl Into<String>) -> Uuid {
        self.push(Level::Success, message).await
    }

    pub async fn error(&self, message: impl Into<String>) -> Uuid {
        self.push(Level::Error, message).await
    }

    pub async fn warning(&self, message: impl Into<String>) -> Uuid {
        self.push(Level::Warning, message).await
    }

    pub async fn info(&self, message: impl Into<String>) -> Uuid {
        self.push(Level::Info, message).await
    }

    /// Drops expired entries and returns the rest, oldest first.
    pub async fn active(&self, now: DateTime<Utc>) -> Vec<Notification> {
        let mut entries = self.entries.lock().await;
        entries.retain(|n| now - n.created_at < self.ttl);
        entries.clone()
    }

    pub async fn dismiss(&self, id: Uuid) -> bool {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|n| n.id != id);
        entries.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_helpers_set_title_and_level() {
        let notifier = Notifier::new(Duration::seconds(5));
        notifier.success("Resource completed successfully!").await;
        notifier.error("Failed to submit rating").await;

        let active = notifier.active(Utc::now()).await;
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].title, "Success");
        assert_eq!(active[1].level, Level::Error);
    }

    #[tokio::test]
    async fn test_entries_expire_after_ttl() {
        let notifier = Notifier::new(Duration::seconds(5));
        notifier.info("hello").await;

        assert_eq!(notifier.active(Utc::now()).await.len(), 1);
        let later = Utc::now() + Duration::seconds(6);
        assert!(notifier.active(later).await.is_empty());
        // Pruned, not just filtered.
        assert!(notifier.active(Utc::now()).await.is_empty());
    }

    #[tokio::test]
    async fn test_push_prunes_expired_entries() {
        let notifier = Notifier::new(Duration::seconds(5));
        notifier.success("Resource skipped successfully!").await;
        notifier.entries.lock().await[0].created_at -= Duration::seconds(10);

        notifier.success("Resource completed successfully!").await;

        let entries = notifier.entries.lock().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "Resource completed successfully!");
    }

    #[tokio::test]
    async fn test_dismiss() {
        let notifier = Notifier::new(Duration::seconds(5));
        let id = notifier.warning("video unavailable").await;
        assert!(notifier.dismiss(id).await);
        assert!(!notifier.dismiss(id).await);
        assert!(notifier.active(Utc::now()).await.is_empty());
    }
}
