//! Transient user-facing notifications.

use serde::Serialize;
use web_time::{Duration, Instant};

use crate::constants::NOTIFICATION_TIMEOUT_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
    pub created: Instant,
}

/// Serializable form handed to the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationView {
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
}

/// Queue of visible notifications, oldest first.
#[derive(Debug)]
pub struct NotificationCenter {
    items: Vec<Notification>,
    next_id: u64,
    timeout: Duration,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(Duration::from_millis(NOTIFICATION_TIMEOUT_MS))
    }
}

impl NotificationCenter {
    pub fn new(timeout: Duration) -> Self {
        Self {
            items: Vec::new(),
            next_id: 1,
            timeout,
        }
    }

    /// Show a message and return its id.
    pub fn push(&mut self, kind: NotificationKind, message: impl Into<String>, now: Instant) -> u64 {
        let message = message.into();
        match kind {
            NotificationKind::Error => log::error!("{}", message),
            NotificationKind::Warning => log::warn!("{}", message),
            NotificationKind::Success | NotificationKind::Info => log::info!("{}", message),
        }

        let id = self.next_id;
        self.next_id += 1;
        self.items.push(Notification {
            id,
            kind,
            message,
            created: now,
        });
        id
    }

    /// Close a notification. Returns false if it was already gone.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    /// Drop notifications older than the timeout. Returns how many were removed.
    pub fn expire(&mut self, now: Instant) -> usize {
        let timeout = self.timeout;
        let before = self.items.len();
        self.items
            .retain(|n| now.saturating_duration_since(n.created) < timeout);
        before - self.items.len()
    }

    pub fn active(&self) -> &[Notification] {
        &self.items
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.items.last()
    }

    pub fn views(&self) -> Vec<NotificationView> {
        self.items
            .iter()
            .map(|n| NotificationView {
                id: n.id,
                kind: n.kind,
                message: n.message.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_dismiss() {
        let mut center = NotificationCenter::default();
        let now = Instant::now();
        let a = center.push(NotificationKind::Info, "a", now);
        let b = center.push(NotificationKind::Error, "b", now);
        assert_ne!(a, b);
        assert_eq!(center.active().len(), 2);

        assert!(center.dismiss(a));
        assert!(!center.dismiss(a));
        assert_eq!(center.latest().unwrap().message, "b");
    }

    #[test]
    fn test_expire_after_five_seconds() {
        let mut center = NotificationCenter::default();
        let start = Instant::now();
        center.push(NotificationKind::Success, "old", start);
        center.push(
            NotificationKind::Warning,
            "new",
            start + Duration::from_millis(3000),
        );

        assert_eq!(center.expire(start + Duration::from_millis(4999)), 0);
        assert_eq!(center.expire(start + Duration::from_millis(5000)), 1);
        assert_eq!(center.active()[0].message, "new");
        assert_eq!(center.expire(start + Duration::from_millis(8000)), 1);
        assert!(center.active().is_empty());
    }

    #[test]
    fn test_views_serialize_kind_lowercase() {
        let mut center = NotificationCenter::default();
        center.push(NotificationKind::Warning, "ratio", Instant::now());
        let json = serde_json::to_string(&center.views()).unwrap();
        assert!(json.contains("\"kind\":\"warning\""));
    }
}
