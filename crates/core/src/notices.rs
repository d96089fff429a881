//! Dismissible user-facing notices raised by views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub id: Uuid,
    pub level: NoticeLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Notices in the order they were raised.
#[derive(Debug, Clone, Default)]
pub struct NoticeBoard {
    notices: Vec<Notice>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&mut self, message: impl Into<String>) -> Uuid {
        self.raise(NoticeLevel::Success, message.into())
    }

    pub fn error(&mut self, message: impl Into<String>) -> Uuid {
        self.raise(NoticeLevel::Error, message.into())
    }

    fn raise(&mut self, level: NoticeLevel, message: String) -> Uuid {
        let notice = Notice {
            id: Uuid::new_v4(),
            level,
            message,
            created_at: Utc::now(),
        };
        let id = notice.id;
        self.notices.push(notice);
        id
    }

    /// Removes a notice. Returns false if it was already gone.
    pub fn dismiss(&mut self, id: Uuid) -> bool {
        let before = self.notices.len();
        self.notices.retain(|notice| notice.id != id);
        self.notices.len() != before
    }

    pub fn active(&self) -> &[Notice] {
        &self.notices
    }
}
