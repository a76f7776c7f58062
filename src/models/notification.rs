// src/models/notification.rs

use serde::Serialize;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NotificationRow {
    pub id: i64,
    pub user_role: String,
    pub staff_id: i64,
    pub payload: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: i64,
    pub user_role: String,
    pub staff_id: i64,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        // Rows written by older producers may hold plain text instead of JSON
        let payload = serde_json::from_str(&row.payload)
            .unwrap_or(serde_json::Value::String(row.payload));

        Self {
            id: row.id,
            user_role: row.user_role,
            staff_id: row.staff_id,
            payload,
            created_at: row.created_at,
            is_read: row.is_read,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(payload: &str) -> NotificationRow {
        NotificationRow {
            id: 1,
            user_role: "lab_assistant".into(),
            staff_id: 3,
            payload: payload.into(),
            created_at: Utc::now(),
            is_read: false,
        }
    }

    #[test]
    fn test_json_payload_is_parsed() {
        let n = Notification::from(row(r#"{"request_id": 4, "status": "approved"}"#));
        assert_eq!(n.payload["request_id"], 4);
    }

    #[test]
    fn test_plain_payload_is_kept_as_text() {
        let n = Notification::from(row("Lab L1 is under maintenance"));
        assert_eq!(n.payload, serde_json::Value::String("Lab L1 is under maintenance".into()));
    }
}
