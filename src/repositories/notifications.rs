// src/repositories/notifications.rs

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool};
use std::str::FromStr;

use crate::auth::StaffRole;
use crate::error::{ApiError, ApiResult};
use crate::models::{Notification, NotificationRow};

/// Per-(role, staff) inbox
#[derive(Clone)]
pub struct NotificationDispatcher {
    pool: SqlitePool,
}

impl NotificationDispatcher {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_for(&self, role: StaffRole, staff_id: i64) -> ApiResult<Vec<Notification>> {
        let rows: Vec<NotificationRow> = sqlx::query_as(
            r#"SELECT id, user_role, staff_id, payload, created_at, is_read
               FROM notifications
               WHERE user_role = ? AND staff_id = ?
               ORDER BY created_at DESC, id DESC"#,
        )
        .bind(role.as_str())
        .bind(staff_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Notification::from).collect())
    }

    /// Inbox a notification belongs to, if it still exists
    pub async fn owner(&self, id: i64) -> ApiResult<Option<(StaffRole, i64)>> {
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT user_role, staff_id FROM notifications WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            None => Ok(None),
            Some((raw_role, staff_id)) => {
                let role = StaffRole::from_str(&raw_role).map_err(|_| {
                    ApiError::InternalServerError(format!("Notification {} has unknown role '{}'", id, raw_role))
                })?;
                Ok(Some((role, staff_id)))
            }
        }
    }

    /// Marking an unknown or already-read notification is not an error
    pub async fn mark_read(&self, id: i64) -> ApiResult<()> {
        sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            log::debug!("Notification {} was already gone", id);
        }
        Ok(())
    }
}

/// Queues a notification. Takes any executor so workflow events can enqueue
/// inside their own transaction.
pub async fn notify<'e, E>(
    executor: E,
    role: StaffRole,
    staff_id: i64,
    payload: &serde_json::Value,
) -> ApiResult<i64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "INSERT INTO notifications (user_role, staff_id, payload, created_at, is_read) VALUES (?, ?, ?, ?, 0)",
    )
    .bind(role.as_str())
    .bind(staff_id)
    .bind(payload.to_string())
    .bind(Utc::now())
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use serde_json::json;

    #[actix_rt::test]
    async fn test_inbox_is_keyed_by_role_and_staff() {
        let pool = test_pool().await;
        let dispatcher = NotificationDispatcher::new(pool.clone());

        let first = notify(&pool, StaffRole::LabAssistant, 3, &json!({"message": "first"})).await.unwrap();
        let second = notify(&pool, StaffRole::LabAssistant, 3, &json!({"message": "second"})).await.unwrap();
        notify(&pool, StaffRole::LabIncharge, 3, &json!({"message": "other role"})).await.unwrap();
        notify(&pool, StaffRole::LabAssistant, 4, &json!({"message": "other staff"})).await.unwrap();

        let inbox = dispatcher.list_for(StaffRole::LabAssistant, 3).await.unwrap();
        let ids: Vec<i64> = inbox.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![second, first]);
        assert_eq!(inbox[0].payload["message"], "second");
        assert!(!inbox[0].is_read);
    }

    #[actix_rt::test]
    async fn test_mark_read_is_idempotent() {
        let pool = test_pool().await;
        let dispatcher = NotificationDispatcher::new(pool.clone());
        let id = notify(&pool, StaffRole::Hod, 1, &json!({"message": "hello"})).await.unwrap();

        dispatcher.mark_read(id).await.unwrap();
        dispatcher.mark_read(id).await.unwrap();
        dispatcher.mark_read(9999).await.unwrap();

        let inbox = dispatcher.list_for(StaffRole::Hod, 1).await.unwrap();
        assert!(inbox[0].is_read);
    }

    #[actix_rt::test]
    async fn test_owner_lookup() {
        let pool = test_pool().await;
        let dispatcher = NotificationDispatcher::new(pool.clone());
        let id = notify(&pool, StaffRole::LabIncharge, 8, &json!({"message": "hi"})).await.unwrap();

        assert_eq!(dispatcher.owner(id).await.unwrap(), Some((StaffRole::LabIncharge, 8)));
        dispatcher.delete(id).await.unwrap();
        assert_eq!(dispatcher.owner(id).await.unwrap(), None);
    }

    #[actix_rt::test]
    async fn test_delete_is_idempotent() {
        let pool = test_pool().await;
        let dispatcher = NotificationDispatcher::new(pool.clone());
        let id = notify(&pool, StaffRole::Admin, 1, &json!({"message": "bye"})).await.unwrap();

        dispatcher.delete(id).await.unwrap();
        dispatcher.delete(id).await.unwrap();
        assert!(dispatcher.list_for(StaffRole::Admin, 1).await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn test_notify_inside_rolled_back_transaction_leaves_nothing() {
        let pool = test_pool().await;
        let dispatcher = NotificationDispatcher::new(pool.clone());

        {
            let mut tx = pool.begin().await.unwrap();
            notify(&mut *tx, StaffRole::LabAssistant, 2, &json!({"message": "draft"})).await.unwrap();
        }

        assert!(dispatcher.list_for(StaffRole::LabAssistant, 2).await.unwrap().is_empty());
    }
}
