use crate::database::models::NotificationRecord;
use anyhow::Result;
use rusqlite::{params, Connection};

pub(super) struct SqliteNotificationRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::NotificationRepository for SqliteNotificationRepository<'conn> {
    fn list_for_user(&self, user_id: &str) -> Result<Vec<NotificationRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, user_id, text, actor_name, actor_avatar, created_at
            FROM notifications
            WHERE user_id = ?1
            ORDER BY created_at DESC
            "#,
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(NotificationRecord {
                id: row.get(0)?,
                user_id: row.get(1)?,
                text: row.get(2)?,
                actor_name: row.get(3)?,
                actor_avatar: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;
        let mut notifications = Vec::new();
        for row in rows {
            notifications.push(row?);
        }
        Ok(notifications)
    }
}
