use crate::database::models::SubscriptionRecord;
use anyhow::Result;
use rusqlite::{params, Connection};

pub(super) struct SqliteSubscriptionRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::SubscriptionRepository for SqliteSubscriptionRepository<'conn> {
    /// Repeated subscription is a no-op that keeps the original timestamp.
    fn upsert(&self, subscriber_id: &str, target_id: &str, created_at: i64) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT OR IGNORE INTO subscriptions (subscriber_id, target_id, created_at)
            VALUES (?1, ?2, ?3)
            "#,
            params![subscriber_id, target_id, created_at],
        )?;
        Ok(())
    }

    fn delete(&self, subscriber_id: &str, target_id: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM subscriptions WHERE subscriber_id = ?1 AND target_id = ?2",
            params![subscriber_id, target_id],
        )?;
        Ok(())
    }

    fn list_for(&self, subscriber_id: &str) -> Result<Vec<SubscriptionRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT subscriber_id, target_id, created_at
            FROM subscriptions
            WHERE subscriber_id = ?1
            ORDER BY created_at ASC, target_id ASC
            "#,
        )?;
        let rows = stmt.query_map(params![subscriber_id], |row| {
            Ok(SubscriptionRecord {
                subscriber_id: row.get(0)?,
                target_id: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?;
        let mut subscriptions = Vec::new();
        for row in rows {
            subscriptions.push(row?);
        }
        Ok(subscriptions)
    }

    fn count_outgoing(&self, user_id: &str) -> Result<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM subscriptions WHERE subscriber_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?)
    }

    fn count_incoming(&self, user_id: &str) -> Result<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM subscriptions WHERE target_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?)
    }
}
