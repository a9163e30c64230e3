use crate::database::models::ExpertRequestRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

pub(super) struct SqliteExpertRequestRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::ExpertRequestRepository for SqliteExpertRequestRepository<'conn> {
    fn get(&self, user_id: &str) -> Result<Option<ExpertRequestRecord>> {
        Ok(self
            .conn
            .query_row(
                "SELECT user_id, status, tags FROM expert_requests WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(ExpertRequestRecord {
                        user_id: row.get(0)?,
                        status: row.get(1)?,
                        tags: row.get(2)?,
                    })
                },
            )
            .optional()?)
    }

    fn upsert(&self, record: &ExpertRequestRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO expert_requests (user_id, status, tags)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id) DO UPDATE SET
                status = excluded.status,
                tags = excluded.tags
            "#,
            params![record.user_id, record.status, record.tags],
        )?;
        Ok(())
    }
}
