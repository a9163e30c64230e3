use crate::database::models::CommentRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqliteCommentRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

fn map_comment_row(row: &Row<'_>) -> rusqlite::Result<CommentRecord> {
    Ok(CommentRecord {
        id: row.get(0)?,
        post_id: row.get(1)?,
        parent_comment_id: row.get(2)?,
        author_id: row.get(3)?,
        body: row.get(4)?,
        created_at: row.get(5)?,
    })
}

const COMMENT_COLUMNS: &str = "id, post_id, parent_comment_id, author_id, body, created_at";

impl<'conn> super::CommentRepository for SqliteCommentRepository<'conn> {
    fn create(&self, record: &CommentRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO comments (id, post_id, parent_comment_id, author_id, body, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.id,
                record.post_id,
                record.parent_comment_id,
                record.author_id,
                record.body,
                record.created_at,
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<CommentRecord>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?1"),
                params![id],
                map_comment_row,
            )
            .optional()?)
    }

    fn list_top_level(&self, post_id: &str) -> Result<Vec<CommentRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments \
             WHERE post_id = ?1 AND parent_comment_id IS NULL \
             ORDER BY created_at ASC, id ASC"
        ))?;
        let rows = stmt.query_map(params![post_id], map_comment_row)?;
        let mut comments = Vec::new();
        for row in rows {
            comments.push(row?);
        }
        Ok(comments)
    }

    fn list_replies(&self, parent_comment_id: &str) -> Result<Vec<CommentRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments \
             WHERE parent_comment_id = ?1 \
             ORDER BY created_at ASC, id ASC"
        ))?;
        let rows = stmt.query_map(params![parent_comment_id], map_comment_row)?;
        let mut replies = Vec::new();
        for row in rows {
            replies.push(row?);
        }
        Ok(replies)
    }

    /// Counts top-level comments only, which is what the post view displays.
    fn count_for_post(&self, post_id: &str) -> Result<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM comments WHERE post_id = ?1 AND parent_comment_id IS NULL",
            params![post_id],
            |row| row.get(0),
        )?)
    }

    fn toggle_like(&self, comment_id: &str, user_id: &str) -> Result<(bool, i64)> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute(
            "DELETE FROM comment_likes WHERE comment_id = ?1 AND user_id = ?2",
            params![comment_id, user_id],
        )?;
        let liked = if removed > 0 {
            false
        } else {
            tx.execute(
                "INSERT INTO comment_likes (comment_id, user_id) VALUES (?1, ?2)",
                params![comment_id, user_id],
            )?;
            true
        };
        let likes = tx.query_row(
            "SELECT COUNT(*) FROM comment_likes WHERE comment_id = ?1",
            params![comment_id],
            |row| row.get(0),
        )?;
        tx.commit()?;
        Ok((liked, likes))
    }

    fn like_count(&self, comment_id: &str) -> Result<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM comment_likes WHERE comment_id = ?1",
            params![comment_id],
            |row| row.get(0),
        )?)
    }

    fn is_liked(&self, comment_id: &str, user_id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM comment_likes WHERE comment_id = ?1 AND user_id = ?2",
            params![comment_id, user_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
