use crate::database::models::{FeedFilter, ModerationUpdate, PostRecord};
use anyhow::Result;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

pub(super) struct SqlitePostRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

const POST_COLUMNS: &str = "p.id, p.author_id, p.title, p.body, p.source, p.image_name, p.tags, \
     p.moderated, p.comments_disabled, p.publish_after, p.publication_time, p.likes, p.views";

fn map_post_row(row: &Row<'_>) -> rusqlite::Result<PostRecord> {
    Ok(PostRecord {
        id: row.get(0)?,
        author_id: row.get(1)?,
        title: row.get(2)?,
        body: row.get(3)?,
        source: row.get(4)?,
        image_name: row.get(5)?,
        tags: row.get(6)?,
        moderated: row.get(7)?,
        comments_disabled: row.get(8)?,
        publish_after: row.get(9)?,
        publication_time: row.get(10)?,
        likes: row.get(11)?,
        views: row.get(12)?,
    })
}

/// Quotes every whitespace-separated token so user input cannot inject FTS5
/// query syntax. Returns `None` when nothing searchable remains.
fn fts_match_expr(raw: &str, column: Option<&str>) -> Option<String> {
    let tokens: Vec<String> = raw
        .split_whitespace()
        .map(|token| {
            let quoted = format!("\"{}\"", token.replace('"', "\"\""));
            match column {
                Some(col) => format!("{col}:{quoted}"),
                None => quoted,
            }
        })
        .collect();
    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" "))
    }
}

impl<'conn> super::PostRepository for SqlitePostRepository<'conn> {
    fn create(&self, record: &PostRecord, category_ids: &[i64]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            r#"
            INSERT INTO posts (id, author_id, title, body, source, image_name, tags,
                               moderated, comments_disabled, publish_after, publication_time, likes, views)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                record.id,
                record.author_id,
                record.title,
                record.body,
                record.source,
                record.image_name,
                record.tags,
                record.moderated,
                record.comments_disabled,
                record.publish_after,
                record.publication_time,
                record.likes,
                record.views,
            ],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO post_categories (post_id, category_id) VALUES (?1, ?2)",
            )?;
            for category_id in category_ids {
                stmt.execute(params![record.id, category_id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<PostRecord>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.id = ?1"),
                params![id],
                map_post_row,
            )
            .optional()?)
    }

    fn query_feed(&self, filter: &FeedFilter) -> Result<Vec<PostRecord>> {
        let trimmed = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        // A leading '#' restricts the search to tags and keeps chronological
        // order; plain text search orders by relevance only when the filter
        // asks for it.
        let (fts, order_by_rank) = match trimmed {
            Some(s) if s.starts_with('#') => (
                fts_match_expr(s.trim_start_matches('#'), Some("tags")),
                false,
            ),
            Some(s) => {
                let expr = fts_match_expr(s, None);
                let rank = filter.rank_by_relevance && expr.is_some();
                (expr, rank)
            }
            None => (None, false),
        };

        let mut sql = format!("SELECT {POST_COLUMNS} FROM posts p");
        let mut clauses: Vec<&str> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if let Some(expr) = &fts {
            sql.push_str(" JOIN posts_fts ON posts_fts.rowid = p.rowid");
            clauses.push("posts_fts MATCH ?");
            params.push(expr.clone().into());
        }
        clauses.push("p.moderated = ?");
        params.push((filter.moderated as i64).into());
        if let Some(cutoff) = filter.visible_before {
            clauses.push("p.publish_after <= ?");
            params.push(cutoff.into());
        }
        if let Some(category_id) = filter.category_id {
            clauses.push(
                "EXISTS (SELECT 1 FROM post_categories pc \
                 WHERE pc.post_id = p.id AND pc.category_id = ?)",
            );
            params.push(category_id.into());
        }
        if let Some(author_id) = &filter.author_id {
            clauses.push("p.author_id = ?");
            params.push(author_id.clone().into());
        }

        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
        if order_by_rank {
            sql.push_str(" ORDER BY bm25(posts_fts) ASC, p.publication_time DESC");
        } else {
            sql.push_str(" ORDER BY p.publication_time DESC");
        }
        sql.push_str(" LIMIT ? OFFSET ?");
        params.push((filter.limit as i64).into());
        params.push((filter.offset as i64).into());

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params), map_post_row)?;
        let mut posts = Vec::new();
        for row in rows {
            posts.push(row?);
        }
        Ok(posts)
    }

    fn categories_of(&self, post_id: &str) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT category_id
            FROM post_categories
            WHERE post_id = ?1
            ORDER BY category_id ASC
            "#,
        )?;
        let rows = stmt.query_map(params![post_id], |row| row.get::<_, i64>(0))?;
        let mut categories = Vec::new();
        for row in rows {
            categories.push(row?);
        }
        Ok(categories)
    }

    fn apply_moderation(&self, post_id: &str, update: &ModerationUpdate) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            r#"
            UPDATE posts SET
                moderated = ?1,
                publish_after = ?2,
                title = ?3,
                body = ?4,
                source = ?5,
                tags = ?6,
                likes = ?7,
                views = ?8,
                publication_time = ?9,
                image_name = COALESCE(?10, image_name)
            WHERE id = ?11
            "#,
            params![
                update.approved,
                update.publish_after,
                update.title,
                update.body,
                update.source,
                update.tags,
                update.likes,
                update.views,
                update.publication_time,
                update.image_name,
                post_id,
            ],
        )?;
        tx.execute(
            "DELETE FROM post_categories WHERE post_id = ?1",
            params![post_id],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO post_categories (post_id, category_id) VALUES (?1, ?2)",
            )?;
            for category_id in &update.category_ids {
                stmt.execute(params![post_id, category_id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    // The membership mutation and the counter delta commit together, so the
    // likes counter always equals the cardinality of post_likes.
    fn toggle_like(&self, post_id: &str, user_id: &str) -> Result<(bool, i64)> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute(
            "DELETE FROM post_likes WHERE post_id = ?1 AND user_id = ?2",
            params![post_id, user_id],
        )?;
        let (liked, delta) = if removed > 0 {
            (false, -1)
        } else {
            tx.execute(
                "INSERT INTO post_likes (post_id, user_id) VALUES (?1, ?2)",
                params![post_id, user_id],
            )?;
            (true, 1)
        };
        tx.execute(
            "UPDATE posts SET likes = likes + ?1 WHERE id = ?2",
            params![delta, post_id],
        )?;
        let likes = tx.query_row(
            "SELECT likes FROM posts WHERE id = ?1",
            params![post_id],
            |row| row.get(0),
        )?;
        tx.commit()?;
        Ok((liked, likes))
    }

    fn is_liked(&self, post_id: &str, user_id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM post_likes WHERE post_id = ?1 AND user_id = ?2",
            params![post_id, user_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // Authenticated viewers are counted once; anonymous views cannot be
    // deduplicated and always increment.
    fn record_view(&self, post_id: &str, viewer_id: Option<&str>) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;
        let counted = match viewer_id {
            Some(user_id) => {
                tx.execute(
                    "INSERT OR IGNORE INTO post_views (post_id, user_id) VALUES (?1, ?2)",
                    params![post_id, user_id],
                )? > 0
            }
            None => true,
        };
        if counted {
            tx.execute(
                "UPDATE posts SET views = views + 1 WHERE id = ?1",
                params![post_id],
            )?;
        }
        let views = tx.query_row(
            "SELECT views FROM posts WHERE id = ?1",
            params![post_id],
            |row| row.get(0),
        )?;
        tx.commit()?;
        Ok(views)
    }

    fn set_comments_disabled(&self, post_id: &str, disabled: bool) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE posts SET comments_disabled = ?1 WHERE id = ?2",
            params![disabled, post_id],
        )?;
        Ok(changed > 0)
    }

    fn delete(&self, post_id: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM posts WHERE id = ?1", params![post_id])?;
        Ok(changed > 0)
    }
}
