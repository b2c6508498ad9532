use anyhow::Result;
use atelier_engagement::snapshot::AuthoredSummary;
use atelier_engagement::{EngagementError, InteractionKind, InteractionLedger, StatsStore, Toggle};
use uuid::Uuid;

use crate::Database;
use crate::queries::{OptionalExt, post_exists};

impl InteractionLedger for Database {
    /// Removes the fact if present, inserts it otherwise. Runs entirely under
    /// the writer lock; the (user_id, post_id) primary key backs it up.
    fn toggle(
        &self,
        kind: InteractionKind,
        user_id: Uuid,
        post_id: Uuid,
    ) -> Result<Toggle, EngagementError> {
        let table = kind.table();
        let uid = user_id.to_string();
        let pid = post_id.to_string();

        let active = self.with_conn_mut(|conn| {
            if !post_exists(conn, &pid)? {
                return Ok(None);
            }

            let existing = conn
                .query_row(
                    &format!("SELECT 1 FROM {table} WHERE user_id = ?1 AND post_id = ?2"),
                    (&uid, &pid),
                    |_| Ok(()),
                )
                .optional()?;

            if existing.is_some() {
                conn.execute(
                    &format!("DELETE FROM {table} WHERE user_id = ?1 AND post_id = ?2"),
                    (&uid, &pid),
                )?;
                Ok(Some(false))
            } else {
                conn.execute(
                    &format!("INSERT INTO {table} (user_id, post_id) VALUES (?1, ?2)"),
                    (&uid, &pid),
                )?;
                Ok(Some(true))
            }
        })?;

        active
            .map(|active| Toggle { active })
            .ok_or(EngagementError::NotFound("Post"))
    }

    fn is_active(
        &self,
        kind: InteractionKind,
        user_id: Uuid,
        post_id: Uuid,
    ) -> Result<bool, EngagementError> {
        let table = kind.table();
        let found = self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT 1 FROM {table} WHERE user_id = ?1 AND post_id = ?2"),
                (user_id.to_string(), post_id.to_string()),
                |_| Ok(()),
            )
            .optional()
        })?;
        Ok(found.is_some())
    }

    fn count_for_post(
        &self,
        kind: InteractionKind,
        post_id: Uuid,
    ) -> Result<u64, EngagementError> {
        let table = kind.table();
        let n: i64 = self.with_conn(|conn| {
            Ok(conn.query_row(
                &format!("SELECT COUNT(*) FROM {table} WHERE post_id = ?1"),
                [post_id.to_string()],
                |row| row.get(0),
            )?)
        })?;
        Ok(n as u64)
    }
}

impl StatsStore for Database {
    fn count_by_user(&self, kind: InteractionKind, user_id: Uuid) -> Result<u64> {
        let table = kind.table();
        let n: i64 = self.with_conn(|conn| {
            Ok(conn.query_row(
                &format!("SELECT COUNT(*) FROM {table} WHERE user_id = ?1"),
                [user_id.to_string()],
                |row| row.get(0),
            )?)
        })?;
        Ok(n as u64)
    }

    fn count_comments_by_user(&self, user_id: Uuid) -> Result<u64> {
        let n: i64 = self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM comments WHERE user_id = ?1",
                [user_id.to_string()],
                |row| row.get(0),
            )?)
        })?;
        Ok(n as u64)
    }

    /// Single statement, so every total comes from the same read snapshot.
    fn authored_summary(&self, author_id: Uuid) -> Result<AuthoredSummary> {
        self.with_conn(|conn| {
            let row = conn.query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(post_type = 'blog'), 0),
                        COALESCE(SUM(post_type = 'social'), 0),
                        COALESCE(SUM(view_count), 0),
                        (SELECT COUNT(*) FROM likes l
                            JOIN posts lp ON l.post_id = lp.id
                            WHERE lp.author_id = ?1)
                 FROM posts
                 WHERE author_id = ?1",
                [author_id.to_string()],
                |row| {
                    Ok([
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                    ])
                },
            )?;

            let [total_posts, blog_posts, social_posts, total_views, total_likes] =
                row.map(|n| n.max(0) as u64);
            Ok(AuthoredSummary {
                total_posts,
                blog_posts,
                social_posts,
                total_views,
                total_likes,
            })
        })
    }
}
