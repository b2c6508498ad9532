use crate::Database;
use crate::models::{CategoryRow, CommentRow, NewPost, PostFilter, PostRow, UserRow};
use anyhow::Result;
use atelier_types::models::Role;
use rusqlite::types::Value;
use rusqlite::{Connection, Row};

const POST_COLUMNS: &str = "p.id, p.title, p.content, p.category_id, p.author_id, p.image_url,
     p.image_public_id, p.post_type, p.view_count, p.created_at, u.username, c.name";

const POST_JOINS: &str = "FROM posts p
     LEFT JOIN users u ON p.author_id = u.id
     LEFT JOIN categories c ON p.category_id = c.id";

impl Database {
    // -- Users --

    /// Inserts a user. Returns `false` when the username or email is already
    /// taken, including when a concurrent registration won the race.
    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, username, email, password, role) VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, username, email, password_hash, role.as_str()),
            );
            match inserted {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
                {
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    /// True when either the username or the email is already registered.
    pub fn user_exists(&self, username: &str, email: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM users WHERE username = ?1 OR email = ?2",
                (username, email),
                |row| row.get(0),
            )?;
            Ok(n > 0)
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    // -- Categories --

    pub fn list_categories(&self) -> Result<Vec<CategoryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY name")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(CategoryRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn category_exists(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row("SELECT 1 FROM categories WHERE id = ?1", [id], |_| Ok(()))
                .optional()?;
            Ok(found.is_some())
        })
    }

    // -- Posts --

    pub fn insert_post(&self, post: &NewPost) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO posts (id, title, content, category_id, author_id, image_url, image_public_id, post_type)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    post.id,
                    post.title,
                    post.content,
                    post.category_id,
                    post.author_id,
                    post.image_url,
                    post.image_public_id,
                    post.post_type.as_str(),
                ],
            )?;
            Ok(())
        })
    }

    /// Reads a post through the writer so a just-inserted row is visible.
    pub fn get_post(&self, id: &str) -> Result<Option<PostRow>> {
        self.with_conn_mut(|conn| {
            let sql = format!("SELECT {POST_COLUMNS} {POST_JOINS} WHERE p.id = ?1");
            conn.query_row(&sql, [id], post_from_row).optional()
        })
    }

    /// Newest first. Filters combine with AND.
    pub fn list_posts(&self, filter: &PostFilter) -> Result<Vec<PostRow>> {
        let mut sql = format!("SELECT {POST_COLUMNS} {POST_JOINS} WHERE 1=1");
        let mut params: Vec<Value> = Vec::new();

        if let Some(post_type) = filter.post_type {
            params.push(Value::Text(post_type.as_str().to_string()));
            sql.push_str(&format!(" AND p.post_type = ?{}", params.len()));
        }
        if let Some(category_id) = filter.category_id {
            params.push(Value::Integer(category_id));
            sql.push_str(&format!(" AND p.category_id = ?{}", params.len()));
        }
        if let Some(author) = &filter.author_username {
            params.push(Value::Text(author.clone()));
            sql.push_str(&format!(" AND u.username = ?{}", params.len()));
        }
        sql.push_str(" ORDER BY p.created_at DESC, p.rowid DESC");

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(params), post_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_posts_by_author(&self, author_id: &str) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {POST_COLUMNS} {POST_JOINS}
                 WHERE p.author_id = ?1
                 ORDER BY p.created_at DESC, p.rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([author_id], post_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Deletes the post if `author_id` owns it and returns the removed row.
    /// Likes, saves and comments go with it via ON DELETE CASCADE.
    pub fn delete_post_owned(&self, id: &str, author_id: &str) -> Result<Option<PostRow>> {
        self.with_conn_mut(|conn| {
            let sql = format!(
                "SELECT {POST_COLUMNS} {POST_JOINS} WHERE p.id = ?1 AND p.author_id = ?2"
            );
            let Some(post) = conn.query_row(&sql, [id, author_id], post_from_row).optional()?
            else {
                return Ok(None);
            };

            conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
            Ok(Some(post))
        })
    }

    /// Returns false when no such post exists.
    pub fn increment_view_count(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let updated = conn.execute(
                "UPDATE posts SET view_count = view_count + 1 WHERE id = ?1",
                [id],
            )?;
            Ok(updated > 0)
        })
    }

    // -- Comments --

    /// Inserts a comment. Returns `None` when the post does not exist.
    pub fn insert_comment(
        &self,
        id: &str,
        post_id: &str,
        user_id: &str,
        content: &str,
    ) -> Result<Option<CommentRow>> {
        self.with_conn_mut(|conn| {
            if !post_exists(conn, post_id)? {
                return Ok(None);
            }

            conn.execute(
                "INSERT INTO comments (id, post_id, user_id, content) VALUES (?1, ?2, ?3, ?4)",
                (id, post_id, user_id, content),
            )?;

            conn.query_row(
                "SELECT cm.id, cm.post_id, cm.user_id, u.username, cm.content, cm.created_at
                 FROM comments cm
                 LEFT JOIN users u ON cm.user_id = u.id
                 WHERE cm.id = ?1",
                [id],
                comment_from_row,
            )
            .optional()
        })
    }

    /// Oldest first. `None` when the post does not exist.
    pub fn list_comments(&self, post_id: &str) -> Result<Option<Vec<CommentRow>>> {
        self.with_conn(|conn| {
            if !post_exists(conn, post_id)? {
                return Ok(None);
            }

            let mut stmt = conn.prepare(
                "SELECT cm.id, cm.post_id, cm.user_id, u.username, cm.content, cm.created_at
                 FROM comments cm
                 LEFT JOIN users u ON cm.user_id = u.id
                 WHERE cm.post_id = ?1
                 ORDER BY cm.created_at ASC, cm.rowid ASC",
            )?;
            let rows = stmt
                .query_map([post_id], comment_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(Some(rows))
        })
    }
}

pub(crate) fn post_exists(conn: &Connection, post_id: &str) -> Result<bool> {
    let found = conn
        .query_row("SELECT 1 FROM posts WHERE id = ?1", [post_id], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, username, email, password, role FROM users WHERE {column} = ?1"
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
                role: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        category_id: row.get(3)?,
        author_id: row.get(4)?,
        image_url: row.get(5)?,
        image_public_id: row.get(6)?,
        post_type: row.get(7)?,
        view_count: row.get(8)?,
        created_at: row.get(9)?,
        author_name: row.get(10)?,
        category_name: row.get(11)?,
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        post_id: row.get(1)?,
        user_id: row.get(2)?,
        username: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use atelier_types::models::{Post, PostType, Role};
    use uuid::Uuid;

    use super::*;
    use crate::testing;

    #[test]
    fn user_lookup_by_email_and_id() {
        let db = testing::open();
        let id = testing::user(&db, "maren", Role::Teacher);

        let row = db.get_user_by_email("maren@example.com").unwrap().unwrap();
        assert_eq!(row.id, id.to_string());
        assert_eq!(row.role(), Role::Teacher);

        assert!(db.get_user_by_id(&id.to_string()).unwrap().is_some());
        assert!(db.get_user_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn user_exists_checks_username_or_email() {
        let db = testing::open();
        testing::user(&db, "maren", Role::Student);

        assert!(db.user_exists("maren", "other@example.com").unwrap());
        assert!(db.user_exists("other", "maren@example.com").unwrap());
        assert!(!db.user_exists("other", "other@example.com").unwrap());
    }

    #[test]
    fn duplicate_user_is_reported_not_raised() {
        let db = testing::open();
        testing::user(&db, "maren", Role::Student);

        let id = Uuid::new_v4().to_string();
        let same_name = db
            .create_user(&id, "maren", "fresh@example.com", "hash", Role::Student)
            .unwrap();
        assert!(!same_name);

        let same_email = db
            .create_user(&id, "fresh", "maren@example.com", "hash", Role::Teacher)
            .unwrap();
        assert!(!same_email);

        assert!(
            db.create_user(&id, "fresh", "fresh@example.com", "hash", Role::Teacher)
                .unwrap()
        );
    }

    #[test]
    fn categories_are_sorted_by_name() {
        let db = testing::open();
        let names: Vec<String> = db
            .list_categories()
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names.len(), 6);
        assert_eq!(names.first().map(String::as_str), Some("Accessories"));
        assert_eq!(names.last().map(String::as_str), Some("Vintage"));

        assert!(db.category_exists(6).unwrap());
        assert!(!db.category_exists(7).unwrap());
    }

    #[test]
    fn get_post_joins_author_and_category() {
        let db = testing::open();
        let author = testing::user(&db, "maren", Role::Teacher);
        let post_id = testing::post(&db, author, PostType::Social);

        let post: Post = db.get_post(&post_id.to_string()).unwrap().unwrap().into();
        assert_eq!(post.id, post_id);
        assert_eq!(post.author_name.as_deref(), Some("maren"));
        assert_eq!(post.category_name.as_deref(), Some("Streetwear"));
        assert_eq!(post.post_type, PostType::Social);
        assert_eq!(post.view_count, 0);
    }

    #[test]
    fn list_posts_applies_filters_newest_first() {
        let db = testing::open();
        let maren = testing::user(&db, "maren", Role::Teacher);
        let ilse = testing::user(&db, "ilse", Role::Student);
        let first = testing::post(&db, maren, PostType::Blog);
        let second = testing::post(&db, maren, PostType::Social);
        let third = testing::post(&db, ilse, PostType::Blog);

        let all = db.list_posts(&PostFilter::default()).unwrap();
        let ids: Vec<String> = all.iter().map(|p| p.id.clone()).collect();
        assert_eq!(
            ids,
            [third.to_string(), second.to_string(), first.to_string()]
        );

        let blogs = db
            .list_posts(&PostFilter {
                post_type: Some(PostType::Blog),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(blogs.len(), 2);

        let marens_blogs = db
            .list_posts(&PostFilter {
                post_type: Some(PostType::Blog),
                author_username: Some("maren".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(marens_blogs.len(), 1);
        assert_eq!(marens_blogs[0].id, first.to_string());

        let other_category = db
            .list_posts(&PostFilter {
                category_id: Some(2),
                ..Default::default()
            })
            .unwrap();
        assert!(other_category.is_empty());
    }

    #[test]
    fn delete_requires_ownership_and_cascades() {
        let db = testing::open();
        let author = testing::user(&db, "maren", Role::Teacher);
        let other = testing::user(&db, "ilse", Role::Student);
        let post_id = testing::post(&db, author, PostType::Blog).to_string();

        db.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO likes (user_id, post_id) VALUES (?1, ?2)",
                (other.to_string(), &post_id),
            )?;
            Ok(())
        })
        .unwrap();
        db.insert_comment(&Uuid::new_v4().to_string(), &post_id, &other.to_string(), "nice")
            .unwrap();

        assert!(db.delete_post_owned(&post_id, &other.to_string()).unwrap().is_none());
        assert!(db.delete_post_owned(&post_id, &author.to_string()).unwrap().is_some());
        assert!(db.get_post(&post_id).unwrap().is_none());

        let leftovers: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT (SELECT COUNT(*) FROM likes) + (SELECT COUNT(*) FROM comments)",
                    [],
                    |r| r.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn view_count_increments_existing_posts_only() {
        let db = testing::open();
        let author = testing::user(&db, "maren", Role::Teacher);
        let post_id = testing::post(&db, author, PostType::Blog).to_string();

        assert!(db.increment_view_count(&post_id).unwrap());
        assert!(db.increment_view_count(&post_id).unwrap());
        assert!(!db.increment_view_count(&Uuid::new_v4().to_string()).unwrap());

        let post = db.get_post(&post_id).unwrap().unwrap();
        assert_eq!(post.view_count, 2);
    }

    #[test]
    fn comments_list_oldest_first() {
        let db = testing::open();
        let author = testing::user(&db, "maren", Role::Teacher);
        let reader = testing::user(&db, "ilse", Role::Student);
        let post_id = testing::post(&db, author, PostType::Blog).to_string();

        let first = db
            .insert_comment(&Uuid::new_v4().to_string(), &post_id, &reader.to_string(), "first")
            .unwrap()
            .unwrap();
        assert_eq!(first.username.as_deref(), Some("ilse"));
        db.insert_comment(&Uuid::new_v4().to_string(), &post_id, &reader.to_string(), "second")
            .unwrap();

        let comments = db.list_comments(&post_id).unwrap().unwrap();
        let bodies: Vec<&str> = comments.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(bodies, ["first", "second"]);

        let missing = Uuid::new_v4().to_string();
        assert!(db.list_comments(&missing).unwrap().is_none());
        assert!(
            db.insert_comment(&Uuid::new_v4().to_string(), &missing, &reader.to_string(), "x")
                .unwrap()
                .is_none()
        );
    }
}
