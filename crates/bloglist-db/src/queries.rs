use std::collections::HashMap;

use crate::Database;
use crate::models::{
    BlogRow, BlogWithOwnerRow, NewBlogRow, UserBlogCountRow, UserRow, UserWithBlogsRow,
};
use anyhow::Result;
use rusqlite::{Connection, Row};
use uuid::Uuid;

/// Raised when an insert collides with a UNIQUE column.
#[derive(Debug, thiserror::Error)]
#[error("unique constraint violated on {column}")]
pub struct UniqueViolation {
    pub column: String,
}

impl Database {
    // -- Users --

    /// Returns the new user's id. Fails with [`UniqueViolation`] if the
    /// username is taken.
    pub fn create_user(
        &self,
        username: &str,
        name: Option<&str>,
        password_hash: &str,
    ) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, name, password_hash) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![&id, username, name, password_hash],
            )
            .map_err(map_unique_violation)?;
            Ok(())
        })?;
        Ok(id)
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// The user's owned blog ids in creation order.
    pub fn get_user_blog_ids(&self, user_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT blog_id FROM user_blogs WHERE user_id = ?1 ORDER BY position",
            )?;
            let ids = stmt
                .query_map([user_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(ids)
        })
    }

    pub fn list_users_with_blogs(&self) -> Result<Vec<UserWithBlogsRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, name, password_hash FROM users ORDER BY rowid",
            )?;
            let mut users = stmt
                .query_map([], user_from_row)?
                .map(|user| user.map(|user| UserWithBlogsRow { user, blogs: vec![] }))
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let index: HashMap<String, usize> = users
                .iter()
                .enumerate()
                .map(|(i, u)| (u.user.id.clone(), i))
                .collect();

            // One pass over the reference list instead of a query per user
            let mut stmt = conn.prepare(
                "SELECT ub.user_id, b.id, b.title, b.author, b.url, b.likes, b.user_id
                 FROM user_blogs ub
                 JOIN blogs b ON b.id = ub.blog_id
                 ORDER BY ub.position",
            )?;
            let entries = stmt
                .query_map([], |row| {
                    let owner: String = row.get(0)?;
                    Ok((owner, blog_from_row_at(row, 1)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            for (owner, blog) in entries {
                if let Some(&i) = index.get(&owner) {
                    users[i].blogs.push(blog);
                }
            }

            Ok(users)
        })
    }

    /// Per-user blog counts computed from the blogs table itself.
    pub fn user_blog_counts(&self) -> Result<Vec<UserBlogCountRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.username, COUNT(b.id)
                 FROM users u
                 LEFT JOIN blogs b ON b.user_id = u.id
                 GROUP BY u.id
                 ORDER BY u.rowid",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(UserBlogCountRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        blog_count: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Blogs --

    pub fn list_blogs(&self) -> Result<Vec<BlogRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, author, url, likes, user_id FROM blogs ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map([], |row| blog_from_row_at(row, 0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_blogs_with_owners(&self) -> Result<Vec<BlogWithOwnerRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT b.id, b.title, b.author, b.url, b.likes, b.user_id, u.username, u.name
                 FROM blogs b
                 JOIN users u ON u.id = b.user_id
                 ORDER BY b.rowid",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(BlogWithOwnerRow {
                        blog: blog_from_row_at(row, 0)?,
                        owner_username: row.get(6)?,
                        owner_name: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_blog(&self, id: &str) -> Result<Option<BlogRow>> {
        self.with_conn(|conn| query_blog(conn, id))
    }

    /// Insert the blog and append it to its owner's blog list in a single
    /// transaction, so the two never disagree.
    pub fn insert_blog(&self, new: &NewBlogRow) -> Result<BlogRow> {
        let blog = BlogRow {
            id: Uuid::new_v4().to_string(),
            title: new.title.clone(),
            author: new.author.clone(),
            url: new.url.clone(),
            likes: new.likes,
            user_id: new.user_id.clone(),
        };
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO blogs (id, title, author, url, likes, user_id) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    &blog.id,
                    &blog.title,
                    &blog.author,
                    &blog.url,
                    blog.likes,
                    &blog.user_id
                ],
            )?;
            tx.execute(
                "INSERT INTO user_blogs (user_id, blog_id) VALUES (?1, ?2)",
                rusqlite::params![&blog.user_id, &blog.id],
            )?;
            tx.commit()?;
            Ok(())
        })?;
        Ok(blog)
    }

    /// Returns false if no blog had that id.
    pub fn delete_blog(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute("DELETE FROM blogs WHERE id = ?1", [id])?;
            Ok(removed > 0)
        })
    }

    /// Returns the updated row, or `None` if no blog had that id.
    pub fn update_blog_likes(&self, id: &str, likes: i64) -> Result<Option<BlogRow>> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE blogs SET likes = ?1 WHERE id = ?2",
                rusqlite::params![likes, id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_blog(conn, id)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, username, name, password_hash FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([value], user_from_row).optional()?;
    Ok(row)
}

fn query_blog(conn: &Connection, id: &str) -> Result<Option<BlogRow>> {
    let mut stmt =
        conn.prepare("SELECT id, title, author, url, likes, user_id FROM blogs WHERE id = ?1")?;
    let row = stmt.query_row([id], |row| blog_from_row_at(row, 0)).optional()?;
    Ok(row)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        name: row.get(2)?,
        password_hash: row.get(3)?,
    })
}

/// Reads the six blog columns starting at `offset`.
fn blog_from_row_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<BlogRow> {
    Ok(BlogRow {
        id: row.get(offset)?,
        title: row.get(offset + 1)?,
        author: row.get(offset + 2)?,
        url: row.get(offset + 3)?,
        likes: row.get(offset + 4)?,
        user_id: row.get(offset + 5)?,
    })
}

fn map_unique_violation(err: rusqlite::Error) -> anyhow::Error {
    match &err {
        rusqlite::Error::SqliteFailure(code, msg)
            if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            // "UNIQUE constraint failed: users.username"
            let column = msg
                .as_deref()
                .and_then(|m| m.rsplit(": ").next())
                .unwrap_or("unknown")
                .to_string();
            UniqueViolation { column }.into()
        }
        _ => err.into(),
    }
}

/// Extension trait for optional query results
trait OptionalExt<T> {
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
