//! Database row types. These map directly to SQLite rows and are kept apart
//! from the bloglist-types records so the DB layer owns its own shapes.

use anyhow::{Context, Result};
use uuid::Uuid;

use bloglist_types::models::{Blog, User};

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub name: Option<String>,
    pub password_hash: String,
}

impl UserRow {
    /// Drops the password hash. `blogs` is the owner's reference list.
    pub fn into_user(self, blogs: Vec<Uuid>) -> Result<User> {
        Ok(User {
            id: parse_id(&self.id)?,
            username: self.username,
            name: self.name,
            blogs,
        })
    }
}

#[derive(Debug, Clone)]
pub struct BlogRow {
    pub id: String,
    pub title: String,
    pub author: String,
    pub url: String,
    pub likes: i64,
    pub user_id: String,
}

impl BlogRow {
    pub fn into_blog(self) -> Result<Blog> {
        Ok(Blog {
            id: parse_id(&self.id)?,
            title: self.title,
            author: self.author,
            url: self.url,
            likes: u64::try_from(self.likes).context("negative likes in store")?,
            user: parse_id(&self.user_id)?,
        })
    }
}

/// Fields of a blog about to be inserted. The store assigns the id.
pub struct NewBlogRow {
    pub title: String,
    pub author: String,
    pub url: String,
    pub likes: i64,
    pub user_id: String,
}

/// A blog joined with the owner's public fields.
pub struct BlogWithOwnerRow {
    pub blog: BlogRow,
    pub owner_username: String,
    pub owner_name: Option<String>,
}

/// A user with the blogs referenced from its ordered `user_blogs` list.
pub struct UserWithBlogsRow {
    pub user: UserRow,
    pub blogs: Vec<BlogRow>,
}

pub struct UserBlogCountRow {
    pub id: String,
    pub username: String,
    pub blog_count: i64,
}

pub fn parse_id(id: &str) -> Result<Uuid> {
    id.parse().with_context(|| format!("corrupt id in store: {}", id))
}
