use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account. The password hash lives only in the store row and
/// never reaches this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub name: Option<String>,
    /// Owned blogs, in creation order.
    pub blogs: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blog {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub url: String,
    pub likes: u64,
    /// Owning user, fixed at creation.
    pub user: Uuid,
}
