use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use bloglist_db::models::{BlogRow, NewBlogRow};
use bloglist_types::api::{
    BlogStatsResponse, BlogWithOwner, CreateBlogRequest, OwnerSummary, UpdateLikesRequest,
};
use bloglist_types::models::Blog;

use crate::auth::{AppState, blocking};
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::AuthUser;
use crate::stats;

const BLOG_NOT_FOUND: &str = "Blog not found";

/// GET /api/blogs
pub async fn list_blogs(State(state): State<AppState>) -> Result<Json<Vec<BlogWithOwner>>, ApiError> {
    let rows = blocking(&state, |s| s.db.list_blogs_with_owners()).await?;

    let blogs = rows
        .into_iter()
        .map(|row| -> anyhow::Result<BlogWithOwner> {
            let blog = row.blog.into_blog()?;
            Ok(BlogWithOwner {
                id: blog.id,
                title: blog.title,
                author: blog.author,
                url: blog.url,
                likes: blog.likes,
                user: OwnerSummary {
                    username: row.owner_username,
                    name: row.owner_name,
                },
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(Json(blogs))
}

/// POST /api/blogs — owner is the authenticated caller.
pub async fn create_blog(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<CreateBlogRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new = NewBlogRow {
        title: required("title", req.title)?,
        author: required("author", req.author)?,
        url: required("url", req.url)?,
        likes: match req.likes {
            None | Some(Value::Null) => 0,
            Some(value) => stored_likes(&value)?,
        },
        user_id: user.id.to_string(),
    };

    let blog = blocking(&state, move |s| s.db.insert_blog(&new)?.into_blog()).await?;

    info!("Blog {} created by {}", blog.id, user.username);

    Ok((StatusCode::CREATED, Json(blog)))
}

/// DELETE /api/blogs/{id}
///
/// Any caller may delete any blog; ownership is not checked here.
pub async fn delete_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_path_id(&id)?;

    let removed = blocking(&state, move |s| s.db.delete_blog(&id.to_string())).await?;
    if !removed {
        return Err(ApiError::NotFound(BLOG_NOT_FOUND.to_string()));
    }

    info!("Blog {} deleted", id);
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/blogs/{id}/likes
pub async fn update_likes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateLikesRequest>,
) -> Result<Json<Blog>, ApiError> {
    let id = parse_path_id(&id)?;
    let likes = match req.likes {
        None | Some(Value::Null) => {
            return Err(ApiError::BadRequest("likes is required".to_string()));
        }
        Some(value) => stored_likes(&value)?,
    };

    let row = blocking(&state, move |s| s.db.update_blog_likes(&id.to_string(), likes))
        .await?
        .ok_or_else(|| ApiError::NotFound(BLOG_NOT_FOUND.to_string()))?;

    Ok(Json(row.into_blog()?))
}

/// GET /api/stats
pub async fn blog_stats(State(state): State<AppState>) -> Result<Json<BlogStatsResponse>, ApiError> {
    let blogs = blocking(&state, |s| {
        s.db.list_blogs()?
            .into_iter()
            .map(BlogRow::into_blog)
            .collect::<anyhow::Result<Vec<_>>>()
    })
    .await?;

    Ok(Json(stats::summarize(&blogs)))
}

fn required(field: &str, value: Option<String>) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::BadRequest(format!(
            "Blog validation failed: {} is required",
            field
        ))),
    }
}

/// Accepts JSON integers in `0..=i64::MAX`, the range the likes column
/// holds. Strings, floats and negatives are rejected.
fn stored_likes(value: &Value) -> Result<i64, ApiError> {
    value
        .as_u64()
        .and_then(|n| i64::try_from(n).ok())
        .ok_or_else(|| ApiError::BadRequest("likes must be a non-negative integer".to_string()))
}

fn parse_path_id(id: &str) -> Result<Uuid, ApiError> {
    id.parse().map_err(|_| ApiError::MalformedId)
}
