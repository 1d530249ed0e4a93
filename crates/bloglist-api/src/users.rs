use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::info;

use bloglist_db::models::parse_id;
use bloglist_types::api::{
    BlogSummary, RegisterRequest, UserBlogCount, UserListQuery, UserResponse,
};

use crate::auth::{AppState, blocking};
use crate::error::ApiError;
use crate::extract::ApiJson;

const MIN_CREDENTIAL_LEN: usize = 3;

/// POST /api/users
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(username), Some(password)) = (
        req.username.filter(|u| !u.is_empty()),
        req.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::BadRequest(
            "Username and password are required".to_string(),
        ));
    };

    if username.chars().count() < MIN_CREDENTIAL_LEN
        || password.chars().count() < MIN_CREDENTIAL_LEN
    {
        return Err(ApiError::BadRequest(
            "Username and password must be at least 3 characters long".to_string(),
        ));
    }

    // Check if username is taken
    let lookup = username.clone();
    if blocking(&state, move |s| s.db.get_user_by_username(&lookup))
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Username must be unique".to_string()));
    }

    let password_hash = blocking(&state, move |s| s.hasher.hash(&password)).await?;

    let (u, n) = (username.clone(), req.name.clone());
    // A racing registration still lands on the UNIQUE index
    let user_id = blocking(&state, move |s| {
        parse_id(&s.db.create_user(&u, n.as_deref(), &password_hash)?)
    })
    .await?;

    info!("Registered user {}", username);

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id: user_id,
            username,
            name: req.name,
            blogs: vec![],
        }),
    ))
}

/// GET /api/users, or GET /api/users?view=counts for per-user blog counts.
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Response, ApiError> {
    match query.view.as_deref() {
        None => Ok(Json(users_with_blogs(&state).await?).into_response()),
        Some("counts") => Ok(Json(blog_counts(&state).await?).into_response()),
        Some(other) => Err(ApiError::BadRequest(format!("unknown view: {}", other))),
    }
}

async fn users_with_blogs(state: &AppState) -> Result<Vec<UserResponse>, ApiError> {
    let rows = blocking(state, |s| s.db.list_users_with_blogs()).await?;

    let users = rows
        .into_iter()
        .map(|row| -> anyhow::Result<UserResponse> {
            let blogs = row
                .blogs
                .into_iter()
                .map(|b| -> anyhow::Result<BlogSummary> {
                    let blog = b.into_blog()?;
                    Ok(BlogSummary {
                        title: blog.title,
                        author: blog.author,
                        url: blog.url,
                        likes: blog.likes,
                    })
                })
                .collect::<anyhow::Result<Vec<_>>>()?;

            Ok(UserResponse {
                id: parse_id(&row.user.id)?,
                username: row.user.username,
                name: row.user.name,
                blogs,
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(users)
}

async fn blog_counts(state: &AppState) -> Result<Vec<UserBlogCount>, ApiError> {
    let rows = blocking(state, |s| s.db.user_blog_counts()).await?;

    let counts = rows
        .into_iter()
        .map(|row| -> anyhow::Result<UserBlogCount> {
            Ok(UserBlogCount {
                id: parse_id(&row.id)?,
                username: row.username,
                blogs: u64::try_from(row.blog_count)?,
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(counts)
}
