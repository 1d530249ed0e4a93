use std::sync::Arc;

use axum::{Json, extract::State};
use tracing::{error, info};

use bloglist_db::Database;
use bloglist_db::models::parse_id;
use bloglist_types::api::{LoginRequest, LoginResponse};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::password::PasswordHasher;
use crate::tokens::{Identity, TokenService};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenService,
    pub hasher: PasswordHasher,
}

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Run store access or password hashing off the async runtime.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })?
        .map_err(ApiError::from)
}

/// Check a username/password pair against the stored hash.
pub async fn authenticate(
    state: &AppState,
    username: String,
    password: String,
) -> Result<Identity, ApiError> {
    let lookup = username.clone();
    let user = blocking(state, move |s| s.db.get_user_by_username(&lookup))
        .await?
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    let stored = user.password_hash.clone();
    let matches = blocking(state, move |s| s.hasher.verify(&password, &stored)).await?;
    if !matches {
        info!("Failed login for {}", username);
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    Ok(Identity {
        user_id: parse_id(&user.id)?,
        username: user.username,
        name: user.name,
    })
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (Some(username), Some(password)) = (req.username, req.password) else {
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    let identity = authenticate(&state, username, password).await?;
    let token = state.tokens.issue(&identity)?;

    info!("User {} logged in", identity.username);

    Ok(Json(LoginResponse {
        token,
        username: identity.username,
        name: identity.name,
    }))
}
