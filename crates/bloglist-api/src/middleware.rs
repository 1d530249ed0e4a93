//! Two-stage auth chain: `extract_token` runs on every request and only
//! attaches what it finds; `resolve_user` guards protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error};
use uuid::Uuid;

use bloglist_types::models::User;

use crate::auth::{AppState, blocking};
use crate::error::ApiError;
use crate::tokens::TokenError;

const TOKEN_MISSING: &str = "Token missing or invalid";

/// Candidate token pulled from the `Authorization` header. Not yet verified.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// The verified caller. Also an extractor that rejects with 401 if the chain
/// did not attach a user.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_at_checked("Bearer ".len())?;

    if scheme.eq_ignore_ascii_case("bearer ") && !token.is_empty() {
        Some(token.to_string())
    } else {
        None
    }
}

pub async fn extract_token(mut req: Request, next: Next) -> Response {
    if let Some(token) = bearer_token(req.headers()) {
        req.extensions_mut().insert(BearerToken(token));
    }
    next.run(req).await
}

pub async fn resolve_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let BearerToken(token) = req
        .extensions()
        .get::<BearerToken>()
        .cloned()
        .ok_or_else(|| ApiError::Unauthorized(TOKEN_MISSING.to_string()))?;

    let claims = state.tokens.verify(&token)?;

    let user = load_user(&state, claims.sub).await?.ok_or_else(|| {
        debug!("Token for unknown user {}", claims.sub);
        ApiError::from(TokenError::Invalid)
    })?;

    req.extensions_mut().insert(AuthUser(user));
    Ok(next.run(req).await)
}

async fn load_user(state: &AppState, id: Uuid) -> Result<Option<User>, ApiError> {
    let id = id.to_string();
    let result = blocking(state, move |s| {
        let Some(row) = s.db.get_user_by_id(&id)? else {
            return Ok(None);
        };
        let blogs = s
            .db
            .get_user_blog_ids(&id)?
            .iter()
            .map(|b| bloglist_db::models::parse_id(b))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Some(row.into_user(blogs)?))
    })
    .await;

    // A failed lookup never lets the request through
    result.map_err(|e| {
        error!("User lookup failed during auth: {}", e);
        ApiError::Unauthorized(TOKEN_MISSING.to_string())
    })
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized(TOKEN_MISSING.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderValue, Method, StatusCode};
    use chrono::{Duration, Utc};
    use serde_json::json;

    use axum::{Router, middleware, routing::post};

    use super::*;
    use crate::testing::{app, json_request, login, register, send, state};
    use crate::tokens::Identity;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_prefix_is_case_insensitive() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc".to_string()));
        assert_eq!(bearer_token(&headers("bearer abc")), Some("abc".to_string()));
        assert_eq!(bearer_token(&headers("BEARER abc")), Some("abc".to_string()));
    }

    #[test]
    fn other_schemes_attach_nothing() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("Bear")), None);
    }

    fn blog() -> serde_json::Value {
        json!({"title": "Type wars", "author": "Robert C. Martin", "url": "http://blog.cleancoder.com"})
    }

    #[tokio::test]
    async fn protected_route_without_token_is_401() {
        let app = app(state());
        let (status, body) = send(&app, json_request(Method::POST, "/api/blogs", blog(), None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Token missing or invalid");
    }

    #[tokio::test]
    async fn expired_token_is_401() {
        let state = state();
        let app = app(state.clone());
        let id = register(&app, "root", "sekret").await;

        let identity = Identity { user_id: id, username: "root".into(), name: None };
        let token = state
            .tokens
            .issue_at(&identity, Utc::now() - Duration::hours(2))
            .unwrap();

        let (status, body) =
            send(&app, json_request(Method::POST, "/api/blogs", blog(), Some(&token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "token expired");
    }

    #[tokio::test]
    async fn token_for_unknown_user_is_401() {
        let state = state();
        let app = app(state.clone());

        let identity = Identity { user_id: Uuid::new_v4(), username: "ghost".into(), name: None };
        let token = state.tokens.issue(&identity).unwrap();

        let (status, body) =
            send(&app, json_request(Method::POST, "/api/blogs", blog(), Some(&token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "token invalid");
    }

    #[tokio::test]
    async fn failed_user_lookup_is_401() {
        let state = state();
        let app = app(state.clone());
        register(&app, "root", "sekret").await;
        let token = login(&app, "root", "sekret").await;

        state
            .db
            .with_conn(|conn| {
                conn.execute_batch("DROP TABLE user_blogs")?;
                Ok(())
            })
            .unwrap();

        let (status, body) =
            send(&app, json_request(Method::POST, "/api/blogs", blog(), Some(&token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Token missing or invalid");
    }

    #[tokio::test]
    async fn handler_without_resolved_user_is_401() {
        let state = state();
        let app = app(state.clone());
        register(&app, "root", "sekret").await;
        let token = login(&app, "root", "sekret").await;

        // Token is extracted but never resolved to a user
        let bare = Router::new()
            .route("/api/blogs", post(crate::blogs::create_blog))
            .layer(middleware::from_fn(extract_token))
            .with_state(state);

        let (status, body) =
            send(&bare, json_request(Method::POST, "/api/blogs", blog(), Some(&token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Token missing or invalid");
    }

    #[tokio::test]
    async fn valid_token_reaches_handler() {
        let app = app(state());
        register(&app, "root", "sekret").await;
        let token = login(&app, "root", "sekret").await;

        let (status, _) =
            send(&app, json_request(Method::POST, "/api/blogs", blog(), Some(&token))).await;
        assert_eq!(status, StatusCode::CREATED);
    }
}
