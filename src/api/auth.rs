use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use serde_json::json;
use super::AppState;

pub const USER_HEADER: &str = "x-user-id";
pub const ANONYMOUS_USER: &str = "anonymous";

/// Reject requests without the configured bearer token. No token configured means open access.
pub async fn api_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<serde_json::Value>)> {
    if let Some(expected_token) = &state.api_token {
        let auth_header = request
            .headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok());

        match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
            Some(token) if token == expected_token => {}
            Some(_) => {
                return Err((StatusCode::UNAUTHORIZED, Json(json!({"error": "Invalid API token", "type": "Unauthorized"}))));
            }
            None => {
                return Err((StatusCode::UNAUTHORIZED, Json(json!({"error": "Missing Authorization header", "type": "Unauthorized"}))));
            }
        }
    }

    Ok(next.run(request).await)
}

/// Owning user of a request, taken from the `x-user-id` header.
#[derive(Debug, Clone, PartialEq)]
pub struct UserId(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for UserId {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(ANONYMOUS_USER);
        Ok(Self(user.to_string()))
    }
}
