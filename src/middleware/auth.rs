use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::{validate_jwt, Token};
use crate::error::ApiError;

/// Header the accounts service hands tokens out for
pub const TOKEN_HEADER: &str = "x-access-token";

/// Resolves the [`Token`] for a request and injects it as an extension.
///
/// Runs before any handler, so a missing or invalid credential yields 401
/// without touching the repository.
pub async fn require_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = resolve_token(request.headers(), &state.jwt_secret)?;
    tracing::debug!("Resolved token for account {}", token.account_id);

    request.extensions_mut().insert(token);
    Ok(next.run(request).await)
}

/// Token context provider: header credential to caller identity
pub fn resolve_token(headers: &HeaderMap, secret: &str) -> Result<Token, ApiError> {
    let raw = extract_jwt_from_headers(headers).map_err(ApiError::unauthorized)?;

    let claims = validate_jwt(&raw, secret)?;

    Ok(Token::from(claims))
}

/// Accepts `x-access-token: <jwt>` or `Authorization: Bearer <jwt>`
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    if let Some(value) = headers.get(TOKEN_HEADER) {
        let token = value
            .to_str()
            .map_err(|_| "Invalid x-access-token header format".to_string())?
            .trim();
        if token.is_empty() {
            return Err("Empty JWT token".to_string());
        }
        return Ok(token.to_string());
    }

    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing access token".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
