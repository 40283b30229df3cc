//! Controller logic shared by every resource kind.
//!
//! Each handler runs the same pipeline: token context (already resolved by
//! [`require_token`](crate::middleware::require_token)), id parsing, the
//! validation gate, one repository call, then status mapping.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::{IntoResponse, Response},
    routing, Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::Value;

use crate::app::AppState;
use crate::auth::Token;
use crate::database::{Repository, Resource};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::validation::{validate_create, validate_patch};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "includeRemoved")]
    pub include_removed: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    pub force: Option<String>,
}

/// Collection and item routes for `R` under `base` (e.g. `/contacts`)
pub fn routes<R: Resource>(base: &str) -> Router<AppState> {
    let collection = routing::get(list::<R>).post(create::<R>);
    let item = routing::get(get::<R>).patch(update::<R>).delete(delete::<R>);

    // Every path answers with and without a trailing slash
    Router::new()
        .route(base, collection.clone())
        .route(&format!("{}/", base), collection)
        .route(&format!("{}/:id", base), item.clone())
        .route(&format!("{}/:id/", base), item)
}

/// GET /{kind}/ - all rows of the caller's account
pub async fn list<R: Resource>(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<R>> {
    let include_removed = is_true(&query.include_removed);
    let rows = repository::<R>(&state)
        .find_all(token.account_id, include_removed)
        .await?;
    Ok(ApiResponse::success(rows))
}

/// GET /{kind}/:id
pub async fn get<R: Resource>(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    Path(id): Path<String>,
) -> ApiResult<R> {
    let id = parse_id(&id)?;
    repository::<R>(&state)
        .find_by_id(id, token.account_id)
        .await?
        .map(ApiResponse::success)
        .ok_or_else(|| not_found::<R>(id))
}

/// POST /{kind}/
pub async fn create<R: Resource>(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<R> {
    let body = json_body(payload)?;
    let valid = validate_create(&body, &R::SCHEMA)?;

    let created = repository::<R>(&state).add(valid, token.account_id).await?;
    Ok(ApiResponse::created(created))
}

/// PATCH /{kind}/:id - partial update
pub async fn update<R: Resource>(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<R> {
    let id = parse_id(&id)?;
    let body = json_body(payload)?;
    let valid = validate_patch(&body, &R::SCHEMA)?;

    repository::<R>(&state)
        .set(id, valid, token.account_id)
        .await?
        .map(ApiResponse::success)
        .ok_or_else(|| not_found::<R>(id))
}

/// DELETE /{kind}/:id[?force=true]
///
/// Soft delete answers 200 with the REMOVED row; `force=true` destroys the
/// row and answers 204.
pub async fn delete<R: Resource>(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let repo = repository::<R>(&state);

    if is_true(&query.force) {
        if repo.remove_by_id(id, token.account_id).await? {
            Ok(ApiResponse::<()>::no_content().into_response())
        } else {
            Err(not_found::<R>(id))
        }
    } else {
        repo.soft_remove(id, token.account_id)
            .await?
            .map(|row| ApiResponse::success(row).into_response())
            .ok_or_else(|| not_found::<R>(id))
    }
}

/// Path ids must be integers; zero is never a valid id.
///
/// Negative values are well-formed and simply never match a row.
pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
    match raw.trim().parse::<i64>() {
        Ok(0) | Err(_) => Err(ApiError::bad_request("id is required")),
        Ok(id) => Ok(id),
    }
}

fn repository<R: Resource>(state: &AppState) -> Repository<R> {
    Repository::new(state.store.clone())
}

fn not_found<R: Resource>(id: i64) -> ApiError {
    ApiError::not_found(format!("{} {} not found", R::SCHEMA.kind, id))
}

fn is_true(flag: &Option<String>) -> bool {
    flag.as_deref() == Some("true")
}

/// A body that is not JSON at all fails the validation gate like any other bad payload
fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!("Rejected request body: {}", rejection.body_text());
            Err(ApiError::unprocessable_entity(
                "Request body must be a JSON object",
                Default::default(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_integer_ids() {
        assert_eq!(parse_id("12").unwrap(), 12);
        assert_eq!(parse_id("-1").unwrap(), -1);
    }

    #[test]
    fn rejects_malformed_ids() {
        for raw in ["abc", "", "0", "1.5", "12abc"] {
            let err = parse_id(raw).unwrap_err();
            assert_eq!(err.status_code(), 400, "id {:?}", raw);
        }
    }

    #[test]
    fn flags_are_exactly_true() {
        assert!(is_true(&Some("true".to_string())));
        assert!(!is_true(&Some("1".to_string())));
        assert!(!is_true(&None));
    }
}
