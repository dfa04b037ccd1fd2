//! Tag and ingredient endpoints
//!
//! One set of handlers serves both kinds; the router for each kind carries
//! its [`AttributeKind`] as a request extension.

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use recipe_common::db::{Attribute, AttributeKind};
use recipe_common::filters::parse_int_flag;
use recipe_common::validation::{CharField, FieldErrors, MAX_NAME_LENGTH};
use serde::Deserialize;
use tracing::info;

use super::auth::CurrentUser;
use super::body::Payload;
use crate::db::attributes;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AttributeListParams {
    pub assigned_only: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AttributePayload {
    pub name: Option<String>,
}

fn attribute_id(path: Result<Path<i64>, PathRejection>) -> ApiResult<i64> {
    path.map(|Path(id)| id).map_err(|_| ApiError::NotFound)
}

/// GET /api/recipe/{tags,ingredients}/
pub async fn list_attributes(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(kind): Extension<AttributeKind>,
    params: Result<Query<AttributeListParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Attribute>>> {
    let Query(params) = params?;
    let assigned_only = parse_int_flag("assigned_only", params.assigned_only.as_deref())?;

    let items = attributes::list_attributes(&state.db, kind, user.id, assigned_only).await?;
    Ok(Json(items))
}

/// PUT /api/recipe/{tags,ingredients}/:id/
pub async fn put_attribute(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(kind): Extension<AttributeKind>,
    path: Result<Path<i64>, PathRejection>,
    payload: ApiResult<Payload<AttributePayload>>,
) -> ApiResult<Json<Attribute>> {
    update_attribute(state, user.id, kind, attribute_id(path)?, payload, false).await
}

/// PATCH /api/recipe/{tags,ingredients}/:id/
pub async fn patch_attribute(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(kind): Extension<AttributeKind>,
    path: Result<Path<i64>, PathRejection>,
    payload: ApiResult<Payload<AttributePayload>>,
) -> ApiResult<Json<Attribute>> {
    update_attribute(state, user.id, kind, attribute_id(path)?, payload, true).await
}

async fn update_attribute(
    state: AppState,
    user_id: i64,
    kind: AttributeKind,
    id: i64,
    payload: ApiResult<Payload<AttributePayload>>,
    partial: bool,
) -> ApiResult<Json<Attribute>> {
    let current = attributes::get_attribute(&state.db, kind, user_id, id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let Payload(payload) = payload?;
    let mut errors = FieldErrors::new();
    let field = CharField::new().max_length(MAX_NAME_LENGTH);
    let name = if partial {
        payload
            .name
            .as_deref()
            .and_then(|name| field.clean(&mut errors, "name", name))
    } else {
        field.clean_required(&mut errors, "name", payload.name.as_deref())
    };
    errors.into_result()?;

    let Some(name) = name else {
        return Ok(Json(current));
    };

    let updated = attributes::rename_attribute(&state.db, kind, user_id, id, &name)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(updated))
}

/// DELETE /api/recipe/{tags,ingredients}/:id/
pub async fn delete_attribute(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(kind): Extension<AttributeKind>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let id = attribute_id(path)?;
    if !attributes::delete_attribute(&state.db, kind, user.id, id).await? {
        return Err(ApiError::NotFound);
    }

    info!("User {} deleted {} {}", user.id, kind.label(), id);
    Ok(StatusCode::NO_CONTENT)
}

/// Routes for one attribute kind (authentication required)
pub fn attribute_routes(kind: AttributeKind) -> Router<AppState> {
    let base = format!("/api/recipe/{}/", kind.field());
    let item = format!("{}:id/", base);

    Router::new()
        .route(&base, get(list_attributes))
        .route(
            &item,
            put(put_attribute)
                .patch(patch_attribute)
                .delete(delete_attribute),
        )
        .layer(Extension(kind))
}
