//! User registration, token issuance and profile endpoints

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use recipe_common::auth::MIN_PASSWORD_LENGTH;
use recipe_common::db::User;
use recipe_common::validation::{
    clean_email, report_missing, CharField, FieldErrors, MAX_NAME_LENGTH,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::auth::CurrentUser;
use super::body::Payload;
use crate::db::{tokens, users, users::UserChanges};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Longest accepted password
const MAX_PASSWORD_LENGTH: usize = 128;

const BAD_CREDENTIALS: &str = "Unable to authenticate with provided credentials.";

/// Body of registration and profile writes
#[derive(Debug, Default, Deserialize)]
pub struct UserPayload {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

/// Public view of a user; the password is never echoed
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub email: String,
    pub name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            name: user.name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Validate a user payload
///
/// With `partial`, absent fields are left unchanged instead of required.
fn clean_user(payload: &UserPayload, partial: bool) -> Result<UserChanges, FieldErrors> {
    let mut errors = FieldErrors::new();

    let email = match payload.email.as_deref() {
        Some(email) => clean_email(&mut errors, "email", email),
        None => {
            report_missing(&mut errors, "email", partial);
            None
        }
    };

    let password = match payload.password.as_deref() {
        Some(password) => CharField::new()
            .keep_whitespace()
            .min_length(MIN_PASSWORD_LENGTH)
            .max_length(MAX_PASSWORD_LENGTH)
            .clean(&mut errors, "password", password),
        None => {
            report_missing(&mut errors, "password", partial);
            None
        }
    };

    let name = match payload.name.as_deref() {
        Some(name) => CharField::new()
            .max_length(MAX_NAME_LENGTH)
            .clean(&mut errors, "name", name),
        None => {
            report_missing(&mut errors, "name", partial);
            None
        }
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(UserChanges {
        email,
        name,
        password,
    })
}

/// POST /api/user/create/
pub async fn create_user(
    State(state): State<AppState>,
    payload: ApiResult<Payload<UserPayload>>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let Payload(payload) = payload?;

    let UserChanges {
        email: Some(email),
        password: Some(password),
        name: Some(name),
    } = clean_user(&payload, false)?
    else {
        return Err(ApiError::Internal("validated user is incomplete".to_string()));
    };

    let user = users::create_user(&state.db, &email, &password, &name).await?;
    info!("Registered user {}", user.id);

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /api/user/token/
pub async fn create_token(
    State(state): State<AppState>,
    payload: ApiResult<Payload<TokenRequest>>,
) -> ApiResult<Json<TokenResponse>> {
    let Payload(payload) = payload?;

    let mut errors = FieldErrors::new();
    let email = CharField::new().clean_required(&mut errors, "email", payload.email.as_deref());
    let password = CharField::new()
        .keep_whitespace()
        .clean_required(&mut errors, "password", payload.password.as_deref());
    let (Some(email), Some(password)) = (email, password) else {
        return Err(errors.into());
    };

    let Some(user) = users::authenticate(&state.db, &email, &password).await? else {
        warn!("Token request with bad credentials");
        return Err(FieldErrors::non_field(BAD_CREDENTIALS).into());
    };

    let token = tokens::get_or_create_token(&state.db, user.id).await?;
    Ok(Json(TokenResponse { token }))
}

/// GET /api/user/me/
pub async fn get_me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserResponse> {
    Json(user.into())
}

/// PUT /api/user/me/
pub async fn put_me(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: ApiResult<Payload<UserPayload>>,
) -> ApiResult<Json<UserResponse>> {
    update_me(state, user, payload, false).await
}

/// PATCH /api/user/me/
pub async fn patch_me(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: ApiResult<Payload<UserPayload>>,
) -> ApiResult<Json<UserResponse>> {
    update_me(state, user, payload, true).await
}

async fn update_me(
    state: AppState,
    user: User,
    payload: ApiResult<Payload<UserPayload>>,
    partial: bool,
) -> ApiResult<Json<UserResponse>> {
    let Payload(payload) = payload?;
    let changes = clean_user(&payload, partial)?;
    let updated = users::update_user(&state.db, user.id, &changes).await?;
    Ok(Json(updated.into()))
}

/// Registration and login routes (no authentication)
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/user/create/", post(create_user))
        .route("/api/user/token/", post(create_token))
}

/// Profile routes (authentication required)
pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/api/user/me/", get(get_me).put(put_me).patch(patch_me))
}
