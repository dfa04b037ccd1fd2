//! Token authentication middleware
//!
//! Applied to protected routes only. Resolves `Authorization: Token <key>`
//! to a user and stores it in the request extensions as [`CurrentUser`].

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use recipe_common::auth::{parse_authorization_header, TokenHeaderError};
use recipe_common::db::User;
use tracing::{debug, warn};

use crate::db::tokens::user_for_token;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Authenticated user, extracted with `Extension<CurrentUser>`
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Reject requests without a valid token
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let Some(value) = request.headers().get(header::AUTHORIZATION) else {
        return Err(ApiError::Unauthorized(
            TokenHeaderError::OtherScheme.to_string(),
        ));
    };

    let value = value.to_str().map_err(|_| {
        ApiError::Unauthorized(
            "Invalid token header. Token string should not contain invalid characters."
                .to_string(),
        )
    })?;

    let key = parse_authorization_header(value)
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    let Some(user) = user_for_token(&state.db, key).await? else {
        warn!("Rejected request with unknown token");
        return Err(ApiError::Unauthorized("Invalid token.".to_string()));
    };

    if !user.is_active {
        warn!("Rejected token for inactive user {}", user.id);
        return Err(ApiError::Unauthorized("User inactive or deleted.".to_string()));
    }

    debug!("Authenticated user {}", user.id);
    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}
