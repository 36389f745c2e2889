use crate::api::ErrorResponse;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::User;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::db::get_user_from_token;

/// Authorization schemes accepted in front of the token.
const SCHEMES: [&str; 2] = ["Bearer ", "Token "];

/// Extractor that validates the Authorization header and provides the authenticated user.
///
/// Put it first in a handler's argument list so unauthenticated requests are
/// rejected before the body is read:
/// ```ignore
/// async fn my_handler(AuthUser(user): AuthUser) -> impl IntoResponse {
///     // user is the authenticated User
/// }
/// ```
pub struct AuthUser(pub User);

#[derive(Debug)]
pub enum AuthError {
    MissingHeader,
    InvalidHeader,
    InvalidFormat,
    InvalidToken,
    /// The token could not be checked at all (database or pool failure).
    Internal(ApiError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingHeader => "Authentication credentials were not provided",
            AuthError::InvalidHeader => "Invalid Authorization header",
            AuthError::InvalidFormat => "Invalid Authorization header format",
            AuthError::InvalidToken => "Invalid or expired token",
            AuthError::Internal(e) => return e.into_response(),
        };

        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new(message)),
        )
            .into_response()
    }
}

/// Pull the token out of an Authorization header value.
fn parse_token(value: &str) -> Result<&str, AuthError> {
    SCHEMES
        .iter()
        .find_map(|scheme| value.strip_prefix(scheme))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidFormat)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<DbPool>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let pool = Arc::<DbPool>::from_ref(state);

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AuthError::MissingHeader)?;

        let auth_str = auth_header.to_str().map_err(|_| AuthError::InvalidHeader)?;

        let token = parse_token(auth_str)?;

        let user = get_user_from_token(&pool, token)
            .await
            .map_err(AuthError::Internal)?
            .ok_or(AuthError::InvalidToken)?;

        Ok(AuthUser(user))
    }
}
