use crate::accounts::{self, ProfileChanges};
use crate::api::{ErrorResponse, Payload};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::User;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub email: String,
    pub name: String,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            name: user.name,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PatchProfileRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

/// Full replacement of the profile. `name` resets to empty when omitted.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PutProfileRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[utoipa::path(
    get,
    path = "/user/me",
    tag = "user",
    responses(
        (status = 200, description = "Authenticated user's profile", body = ProfileResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_profile(AuthUser(user): AuthUser) -> Json<ProfileResponse> {
    Json(user.into())
}

#[utoipa::path(
    patch,
    path = "/user/me",
    tag = "user",
    request_body = PatchProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 400, description = "Invalid email or password", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn patch_profile(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Payload(req): Payload<PatchProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let mut conn = pool.get()?;

    let updated = accounts::update_profile(
        &mut conn,
        &user,
        ProfileChanges {
            email: req.email,
            password: req.password,
            name: req.name,
        },
    )?;

    Ok(Json(updated.into()))
}

#[utoipa::path(
    put,
    path = "/user/me",
    tag = "user",
    request_body = PutProfileRequest,
    responses(
        (status = 200, description = "Profile replaced", body = ProfileResponse),
        (status = 400, description = "Invalid email or password", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn put_profile(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Payload(req): Payload<PutProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let mut conn = pool.get()?;

    let updated = accounts::update_profile(
        &mut conn,
        &user,
        ProfileChanges {
            email: Some(req.email),
            password: Some(req.password),
            name: Some(req.name),
        },
    )?;

    Ok(Json(updated.into()))
}
