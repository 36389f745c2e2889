use crate::accounts::{self, NewAccount};
use crate::api::{ErrorResponse, Payload};
use crate::db::DbPool;
use crate::error::ApiError;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreateUserResponse {
    pub email: String,
    pub name: String,
}

#[utoipa::path(
    post,
    path = "/user/create",
    tag = "user",
    request_body(content = CreateUserRequest, example = json!({"email": "user@example.com", "password": "password123", "name": "Test User"})),
    responses(
        (status = 201, description = "User created", body = CreateUserResponse),
        (status = 400, description = "Invalid email or password, or email already taken", body = ErrorResponse)
    )
)]
pub async fn create_user(
    State(pool): State<Arc<DbPool>>,
    Payload(req): Payload<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreateUserResponse>), ApiError> {
    let mut conn = pool.get()?;

    let user = accounts::create_user(
        &mut conn,
        NewAccount {
            email: &req.email,
            password: &req.password,
            name: &req.name,
        },
    )?;

    tracing::info!(user_id = user.id, "registered user");

    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            email: user.email,
            name: user.name,
        }),
    ))
}
