use crate::accounts;
use crate::api::{ErrorResponse, Payload};
use crate::auth::create_session;
use crate::error::ApiError;
use crate::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TokenRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

#[utoipa::path(
    post,
    path = "/user/token",
    tag = "user",
    request_body(content = TokenRequest, example = json!({"email": "user@example.com", "password": "password123"})),
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn create_token(
    State(state): State<AppState>,
    Payload(req): Payload<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let mut conn = state.pool.get()?;

    let user = accounts::authenticate(&mut conn, &req.email, &req.password)?.ok_or_else(|| {
        ApiError::invalid("Unable to authenticate with provided credentials")
    })?;

    let token = create_session(&mut conn, user.id, state.config.token_ttl_days)?;

    Ok(Json(TokenResponse { token }))
}
