pub mod user;

use crate::AppState;
use axum::routing::post;
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for public endpoints (no auth required)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user/create", post(user::create::create_user))
        .route("/user/token", post(user::token::create_token))
}

#[derive(OpenApi)]
#[openapi(
    paths(user::create::create_user, user::token::create_token),
    components(schemas(
        user::create::CreateUserRequest,
        user::create::CreateUserResponse,
        user::token::TokenRequest,
        user::token::TokenResponse,
    ))
)]
pub struct ApiDoc;
