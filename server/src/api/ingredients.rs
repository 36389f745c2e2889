use crate::api::attributes::{
    self, AttributeResponse, CreateAttributeRequest, ListAttributesParams,
};
use crate::api::{ErrorResponse, Payload};
use crate::auth::AuthUser;
use crate::catalog::AttributeKind;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::AppState;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use utoipa::OpenApi;

/// Returns the router for /recipe/ingredients endpoints (mounted at /recipe/ingredients)
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_ingredients).post(create_ingredient))
}

#[derive(OpenApi)]
#[openapi(
    paths(list_ingredients, create_ingredient),
    components(schemas(AttributeResponse, CreateAttributeRequest))
)]
pub struct ApiDoc;

#[utoipa::path(
    get,
    path = "/recipe/ingredients",
    tag = "ingredients",
    params(ListAttributesParams),
    responses(
        (status = 200, description = "Your ingredients, by name descending", body = Vec<AttributeResponse>),
        (status = 400, description = "Invalid assigned_only value", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_ingredients(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    params: Result<Query<ListAttributesParams>, QueryRejection>,
) -> Result<Json<Vec<AttributeResponse>>, ApiError> {
    attributes::list(&pool, AttributeKind::Ingredient, &user, params)
}

#[utoipa::path(
    post,
    path = "/recipe/ingredients",
    tag = "ingredients",
    request_body(content = CreateAttributeRequest, example = json!({"name": "Salt"})),
    responses(
        (status = 201, description = "Ingredient created", body = AttributeResponse),
        (status = 400, description = "Blank name", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_ingredient(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    payload: Payload<CreateAttributeRequest>,
) -> Result<(StatusCode, Json<AttributeResponse>), ApiError> {
    attributes::create(&pool, AttributeKind::Ingredient, &user, payload)
}
