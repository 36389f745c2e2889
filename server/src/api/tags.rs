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

/// Returns the router for /recipe/tags endpoints (mounted at /recipe/tags)
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_tags).post(create_tag))
}

#[derive(OpenApi)]
#[openapi(
    paths(list_tags, create_tag),
    components(schemas(AttributeResponse, CreateAttributeRequest))
)]
pub struct ApiDoc;

#[utoipa::path(
    get,
    path = "/recipe/tags",
    tag = "tags",
    params(ListAttributesParams),
    responses(
        (status = 200, description = "Your tags, by name descending", body = Vec<AttributeResponse>),
        (status = 400, description = "Invalid assigned_only value", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_tags(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    params: Result<Query<ListAttributesParams>, QueryRejection>,
) -> Result<Json<Vec<AttributeResponse>>, ApiError> {
    attributes::list(&pool, AttributeKind::Tag, &user, params)
}

#[utoipa::path(
    post,
    path = "/recipe/tags",
    tag = "tags",
    request_body(content = CreateAttributeRequest, example = json!({"name": "Dessert"})),
    responses(
        (status = 201, description = "Tag created", body = AttributeResponse),
        (status = 400, description = "Blank name", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_tag(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    payload: Payload<CreateAttributeRequest>,
) -> Result<(StatusCode, Json<AttributeResponse>), ApiError> {
    attributes::create(&pool, AttributeKind::Tag, &user, payload)
}
