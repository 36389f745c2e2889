use super::{RecipeRequest, RecipeResponse};
use crate::api::{ErrorResponse, Payload};
use crate::auth::AuthUser;
use crate::catalog;
use crate::db::DbPool;
use crate::error::ApiError;
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/recipe/recipes",
    tag = "recipes",
    request_body(content = RecipeRequest, example = json!({
        "title": "Chocolate cheesecake",
        "time_minutes": 30,
        "price": 5.25,
        "tags": [1],
        "ingredients": [2, 3]
    })),
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Invalid or missing fields, or unknown tag/ingredient id", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Payload(req): Payload<RecipeRequest>,
) -> Result<(StatusCode, Json<RecipeResponse>), ApiError> {
    let mut conn = pool.get()?;

    let recipe = catalog::create_recipe(&mut conn, user.id, req.into())?;
    let created = catalog::with_relations(&mut conn, vec![recipe])?
        .pop()
        .ok_or(ApiError::NotFound("Recipe"))?;

    Ok((StatusCode::CREATED, Json(created.into())))
}
