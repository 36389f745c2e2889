use super::RecipeDetailResponse;
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::catalog;
use crate::db::DbPool;
use crate::error::ApiError;
use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/recipe/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe details", body = RecipeDetailResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<i32>,
) -> Result<Json<RecipeDetailResponse>, ApiError> {
    let mut conn = pool.get()?;

    let recipe = catalog::get_recipe(&mut conn, user.id, id)?;
    let detail = catalog::with_relations(&mut conn, vec![recipe])?
        .pop()
        .ok_or(ApiError::NotFound("Recipe"))?;

    Ok(Json(detail.into()))
}
