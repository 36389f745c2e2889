use super::{RecipeRequest, RecipeResponse};
use crate::api::{ErrorResponse, Payload};
use crate::auth::AuthUser;
use crate::catalog::{self, UpdateMode};
use crate::db::DbPool;
use crate::error::ApiError;
use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;

fn apply(
    pool: &DbPool,
    owner: i32,
    id: i32,
    req: RecipeRequest,
    mode: UpdateMode,
) -> Result<Json<RecipeResponse>, ApiError> {
    let mut conn = pool.get()?;

    let recipe = catalog::update_recipe(&mut conn, owner, id, req.into(), mode)?;
    let updated = catalog::with_relations(&mut conn, vec![recipe])?
        .pop()
        .ok_or(ApiError::NotFound("Recipe"))?;

    tracing::debug!(recipe_id = id, ?mode, "updated recipe");
    Ok(Json(updated.into()))
}

#[utoipa::path(
    patch,
    path = "/recipe/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    request_body(content = RecipeRequest, example = json!({"title": "New title", "tags": []})),
    responses(
        (status = 200, description = "Recipe updated; omitted fields unchanged", body = RecipeResponse),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn patch_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<i32>,
    Payload(req): Payload<RecipeRequest>,
) -> Result<Json<RecipeResponse>, ApiError> {
    apply(&pool, user.id, id, req, UpdateMode::Partial)
}

#[utoipa::path(
    put,
    path = "/recipe/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    request_body(content = RecipeRequest, example = json!({
        "title": "Spaghetti carbonara",
        "time_minutes": 25,
        "price": 5.00
    })),
    responses(
        (status = 200, description = "Recipe replaced; omitted link and relations cleared", body = RecipeResponse),
        (status = 400, description = "Invalid or missing fields", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn put_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<i32>,
    Payload(req): Payload<RecipeRequest>,
) -> Result<Json<RecipeResponse>, ApiError> {
    apply(&pool, user.id, id, req, UpdateMode::Full)
}
