use super::RecipeResponse;
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::catalog::{self, parse_id_list, RecipeFilter};
use crate::db::DbPool;
use crate::error::ApiError;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListRecipesParams {
    /// Comma-separated tag ids, e.g. `1,3`
    pub tags: Option<String>,
    /// Comma-separated ingredient ids, e.g. `2,5`
    pub ingredients: Option<String>,
}

fn id_filter(raw: Option<&str>, param: &'static str) -> Result<Option<Vec<i32>>, ApiError> {
    match raw {
        Some(raw) => parse_id_list(raw).map_err(|e| ApiError::validation(param, e.to_string())),
        None => Ok(None),
    }
}

#[utoipa::path(
    get,
    path = "/recipe/recipes",
    tag = "recipes",
    params(ListRecipesParams),
    responses(
        (status = 200, description = "Your recipes, newest first", body = Vec<RecipeResponse>),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_recipes(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    params: Result<Query<ListRecipesParams>, QueryRejection>,
) -> Result<Json<Vec<RecipeResponse>>, ApiError> {
    let Query(params) = params?;
    let filter = RecipeFilter {
        tag_ids: id_filter(params.tags.as_deref(), "tags")?,
        ingredient_ids: id_filter(params.ingredients.as_deref(), "ingredients")?,
    };

    let mut conn = pool.get()?;
    let recipes = catalog::list_recipes(&mut conn, user.id, &filter)?;
    let recipes = catalog::with_relations(&mut conn, recipes)?;

    Ok(Json(recipes.into_iter().map(RecipeResponse::from).collect()))
}
