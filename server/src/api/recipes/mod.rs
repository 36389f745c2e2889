pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;
pub mod upload_image;

use crate::api::attributes::AttributeResponse;
use crate::catalog::RecipeWithRelations;
use crate::media::{media_url, MAX_FILE_SIZE};
use crate::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

/// Returns the router for /recipe/recipes endpoints (mounted at /recipe/recipes)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list_recipes).post(create::create_recipe))
        .route(
            "/{id}",
            get(get::get_recipe)
                .patch(update::patch_recipe)
                .put(update::put_recipe)
                .delete(delete::delete_recipe),
        )
        .route(
            "/{id}/upload-image",
            // Room for the multipart framing around a maximum-size image
            post(upload_image::upload_image)
                .layer(DefaultBodyLimit::max(MAX_FILE_SIZE + 64 * 1024)),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list::list_recipes,
        create::create_recipe,
        get::get_recipe,
        update::patch_recipe,
        update::put_recipe,
        delete::delete_recipe,
        upload_image::upload_image,
    ),
    components(schemas(
        RecipeRequest,
        RecipeResponse,
        RecipeDetailResponse,
        upload_image::RecipeImageResponse,
        upload_image::ImageUploadForm,
    ))
)]
pub struct ApiDoc;

/// Recipe fields accepted on create and update. Which ones are required
/// depends on the method: POST and PUT need title, time and price.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RecipeRequest {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<f64>,
    pub link: Option<String>,
    /// Ids of your tags to link
    pub tags: Option<Vec<i32>>,
    /// Ids of your ingredients to link
    pub ingredients: Option<Vec<i32>>,
}

impl From<RecipeRequest> for crate::catalog::RecipeChanges {
    fn from(req: RecipeRequest) -> Self {
        Self {
            title: req.title,
            time_minutes: req.time_minutes,
            price: req.price,
            link: req.link,
            tags: req.tags,
            ingredients: req.ingredients,
        }
    }
}

/// Recipe as shown in lists and returned from writes, with relations as ids.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeResponse {
    pub id: i32,
    pub title: String,
    pub time_minutes: i32,
    pub price: f64,
    pub link: String,
    /// URL path of the uploaded image
    pub image: Option<String>,
    pub tags: Vec<i32>,
    pub ingredients: Vec<i32>,
}

impl From<RecipeWithRelations> for RecipeResponse {
    fn from(full: RecipeWithRelations) -> Self {
        let recipe = full.recipe;
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            image: recipe.image.as_deref().map(media_url),
            tags: full.tags.iter().map(|t| t.id).collect(),
            ingredients: full.ingredients.iter().map(|i| i.id).collect(),
        }
    }
}

/// Recipe with its tags and ingredients spelled out.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeDetailResponse {
    pub id: i32,
    pub title: String,
    pub time_minutes: i32,
    pub price: f64,
    pub link: String,
    pub image: Option<String>,
    pub tags: Vec<AttributeResponse>,
    pub ingredients: Vec<AttributeResponse>,
}

impl From<RecipeWithRelations> for RecipeDetailResponse {
    fn from(full: RecipeWithRelations) -> Self {
        let recipe = full.recipe;
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            image: recipe.image.as_deref().map(media_url),
            tags: full.tags.into_iter().map(AttributeResponse::from).collect(),
            ingredients: full
                .ingredients
                .into_iter()
                .map(AttributeResponse::from)
                .collect(),
        }
    }
}
