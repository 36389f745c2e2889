use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::catalog;
use crate::error::ApiError;
use crate::media::media_url;
use crate::AppState;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

const IMAGE_FIELD: &str = "image";

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeImageResponse {
    pub id: i32,
    /// URL path the image is served from
    pub image: Option<String>,
}

/// Multipart upload form (for OpenAPI documentation only)
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ImageUploadForm {
    /// JPEG, PNG, GIF or WebP image, at most 10 MiB
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

#[utoipa::path(
    post,
    path = "/recipe/recipes/{id}/upload-image",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    request_body(content = ImageUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image stored", body = RecipeImageResponse),
        (status = 400, description = "Missing or invalid image", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_image(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<RecipeImageResponse>, ApiError> {
    let mut multipart = multipart?;

    let mut data = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(IMAGE_FIELD) {
            data = Some(field.bytes().await?);
            break;
        }
    }

    let data = data.ok_or_else(|| ApiError::validation(IMAGE_FIELD, "No file was submitted"))?;

    let mut conn = state.pool.get()?;
    let recipe = catalog::set_recipe_image(&mut conn, &state.media, user.id, id, &data)?;

    tracing::info!(recipe_id = recipe.id, bytes = data.len(), "stored recipe image");

    Ok(Json(RecipeImageResponse {
        id: recipe.id,
        image: recipe.image.as_deref().map(media_url),
    }))
}
