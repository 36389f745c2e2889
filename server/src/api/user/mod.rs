pub mod me;

use crate::AppState;
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /user/me (mounted at /user)
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/me",
        get(me::get_profile)
            .patch(me::patch_profile)
            .put(me::put_profile),
    )
}

#[derive(OpenApi)]
#[openapi(
    paths(me::get_profile, me::patch_profile, me::put_profile),
    components(schemas(me::ProfileResponse, me::PatchProfileRequest, me::PutProfileRequest))
)]
pub struct ApiDoc;
