//! Request and response types shared by the tag and ingredient endpoints,
//! which differ only in the table they read and write.

use crate::api::Payload;
use crate::catalog::{self, parse_flag, AttributeKind};
use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::{Attribute, User};
use axum::extract::{rejection::QueryRejection, Query};
use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttributeResponse {
    pub id: i32,
    pub name: String,
}

impl From<Attribute> for AttributeResponse {
    fn from(attribute: Attribute) -> Self {
        Self {
            id: attribute.id,
            name: attribute.name,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateAttributeRequest {
    pub name: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListAttributesParams {
    /// `1` to only list entries used by at least one of your recipes, `0` for all
    #[param(value_type = Option<i64>)]
    pub assigned_only: Option<String>,
}

pub(crate) fn list(
    pool: &DbPool,
    kind: AttributeKind,
    user: &User,
    params: Result<Query<ListAttributesParams>, QueryRejection>,
) -> Result<Json<Vec<AttributeResponse>>, ApiError> {
    let Query(params) = params?;
    let assigned_only = match params.assigned_only.as_deref() {
        Some(raw) => {
            parse_flag(raw).map_err(|e| ApiError::validation("assigned_only", e.to_string()))?
        }
        None => false,
    };

    let mut conn = pool.get()?;
    let rows = catalog::list_attributes(&mut conn, kind, user.id, assigned_only)?;

    Ok(Json(rows.into_iter().map(AttributeResponse::from).collect()))
}

pub(crate) fn create(
    pool: &DbPool,
    kind: AttributeKind,
    user: &User,
    Payload(req): Payload<CreateAttributeRequest>,
) -> Result<(StatusCode, Json<AttributeResponse>), ApiError> {
    let mut conn = pool.get()?;
    let created = catalog::create_attribute(&mut conn, kind, user.id, &req.name)?;

    Ok((StatusCode::CREATED, Json(created.into())))
}
