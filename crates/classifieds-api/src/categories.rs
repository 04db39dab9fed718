use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
};

use classifieds_db::models::CategoryRow;
use classifieds_types::api::{CategoryResponse, ListResponse, StatusResponse};

use crate::body::JsonBody;
use crate::error::ApiError;
use crate::extract::IdPath;
use crate::listing::{PageQuery, list_response};
use crate::state::{AppState, blocking};

fn category_response(row: CategoryRow) -> CategoryResponse {
    CategoryResponse {
        id: row.id,
        name: row.name,
    }
}

fn read_name(bytes: &[u8]) -> Result<String, ApiError> {
    let mut body = JsonBody::parse(bytes)?;
    let Some(name) = body.required_text("name") else {
        return Err(body.reject());
    };
    body.finish()?;
    Ok(name)
}

pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListResponse<CategoryResponse>>, ApiError> {
    let page = query.request(&state.config);
    let rows = blocking(&state, move |s| Ok(s.db.list_categories(page)?)).await?;
    Ok(Json(list_response(rows, category_response)))
}

pub async fn get_category(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> Result<Json<CategoryResponse>, ApiError> {
    let row = blocking(&state, move |s| Ok(s.db.get_category(id)?)).await?;
    Ok(Json(category_response(row)))
}

pub async fn create_category(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CategoryResponse>, ApiError> {
    let name = read_name(&body)?;
    let row = blocking(&state, move |s| Ok(s.db.create_category(&name)?)).await?;
    Ok(Json(category_response(row)))
}

pub async fn update_category(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    body: Bytes,
) -> Result<Json<CategoryResponse>, ApiError> {
    let name = read_name(&body)?;
    let row = blocking(&state, move |s| Ok(s.db.update_category(id, &name)?)).await?;
    Ok(Json(category_response(row)))
}

/// DELETE /cat/{id}/delete/: ads in the category are kept, uncategorized.
pub async fn delete_category(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> Result<Json<StatusResponse>, ApiError> {
    blocking(&state, move |s| Ok(s.db.delete_category(id)?)).await?;
    Ok(Json(StatusResponse::ok()))
}
