use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
};

use classifieds_db::models::{LocationChanges, LocationFields, LocationRow};
use classifieds_types::api::{ListResponse, LocationResponse, StatusResponse};

use crate::body::JsonBody;
use crate::error::ApiError;
use crate::extract::IdPath;
use crate::listing::{PageQuery, list_response};
use crate::state::{AppState, blocking};

fn location_response(row: LocationRow) -> LocationResponse {
    LocationResponse {
        id: row.id,
        name: row.name,
        lat: row.lat,
        lng: row.lng,
    }
}

/// Reads `name` (required) plus `lat`/`lng`, which stay `None` when absent.
fn read_location(bytes: &[u8]) -> Result<LocationChanges, ApiError> {
    let mut body = JsonBody::parse(bytes)?;
    let name = body.required_text("name");
    let lat = body.optional_text("lat");
    let lng = body.optional_text("lng");

    let Some(name) = name else {
        return Err(body.reject());
    };
    body.finish()?;

    Ok(LocationChanges { name, lat, lng })
}

pub async fn list_locations(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListResponse<LocationResponse>>, ApiError> {
    let page = query.request(&state.config);
    let rows = blocking(&state, move |s| Ok(s.db.list_locations(page)?)).await?;
    Ok(Json(list_response(rows, location_response)))
}

pub async fn get_location(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> Result<Json<LocationResponse>, ApiError> {
    let row = blocking(&state, move |s| Ok(s.db.get_location(id)?)).await?;
    Ok(Json(location_response(row)))
}

pub async fn create_location(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<LocationResponse>, ApiError> {
    let input = read_location(&body)?;
    let fields = LocationFields {
        name: input.name,
        lat: input.lat.unwrap_or_default(),
        lng: input.lng.unwrap_or_default(),
    };

    let row = blocking(&state, move |s| Ok(s.db.create_location(&fields)?)).await?;
    Ok(Json(location_response(row)))
}

pub async fn update_location(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    body: Bytes,
) -> Result<Json<LocationResponse>, ApiError> {
    let changes = read_location(&body)?;
    let row = blocking(&state, move |s| Ok(s.db.update_location(id, changes)?)).await?;
    Ok(Json(location_response(row)))
}

/// DELETE /loc/{id}/delete/: takes the location's users and their ads along.
pub async fn delete_location(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> Result<Json<StatusResponse>, ApiError> {
    let images = blocking(&state, move |s| Ok(s.db.delete_location(id)?)).await?;
    state.media.delete_all(&images).await;
    Ok(Json(StatusResponse::ok()))
}
