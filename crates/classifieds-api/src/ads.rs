use axum::{
    Json,
    body::Bytes,
    extract::{
        Multipart, Query, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
};
use tracing::{info, warn};

use classifieds_db::models::{AdChanges, AdRow, NewAd};
use classifieds_types::api::{AdResponse, ListResponse, StatusResponse};

use crate::body::JsonBody;
use crate::error::ApiError;
use crate::extract::IdPath;
use crate::listing::{PageQuery, list_response};
use crate::media::{self, MediaStorage};
use crate::state::{AppState, blocking};

/// Multipart field carrying the uploaded file.
const IMAGE_FIELD: &str = "image";

pub fn ad_response(media: &MediaStorage, row: AdRow) -> AdResponse {
    AdResponse {
        id: row.id,
        name: row.name,
        author_id: row.author_id,
        author: row.author_username,
        price: row.price,
        description: row.description,
        is_published: row.is_published,
        category_id: row.category_id,
        category: row.category_name,
        image: row.image.as_deref().map(|path| media.url(path)),
    }
}

/// GET /ad/: ads by price, most expensive first.
pub async fn list_ads(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListResponse<AdResponse>>, ApiError> {
    let page = query.request(&state.config);
    let rows = blocking(&state, move |s| Ok(s.db.list_ads(page)?)).await?;

    Ok(Json(list_response(rows, |row| ad_response(&state.media, row))))
}

/// GET /ad/{id}/
pub async fn get_ad(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> Result<Json<AdResponse>, ApiError> {
    let row = blocking(&state, move |s| Ok(s.db.get_ad(id)?)).await?;
    Ok(Json(ad_response(&state.media, row)))
}

/// POST /ad/create/: the new ad is published whatever the body says.
pub async fn create_ad(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AdResponse>, ApiError> {
    let mut body = JsonBody::parse(&body)?;
    let required = (
        body.required_text("name"),
        body.required_int("author"),
        body.required_int("price"),
        body.required_text("description"),
    );
    let category_id = body.nullable_int("category").flatten();

    let (Some(name), Some(author_id), Some(price), Some(description)) = required else {
        return Err(body.reject());
    };
    body.finish()?;

    let new = NewAd {
        name,
        author_id,
        price,
        description,
        category_id,
    };
    let row = blocking(&state, move |s| Ok(s.db.create_ad(&new)?)).await?;

    Ok(Json(ad_response(&state.media, row)))
}

/// POST /ad/{id}/update/: overwrites name, author, price and description;
/// category and is_published only when present.
pub async fn update_ad(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    body: Bytes,
) -> Result<Json<AdResponse>, ApiError> {
    let mut body = JsonBody::parse(&body)?;
    let required = (
        body.required_text("name"),
        body.required_int("author"),
        body.required_int("price"),
        body.required_text("description"),
    );
    let category_id = body.nullable_int("category");
    let is_published = body.optional_bool("is_published");

    let (Some(name), Some(author_id), Some(price), Some(description)) = required else {
        return Err(body.reject());
    };
    body.finish()?;

    let changes = AdChanges {
        name,
        author_id,
        price,
        description,
        category_id,
        is_published,
    };
    let row = blocking(&state, move |s| Ok(s.db.update_ad(id, changes)?)).await?;

    Ok(Json(ad_response(&state.media, row)))
}

/// DELETE /ad/{id}/delete/
pub async fn delete_ad(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> Result<Json<StatusResponse>, ApiError> {
    let image = blocking(&state, move |s| Ok(s.db.delete_ad(id)?)).await?;

    if let Some(image) = image {
        state.media.delete_all(&[image]).await;
    }

    Ok(Json(StatusResponse::ok()))
}

/// POST /ad/{id}/upload_image/: multipart form with an `image` file.
pub async fn upload_image(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AdResponse>, ApiError> {
    let mut multipart = multipart.map_err(|rejection| {
        warn!("Rejected upload body: {}", rejection.body_text());
        ApiError::BadRequest(rejection.body_text())
    })?;
    // 404 before touching the disk
    blocking(&state, move |s| Ok(s.db.get_ad(id)?)).await?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, state.config.max_upload_bytes))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, state.config.max_upload_bytes))?;
        upload = Some((file_name, data));
    }

    let Some((file_name, data)) = upload else {
        return Err(ApiError::field(IMAGE_FIELD, "No file was submitted."));
    };
    if data.is_empty() {
        return Err(ApiError::field(IMAGE_FIELD, "The submitted file is empty."));
    }
    let extension = media::image_extension(file_name.as_deref())
        .map_err(|message| ApiError::field(IMAGE_FIELD, message))?;

    let stored = state.media.save_image(&extension, &data).await?;

    let path = stored.clone();
    let result = blocking(&state, move |s| Ok(s.db.set_ad_image(id, &path)?)).await;
    let (row, previous) = match result {
        Ok(updated) => updated,
        Err(e) => {
            // The ad vanished between the check and the write
            state.media.delete_all(&[stored]).await;
            return Err(e);
        }
    };

    if let Some(previous) = previous {
        state.media.delete_all(&[previous]).await;
    }

    info!("Ad {} image uploaded ({} bytes)", id, data.len());
    Ok(Json(ad_response(&state.media, row)))
}

fn multipart_error(e: MultipartError, limit: usize) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::PayloadTooLarge(limit);
    }
    warn!("Rejected multipart body: {}", e);
    ApiError::BadRequest(e.body_text())
}
