use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};
use tower_http::services::ServeDir;
use tracing::info;

use classifieds_types::api::StatusResponse;

use crate::state::AppState;
use crate::{ads, categories, locations, users};

/// GET /
pub async fn index() -> Json<StatusResponse> {
    Json(StatusResponse::ok())
}

/// Every route of the service. Media files are mounted only in debug mode.
pub fn router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    let mut app = Router::new()
        .route("/", get(index))
        // Ads
        .route("/ad/", get(ads::list_ads))
        .route("/ad/create/", post(ads::create_ad))
        .route("/ad/{id}/", get(ads::get_ad))
        .route("/ad/{id}/update/", post(ads::update_ad).patch(ads::update_ad))
        .route("/ad/{id}/delete/", delete(ads::delete_ad))
        .route("/ad/{id}/upload_image/", post(ads::upload_image).layer(upload_limit))
        // Categories
        .route("/cat/", get(categories::list_categories))
        .route("/cat/create/", post(categories::create_category))
        .route("/cat/{id}/", get(categories::get_category))
        .route(
            "/cat/{id}/update/",
            post(categories::update_category).patch(categories::update_category),
        )
        .route("/cat/{id}/delete/", delete(categories::delete_category))
        // Locations
        .route("/loc/", get(locations::list_locations))
        .route("/loc/create/", post(locations::create_location))
        .route("/loc/{id}/", get(locations::get_location))
        .route(
            "/loc/{id}/update/",
            post(locations::update_location).patch(locations::update_location),
        )
        .route("/loc/{id}/delete/", delete(locations::delete_location))
        // Users
        .route("/user/", get(users::list_users))
        .route("/user/create/", post(users::create_user))
        .route("/user/{id}/", get(users::get_user))
        .route("/user/{id}/update/", post(users::update_user).patch(users::update_user))
        .route("/user/{id}/delete/", delete(users::delete_user));

    if state.config.debug {
        info!(
            "Serving media from {} at {}",
            state.config.media_root.display(),
            state.config.media_url
        );
        app = app.nest_service(
            &state.config.media_url,
            ServeDir::new(&state.config.media_root),
        );
    }

    app.with_state(state)
}
