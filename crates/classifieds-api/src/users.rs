use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
};
use classifieds_db::models::{NewUser, UserChanges, UserRow, UserSummaryRow};
use classifieds_db::validation::check_text;
use classifieds_types::api::{ListResponse, StatusResponse, UserListItem, UserResponse};
use classifieds_types::models::Role;

use crate::body::JsonBody;
use crate::error::ApiError;
use crate::extract::IdPath;
use crate::listing::{PageQuery, list_response};
use crate::state::{AppState, blocking};

const PASSWORD_MAX: usize = 128;

fn user_response(row: UserRow) -> UserResponse {
    UserResponse {
        id: row.id,
        first_name: row.first_name,
        last_name: row.last_name,
        username: row.username,
        role: row.role,
        age: row.age,
        location_id: row.location_id,
        location: row.location_name,
    }
}

fn user_list_item(row: UserSummaryRow) -> UserListItem {
    UserListItem {
        user: user_response(row.user),
        ads_published: row.ads_published as u64,
    }
}

/// Argon2id with a random salt. Blocking; call from a blocking task.
fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))
}

fn read_password(body: &mut JsonBody, required: bool) -> Option<String> {
    let password = match required {
        true => body.required_text("password"),
        false => body.optional_text("password"),
    };
    let password = password?;
    check_text(body.errors_mut(), "password", &password, PASSWORD_MAX);
    Some(password)
}

fn read_role(body: &mut JsonBody) -> Option<Role> {
    let raw = body.optional_text("role")?;
    match raw.parse() {
        Ok(role) => Some(role),
        Err(e) => {
            body.errors_mut().add("role", e.to_string());
            None
        }
    }
}

/// GET /user/: users with their published ad counts.
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListResponse<UserListItem>>, ApiError> {
    let page = query.request(&state.config);
    let rows = blocking(&state, move |s| Ok(s.db.list_users(page)?)).await?;
    Ok(Json(list_response(rows, user_list_item)))
}

/// GET /user/{id}/
pub async fn get_user(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> Result<Json<UserResponse>, ApiError> {
    let row = blocking(&state, move |s| Ok(s.db.get_user(id)?)).await?;
    Ok(Json(user_response(row)))
}

/// POST /user/create/: `location` is a location name, created on demand.
pub async fn create_user(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<UserResponse>, ApiError> {
    let mut body = JsonBody::parse(&body)?;
    let required = (
        body.required_text("first_name"),
        body.required_text("username"),
        read_password(&mut body, true),
        body.required_int("age"),
        body.required_text("location"),
    );
    let last_name = body.nullable_text("last_name").flatten();
    let role = read_role(&mut body).unwrap_or_default();

    let (Some(first_name), Some(username), Some(password), Some(age), Some(location)) = required
    else {
        return Err(body.reject());
    };
    body.finish()?;

    let row = blocking(&state, move |s| {
        let new = NewUser {
            first_name,
            last_name,
            username,
            password_hash: hash_password(&password)?,
            role,
            age,
            location,
        };
        Ok(s.db.create_user(&new)?)
    })
    .await?;

    Ok(Json(user_response(row)))
}

/// POST /user/{id}/update/: `last_name`, `password` and `role` are only
/// touched when present.
pub async fn update_user(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    body: Bytes,
) -> Result<Json<UserResponse>, ApiError> {
    let mut body = JsonBody::parse(&body)?;
    let required = (
        body.required_text("first_name"),
        body.required_text("username"),
        body.required_int("age"),
        body.required_text("location"),
    );
    let last_name = body.nullable_text("last_name");
    let password = read_password(&mut body, false);
    let role = read_role(&mut body);

    let (Some(first_name), Some(username), Some(age), Some(location)) = required else {
        return Err(body.reject());
    };
    body.finish()?;

    let row = blocking(&state, move |s| {
        let changes = UserChanges {
            first_name,
            last_name,
            username,
            password_hash: password.as_deref().map(hash_password).transpose()?,
            role,
            age,
            location,
        };
        Ok(s.db.update_user(id, &changes)?)
    })
    .await?;

    Ok(Json(user_response(row)))
}

/// DELETE /user/{id}/delete/: the user's ads go with them.
pub async fn delete_user(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> Result<Json<StatusResponse>, ApiError> {
    let images = blocking(&state, move |s| Ok(s.db.delete_user(id)?)).await?;
    state.media.delete_all(&images).await;
    Ok(Json(StatusResponse::ok()))
}
