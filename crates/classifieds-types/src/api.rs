use serde::{Deserialize, Serialize};

use crate::models::Role;

// -- Envelopes --

/// One page of a list endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub num_pages: u64,
    pub total: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

// -- Ads --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdResponse {
    pub id: i64,
    pub name: String,
    pub author_id: i64,
    /// Author's username.
    pub author: String,
    pub price: i64,
    pub description: String,
    pub is_published: bool,
    pub category_id: Option<i64>,
    pub category: Option<String>,
    /// Resolved media URL of the attached image.
    pub image: Option<String>,
}

// -- Categories --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
}

// -- Locations --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationResponse {
    pub id: i64,
    pub name: String,
    pub lat: String,
    pub lng: String,
}

// -- Users --

/// Public view of a user. The password hash is never part of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: String,
    pub role: Role,
    pub age: i64,
    pub location_id: i64,
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListItem {
    #[serde(flatten)]
    pub user: UserResponse,
    pub ads_published: u64,
}
