//! Database row types, mapped directly from SQLite rows.
//! Kept apart from the classifieds-types API models so the DB layer stands alone.

use classifieds_types::models::Role;

#[derive(Debug, Clone, PartialEq)]
pub struct LocationRow {
    pub id: i64,
    pub name: String,
    pub lat: String,
    pub lng: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
}

/// An ad with its author and category already joined in.
#[derive(Debug, Clone, PartialEq)]
pub struct AdRow {
    pub id: i64,
    pub name: String,
    pub author_id: i64,
    pub author_username: String,
    pub price: i64,
    pub description: String,
    pub is_published: bool,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    /// Path relative to the media root.
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub age: i64,
    pub location_id: i64,
    pub location_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserSummaryRow {
    pub user: UserRow,
    pub ads_published: i64,
}

// -- Write inputs --

#[derive(Debug, Clone, Default)]
pub struct LocationFields {
    pub name: String,
    pub lat: String,
    pub lng: String,
}

/// Fields a location update may touch. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct LocationChanges {
    pub name: String,
    pub lat: Option<String>,
    pub lng: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewAd {
    pub name: String,
    pub author_id: i64,
    pub price: i64,
    pub description: String,
    pub category_id: Option<i64>,
}

/// The four always-overwritten fields plus the optional ones.
#[derive(Debug, Clone)]
pub struct AdChanges {
    pub name: String,
    pub author_id: i64,
    pub price: i64,
    pub description: String,
    /// `Some(None)` detaches the category.
    pub category_id: Option<Option<i64>>,
    pub is_published: Option<bool>,
}

/// Complete column set of an ad, validated before every write.
#[derive(Debug, Clone)]
pub struct AdFields {
    pub name: String,
    pub author_id: i64,
    pub price: i64,
    pub description: String,
    pub is_published: bool,
    pub category_id: Option<i64>,
}

impl AdFields {
    pub fn apply(&mut self, changes: AdChanges) {
        self.name = changes.name;
        self.author_id = changes.author_id;
        self.price = changes.price;
        self.description = changes.description;
        if let Some(category_id) = changes.category_id {
            self.category_id = category_id;
        }
        if let Some(is_published) = changes.is_published {
            self.is_published = is_published;
        }
    }
}

impl From<&AdRow> for AdFields {
    fn from(row: &AdRow) -> Self {
        Self {
            name: row.name.clone(),
            author_id: row.author_id,
            price: row.price,
            description: row.description.clone(),
            is_published: row.is_published,
            category_id: row.category_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub age: i64,
    /// Location name, resolved with get-or-create.
    pub location: String,
}

#[derive(Debug, Clone)]
pub struct UserChanges {
    pub first_name: String,
    /// `Some(None)` clears the last name.
    pub last_name: Option<Option<String>>,
    pub username: String,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub age: i64,
    pub location: String,
}

/// Complete column set of a user, validated before every write.
#[derive(Debug, Clone)]
pub struct UserFields {
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub age: i64,
}

impl UserFields {
    pub fn apply(&mut self, changes: &UserChanges) {
        self.first_name = changes.first_name.clone();
        if let Some(last_name) = &changes.last_name {
            self.last_name = last_name.clone();
        }
        self.username = changes.username.clone();
        if let Some(hash) = &changes.password_hash {
            self.password_hash = hash.clone();
        }
        if let Some(role) = changes.role {
            self.role = role;
        }
        self.age = changes.age;
    }
}

impl From<&UserRow> for UserFields {
    fn from(row: &UserRow) -> Self {
        Self {
            first_name: row.first_name.clone(),
            last_name: row.last_name.clone(),
            username: row.username.clone(),
            password_hash: row.password_hash.clone(),
            role: row.role,
            age: row.age,
        }
    }
}

impl From<&NewUser> for UserFields {
    fn from(new: &NewUser) -> Self {
        Self {
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            username: new.username.clone(),
            password_hash: new.password_hash.clone(),
            role: new.role,
            age: new.age,
        }
    }
}
