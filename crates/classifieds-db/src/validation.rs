//! Model-level validation run before every insert or update.
//!
//! Pure field checks produce [`FieldErrors`]; relational checks (foreign
//! keys, uniqueness) read through the connection that will perform the write,
//! so they see the same transaction.

use classifieds_types::errors::FieldErrors;
use rusqlite::{Connection, OptionalExtension};

use crate::Result;
use crate::models::{AdFields, LocationFields, UserFields};

pub const LOCATION_NAME_MAX: usize = 100;
pub const COORDINATE_MAX: usize = 30;
pub const CATEGORY_NAME_MAX: usize = 100;
pub const AD_NAME_MAX: usize = 100;
pub const FIRST_NAME_MAX: usize = 20;
pub const LAST_NAME_MAX: usize = 20;
pub const USERNAME_MAX: usize = 40;
pub const AGE_MAX: i64 = 32767;

pub const BLANK: &str = "This field cannot be blank.";

fn too_long(max: usize, len: usize) -> String {
    format!("Ensure this value has at most {} characters (it has {}).", max, len)
}

/// Non-blank text of at most `max` characters.
pub fn check_text(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    if value.trim().is_empty() {
        errors.add(field, BLANK);
        return;
    }
    check_length(errors, field, value, max);
}

/// Text that may be empty but not longer than `max` characters.
pub fn check_length(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        errors.add(field, too_long(max, len));
    }
}

pub fn check_range(errors: &mut FieldErrors, field: &str, value: i64, min: i64, max: i64) {
    if value < min {
        errors.add(field, format!("Ensure this value is greater than or equal to {}.", min));
    } else if value > max {
        errors.add(field, format!("Ensure this value is less than or equal to {}.", max));
    }
}

pub fn validate_location(fields: &LocationFields) -> FieldErrors {
    let mut errors = FieldErrors::new();
    check_text(&mut errors, "name", &fields.name, LOCATION_NAME_MAX);
    check_length(&mut errors, "lat", &fields.lat, COORDINATE_MAX);
    check_length(&mut errors, "lng", &fields.lng, COORDINATE_MAX);
    errors
}

pub fn validate_category(name: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    check_text(&mut errors, "name", name, CATEGORY_NAME_MAX);
    errors
}

pub fn validate_ad(conn: &Connection, fields: &AdFields) -> Result<FieldErrors> {
    let mut errors = FieldErrors::new();
    check_text(&mut errors, "name", &fields.name, AD_NAME_MAX);
    check_range(&mut errors, "price", fields.price, 0, i64::MAX);

    if !row_exists(conn, "users", fields.author_id)? {
        errors.add("author", format!("User with id {} does not exist.", fields.author_id));
    }
    if let Some(category_id) = fields.category_id {
        if !row_exists(conn, "categories", category_id)? {
            errors.add("category", format!("Category with id {} does not exist.", category_id));
        }
    }

    Ok(errors)
}

/// `user_id` is the row being updated, excluded from the uniqueness check.
pub fn validate_user(
    conn: &Connection,
    fields: &UserFields,
    user_id: Option<i64>,
) -> Result<FieldErrors> {
    let mut errors = FieldErrors::new();
    check_text(&mut errors, "first_name", &fields.first_name, FIRST_NAME_MAX);
    if let Some(last_name) = &fields.last_name {
        check_length(&mut errors, "last_name", last_name, LAST_NAME_MAX);
    }
    check_text(&mut errors, "username", &fields.username, USERNAME_MAX);
    if fields.password_hash.is_empty() {
        errors.add("password", BLANK);
    }
    check_range(&mut errors, "age", fields.age, 0, AGE_MAX);

    if !errors.contains("username") {
        let taken: Option<i64> = conn
            .query_row(
                "SELECT id FROM users WHERE username = ?1",
                [&fields.username],
                |row| row.get(0),
            )
            .optional()?;
        if taken.is_some_and(|id| Some(id) != user_id) {
            errors.add("username", "User with this username already exists.");
        }
    }

    Ok(errors)
}

/// Validates the location name a user refers to; errors are keyed `location`.
pub fn validate_location_name(name: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    check_text(&mut errors, "location", name, LOCATION_NAME_MAX);
    errors
}

fn row_exists(conn: &Connection, table: &str, id: i64) -> Result<bool> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", table);
    let exists: bool = conn.query_row(&sql, [id], |row| row.get(0))?;
    Ok(exists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use classifieds_types::models::Role;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::migrations::run(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO locations (name) VALUES ('Moscow');
             INSERT INTO users (first_name, username, password, age, location_id)
                 VALUES ('Ivan', 'ivan', 'hash', 30, 1);",
        )
        .unwrap();
        conn
    }

    fn user_fields(username: &str) -> UserFields {
        UserFields {
            first_name: "Petr".into(),
            last_name: None,
            username: username.into(),
            password_hash: "hash".into(),
            role: Role::Member,
            age: 41,
        }
    }

    #[test]
    fn blank_and_long_text_are_rejected() {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "name", "   ", 10);
        check_text(&mut errors, "title", "abcdefghijk", 10);
        check_text(&mut errors, "ok", "fine", 10);

        assert_eq!(errors.get("name"), Some(&[BLANK.to_string()][..]));
        assert_eq!(
            errors.get("title").unwrap()[0],
            "Ensure this value has at most 10 characters (it has 11)."
        );
        assert!(!errors.contains("ok"));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let mut errors = FieldErrors::new();
        check_length(&mut errors, "name", "Москва", 6);
        assert!(errors.is_empty());
    }

    #[test]
    fn ad_requires_existing_author_and_category() {
        let conn = conn();
        let fields = AdFields {
            name: "Bike".into(),
            author_id: 99,
            price: -5,
            description: String::new(),
            is_published: true,
            category_id: Some(7),
        };

        let errors = validate_ad(&conn, &fields).unwrap();
        assert!(errors.contains("author"));
        assert!(errors.contains("category"));
        assert!(errors.contains("price"));
        assert!(!errors.contains("name"));
    }

    #[test]
    fn username_must_be_unique_except_for_self() {
        let conn = conn();

        let errors = validate_user(&conn, &user_fields("ivan"), None).unwrap();
        assert!(errors.contains("username"));

        let errors = validate_user(&conn, &user_fields("ivan"), Some(1)).unwrap();
        assert!(errors.is_empty());
    }

    #[test]
    fn age_is_bounded() {
        let conn = conn();
        let mut fields = user_fields("petr");
        fields.age = 40000;

        let errors = validate_user(&conn, &fields, None).unwrap();
        assert_eq!(
            errors.get("age").unwrap()[0],
            "Ensure this value is less than or equal to 32767."
        );
    }
}
