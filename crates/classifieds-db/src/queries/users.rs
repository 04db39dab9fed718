use rusqlite::{Connection, OptionalExtension, Row};
use tracing::info;

use super::{get_or_create_location, orphaned_images, page_bounds, role_column};
use crate::models::{NewUser, UserChanges, UserFields, UserRow, UserSummaryRow};
use crate::pagination::{Page, PageRequest};
use crate::validation::{validate_location_name, validate_user};
use crate::{Database, DbError, Result};

const USER_COLUMNS: &str =
    "u.id, u.first_name, u.last_name, u.username, u.password, u.role, u.age,
     u.location_id, l.name";

impl Database {
    /// Users with the number of published ads each one authored.
    pub fn list_users(&self, page: PageRequest) -> Result<Page<UserSummaryRow>> {
        self.with_conn(|conn| {
            let bounds = page_bounds(conn, "users", page)?;
            let sql = format!(
                "SELECT {}, COUNT(a.id) FILTER (WHERE a.is_published = 1)
                 FROM users u
                 JOIN locations l ON l.id = u.location_id
                 LEFT JOIN ads a ON a.author_id = u.id
                 GROUP BY u.id
                 ORDER BY u.id
                 LIMIT ?1 OFFSET ?2",
                USER_COLUMNS
            );

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    rusqlite::params![bounds.limit as i64, bounds.offset as i64],
                    |row| {
                        Ok(UserSummaryRow {
                            user: map_user(row)?,
                            ads_published: row.get(9)?,
                        })
                    },
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(bounds.into_page(rows))
        })
    }

    pub fn get_user(&self, id: i64) -> Result<UserRow> {
        self.with_conn(|conn| query_user(conn, id))
    }

    /// Resolves the location by name, validates, then inserts, all in one
    /// transaction so a rejected user leaves no stray location behind.
    pub fn create_user(&self, new: &NewUser) -> Result<UserRow> {
        self.with_tx(|tx| {
            let fields = UserFields::from(new);
            let location_id = resolve_location(tx, &new.location, &fields, None)?;

            tx.execute(
                "INSERT INTO users (first_name, last_name, username, password, role, age, location_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    fields.first_name,
                    fields.last_name,
                    fields.username,
                    fields.password_hash,
                    fields.role.as_str(),
                    fields.age,
                    location_id,
                ],
            )?;
            let id = tx.last_insert_rowid();

            info!("User {} created: {}", id, fields.username);
            query_user(tx, id)
        })
    }

    pub fn update_user(&self, id: i64, changes: &UserChanges) -> Result<UserRow> {
        self.with_tx(|tx| {
            let existing = query_user(tx, id)?;
            let mut fields = UserFields::from(&existing);
            fields.apply(changes);
            let location_id = resolve_location(tx, &changes.location, &fields, Some(id))?;

            tx.execute(
                "UPDATE users
                 SET first_name = ?1, last_name = ?2, username = ?3, password = ?4,
                     role = ?5, age = ?6, location_id = ?7
                 WHERE id = ?8",
                rusqlite::params![
                    fields.first_name,
                    fields.last_name,
                    fields.username,
                    fields.password_hash,
                    fields.role.as_str(),
                    fields.age,
                    location_id,
                    id,
                ],
            )?;

            info!("User {} updated", id);
            query_user(tx, id)
        })
    }

    /// Deletes a user and their ads. Returns the orphaned image paths.
    pub fn delete_user(&self, id: i64) -> Result<Vec<String>> {
        self.with_tx(|tx| {
            query_user(tx, id)?;
            let images = orphaned_images(tx, "a.author_id = ?1", id)?;
            tx.execute("DELETE FROM users WHERE id = ?1", [id])?;

            info!("User {} deleted ({} images orphaned)", id, images.len());
            Ok(images)
        })
    }
}

/// Get-or-creates the named location, then runs the full user validation.
/// Any failure aborts the surrounding transaction, location insert included.
fn resolve_location(
    conn: &Connection,
    location: &str,
    fields: &UserFields,
    user_id: Option<i64>,
) -> Result<i64> {
    let name_errors = validate_location_name(location);
    let location_id = match name_errors.is_empty() {
        true => Some(get_or_create_location(conn, location)?),
        false => None,
    };

    let mut errors = validate_user(conn, fields, user_id)?;
    errors.merge(name_errors);
    match location_id {
        Some(id) if errors.is_empty() => Ok(id),
        _ => Err(DbError::Validation(errors)),
    }
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        username: row.get(3)?,
        password_hash: row.get(4)?,
        role: role_column(row, 5)?,
        age: row.get(6)?,
        location_id: row.get(7)?,
        location_name: row.get(8)?,
    })
}

fn query_user(conn: &Connection, id: i64) -> Result<UserRow> {
    let sql = format!(
        "SELECT {} FROM users u JOIN locations l ON l.id = u.location_id WHERE u.id = ?1",
        USER_COLUMNS
    );
    conn.query_row(&sql, [id], map_user)
        .optional()?
        .ok_or(DbError::NotFound { entity: "User", id })
}
