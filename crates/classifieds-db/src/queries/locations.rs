use rusqlite::{Connection, OptionalExtension, Row};
use tracing::{debug, info};

use super::{orphaned_images, page_bounds};
use crate::models::{LocationChanges, LocationFields, LocationRow};
use crate::pagination::{Page, PageRequest};
use crate::validation::validate_location;
use crate::{Database, DbError, Result};

impl Database {
    pub fn list_locations(&self, page: PageRequest) -> Result<Page<LocationRow>> {
        self.with_conn(|conn| {
            let bounds = page_bounds(conn, "locations", page)?;
            let mut stmt = conn.prepare(
                "SELECT id, name, lat, lng FROM locations ORDER BY id LIMIT ?1 OFFSET ?2",
            )?;
            let rows = stmt
                .query_map(
                    rusqlite::params![bounds.limit as i64, bounds.offset as i64],
                    map_location,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(bounds.into_page(rows))
        })
    }

    pub fn get_location(&self, id: i64) -> Result<LocationRow> {
        self.with_conn(|conn| query_location(conn, id))
    }

    pub fn create_location(&self, fields: &LocationFields) -> Result<LocationRow> {
        validate_location(fields).into_result()?;

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO locations (name, lat, lng) VALUES (?1, ?2, ?3)",
                (&fields.name, &fields.lat, &fields.lng),
            )?;
            let id = conn.last_insert_rowid();

            info!("Location {} created: {}", id, fields.name);
            query_location(conn, id)
        })
    }

    pub fn update_location(&self, id: i64, changes: LocationChanges) -> Result<LocationRow> {
        self.with_tx(|tx| {
            let existing = query_location(tx, id)?;
            let fields = LocationFields {
                name: changes.name,
                lat: changes.lat.unwrap_or(existing.lat),
                lng: changes.lng.unwrap_or(existing.lng),
            };
            validate_location(&fields).into_result()?;

            tx.execute(
                "UPDATE locations SET name = ?1, lat = ?2, lng = ?3 WHERE id = ?4",
                rusqlite::params![fields.name, fields.lat, fields.lng, id],
            )?;

            info!("Location {} updated", id);
            query_location(tx, id)
        })
    }

    /// Deletes a location together with its users and their ads.
    /// Returns the image paths of the ads that went with them.
    pub fn delete_location(&self, id: i64) -> Result<Vec<String>> {
        self.with_tx(|tx| {
            query_location(tx, id)?;
            let images = orphaned_images(tx, "u.location_id = ?1", id)?;
            tx.execute("DELETE FROM locations WHERE id = ?1", [id])?;

            info!("Location {} deleted ({} images orphaned)", id, images.len());
            Ok(images)
        })
    }
}

/// Returns the id of the oldest location called `name`, inserting one with
/// empty coordinates when none exists.
pub fn get_or_create_location(conn: &Connection, name: &str) -> Result<i64> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM locations WHERE name = ?1 ORDER BY id LIMIT 1",
            [name],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(id) = existing {
        return Ok(id);
    }

    conn.execute("INSERT INTO locations (name) VALUES (?1)", [name])?;
    let id = conn.last_insert_rowid();
    debug!("Location {} created on demand: {}", id, name);
    Ok(id)
}

fn map_location(row: &Row<'_>) -> rusqlite::Result<LocationRow> {
    Ok(LocationRow {
        id: row.get(0)?,
        name: row.get(1)?,
        lat: row.get(2)?,
        lng: row.get(3)?,
    })
}

fn query_location(conn: &Connection, id: i64) -> Result<LocationRow> {
    conn.query_row(
        "SELECT id, name, lat, lng FROM locations WHERE id = ?1",
        [id],
        map_location,
    )
    .optional()?
    .ok_or(DbError::NotFound { entity: "Location", id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::fixtures;

    #[test]
    fn get_or_create_reuses_existing_rows() {
        let db = fixtures::db();
        let first = db.with_conn(|conn| get_or_create_location(conn, "Kazan")).unwrap();
        let second = db.with_conn(|conn| get_or_create_location(conn, "Kazan")).unwrap();
        let other = db.with_conn(|conn| get_or_create_location(conn, "Omsk")).unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(db.list_locations(PageRequest::new(None, 10)).unwrap().total, 2);
    }

    #[test]
    fn update_keeps_coordinates_unless_given() {
        let db = fixtures::db();
        let created = db
            .create_location(&LocationFields {
                name: "Sochi".into(),
                lat: "43.58".into(),
                lng: "39.72".into(),
            })
            .unwrap();

        let updated = db
            .update_location(
                created.id,
                LocationChanges {
                    name: "Sochi city".into(),
                    lat: None,
                    lng: Some("39.73".into()),
                },
            )
            .unwrap();

        assert_eq!(updated.name, "Sochi city");
        assert_eq!(updated.lat, "43.58");
        assert_eq!(updated.lng, "39.73");
    }

    #[test]
    fn overlong_coordinates_are_rejected() {
        let db = fixtures::db();
        let err = db
            .create_location(&LocationFields {
                name: "Nowhere".into(),
                lat: "1".repeat(31),
                lng: String::new(),
            })
            .unwrap_err();

        let DbError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.contains("lat"));
        assert!(!errors.contains("lng"));
    }

    #[test]
    fn delete_cascades_to_users_and_ads() {
        let db = fixtures::db();
        let user = fixtures::user(&db, "local", "Tver");
        let bystander = fixtures::user(&db, "other", "Pskov");
        let ad = db.create_ad(&fixtures::new_ad("Sofa", user.id, 900)).unwrap();
        db.set_ad_image(ad.id, "images/sofa.jpg").unwrap();

        let images = db.delete_location(user.location_id).unwrap();

        assert_eq!(images, ["images/sofa.jpg"]);
        assert!(matches!(db.get_user(user.id), Err(DbError::NotFound { .. })));
        assert!(matches!(db.get_ad(ad.id), Err(DbError::NotFound { .. })));
        assert!(db.get_user(bystander.id).is_ok());
    }
}
