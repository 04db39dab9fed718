use rusqlite::{Connection, OptionalExtension, Row};
use tracing::info;

use super::page_bounds;
use crate::models::{AdChanges, AdFields, AdRow, NewAd};
use crate::pagination::{Page, PageRequest};
use crate::validation::validate_ad;
use crate::{Database, DbError, Result};

// Author and category are joined in so list pages cost a single query
const AD_SELECT: &str =
    "SELECT a.id, a.name, a.author_id, u.username, a.price, a.description,
            a.is_published, a.category_id, c.name, a.image
     FROM ads a
     JOIN users u ON u.id = a.author_id
     LEFT JOIN categories c ON c.id = a.category_id";

impl Database {
    /// Ads ordered by price, most expensive first.
    pub fn list_ads(&self, page: PageRequest) -> Result<Page<AdRow>> {
        self.with_conn(|conn| {
            let bounds = page_bounds(conn, "ads", page)?;
            let sql = format!("{} ORDER BY a.price DESC, a.id ASC LIMIT ?1 OFFSET ?2", AD_SELECT);

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    rusqlite::params![bounds.limit as i64, bounds.offset as i64],
                    map_ad,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(bounds.into_page(rows))
        })
    }

    pub fn get_ad(&self, id: i64) -> Result<AdRow> {
        self.with_conn(|conn| query_ad(conn, id))
    }

    /// Inserts a new ad. New ads are always published.
    pub fn create_ad(&self, new: &NewAd) -> Result<AdRow> {
        self.with_tx(|tx| {
            let fields = AdFields {
                name: new.name.clone(),
                author_id: new.author_id,
                price: new.price,
                description: new.description.clone(),
                is_published: true,
                category_id: new.category_id,
            };
            validate_ad(tx, &fields)?.into_result()?;

            tx.execute(
                "INSERT INTO ads (name, author_id, price, description, is_published, category_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    fields.name,
                    fields.author_id,
                    fields.price,
                    fields.description,
                    fields.is_published,
                    fields.category_id,
                ],
            )?;
            let id = tx.last_insert_rowid();

            info!("Ad {} created by user {}", id, fields.author_id);
            query_ad(tx, id)
        })
    }

    pub fn update_ad(&self, id: i64, changes: AdChanges) -> Result<AdRow> {
        self.with_tx(|tx| {
            let existing = query_ad(tx, id)?;
            let mut fields = AdFields::from(&existing);
            fields.apply(changes);
            validate_ad(tx, &fields)?.into_result()?;

            tx.execute(
                "UPDATE ads
                 SET name = ?1, author_id = ?2, price = ?3, description = ?4,
                     is_published = ?5, category_id = ?6
                 WHERE id = ?7",
                rusqlite::params![
                    fields.name,
                    fields.author_id,
                    fields.price,
                    fields.description,
                    fields.is_published,
                    fields.category_id,
                    id,
                ],
            )?;

            info!("Ad {} updated", id);
            query_ad(tx, id)
        })
    }

    /// Deletes an ad and returns the image path it referenced, if any.
    pub fn delete_ad(&self, id: i64) -> Result<Option<String>> {
        self.with_tx(|tx| {
            let image = query_image(tx, id)?;
            tx.execute("DELETE FROM ads WHERE id = ?1", [id])?;

            info!("Ad {} deleted", id);
            Ok(image)
        })
    }

    /// Points the ad at a newly stored image and returns the updated row
    /// together with the path of the image it replaced.
    pub fn set_ad_image(&self, id: i64, image: &str) -> Result<(AdRow, Option<String>)> {
        self.with_tx(|tx| {
            let previous = query_image(tx, id)?;
            tx.execute(
                "UPDATE ads SET image = ?1 WHERE id = ?2",
                rusqlite::params![image, id],
            )?;

            info!("Ad {} image set to {}", id, image);
            Ok((query_ad(tx, id)?, previous))
        })
    }
}

fn map_ad(row: &Row<'_>) -> rusqlite::Result<AdRow> {
    Ok(AdRow {
        id: row.get(0)?,
        name: row.get(1)?,
        author_id: row.get(2)?,
        author_username: row.get(3)?,
        price: row.get(4)?,
        description: row.get(5)?,
        is_published: row.get(6)?,
        category_id: row.get(7)?,
        category_name: row.get(8)?,
        image: row.get(9)?,
    })
}

fn query_ad(conn: &Connection, id: i64) -> Result<AdRow> {
    let sql = format!("{} WHERE a.id = ?1", AD_SELECT);
    conn.query_row(&sql, [id], map_ad)
        .optional()?
        .ok_or(DbError::NotFound { entity: "Ad", id })
}

fn query_image(conn: &Connection, id: i64) -> Result<Option<String>> {
    conn.query_row("SELECT image FROM ads WHERE id = ?1", [id], |row| {
        row.get::<_, Option<String>>(0)
    })
    .optional()?
    .ok_or(DbError::NotFound { entity: "Ad", id })
}
