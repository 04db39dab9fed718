mod ads;
mod categories;
mod locations;
mod users;

pub use locations::get_or_create_location;

use rusqlite::{Connection, Row};

use classifieds_types::models::Role;

use crate::Result;
use crate::pagination::{PageBounds, PageRequest};

fn count_rows(conn: &Connection, table: &str) -> Result<u64> {
    let sql = format!("SELECT COUNT(*) FROM {}", table);
    let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(count as u64)
}

/// Counts `table` and resolves the requested page against that total.
fn page_bounds(conn: &Connection, table: &str, page: PageRequest) -> Result<PageBounds> {
    let total = count_rows(conn, table)?;
    Ok(page.resolve(total))
}

fn role_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Role> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Images referenced by ads matching `filter`, collected before a cascading
/// delete removes the rows.
fn orphaned_images(conn: &Connection, filter: &str, id: i64) -> Result<Vec<String>> {
    let sql = format!(
        "SELECT a.image FROM ads a JOIN users u ON u.id = a.author_id
         WHERE a.image IS NOT NULL AND {}",
        filter
    );
    let mut stmt = conn.prepare(&sql)?;
    let images = stmt
        .query_map([id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(images)
}
