use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use super::page_bounds;
use crate::models::CategoryRow;
use crate::pagination::{Page, PageRequest};
use crate::validation::validate_category;
use crate::{Database, DbError, Result};

impl Database {
    pub fn list_categories(&self, page: PageRequest) -> Result<Page<CategoryRow>> {
        self.with_conn(|conn| {
            let bounds = page_bounds(conn, "categories", page)?;
            let mut stmt =
                conn.prepare("SELECT id, name FROM categories ORDER BY id LIMIT ?1 OFFSET ?2")?;
            let rows = stmt
                .query_map(
                    rusqlite::params![bounds.limit as i64, bounds.offset as i64],
                    |row| {
                        Ok(CategoryRow {
                            id: row.get(0)?,
                            name: row.get(1)?,
                        })
                    },
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(bounds.into_page(rows))
        })
    }

    pub fn get_category(&self, id: i64) -> Result<CategoryRow> {
        self.with_conn(|conn| query_category(conn, id))
    }

    pub fn create_category(&self, name: &str) -> Result<CategoryRow> {
        validate_category(name).into_result()?;

        self.with_conn(|conn| {
            conn.execute("INSERT INTO categories (name) VALUES (?1)", [name])?;
            let id = conn.last_insert_rowid();

            info!("Category {} created: {}", id, name);
            query_category(conn, id)
        })
    }

    pub fn update_category(&self, id: i64, name: &str) -> Result<CategoryRow> {
        self.with_tx(|tx| {
            query_category(tx, id)?;
            validate_category(name).into_result()?;

            tx.execute(
                "UPDATE categories SET name = ?1 WHERE id = ?2",
                rusqlite::params![name, id],
            )?;

            info!("Category {} renamed to {}", id, name);
            query_category(tx, id)
        })
    }

    /// Ads in the category survive with no category.
    pub fn delete_category(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM categories WHERE id = ?1", [id])?;
            if deleted == 0 {
                return Err(DbError::NotFound { entity: "Category", id });
            }

            info!("Category {} deleted", id);
            Ok(())
        })
    }
}

fn query_category(conn: &Connection, id: i64) -> Result<CategoryRow> {
    conn.query_row("SELECT id, name FROM categories WHERE id = ?1", [id], |row| {
        Ok(CategoryRow {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })
    .optional()?
    .ok_or(DbError::NotFound { entity: "Category", id })
}

#[cfg(test)]
mod tests {
    use crate::DbError;
    use crate::pagination::PageRequest;
    use crate::queries::fixtures;

    #[test]
    fn crud_round() {
        let db = fixtures::db();
        let created = db.create_category("Books").unwrap();
        assert_eq!(db.get_category(created.id).unwrap().name, "Books");

        let renamed = db.update_category(created.id, "Comics").unwrap();
        assert_eq!(renamed.name, "Comics");

        db.delete_category(created.id).unwrap();
        assert!(matches!(
            db.get_category(created.id),
            Err(DbError::NotFound { entity: "Category", .. })
        ));
    }

    #[test]
    fn blank_name_is_rejected() {
        let db = fixtures::db();
        let err = db.create_category("").unwrap_err();
        let DbError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.contains("name"));
        assert_eq!(db.list_categories(PageRequest::new(None, 10)).unwrap().total, 0);
    }

    #[test]
    fn update_of_missing_category_is_not_found() {
        let db = fixtures::db();
        assert!(matches!(
            db.update_category(5, "Cars"),
            Err(DbError::NotFound { id: 5, .. })
        ));
    }
}
