use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);"
    )?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE locations (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                name    TEXT NOT NULL,
                lat     TEXT NOT NULL DEFAULT '',
                lng     TEXT NOT NULL DEFAULT ''
            );

            CREATE INDEX idx_locations_name ON locations(name);

            CREATE TABLE categories (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                name    TEXT NOT NULL
            );

            CREATE TABLE users (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                first_name  TEXT NOT NULL,
                last_name   TEXT,
                username    TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                role        TEXT NOT NULL DEFAULT 'member'
                            CHECK (role IN ('member', 'moderator', 'admin')),
                age         INTEGER NOT NULL CHECK (age BETWEEN 0 AND 32767),
                location_id INTEGER NOT NULL REFERENCES locations(id) ON DELETE CASCADE
            );

            CREATE INDEX idx_users_location ON users(location_id);

            CREATE TABLE ads (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                name         TEXT NOT NULL,
                author_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                price        INTEGER NOT NULL CHECK (price >= 0),
                description  TEXT NOT NULL DEFAULT '',
                is_published INTEGER NOT NULL DEFAULT 0,
                category_id  INTEGER REFERENCES categories(id) ON DELETE SET NULL,
                image        TEXT
            );

            CREATE INDEX idx_ads_price ON ads(price DESC);
            CREATE INDEX idx_ads_author ON ads(author_id);
            CREATE INDEX idx_ads_category ON ads(category_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }

    #[test]
    fn role_check_rejects_unknown_values() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        conn.execute("INSERT INTO locations (name) VALUES ('Moscow')", [])
            .unwrap();

        let result = conn.execute(
            "INSERT INTO users (first_name, username, password, role, age, location_id)
             VALUES ('Ivan', 'ivan', 'x', 'owner', 30, 1)",
            [],
        );
        assert!(result.is_err());
    }
}
