/// Bumping this wipes the store: version changes drop and recreate both
/// tables, there is no row migration.
pub const SCHEMA_VERSION: i64 = 2;

pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS contacts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    firstname TEXT NOT NULL,
    lastname TEXT NOT NULL DEFAULT '',
    email TEXT NOT NULL DEFAULT '',
    address TEXT NOT NULL DEFAULT '',
    tel_number TEXT NOT NULL,
    picture TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    contact_id INTEGER NOT NULL REFERENCES contacts(id),
    body TEXT NOT NULL,
    date INTEGER NOT NULL,
    is_sent INTEGER NOT NULL
);
"#;

pub const DROP_TABLES: &str = r#"
DROP TABLE IF EXISTS messages;
DROP TABLE IF EXISTS contacts;
"#;
