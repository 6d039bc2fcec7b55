use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::error::{DbError, Result};
use crate::models::{Contact, Message};
use crate::schema::{CREATE_TABLES, DROP_TABLES, SCHEMA_VERSION};

/// Everything a message insert learned inside one transaction.
#[derive(Debug, Clone)]
pub struct IncomingRecord {
    pub contact: Contact,
    /// True when the sender was unknown and a placeholder contact was made.
    pub created: bool,
    pub message: Message,
}

/// The contacts-and-messages store. One pool for the whole process; every
/// caller goes through here.
pub struct ChirpDb {
    pool: Pool<Sqlite>,
}

impl ChirpDb {
    pub async fn open() -> Result<Self> {
        let db_path = Self::default_path()?;
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Self::open_with(SqliteConnectOptions::new().filename(&db_path), None).await?;
        tracing::info!("database ready at {}", db_path.display());
        Ok(db)
    }

    pub async fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(SqliteConnectOptions::new().filename(path), None).await
    }

    /// A private throwaway store. Capped to a single connection, since a
    /// second pooled connection would see its own empty database.
    pub async fn open_in_memory() -> Result<Self> {
        Self::open_with(SqliteConnectOptions::new().in_memory(true), Some(1)).await
    }

    async fn open_with(options: SqliteConnectOptions, max_conns: Option<u32>) -> Result<Self> {
        // The REFERENCES clause in the schema is declarative only: deleting a
        // contact must leave its messages behind, so enforcement stays off.
        let options = options.create_if_missing(true).foreign_keys(false);
        let mut pool_options = SqlitePoolOptions::new();
        if let Some(n) = max_conns {
            pool_options = pool_options.max_connections(n);
        }
        let pool = pool_options.connect_with(options).await?;
        migrate(&pool).await?;
        Ok(Self { pool })
    }

    fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("io", "chirp", "chirp").ok_or(DbError::DataDir)?;
        Ok(dirs.data_dir().join("chirp.db"))
    }

    /// Inserts a contact, ignoring any caller-supplied id, and returns the
    /// id the store assigned.
    pub async fn add_contact(&self, contact: &Contact) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO contacts (firstname, lastname, email, address, tel_number, picture)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&contact.firstname)
        .bind(&contact.lastname)
        .bind(&contact.email)
        .bind(&contact.address)
        .bind(&contact.tel_number)
        .bind(&contact.picture)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_contact(&self, id: i64) -> Result<Option<Contact>> {
        Ok(
            sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    /// Exact match on the stored number. Callers normalize before asking.
    pub async fn get_contact_by_number(&self, tel_number: &str) -> Result<Option<Contact>> {
        Ok(
            sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE tel_number = ?")
                .bind(tel_number)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    /// Full-row overwrite keyed by id.
    pub async fn update_contact(&self, contact: &Contact) -> Result<()> {
        sqlx::query(
            "UPDATE contacts
             SET firstname = ?, lastname = ?, email = ?, address = ?, tel_number = ?, picture = ?
             WHERE id = ?",
        )
        .bind(&contact.firstname)
        .bind(&contact.lastname)
        .bind(&contact.email)
        .bind(&contact.address)
        .bind(&contact.tel_number)
        .bind(&contact.picture)
        .bind(contact.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Removes the contact row only; any messages keep their rows.
    pub async fn delete_contact(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM contacts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Full scan, no ordering promised.
    pub async fn all_contacts(&self) -> Result<Vec<Contact>> {
        Ok(sqlx::query_as::<_, Contact>("SELECT * FROM contacts")
            .fetch_all(&self.pool)
            .await?)
    }

    /// Inserts a message, ignoring any caller-supplied id.
    pub async fn add_message(&self, message: &Message) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO messages (contact_id, body, date, is_sent) VALUES (?, ?, ?, ?)",
        )
        .bind(message.contact_id)
        .bind(&message.body)
        .bind(message.date)
        .bind(message.is_sent)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Rows for one contact in whatever order the store walks them; sort by
    /// `date` for a chronological thread.
    pub async fn messages_for_contact(&self, contact_id: i64) -> Result<Vec<Message>> {
        Ok(
            sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE contact_id = ?")
                .bind(contact_id)
                .fetch_all(&self.pool)
                .await?,
        )
    }

    /// The inbound unit: resolve the sender to a contact (creating a
    /// placeholder when unknown) and store the message, all in one
    /// transaction. Two deliveries from the same new sender can never
    /// produce two contacts.
    pub async fn record_incoming(
        &self,
        tel_number: &str,
        body: &str,
        date: i64,
    ) -> Result<IncomingRecord> {
        let mut tx = self.pool.begin().await?;

        let existing =
            sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE tel_number = ?")
                .bind(tel_number)
                .fetch_optional(&mut *tx)
                .await?;

        let (contact, created) = match existing {
            Some(contact) => (contact, false),
            None => {
                let mut contact = Contact::placeholder(tel_number);
                let result = sqlx::query(
                    "INSERT INTO contacts (firstname, lastname, email, address, tel_number, picture)
                     VALUES (?, ?, ?, ?, ?, ?)",
                )
                .bind(&contact.firstname)
                .bind(&contact.lastname)
                .bind(&contact.email)
                .bind(&contact.address)
                .bind(&contact.tel_number)
                .bind(&contact.picture)
                .execute(&mut *tx)
                .await?;
                contact.id = result.last_insert_rowid();
                (contact, true)
            }
        };

        let result =
            sqlx::query("INSERT INTO messages (contact_id, body, date, is_sent) VALUES (?, ?, ?, 0)")
                .bind(contact.id)
                .bind(body)
                .bind(date)
                .execute(&mut *tx)
                .await?;
        let message = Message {
            id: result.last_insert_rowid(),
            contact_id: contact.id,
            body: body.to_string(),
            date,
            is_sent: false,
        };

        tx.commit().await?;

        Ok(IncomingRecord {
            contact,
            created,
            message,
        })
    }
}

async fn migrate(pool: &Pool<Sqlite>) -> Result<()> {
    let (stored,): (i64,) = sqlx::query_as("PRAGMA user_version").fetch_one(pool).await?;

    if stored != 0 && stored != SCHEMA_VERSION {
        // Version changes are destructive: both tables are dropped and every
        // stored contact and message is lost.
        tracing::warn!(stored, current = SCHEMA_VERSION, "schema version changed, wiping store");
        sqlx::raw_sql(DROP_TABLES).execute(pool).await?;
    }

    sqlx::raw_sql(CREATE_TABLES).execute(pool).await?;
    sqlx::query(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))
        .execute(pool)
        .await?;

    Ok(())
}
