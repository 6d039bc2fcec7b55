use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Contact {
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub address: String,
    /// Join key for inbound matching; stored in normalized form.
    pub tel_number: String,
    /// Base64 PNG, empty when unset.
    pub picture: String,
}

impl Contact {
    /// Minimal contact synthesized for a sender we have never seen.
    pub fn placeholder(tel_number: &str) -> Self {
        Self {
            id: 0,
            firstname: tel_number.to_string(),
            lastname: String::new(),
            email: String::new(),
            address: String::new(),
            tel_number: tel_number.to_string(),
            picture: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: i64,
    pub contact_id: i64,
    pub body: String,
    /// Milliseconds since the epoch, set when the row is created.
    pub date: i64,
    /// True for messages composed locally, false for received ones.
    pub is_sent: bool,
}
