use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("no usable data directory on this platform")]
    DataDir,
}

pub type Result<T> = std::result::Result<T, DbError>;
