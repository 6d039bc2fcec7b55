use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("database error: {0}")]
    Db(#[from] chirp_db::DbError),

    #[error("radio error: {0}")]
    Radio(#[from] chirp_radio::RadioError),

    #[error("contact {0} not found")]
    ContactNotFound(i64),
}

pub type Result<T> = std::result::Result<T, WorkerError>;
