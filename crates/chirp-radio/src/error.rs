use thiserror::Error;

#[derive(Error, Debug)]
pub enum RadioError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("modem daemon is not running")]
    NotRunning,

    #[error("failed to spawn modem daemon: {0}")]
    SpawnFailed(String),

    #[error("modem command channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, RadioError>;
