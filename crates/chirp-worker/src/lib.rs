mod error;
mod events;
mod ingest;
mod lifecycle;
mod worker;

pub use error::WorkerError;
pub use events::WorkerEvent;
pub use lifecycle::AppLifecycle;
pub use worker::{ChirpWorker, display_name};

pub use chirp_core::{DeliverPdu, PduError, SilentNotice, UserNotice};
pub use chirp_db::{Contact, Message};
