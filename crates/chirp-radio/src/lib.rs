mod error;
mod link;
mod process;

pub use error::RadioError;
pub use link::RadioLink;
