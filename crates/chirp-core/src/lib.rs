mod events;
mod normalize;
mod notify;
mod pdu;
mod picture;
mod protocol;

pub use events::*;
pub use normalize::*;
pub use notify::*;
pub use pdu::*;
pub use picture::*;
pub use protocol::*;
