use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum RadioCommand {
    SendText { to: String, text: String },
    Shutdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum RadioEvent {
    Ready,

    /// One OS-level delivery. A single event may carry several PDUs;
    /// each element is one hex-encoded SMS-DELIVER TPDU.
    Deliver { pdus: Vec<String> },

    Fault { detail: String },
}
