use serde::{Deserialize, Serialize};

use crate::events::{RadioCommand, RadioEvent};

/// One line on the modem daemon's stdin or stdout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadioFrame {
    pub id: String,
    #[serde(flatten)]
    pub content: FrameContent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameContent {
    Command(RadioCommand),
    Event(RadioEvent),
}

impl RadioFrame {
    pub fn command(command: RadioCommand) -> Self {
        Self {
            id: generate_id(),
            content: FrameContent::Command(command),
        }
    }

    pub fn event(event: RadioEvent) -> Self {
        Self {
            id: generate_id(),
            content: FrameContent::Event(event),
        }
    }

    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_default() + "\n"
    }

    /// `None` for anything that is not a well-formed frame; the daemon link
    /// drops such lines rather than failing.
    pub fn from_line(line: &str) -> Option<Self> {
        serde_json::from_str(line.trim()).ok()
    }
}

fn generate_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("{nanos:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_round_trips_through_line() {
        let frame = RadioFrame::command(RadioCommand::SendText {
            to: "0612345678".into(),
            text: "hello".into(),
        });
        let parsed = RadioFrame::from_line(&frame.to_line()).unwrap();
        assert_eq!(parsed.id, frame.id);
        match parsed.content {
            FrameContent::Command(RadioCommand::SendText { to, text }) => {
                assert_eq!(to, "0612345678");
                assert_eq!(text, "hello");
            }
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn deliver_event_parses_from_daemon_line() {
        let line = r#"{"id":"abc","type":"Deliver","payload":{"pdus":["0001"]}}"#;
        let frame = RadioFrame::from_line(line).unwrap();
        match frame.content {
            FrameContent::Event(RadioEvent::Deliver { pdus }) => {
                assert_eq!(pdus, vec!["0001".to_string()]);
            }
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn garbage_line_is_dropped() {
        assert!(RadioFrame::from_line("not json at all").is_none());
        assert!(RadioFrame::from_line(r#"{"id":"x","type":"Nope"}"#).is_none());
    }
}
