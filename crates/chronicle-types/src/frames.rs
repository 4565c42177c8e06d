use serde::{Deserialize, Serialize};

/// A chat channel frame: `{"event": "chat"|"typing", "data": <arbitrary JSON>}`.
///
/// Frames are transient — rebroadcast verbatim and never persisted. The
/// payload is opaque to the server; only the event kind decides fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatFrame {
    pub event: ChatEvent,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatEvent {
    /// Delivered to every connected participant, including the sender.
    Chat,
    /// Delivered to every participant except the sender.
    Typing,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn frame_wire_shape() {
        let frame: ChatFrame =
            serde_json::from_str(r#"{"event":"chat","data":{"msg":"hi"}}"#).unwrap();
        assert_eq!(frame.event, ChatEvent::Chat);
        assert_eq!(frame.data, json!({"msg": "hi"}));

        let text = serde_json::to_string(&frame).unwrap();
        assert_eq!(text, r#"{"event":"chat","data":{"msg":"hi"}}"#);
    }

    #[test]
    fn typing_event_parses() {
        let frame: ChatFrame =
            serde_json::from_str(r#"{"event":"typing","data":{"user":"A"}}"#).unwrap();
        assert_eq!(frame.event, ChatEvent::Typing);
    }

    #[test]
    fn unknown_event_rejected() {
        assert!(serde_json::from_str::<ChatFrame>(r#"{"event":"join","data":null}"#).is_err());
    }
}
