use serde_json::Value;

use crate::types::Direction;

#[derive(Debug, PartialEq)]
pub enum ParsedClientMessage {
    Start,
    Restart,
    Input { dir: Direction },
    Ping { t: f64 },
}

/// Parses one inbound text frame. Malformed JSON, unknown types and bad
/// field values all yield `None`.
pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "start" => Some(ParsedClientMessage::Start),
        "restart" => Some(ParsedClientMessage::Restart),
        "input" => {
            let dir = Direction::parse_move(object.get("dir")?.as_str()?)?;
            Some(ParsedClientMessage::Input { dir })
        }
        "ping" => {
            let t = object.get("t")?.as_f64()?;
            if !t.is_finite() {
                return None;
            }
            Some(ParsedClientMessage::Ping { t })
        }
        _ => None,
    }
}
