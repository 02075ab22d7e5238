use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::message::message_models::RoomMessage;

/// Server-to-client frames.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    ChatMessage(RoomMessage),
    Presence(PresencePayload),
    Error(ErrorPayload),
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PresencePayload {
    pub user_id: Uuid,
    pub username: String,
    pub is_online: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorPayload {
    pub message: String,
}

// Client-to-server messages
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    SendMessage { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_chat_message_is_tagged() {
        let frame = WsMessage::ChatMessage(RoomMessage {
            id: Uuid::nil(),
            user: "alice".into(),
            message: Some("hi".into()),
            media: None,
            created_at: Utc::now(),
        });
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["type"], "chat_message");
        assert_eq!(value["user"], "alice");
        assert_eq!(value["message"], "hi");
    }

    #[test]
    fn test_presence_is_tagged() {
        let frame = WsMessage::Presence(PresencePayload {
            user_id: Uuid::nil(),
            username: "bob".into(),
            is_online: false,
        });
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["type"], "presence");
        assert_eq!(value["is_online"], false);
    }

    #[test]
    fn test_parse_send_message() {
        let raw = json!({"type": "send_message", "message": "hello"}).to_string();
        let ClientMessage::SendMessage { message } = serde_json::from_str(&raw).unwrap();
        assert_eq!(message, "hello");
    }

    #[test]
    fn test_unknown_client_frame_is_rejected() {
        let raw = json!({"type": "typing", "is_typing": true}).to_string();
        assert!(serde_json::from_str::<ClientMessage>(&raw).is_err());
    }
}
