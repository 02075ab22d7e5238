use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::message_models::RoomMessage;

/// Multipart form accepted by the send endpoint. Documentation only.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageForm {
    pub message: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub media: Option<Vec<u8>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessagesResponse {
    pub messages: Vec<RoomMessage>,
}
