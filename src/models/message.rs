use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'messages' table in the database. Directed, two-party.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub recipient_id: i64,
    pub body: String,
    pub is_read: bool,
    pub is_liked: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for sending a message.
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    pub recipient_id: i64,

    #[validate(length(min = 1, max = 5000, message = "Message body must not be empty"))]
    pub body: String,
}

/// One conversation counterpart with the latest message for preview.
#[derive(Debug, Serialize, FromRow)]
pub struct ConversationItem {
    pub user_id: i64,
    pub name: String,
    pub pic: String,
    pub last_msg: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// One message in a two-party history, annotated for the requesting user.
#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub id: i64,
    pub body: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub sender_id: i64,
    pub is_liked: bool,
    pub is_me: bool,
}
