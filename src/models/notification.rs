use serde::Serialize;
use sqlx::FromRow;

use crate::notify;

/// One notification row as fetched for the recipient's feed, with the
/// actor's identity and (for job-scoped kinds) the job title joined in.
#[derive(Debug, FromRow)]
pub struct NotificationRow {
    pub id: i64,
    pub kind: String,
    pub ref_id: Option<i64>,
    pub actor_id: Option<i64>,
    pub actor_name: Option<String>,
    pub actor_pic: Option<String>,
    pub job_title: Option<String>,
    pub is_read: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A notification as returned to the client.
#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: i64,
    pub kind: String,
    pub message: String,
    pub actor_id: Option<i64>,
    pub actor_name: String,
    pub actor_pic: Option<String>,
    pub ref_id: Option<i64>,
    pub is_read: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<NotificationRow> for NotificationResponse {
    fn from(row: NotificationRow) -> Self {
        let message = notify::display_message(&row.kind, row.job_title.as_deref());
        NotificationResponse {
            id: row.id,
            kind: row.kind,
            message,
            actor_id: row.actor_id,
            // The actor row may be gone (account deleted, FK set to NULL).
            actor_name: row.actor_name.unwrap_or_else(|| "Someone".to_string()),
            actor_pic: row.actor_pic,
            ref_id: row.ref_id,
            is_read: row.is_read,
            created_at: row.created_at,
        }
    }
}
