use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::comment::CommentResponse;

/// Represents the 'posts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub content: String,
    /// Stored filename of an attached image or PDF, if any.
    pub image_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Query parameters for the feed.
#[derive(Debug, Deserialize)]
pub struct FeedParams {
    /// 'following' restricts the feed to the actor and the users they follow;
    /// anything else (or absent) means the global feed.
    pub filter: Option<String>,
}

/// One post row as fetched for the feed, with author identity and
/// the current user's interaction status joined in.
#[derive(Debug, FromRow)]
pub struct FeedRow {
    pub id: i64,
    pub user_id: i64,
    pub firstname: String,
    pub lastname: String,
    pub profile_pic: String,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub likes_count: i64,
    pub is_liked: bool,
}

/// A feed item as returned to the client.
#[derive(Debug, Serialize)]
pub struct FeedItem {
    pub id: i64,
    pub content: String,
    pub image_url: Option<String>,
    pub is_pdf: bool,
    pub author: String,
    pub author_id: i64,
    pub author_pic: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub likes: i64,
    pub is_liked: bool,
    pub comments: Vec<CommentResponse>,
}

impl FeedRow {
    pub fn into_item(self, comments: Vec<CommentResponse>) -> FeedItem {
        let is_pdf = self
            .image_url
            .as_deref()
            .map(|f| f.to_ascii_lowercase().ends_with(".pdf"))
            .unwrap_or(false);

        FeedItem {
            id: self.id,
            content: self.content,
            image_url: self.image_url,
            is_pdf,
            author: format!("{} {}", self.firstname, self.lastname),
            author_id: self.user_id,
            author_pic: self.profile_pic,
            created_at: self.created_at,
            likes: self.likes_count,
            is_liked: self.is_liked,
            comments,
        }
    }
}
