// src/handlers/messages.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::message::{ChatMessage, ConversationItem, Message, SendMessageRequest},
    utils::{html::clean_html, jwt::Claims},
};

/// Conversation overview: every distinct counterpart the current user has
/// exchanged messages with, each with the most recent message as preview,
/// ordered by recency.
pub async fn list_conversations(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let conversations = sqlx::query_as::<_, ConversationItem>(
        r#"
        SELECT t.counterpart_id AS user_id,
               u.firstname || ' ' || u.lastname AS name,
               u.profile_pic AS pic,
               t.body AS last_msg,
               t.created_at AS "timestamp"
        FROM (
            SELECT DISTINCT ON (counterpart_id) counterpart_id, body, created_at
            FROM (
                SELECT m.body, m.created_at,
                       CASE WHEN m.sender_id = $1 THEN m.recipient_id
                            ELSE m.sender_id END AS counterpart_id
                FROM messages m
                WHERE m.sender_id = $1 OR m.recipient_id = $1
            ) pairs
            ORDER BY counterpart_id, created_at DESC
        ) t
        JOIN users u ON u.id = t.counterpart_id
        ORDER BY t.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list conversations: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(conversations))
}

/// Full history between the current user and a counterpart, oldest first.
/// Incoming messages are marked read as a side effect of being fetched.
pub async fn get_history(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(counterpart_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE messages SET is_read = TRUE
        WHERE sender_id = $1 AND recipient_id = $2 AND is_read = FALSE
        "#,
    )
    .bind(counterpart_id)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    let messages = sqlx::query_as::<_, Message>(
        r#"
        SELECT * FROM messages
        WHERE (sender_id = $1 AND recipient_id = $2)
           OR (sender_id = $2 AND recipient_id = $1)
        ORDER BY created_at ASC
        "#,
    )
    .bind(user_id)
    .bind(counterpart_id)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    let history: Vec<ChatMessage> = messages
        .into_iter()
        .map(|m| ChatMessage {
            id: m.id,
            body: m.body,
            timestamp: m.created_at,
            sender_id: m.sender_id,
            is_liked: m.is_liked,
            is_me: m.sender_id == user_id,
        })
        .collect();

    Ok(Json(history))
}

/// Send a direct message.
pub async fn send_message(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = claims.user_id();

    if payload.recipient_id == user_id {
        return Err(AppError::BadRequest(
            "You cannot message yourself".to_string(),
        ));
    }

    let body = clean_html(payload.body.trim());
    if body.is_empty() {
        return Err(AppError::BadRequest(
            "Message body must not be empty".to_string(),
        ));
    }

    let _recipient: i64 = sqlx::query_scalar("SELECT id FROM users WHERE id = $1")
        .bind(payload.recipient_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Recipient not found".to_string()))?;

    let message_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO messages (sender_id, recipient_id, body)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(payload.recipient_id)
    .bind(&body)
    .fetch_one(&pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": message_id, "message": "Sent" })),
    ))
}

/// Toggle the like flag on a received message. Only the recipient may do
/// this; the sender (or anyone else) gets a 403.
pub async fn toggle_message_like(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(message_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let message = sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = $1")
        .bind(message_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Message not found".to_string()))?;

    if message.recipient_id != user_id {
        return Err(AppError::Forbidden(
            "Cannot like this message".to_string(),
        ));
    }

    let is_liked: bool = sqlx::query_scalar(
        "UPDATE messages SET is_liked = NOT is_liked WHERE id = $1 RETURNING is_liked",
    )
    .bind(message_id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(serde_json::json!({
        "message": "Like status updated",
        "is_liked": is_liked,
    })))
}
