// src/handlers/notifications.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::notification::{NotificationRow, NotificationResponse},
    utils::jwt::Claims,
};

/// List the current user's notifications, newest first.
///
/// Reading the list flips every still-unread entry to read in the same
/// transaction; the flip is one-way and a second listing returns the same
/// rows, all read. The rows report the state as it was before this read.
pub async fn list_notifications(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let mut tx = pool.begin().await?;

    let rows = sqlx::query_as::<_, NotificationRow>(
        r#"
        SELECT n.id, n.kind, n.ref_id, n.actor_id,
               a.firstname || ' ' || a.lastname AS actor_name,
               a.profile_pic AS actor_pic,
               j.title AS job_title,
               n.is_read, n.created_at
        FROM notifications n
        LEFT JOIN users a ON n.actor_id = a.id
        LEFT JOIN jobs j ON j.id = n.ref_id
               AND n.kind IN ('job_application', 'application_accepted', 'application_refused')
        WHERE n.user_id = $1
        ORDER BY n.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list notifications: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    let notifications: Vec<NotificationResponse> =
        rows.into_iter().map(NotificationResponse::from).collect();

    Ok(Json(notifications))
}
