// src/notify.rs
//
// Notification fan-out. Every state-changing action that concerns another
// user appends exactly one row here, inside the caller's transaction, so a
// rolled-back mutation never leaves a stray notification behind.

use crate::error::AppError;

/// What happened, as a tagged variant: the kind plus the one reference id
/// scoped to that kind (a follow has none).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Follow,
    PostLike { post_id: i64 },
    CommentLike { comment_id: i64 },
    Comment { post_id: i64 },
    JobApplication { job_id: i64 },
    ApplicationAccepted { job_id: i64 },
    ApplicationRefused { job_id: i64 },
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Follow => "follow",
            NotificationKind::PostLike { .. } => "post_like",
            NotificationKind::CommentLike { .. } => "comment_like",
            NotificationKind::Comment { .. } => "comment",
            NotificationKind::JobApplication { .. } => "job_application",
            NotificationKind::ApplicationAccepted { .. } => "application_accepted",
            NotificationKind::ApplicationRefused { .. } => "application_refused",
        }
    }

    pub fn ref_id(&self) -> Option<i64> {
        match *self {
            NotificationKind::Follow => None,
            NotificationKind::PostLike { post_id } => Some(post_id),
            NotificationKind::CommentLike { comment_id } => Some(comment_id),
            NotificationKind::Comment { post_id } => Some(post_id),
            NotificationKind::JobApplication { job_id } => Some(job_id),
            NotificationKind::ApplicationAccepted { job_id } => Some(job_id),
            NotificationKind::ApplicationRefused { job_id } => Some(job_id),
        }
    }
}

/// Human-readable message for a stored kind. Job-scoped kinds get the job
/// title joined in at read time; the row itself stores only kind + ref.
pub fn display_message(kind: &str, job_title: Option<&str>) -> String {
    let title = job_title.unwrap_or("your job posting");
    match kind {
        "follow" => "started following you".to_string(),
        "post_like" => "liked your post".to_string(),
        "comment_like" => "liked your comment".to_string(),
        "comment" => "commented on your post".to_string(),
        "job_application" => format!("applied for {}", title),
        "application_accepted" => format!("Your application for {} was accepted", title),
        "application_refused" => format!("Your application for {} was refused", title),
        other => other.to_string(),
    }
}

/// Append a notification for `recipient`, triggered by `actor`.
///
/// Callers suppress self-notification (actor == recipient) before calling;
/// runs on any executor so it can join the caller's transaction.
pub async fn record<'e, E>(
    executor: E,
    recipient: i64,
    actor: i64,
    kind: NotificationKind,
) -> Result<(), AppError>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO notifications (user_id, actor_id, kind, ref_id)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(recipient)
    .bind(actor)
    .bind(kind.as_str())
    .bind(kind.ref_id())
    .execute(executor)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_and_ref_are_scoped_together() {
        assert_eq!(NotificationKind::Follow.as_str(), "follow");
        assert_eq!(NotificationKind::Follow.ref_id(), None);

        let like = NotificationKind::PostLike { post_id: 7 };
        assert_eq!(like.as_str(), "post_like");
        assert_eq!(like.ref_id(), Some(7));

        let applied = NotificationKind::JobApplication { job_id: 3 };
        assert_eq!(applied.as_str(), "job_application");
        assert_eq!(applied.ref_id(), Some(3));
    }

    #[test]
    fn messages_include_job_title_when_known() {
        assert_eq!(
            display_message("job_application", Some("Backend Intern")),
            "applied for Backend Intern"
        );
        assert_eq!(
            display_message("application_refused", None),
            "Your application for your job posting was refused"
        );
        assert_eq!(display_message("follow", None), "started following you");
    }
}
