// src/handlers/applications.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::{
        application::{
            RecruiterApplicationItem, STATUS_ACCEPTED, STATUS_REFUSED, StudentApplicationItem,
            UpdateStatusRequest, is_valid_status,
        },
        user::{ROLE_RECRUITER, ROLE_STUDENT},
    },
    notify::{self, NotificationKind},
    utils::jwt::Claims,
};

/// Role-dependent application listing: students see the jobs they applied
/// to, recruiters see the applications submitted to their jobs.
pub async fn list_applications(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<axum::response::Response, AppError> {
    let user_id = claims.user_id();

    if claims.role == ROLE_STUDENT {
        let items = sqlx::query_as::<_, StudentApplicationItem>(
            r#"
            SELECT a.id, a.job_id, j.title AS job_title,
                   u.firstname || ' ' || u.lastname AS company,
                   a.status, a.created_at
            FROM applications a
            JOIN jobs j ON a.job_id = j.id
            JOIN users u ON j.recruiter_id = u.id
            WHERE a.student_id = $1
            ORDER BY a.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&pool)
        .await?;

        return Ok(Json(items).into_response());
    }

    let items = sqlx::query_as::<_, RecruiterApplicationItem>(
        r#"
        SELECT a.id, a.job_id, j.title AS job_title,
               a.student_id AS applicant_id,
               s.firstname || ' ' || s.lastname AS applicant_name,
               a.status, a.created_at
        FROM applications a
        JOIN jobs j ON a.job_id = j.id
        JOIN users s ON a.student_id = s.id
        WHERE j.recruiter_id = $1
        ORDER BY a.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(items).into_response())
}

/// Row shape for the ownership check on a status change.
#[derive(sqlx::FromRow)]
struct ApplicationTarget {
    job_id: i64,
    student_id: i64,
    recruiter_id: i64,
}

/// Decide an application: pending -> accepted / refused.
///
/// Only the recruiter owning the job may decide; the student is notified of
/// accept/refuse decisions. Moving an application back to pending is
/// allowed and emits no notification.
pub async fn update_status(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(application_id): Path<i64>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    if claims.role != ROLE_RECRUITER {
        return Err(AppError::Forbidden(
            "Only recruiters can decide applications".to_string(),
        ));
    }

    if !is_valid_status(&payload.status) {
        return Err(AppError::BadRequest(format!(
            "Unknown status '{}'",
            payload.status
        )));
    }

    let user_id = claims.user_id();

    let mut tx = pool.begin().await?;

    let target = sqlx::query_as::<_, ApplicationTarget>(
        r#"
        SELECT a.job_id, a.student_id, j.recruiter_id
        FROM applications a
        JOIN jobs j ON a.job_id = j.id
        WHERE a.id = $1
        "#,
    )
    .bind(application_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Application not found".to_string()))?;

    if target.recruiter_id != user_id {
        return Err(AppError::Forbidden(
            "This application is not for one of your jobs".to_string(),
        ));
    }

    sqlx::query("UPDATE applications SET status = $1 WHERE id = $2")
        .bind(&payload.status)
        .bind(application_id)
        .execute(&mut *tx)
        .await?;

    let kind = match payload.status.as_str() {
        STATUS_ACCEPTED => Some(NotificationKind::ApplicationAccepted {
            job_id: target.job_id,
        }),
        STATUS_REFUSED => Some(NotificationKind::ApplicationRefused {
            job_id: target.job_id,
        }),
        _ => None,
    };

    if let Some(kind) = kind {
        notify::record(&mut *tx, target.student_id, user_id, kind).await?;
    }

    tx.commit().await?;

    Ok(Json(serde_json::json!({
        "message": format!("Application marked as {}", payload.status),
    })))
}
