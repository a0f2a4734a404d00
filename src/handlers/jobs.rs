// src/handlers/jobs.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::{AppError, is_unique_violation},
    models::{
        job::{CreateJobRequest, JobListItem, JobRow, RateJobRequest, round_avg},
        user::{ROLE_RECRUITER, ROLE_STUDENT},
    },
    notify::{self, NotificationKind},
    utils::jwt::Claims,
};

/// List all jobs, newest first, each with its recruiter identity, the
/// read-time average rating and the current user's saved status.
pub async fn list_jobs(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let rows = sqlx::query_as::<_, JobRow>(
        r#"
        SELECT j.id, j.recruiter_id, u.firstname, u.lastname, u.profile_pic,
               j.title, j.description, j.salary, j.location, j.is_remote, j.created_at,
               (SELECT CAST(AVG(stars) AS DOUBLE PRECISION)
                FROM job_ratings r WHERE r.job_id = j.id) AS avg_stars,
               EXISTS(SELECT 1 FROM saved_jobs s
                      WHERE s.job_id = j.id AND s.user_id = $1) AS is_saved
        FROM jobs j
        JOIN users u ON j.recruiter_id = u.id
        ORDER BY j.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list jobs: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let jobs: Vec<JobListItem> = rows.into_iter().map(JobListItem::from).collect();

    Ok(Json(jobs))
}

/// Create a job posting. Recruiters only.
pub async fn create_job(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateJobRequest>,
) -> Result<impl IntoResponse, AppError> {
    if claims.role != ROLE_RECRUITER {
        return Err(AppError::Forbidden(
            "Only recruiters can post jobs".to_string(),
        ));
    }

    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let job_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO jobs (recruiter_id, title, description, salary, location, is_remote)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(claims.user_id())
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(&payload.salary)
    .bind(&payload.location)
    .bind(payload.is_remote)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create job: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": job_id })),
    ))
}

/// Apply to a job. Students only; one application per (job, student).
///
/// A concurrent duplicate apply loses on the unique constraint and surfaces
/// as the same 409 the pre-check produces. The recruiter is notified inside
/// the same transaction as the insert.
pub async fn apply(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(job_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if claims.role != ROLE_STUDENT {
        return Err(AppError::Forbidden(
            "Only students can apply".to_string(),
        ));
    }

    let user_id = claims.user_id();

    let mut tx = pool.begin().await?;

    let recruiter_id: i64 = sqlx::query_scalar("SELECT recruiter_id FROM jobs WHERE id = $1")
        .bind(job_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Job not found".to_string()))?;

    let existing: Option<i32> =
        sqlx::query_scalar("SELECT 1 FROM applications WHERE job_id = $1 AND student_id = $2")
            .bind(job_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;

    if existing.is_some() {
        return Err(AppError::Conflict("Already applied".to_string()));
    }

    sqlx::query("INSERT INTO applications (job_id, student_id) VALUES ($1, $2)")
        .bind(job_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return AppError::Conflict("Already applied".to_string());
            }
            AppError::InternalServerError(e.to_string())
        })?;

    notify::record(
        &mut *tx,
        recruiter_id,
        user_id,
        NotificationKind::JobApplication { job_id },
    )
    .await?;

    tx.commit().await?;

    Ok(Json(serde_json::json!({ "message": "Applied successfully" })))
}

/// Toggle the saved flag on a job for the current user. No notification.
pub async fn toggle_save(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(job_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let mut tx = pool.begin().await?;

    let _exists: i64 = sqlx::query_scalar("SELECT id FROM jobs WHERE id = $1")
        .bind(job_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Job not found".to_string()))?;

    let existing: Option<i32> =
        sqlx::query_scalar("SELECT 1 FROM saved_jobs WHERE user_id = $1 AND job_id = $2")
            .bind(user_id)
            .bind(job_id)
            .fetch_optional(&mut *tx)
            .await?;

    let is_saved = existing.is_some();

    if is_saved {
        sqlx::query("DELETE FROM saved_jobs WHERE user_id = $1 AND job_id = $2")
            .bind(user_id)
            .bind(job_id)
            .execute(&mut *tx)
            .await?;
    } else {
        sqlx::query("INSERT INTO saved_jobs (user_id, job_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(job_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    return AppError::Conflict("Already saved".to_string());
                }
                AppError::InternalServerError(e.to_string())
            })?;
    }

    tx.commit().await?;

    Ok(Json(serde_json::json!({
        "saved": !is_saved,
        "message": if is_saved { "Job removed from saved" } else { "Job saved" },
    })))
}

/// Rate a job, 1-5 stars. Upsert keyed on the (user, job) unique
/// constraint: a re-rating updates the existing row in place.
pub async fn rate(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(job_id): Path<i64>,
    Json(payload): Json<RateJobRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = claims.user_id();

    let _exists: i64 = sqlx::query_scalar("SELECT id FROM jobs WHERE id = $1")
        .bind(job_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Job not found".to_string()))?;

    sqlx::query(
        r#"
        INSERT INTO job_ratings (job_id, user_id, stars)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, job_id) DO UPDATE SET stars = EXCLUDED.stars
        "#,
    )
    .bind(job_id)
    .bind(user_id)
    .bind(payload.stars)
    .execute(&pool)
    .await?;

    let avg: Option<f64> = sqlx::query_scalar(
        "SELECT CAST(AVG(stars) AS DOUBLE PRECISION) FROM job_ratings WHERE job_id = $1",
    )
    .bind(job_id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(serde_json::json!({
        "message": "Rating submitted",
        "rating": round_avg(avg),
    })))
}
