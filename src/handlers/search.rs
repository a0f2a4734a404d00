// src/handlers/search.rs

use axum::{Json, extract::{Query, State}, response::IntoResponse};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    /// 'users', 'jobs' or 'all' (default).
    #[serde(rename = "type")]
    pub search_type: Option<String>,
}

#[derive(Debug, Serialize, FromRow)]
struct UserHit {
    id: i64,
    name: String,
    role: String,
    avatar: String,
}

#[derive(Debug, Serialize, FromRow)]
struct JobHit {
    id: i64,
    title: String,
    company: String,
    location: Option<String>,
}

/// Case-insensitive substring search over users and jobs.
/// An empty query returns empty result sets.
pub async fn search(
    State(pool): State<PgPool>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let query = params.q.unwrap_or_default();
    let search_type = params.search_type.unwrap_or_else(|| "all".to_string());

    let mut users: Vec<UserHit> = Vec::new();
    let mut jobs: Vec<JobHit> = Vec::new();

    if query.is_empty() {
        return Ok(Json(serde_json::json!({ "users": users, "jobs": jobs })));
    }

    let pattern = format!("%{}%", query);

    if search_type == "users" || search_type == "all" {
        users = sqlx::query_as::<_, UserHit>(
            r#"
            SELECT id, firstname || ' ' || lastname AS name, role,
                   profile_pic AS avatar
            FROM users
            WHERE firstname ILIKE $1 OR lastname ILIKE $1 OR email ILIKE $1
            "#,
        )
        .bind(&pattern)
        .fetch_all(&pool)
        .await?;
    }

    if search_type == "jobs" || search_type == "all" {
        jobs = sqlx::query_as::<_, JobHit>(
            r#"
            SELECT j.id, j.title,
                   u.firstname || ' ' || u.lastname AS company,
                   j.location
            FROM jobs j
            JOIN users u ON j.recruiter_id = u.id
            WHERE j.title ILIKE $1 OR j.description ILIKE $1
            "#,
        )
        .bind(&pattern)
        .fetch_all(&pool)
        .await?;
    }

    Ok(Json(serde_json::json!({ "users": users, "jobs": jobs })))
}
