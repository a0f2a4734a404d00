// src/handlers/profile.rs

use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, is_unique_violation},
    models::user::{MeResponse, PublicProfileResponse, UpdateProfileRequest},
    notify::{self, NotificationKind},
    utils::{hash::hash_password, html::clean_html, jwt::Claims, upload::save_upload},
};

/// Profile row with follow-graph aggregates joined in.
#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: i64,
    firstname: String,
    lastname: String,
    email: String,
    role: String,
    bio: Option<String>,
    study_place: Option<String>,
    work_place: Option<String>,
    linkedin_link: Option<String>,
    github_link: Option<String>,
    profile_pic: String,
    followers_count: i64,
    following_count: i64,
}

/// Get the current user's profile with follower/following counts.
pub async fn get_me(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    // Subqueries over the follow edge table; both directions are derived
    // views of the same storage.
    let me = sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT u.id, u.firstname, u.lastname, u.email, u.role, u.bio,
               u.study_place, u.work_place, u.linkedin_link, u.github_link,
               u.profile_pic,
               (SELECT COUNT(*) FROM follows f WHERE f.followed_id = u.id) AS followers_count,
               (SELECT COUNT(*) FROM follows f WHERE f.follower_id = u.id) AS following_count
        FROM users u
        WHERE u.id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(MeResponse {
        id: me.id,
        firstname: me.firstname,
        lastname: me.lastname,
        email: me.email,
        role: me.role,
        bio: me.bio,
        study_place: me.study_place,
        work_place: me.work_place,
        linkedin: me.linkedin_link,
        github: me.github_link,
        profile_pic: me.profile_pic,
        followers_count: me.followers_count,
        following_count: me.following_count,
    }))
}

/// Get another user's profile, with whether the current user follows them.
pub async fn get_user(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let actor_id = claims.user_id();

    let user = sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT u.id, u.firstname, u.lastname, u.email, u.role, u.bio,
               u.study_place, u.work_place, u.linkedin_link, u.github_link,
               u.profile_pic,
               (SELECT COUNT(*) FROM follows f WHERE f.followed_id = u.id) AS followers_count,
               (SELECT COUNT(*) FROM follows f WHERE f.follower_id = u.id) AS following_count
        FROM users u
        WHERE u.id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    let is_following: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = $1 AND followed_id = $2)",
    )
    .bind(actor_id)
    .bind(user_id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(PublicProfileResponse {
        id: user.id,
        firstname: user.firstname,
        lastname: user.lastname,
        role: user.role,
        bio: user.bio,
        study_place: user.study_place,
        work_place: user.work_place,
        profile_pic: user.profile_pic,
        followers_count: user.followers_count,
        following_count: user.following_count,
        is_following,
    }))
}

/// Partial profile update. Role and email are immutable and not accepted.
/// Present fields are applied one by one; a password change is re-hashed.
pub async fn update_profile(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = claims.user_id();

    let _exists: i64 = sqlx::query_scalar("SELECT id FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    if let Some(firstname) = payload.firstname {
        sqlx::query("UPDATE users SET firstname = $1 WHERE id = $2")
            .bind(firstname)
            .bind(user_id)
            .execute(&pool)
            .await?;
    }

    if let Some(lastname) = payload.lastname {
        sqlx::query("UPDATE users SET lastname = $1 WHERE id = $2")
            .bind(lastname)
            .bind(user_id)
            .execute(&pool)
            .await?;
    }

    if let Some(bio) = payload.bio {
        sqlx::query("UPDATE users SET bio = $1 WHERE id = $2")
            .bind(clean_html(&bio))
            .bind(user_id)
            .execute(&pool)
            .await?;
    }

    if let Some(study_place) = payload.study_place {
        sqlx::query("UPDATE users SET study_place = $1 WHERE id = $2")
            .bind(study_place)
            .bind(user_id)
            .execute(&pool)
            .await?;
    }

    if let Some(work_place) = payload.work_place {
        sqlx::query("UPDATE users SET work_place = $1 WHERE id = $2")
            .bind(work_place)
            .bind(user_id)
            .execute(&pool)
            .await?;
    }

    if let Some(linkedin_link) = payload.linkedin_link {
        sqlx::query("UPDATE users SET linkedin_link = $1 WHERE id = $2")
            .bind(linkedin_link)
            .bind(user_id)
            .execute(&pool)
            .await?;
    }

    if let Some(github_link) = payload.github_link {
        sqlx::query("UPDATE users SET github_link = $1 WHERE id = $2")
            .bind(github_link)
            .bind(user_id)
            .execute(&pool)
            .await?;
    }

    if let Some(password) = payload.password.filter(|p| !p.is_empty()) {
        let hashed = hash_password(&password)?;
        sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(hashed)
            .bind(user_id)
            .execute(&pool)
            .await?;
    }

    Ok(Json(serde_json::json!({
        "message": "Profile updated successfully"
    })))
}

/// Toggle the follow edge from the current user to the target.
///
/// Self-follow is a validation error. Following notifies the target;
/// unfollowing emits nothing and removes no past notification.
pub async fn toggle_follow(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(target_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    if target_id == user_id {
        return Err(AppError::BadRequest(
            "You cannot follow yourself".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let target_firstname: String = sqlx::query_scalar("SELECT firstname FROM users WHERE id = $1")
        .bind(target_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let existing: Option<i32> =
        sqlx::query_scalar("SELECT 1 FROM follows WHERE follower_id = $1 AND followed_id = $2")
            .bind(user_id)
            .bind(target_id)
            .fetch_optional(&mut *tx)
            .await?;

    let is_following = existing.is_some();

    if is_following {
        sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followed_id = $2")
            .bind(user_id)
            .bind(target_id)
            .execute(&mut *tx)
            .await?;
    } else {
        sqlx::query("INSERT INTO follows (follower_id, followed_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(target_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    return AppError::Conflict("Already following".to_string());
                }
                AppError::InternalServerError(e.to_string())
            })?;

        notify::record(&mut *tx, target_id, user_id, NotificationKind::Follow).await?;
    }

    tx.commit().await?;

    Ok(Json(serde_json::json!({
        "following": !is_following,
        "message": if is_following {
            format!("Unfollowed {}", target_firstname)
        } else {
            format!("Followed {}", target_firstname)
        },
    })))
}

/// Upload a new profile picture (multipart `file` field).
pub async fn upload_pfp(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .map(|s| s.to_string())
                .ok_or(AppError::BadRequest("No selected file".to_string()))?;
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            upload = Some((filename, data.to_vec()));
        }
    }

    let (filename, data) = upload.ok_or(AppError::BadRequest("No file part".to_string()))?;

    let stored = save_upload(&config.upload_dir, &filename, &data).await?;

    sqlx::query("UPDATE users SET profile_pic = $1 WHERE id = $2")
        .bind(&stored)
        .bind(user_id)
        .execute(&pool)
        .await?;

    Ok(Json(serde_json::json!({
        "message": "Profile picture updated",
        "profile_pic": stored,
    })))
}
