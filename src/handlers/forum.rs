// src/handlers/forum.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, is_unique_violation},
    models::{
        comment::{CommentResponse, CreateCommentRequest},
        post::{FeedParams, FeedRow},
    },
    notify::{self, NotificationKind},
    utils::{html::clean_html, jwt::Claims, upload::save_upload},
};

/// The forum feed, newest first.
///
/// `?filter=following` restricts it to posts authored by the current user
/// and the users they follow; anything else returns the global feed.
/// Each item carries its like count, the current user's like status and
/// the full ordered comment list.
pub async fn get_feed(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<FeedParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let following_only = params.filter.as_deref() == Some("following");

    let mut sql = String::from(
        r#"
        SELECT p.id, p.user_id, u.firstname, u.lastname, u.profile_pic,
               p.content, p.image_url, p.created_at,
               (SELECT COUNT(*) FROM post_likes pl WHERE pl.post_id = p.id) AS likes_count,
               EXISTS(SELECT 1 FROM post_likes pl
                      WHERE pl.post_id = p.id AND pl.user_id = $1) AS is_liked
        FROM posts p
        JOIN users u ON p.user_id = u.id
        "#,
    );
    if following_only {
        sql.push_str(
            r#"
        WHERE p.user_id = $1
           OR p.user_id IN (SELECT followed_id FROM follows WHERE follower_id = $1)
        "#,
        );
    }
    sql.push_str(" ORDER BY p.created_at DESC");

    let rows = sqlx::query_as::<_, FeedRow>(&sql)
        .bind(user_id)
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch feed: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    // One query for every comment on the page, grouped per post in memory.
    let post_ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut comments_by_post: HashMap<i64, Vec<CommentResponse>> = HashMap::new();

    if !post_ids.is_empty() {
        let comments = sqlx::query_as::<_, CommentResponse>(
            r#"
            SELECT c.id, c.post_id, c.user_id AS author_id,
                   u.firstname || ' ' || u.lastname AS author,
                   u.profile_pic AS author_pic,
                   c.content, c.created_at,
                   (SELECT COUNT(*) FROM comment_likes cl
                    WHERE cl.comment_id = c.id) AS likes
            FROM comments c
            JOIN users u ON c.user_id = u.id
            WHERE c.post_id = ANY($1)
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(&post_ids)
        .fetch_all(&pool)
        .await?;

        for comment in comments {
            comments_by_post
                .entry(comment.post_id)
                .or_default()
                .push(comment);
        }
    }

    let feed: Vec<_> = rows
        .into_iter()
        .map(|row| {
            let comments = comments_by_post.remove(&row.id).unwrap_or_default();
            row.into_item(comments)
        })
        .collect();

    Ok(Json(feed))
}

/// Create a new post from a multipart form: a `content` text field and an
/// optional `file` attachment (image or PDF).
pub async fn create_post(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let mut content: Option<String> = None;
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        match field.name() {
            Some("content") => {
                content = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .ok_or(AppError::BadRequest("Attachment has no filename".to_string()))?;
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                upload = Some((filename, data.to_vec()));
            }
            _ => {}
        }
    }

    let content = content
        .map(|c| clean_html(c.trim()))
        .filter(|c| !c.is_empty())
        .ok_or(AppError::BadRequest("Post content is required".to_string()))?;

    let image_url = match upload {
        Some((filename, data)) => Some(save_upload(&config.upload_dir, &filename, &data).await?),
        None => None,
    };

    let post_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO posts (user_id, content, image_url)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(&content)
    .bind(&image_url)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create post: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": post_id })),
    ))
}

/// Toggle Like on a post.
///
/// Liking someone else's post notifies the author; unliking and self-likes
/// never do, and unliking removes no past notification.
pub async fn toggle_post_like(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let mut tx = pool.begin().await?;

    let author_id: i64 = sqlx::query_scalar("SELECT user_id FROM posts WHERE id = $1")
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    let existing: Option<i32> =
        sqlx::query_scalar("SELECT 1 FROM post_likes WHERE user_id = $1 AND post_id = $2")
            .bind(user_id)
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?;

    let is_liked = existing.is_some();

    if is_liked {
        // Unlike
        sqlx::query("DELETE FROM post_likes WHERE user_id = $1 AND post_id = $2")
            .bind(user_id)
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
    } else {
        // Like
        sqlx::query("INSERT INTO post_likes (user_id, post_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    // Concurrent request handled gracefully
                    return AppError::Conflict("Already liked".to_string());
                }
                AppError::InternalServerError(e.to_string())
            })?;

        if author_id != user_id {
            notify::record(
                &mut *tx,
                author_id,
                user_id,
                NotificationKind::PostLike { post_id },
            )
            .await?;
        }
    }

    tx.commit().await?;

    Ok(Json(serde_json::json!({ "liked": !is_liked })))
}

/// Toggle Like on a comment. Same rules as post likes.
pub async fn toggle_comment_like(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(comment_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let mut tx = pool.begin().await?;

    let author_id: i64 = sqlx::query_scalar("SELECT user_id FROM comments WHERE id = $1")
        .bind(comment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Comment not found".to_string()))?;

    let existing: Option<i32> =
        sqlx::query_scalar("SELECT 1 FROM comment_likes WHERE user_id = $1 AND comment_id = $2")
            .bind(user_id)
            .bind(comment_id)
            .fetch_optional(&mut *tx)
            .await?;

    let is_liked = existing.is_some();

    if is_liked {
        sqlx::query("DELETE FROM comment_likes WHERE user_id = $1 AND comment_id = $2")
            .bind(user_id)
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;
    } else {
        sqlx::query("INSERT INTO comment_likes (user_id, comment_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(comment_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    return AppError::Conflict("Already liked".to_string());
                }
                AppError::InternalServerError(e.to_string())
            })?;

        if author_id != user_id {
            notify::record(
                &mut *tx,
                author_id,
                user_id,
                NotificationKind::CommentLike { comment_id },
            )
            .await?;
        }
    }

    tx.commit().await?;

    Ok(Json(serde_json::json!({ "liked": !is_liked })))
}

/// Add a comment to a post. Notifies the post author unless they are
/// commenting on their own post.
pub async fn add_comment(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<i64>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let user_id = claims.user_id();

    let mut tx = pool.begin().await?;

    let author_id: i64 = sqlx::query_scalar("SELECT user_id FROM posts WHERE id = $1")
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    let content = clean_html(payload.content.trim());
    if content.is_empty() {
        return Err(AppError::BadRequest("Comment must not be empty".to_string()));
    }

    let comment_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO comments (post_id, user_id, content)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(post_id)
    .bind(user_id)
    .bind(&content)
    .fetch_one(&mut *tx)
    .await?;

    if author_id != user_id {
        notify::record(
            &mut *tx,
            author_id,
            user_id,
            NotificationKind::Comment { post_id },
        )
        .await?;
    }

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": comment_id })),
    ))
}
