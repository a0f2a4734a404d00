// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, is_unique_violation},
    models::user::{SigninRequest, SignupRequest, User},
    utils::{
        hash::{hash_password, verify_password},
        jwt::{TOKEN_COOKIE, sign_jwt},
    },
};

/// Registers a new user as student or recruiter.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created, or 409 when the email is already registered.
pub async fn signup(
    State(pool): State<PgPool>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO users (firstname, lastname, email, password, role)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(&payload.firstname)
    .bind(&payload.lastname)
    .bind(&payload.email)
    .bind(&hashed_password)
    .bind(&payload.role)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!("Email '{}' is already registered", payload.email))
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User created successfully", "id": id })),
    ))
}

/// Authenticates a user by email and password.
///
/// On success sets the signed credential as an HTTP-only cookie and also
/// returns it in the body for non-browser clients. Unknown email and wrong
/// password produce the same 401 message.
pub async fn signin(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    jar: CookieJar,
    Json(payload): Json<SigninRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&payload.email)
        .fetch_optional(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Signin DB error: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    let user = user.ok_or(AppError::AuthError("Invalid credentials".to_string()))?;

    let is_valid = verify_password(&payload.password, &user.password)?;

    if !is_valid {
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    }

    let name = format!("{} {}", user.firstname, user.lastname);
    let token = sign_jwt(
        user.id,
        &name,
        &user.role,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    let cookie = Cookie::build((TOKEN_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((
        jar.add(cookie),
        Json(json!({
            "message": "Login successful",
            "role": user.role,
            "token": token,
        })),
    ))
}

/// Clears the credential cookie.
pub async fn logout(jar: CookieJar) -> Result<impl IntoResponse, AppError> {
    let jar = jar.remove(Cookie::build((TOKEN_COOKIE, "")).path("/"));
    Ok((jar, Json(json!({ "message": "Logged out" }))))
}
