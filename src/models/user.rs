// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;
use validator::Validate;

pub const ROLE_STUDENT: &str = "student";
pub const ROLE_RECRUITER: &str = "recruiter";

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    pub firstname: String,
    pub lastname: String,

    /// Unique email address, doubles as the login identifier.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// 'student' or 'recruiter'. Immutable after signup.
    pub role: String,

    pub bio: Option<String>,
    pub study_place: Option<String>,
    pub work_place: Option<String>,
    pub linkedin_link: Option<String>,
    pub github_link: Option<String>,
    pub profile_pic: String,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for signup.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 50, message = "Firstname must be 1-50 characters."))]
    pub firstname: String,

    #[validate(length(min = 1, max = 50, message = "Lastname must be 1-50 characters."))]
    pub lastname: String,

    #[validate(email(message = "Invalid email address."), length(max = 120))]
    pub email: String,

    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,

    #[validate(custom(function = validate_role))]
    pub role: String,
}

/// DTO for signin.
#[derive(Debug, Deserialize, Validate)]
pub struct SigninRequest {
    #[validate(length(min = 1, max = 120))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// DTO for partial profile updates. Role and email are not accepted.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 50))]
    pub firstname: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub lastname: Option<String>,
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
    #[validate(length(max = 100))]
    pub study_place: Option<String>,
    #[validate(length(max = 100))]
    pub work_place: Option<String>,
    #[validate(custom(function = validate_optional_link))]
    pub linkedin_link: Option<String>,
    #[validate(custom(function = validate_optional_link))]
    pub github_link: Option<String>,
    #[validate(length(min = 4, max = 128))]
    pub password: Option<String>,
}

/// The current user's profile with follow-graph aggregates.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub role: String,
    pub bio: Option<String>,
    pub study_place: Option<String>,
    pub work_place: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub profile_pic: String,
    pub followers_count: i64,
    pub following_count: i64,
}

/// Another user's profile as seen by the current user.
#[derive(Debug, Serialize)]
pub struct PublicProfileResponse {
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
    pub role: String,
    pub bio: Option<String>,
    pub study_place: Option<String>,
    pub work_place: Option<String>,
    pub profile_pic: String,
    pub followers_count: i64,
    pub following_count: i64,
    pub is_following: bool,
}

fn validate_role(role: &str) -> Result<(), validator::ValidationError> {
    if role != ROLE_STUDENT && role != ROLE_RECRUITER {
        return Err(validator::ValidationError::new("invalid_role"));
    }
    Ok(())
}

/// Validates that a link, when present and non-empty, is a well-formed URL.
fn validate_optional_link(link: &str) -> Result<(), validator::ValidationError> {
    if link.is_empty() {
        return Ok(());
    }
    if link.len() > 200 || Url::parse(link).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}
