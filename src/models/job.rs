use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'jobs' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub recruiter_id: i64,
    pub title: String,
    pub description: String,
    pub salary: Option<String>,
    pub location: Option<String>,
    pub is_remote: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a new job. Recruiters only.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateJobRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: String,

    #[validate(length(
        min = 1,
        max = 10000,
        message = "Description must be 1-10000 characters"
    ))]
    pub description: String,

    #[validate(length(max = 50))]
    pub salary: Option<String>,

    #[validate(length(max = 100))]
    pub location: Option<String>,

    #[serde(default)]
    pub is_remote: bool,
}

/// DTO for rating a job. 0 is the "no ratings yet" display sentinel and
/// is rejected as input; valid submissions are 1-5.
#[derive(Debug, Deserialize, Validate)]
pub struct RateJobRequest {
    #[validate(range(min = 1, max = 5, message = "Stars must be between 1 and 5"))]
    pub stars: i32,
}

/// One job row as fetched for the listing, with recruiter identity,
/// raw rating average and the current user's saved status joined in.
#[derive(Debug, FromRow)]
pub struct JobRow {
    pub id: i64,
    pub recruiter_id: i64,
    pub firstname: String,
    pub lastname: String,
    pub profile_pic: String,
    pub title: String,
    pub description: String,
    pub salary: Option<String>,
    pub location: Option<String>,
    pub is_remote: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub avg_stars: Option<f64>,
    pub is_saved: bool,
}

/// A job listing item as returned to the client.
#[derive(Debug, Serialize)]
pub struct JobListItem {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub salary: Option<String>,
    pub location: Option<String>,
    pub is_remote: bool,
    pub recruiter: String,
    pub recruiter_id: i64,
    pub recruiter_pic: String,
    pub rating: f64,
    pub is_saved: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<JobRow> for JobListItem {
    fn from(row: JobRow) -> Self {
        JobListItem {
            id: row.id,
            title: row.title,
            description: row.description,
            salary: row.salary,
            location: row.location,
            is_remote: row.is_remote,
            recruiter: format!("{} {}", row.firstname, row.lastname),
            recruiter_id: row.recruiter_id,
            recruiter_pic: row.profile_pic,
            rating: round_avg(row.avg_stars),
            is_saved: row.is_saved,
            created_at: row.created_at,
        }
    }
}

/// Average rating rounded to one decimal; 0 when no ratings exist.
/// The mean itself comes from AVG(stars) at read time, never a stored column.
pub fn round_avg(avg: Option<f64>) -> f64 {
    match avg {
        Some(v) => (v * 10.0).round() / 10.0,
        None => 0.0,
    }
}
