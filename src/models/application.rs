use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_ACCEPTED: &str = "accepted";
pub const STATUS_REFUSED: &str = "refused";

/// Represents the 'applications' table in the database.
/// Unique per (job, student); re-applying is rejected, not duplicated.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Application {
    pub id: i64,
    pub job_id: i64,
    pub student_id: i64,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for a recruiter's status decision.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// True for the statuses the storage CHECK constraint admits.
pub fn is_valid_status(status: &str) -> bool {
    matches!(status, STATUS_PENDING | STATUS_ACCEPTED | STATUS_REFUSED)
}

/// A student's view of one of their applications.
#[derive(Debug, Serialize, FromRow)]
pub struct StudentApplicationItem {
    pub id: i64,
    pub job_id: i64,
    pub job_title: String,
    pub company: String,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A recruiter's view of an application to one of their jobs.
#[derive(Debug, Serialize, FromRow)]
pub struct RecruiterApplicationItem {
    pub id: i64,
    pub job_id: i64,
    pub job_title: String,
    pub applicant_id: i64,
    pub applicant_name: String,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
