use chrono::NaiveDateTime;
use sqlx::FromRow;

use crate::api::job::models::{JobSummary, SalaryRange};
use crate::db::store::StoreError;

/// Listing columns of a `job_postings` row. The internal `id` is never
/// selected into this shape.
#[derive(Debug, FromRow)]
pub struct JobRow {
    pub title: String,
    pub work_policy: String,
    pub location: String,
    pub department: String,
    pub employment_type: String,
    pub experience_level: String,
    pub job_type: String,
    pub salary_min: f64,
    pub salary_max: f64,
    pub salary_currency: String,
    pub job_slug: String,
    pub posted_days_ago: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<JobRow> for JobSummary {
    type Error = StoreError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        Ok(JobSummary {
            title: row.title,
            work_policy: row.work_policy.parse().map_err(StoreError::Invalid)?,
            location: row.location,
            department: row.department,
            employment_type: row.employment_type.parse().map_err(StoreError::Invalid)?,
            experience_level: row.experience_level.parse().map_err(StoreError::Invalid)?,
            job_type: row.job_type.parse().map_err(StoreError::Invalid)?,
            salary_range: SalaryRange {
                min: row.salary_min,
                max: row.salary_max,
                currency: row.salary_currency,
            },
            job_slug: row.job_slug,
            posted_days_ago: row.posted_days_ago,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
