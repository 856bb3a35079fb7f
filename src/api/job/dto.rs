use actix_multipart::form::{bytes::Bytes, MultipartForm};
use actix_web::http::StatusCode;
use serde::{Deserialize, Serialize};

use super::models::JobSummary;
use crate::db::store::{BulkInsertReport, FailureKind, InsertFailure};
use crate::query::listing::{JOB_TYPE_OPTIONS, LOCATION_OPTIONS, SORT_OPTIONS};

/// Bulk request body: either `{jobs: [...]}` or a bare array. Records stay
/// untyped here so one malformed record fails alone.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum BulkJobsPayload {
    Wrapped { jobs: Vec<serde_json::Value> },
    Bare(Vec<serde_json::Value>),
}

impl BulkJobsPayload {
    pub fn into_records(self) -> Vec<serde_json::Value> {
        match self {
            BulkJobsPayload::Wrapped { jobs } => jobs,
            BulkJobsPayload::Bare(jobs) => jobs,
        }
    }
}

/// Multipart upload carrying a JSON file in the bulk body format
#[derive(MultipartForm)]
pub struct BulkUploadForm {
    pub file: Bytes,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkInsertData {
    pub inserted_count: usize,
    pub jobs: Vec<JobSummary>,
}

/// Response for bulk job creation, including partial failures
#[derive(Debug, Serialize)]
pub struct BulkJobResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub data: BulkInsertData,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<InsertFailure>,
}

fn describe(failures: &[InsertFailure], kind: FailureKind) -> String {
    failures
        .iter()
        .filter(|f| f.kind == kind)
        .map(|f| format!("job #{} ({}): {}", f.index + 1, f.job_slug, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl BulkJobResponse {
    /// Pick the status for a finished batch. Store faults outrank duplicate
    /// slugs, which outrank validation failures.
    pub fn from_report(report: BulkInsertReport) -> (StatusCode, Self) {
        let inserted_count = report.inserted.len();
        let data = BulkInsertData {
            inserted_count,
            jobs: report.inserted,
        };
        let failures = report.failures;

        let (status, error, details) = if failures.iter().any(|f| f.kind == FailureKind::Store) {
            (StatusCode::INTERNAL_SERVER_ERROR, Some("Something went wrong".to_string()), None)
        } else if failures.iter().any(|f| f.kind == FailureKind::Duplicate) {
            (
                StatusCode::CONFLICT,
                Some("Duplicate job_slug found. Each job must have a unique slug.".to_string()),
                Some(describe(&failures, FailureKind::Duplicate)),
            )
        } else if failures.iter().any(|f| f.kind == FailureKind::Validation) {
            (
                StatusCode::BAD_REQUEST,
                Some("Validation failed".to_string()),
                Some(describe(&failures, FailureKind::Validation)),
            )
        } else {
            (StatusCode::OK, None, None)
        };

        let message = if failures.is_empty() {
            format!("Successfully inserted {} jobs", inserted_count)
        } else {
            format!("Inserted {} jobs, {} failed", inserted_count, failures.len())
        };

        (
            status,
            Self {
                success: status.is_success(),
                message,
                error,
                details,
                data,
                failures,
            },
        )
    }
}

#[derive(Debug, Serialize)]
pub struct SortOption {
    pub label: &'static str,
    pub value: &'static str,
}

/// Closed option lists the careers page renders as filter controls
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub locations: &'static [&'static str],
    pub job_types: &'static [&'static str],
    pub sort_options: Vec<SortOption>,
}

impl FilterOptions {
    pub fn current() -> Self {
        Self {
            locations: LOCATION_OPTIONS,
            job_types: JOB_TYPE_OPTIONS,
            sort_options: SORT_OPTIONS
                .iter()
                .map(|&(label, value)| SortOption { label, value })
                .collect(),
        }
    }
}
