use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use super::dto::BulkJobsPayload;
use super::models::{JobSummary, NewJob};
use crate::api::validation::ErrorResponse;
use crate::db::store::{BulkInsertReport, FailureKind, InsertFailure, JobStore, StoreError};
use crate::query::{build_pipeline, ListingLimits, ListingParams, ListingQuery};

/// Service-level errors
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A free-text filter exceeded the configured maximum
    #[error("{field} must not exceed {max_length} characters")]
    FilterTooLong { field: &'static str, max_length: usize },

    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Job not found: {0}")]
    NotFound(String),

    /// Duplicate `job_slug`
    #[error("{0}")]
    Conflict(String),

    /// Store failure; `context` is the only part shown to callers
    #[error("{context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::FilterTooLong { .. } | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ServiceError::FilterTooLong { .. } => {
                warn!("Rejected listing request: {}", self);
                ErrorResponse::new(self.to_string())
            }
            ServiceError::Validation(messages) => {
                warn!("Validation error: {}", self);
                ErrorResponse::new("Validation failed").with_details(messages.join("; "))
            }
            ServiceError::NotFound(slug) => {
                warn!("Job not found: {}", slug);
                ErrorResponse::new("Not found").with_message(format!("Job with slug {} not found", slug))
            }
            ServiceError::Conflict(details) => {
                warn!("Conflict: {}", details);
                ErrorResponse::new("Duplicate job_slug found. Each job must have a unique slug.")
                    .with_details(details.clone())
            }
            ServiceError::Store { context, source } => {
                error!("{}: {}", context, source);
                ErrorResponse::new(*context).with_message("Database error occurred")
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Job listing and ingestion logic
pub struct JobService {
    store: Arc<dyn JobStore>,
    limits: ListingLimits,
}

impl JobService {
    pub fn new(store: Arc<dyn JobStore>, limits: ListingLimits) -> Self {
        Self { store, limits }
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    /// List one page of jobs.
    ///
    /// Oversized filters are rejected before any escaping or query
    /// construction. Never mutates the store.
    pub async fn list_jobs(&self, params: &ListingParams) -> Result<Vec<JobSummary>, ServiceError> {
        let query = ListingQuery::from_params(params, &self.limits).map_err(|e| ServiceError::FilterTooLong {
            field: e.field,
            max_length: e.max_length,
        })?;

        info!(
            "Service: Listing jobs offset={} limit={} search={:?} location={:?} job_type={:?} sort={:?}",
            query.offset, query.limit, query.search, query.location, query.job_type, query.sort
        );

        let pipeline = build_pipeline(&query);
        let jobs = self
            .store
            .aggregate(&pipeline)
            .await
            .map_err(|source| ServiceError::Store {
                context: "Failed to fetch jobs",
                source,
            })?;

        info!("Service: Listing returned {} jobs", jobs.len());
        Ok(jobs)
    }

    pub async fn get_job(&self, job_slug: &str) -> Result<JobSummary, ServiceError> {
        let job_slug = job_slug.trim().to_lowercase();
        let found = self
            .store
            .find_by_slug(&job_slug)
            .await
            .map_err(|source| ServiceError::Store {
                context: "Failed to fetch job",
                source,
            })?;
        found.ok_or(ServiceError::NotFound(job_slug))
    }

    /// Create a single job
    pub async fn create_job(&self, job: NewJob) -> Result<JobSummary, ServiceError> {
        let job = job.normalized();
        if let Some(messages) = job.validation_messages() {
            return Err(ServiceError::Validation(messages));
        }

        info!("Service: Creating job with job_slug={}", job.job_slug);

        match self.store.insert(&job).await {
            Ok(created) => {
                info!("Service: Job created successfully with job_slug={}", created.job_slug);
                Ok(created)
            }
            Err(err @ StoreError::Duplicate { .. }) => Err(ServiceError::Conflict(err.to_string())),
            Err(StoreError::Invalid(msg)) => Err(ServiceError::Validation(vec![msg])),
            Err(source) => Err(ServiceError::Store {
                context: "Failed to create job",
                source,
            }),
        }
    }

    /// Bulk create jobs.
    ///
    /// Each record is decoded, normalized and validated on its own; valid
    /// records are inserted independently so one bad record never blocks
    /// the rest.
    pub async fn bulk_create_jobs(&self, payload: BulkJobsPayload) -> BulkInsertReport {
        let records = payload.into_records();
        info!("Service: Processing bulk job creation for {} jobs", records.len());

        let mut rejected = Vec::new();
        let mut valid = Vec::new();

        for (index, record) in records.into_iter().enumerate() {
            let slug_hint = record
                .get("job_slug")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();

            let job = match serde_json::from_value::<NewJob>(record) {
                Ok(job) => job.normalized(),
                Err(err) => {
                    warn!("Service: Job #{} could not be decoded: {}", index + 1, err);
                    rejected.push(InsertFailure {
                        index,
                        job_slug: slug_hint,
                        kind: FailureKind::Validation,
                        message: err.to_string(),
                    });
                    continue;
                }
            };

            match job.validation_messages() {
                Some(messages) => {
                    warn!("Service: Validation failed for job: {}", job.job_slug);
                    rejected.push(InsertFailure {
                        index,
                        job_slug: job.job_slug,
                        kind: FailureKind::Validation,
                        message: messages.join("; "),
                    });
                }
                None => valid.push((index, job)),
            }
        }

        let mut report = if valid.is_empty() {
            warn!("Service: No valid jobs to insert");
            BulkInsertReport::default()
        } else {
            info!("Service: Inserting {} valid jobs", valid.len());
            self.store.insert_many(&valid).await
        };

        report.failures.extend(rejected);
        report.failures.sort_by_key(|f| f.index);

        if report.failures.is_empty() {
            info!(
                "Service: Bulk job creation completed successfully: {} jobs created",
                report.inserted.len()
            );
        } else {
            warn!(
                "Service: Bulk job creation completed: {} created, {} failed",
                report.inserted.len(),
                report.failures.len()
            );
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::job::models::fixtures::new_job;
    use crate::api::job::models::JobType;
    use crate::db::MemoryJobStore;
    use async_trait::async_trait;
    use crate::query::Pipeline;

    struct FailingStore;

    #[async_trait]
    impl JobStore for FailingStore {
        async fn aggregate(&self, _pipeline: &Pipeline) -> Result<Vec<JobSummary>, StoreError> {
            Err(StoreError::Query("connection reset by peer".to_string()))
        }

        async fn insert(&self, _job: &NewJob) -> Result<JobSummary, StoreError> {
            Err(StoreError::Query("connection reset by peer".to_string()))
        }

        async fn find_by_slug(&self, _job_slug: &str) -> Result<Option<JobSummary>, StoreError> {
            Ok(None)
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Query("down".to_string()))
        }
    }

    fn service() -> JobService {
        JobService::new(Arc::new(MemoryJobStore::new()), ListingLimits::default())
    }

    #[tokio::test]
    async fn oversized_search_is_rejected_before_the_store() {
        let service = JobService::new(Arc::new(FailingStore), ListingLimits::default());
        let params = ListingParams {
            search: Some("x".repeat(101)),
            ..Default::default()
        };

        let err = service.list_jobs(&params).await.unwrap_err();

        assert!(matches!(err, ServiceError::FilterTooLong { field: "search", max_length: 100 }));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn store_failure_becomes_generic_server_error() {
        let service = JobService::new(Arc::new(FailingStore), ListingLimits::default());

        let err = service.list_jobs(&ListingParams::default()).await.unwrap_err();

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = actix_web::body::to_bytes(err.error_response().into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "success": false,
                "error": "Failed to fetch jobs",
                "message": "Database error occurred"
            })
        );
    }

    #[tokio::test]
    async fn create_rejects_duplicate_slug_with_conflict() {
        let service = service();
        service.create_job(new_job("dup", JobType::Tech, 1)).await.unwrap();

        let err = service
            .create_job(new_job(" DUP ", JobType::Tech, 2))
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert!(err.to_string().contains("'dup'"));
    }

    #[tokio::test]
    async fn get_job_looks_up_lowercased_slug() {
        let service = service();
        service.create_job(new_job("lead-designer", JobType::Design, 4)).await.unwrap();

        let job = service.get_job("Lead-Designer").await.unwrap();
        let missing = service.get_job("nobody").await.unwrap_err();

        assert_eq!(job.job_type, JobType::Design);
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bulk_reports_decode_validation_and_duplicate_failures_by_index() {
        let service = service();
        service.create_job(new_job("taken", JobType::Tech, 1)).await.unwrap();

        let mut invalid = serde_json::to_value(new_job("bad-range", JobType::Tech, 1)).unwrap();
        invalid["salary_range"]["min"] = serde_json::json!(1_000_000);
        let payload = BulkJobsPayload::Bare(vec![
            serde_json::to_value(new_job("fresh", JobType::Tech, 1)).unwrap(),
            serde_json::json!({"job_slug": "no-fields"}),
            invalid,
            serde_json::to_value(new_job("taken", JobType::Tech, 1)).unwrap(),
        ]);

        let report = service.bulk_create_jobs(payload).await;

        assert_eq!(report.inserted.len(), 1);
        let kinds: Vec<(usize, FailureKind)> = report.failures.iter().map(|f| (f.index, f.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (1, FailureKind::Validation),
                (2, FailureKind::Validation),
                (3, FailureKind::Duplicate)
            ]
        );
        assert_eq!(report.failures[0].job_slug, "no-fields");
    }
}
